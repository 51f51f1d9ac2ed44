use bytes::Bytes;
use resp::Command;
use resp::EncodeError;
use resp::Verb;
use resp::encode_command;
use rstest::rstest;

#[test]
fn encode_get_foo() {
	let cmd = Command::with_text_args(Verb::Get, ["foo"]);
	let mut dst = vec![0u8; 64];

	let end = encode_command(&mut dst, 0, &cmd).unwrap();
	assert_eq!(&dst[..end], b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n");
}

#[test]
fn encode_is_deterministic() {
	let cmd = Command::with_text_args(Verb::Set, ["key", "value"]);
	let mut first = vec![0u8; 64];
	let mut second = vec![0u8; 64];

	let end_first = encode_command(&mut first, 0, &cmd).unwrap();
	let end_second = encode_command(&mut second, 0, &cmd).unwrap();
	assert_eq!(&first[..end_first], &second[..end_second]);
}

#[test]
fn multi_token_verb_counts_each_token() {
	let cmd = Command::with_text_args(Verb::ClientSetname, ["conn-1"]);
	let mut dst = vec![0u8; 64];

	let end = encode_command(&mut dst, 0, &cmd).unwrap();
	assert_eq!(
		&dst[..end],
		b"*3\r\n$6\r\nCLIENT\r\n$7\r\nSETNAME\r\n$6\r\nconn-1\r\n"
	);
}

#[test]
fn commands_append_back_to_back() {
	let ping = Command::new(Verb::Ping);
	let get = Command::with_text_args(Verb::Get, ["k"]);
	let mut dst = vec![0u8; 64];

	let middle = encode_command(&mut dst, 0, &ping).unwrap();
	let end = encode_command(&mut dst, middle, &get).unwrap();
	assert_eq!(&dst[..end], b"*1\r\n$4\r\nPING\r\n*2\r\n$3\r\nGET\r\n$1\r\nk\r\n");
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(10)]
#[case(21)]
fn too_small_buffer_signals_out_of_bounds(#[case] capacity: usize) {
	// The full frame takes 22 bytes; anything shorter must fail
	let cmd = Command::with_text_args(Verb::Get, ["foo"]);
	let mut dst = vec![0u8; capacity];

	assert_eq!(encode_command(&mut dst, 0, &cmd), Err(EncodeError::OutOfBounds));
}

#[test]
fn retry_after_out_of_bounds_succeeds() {
	let cmd = Command::with_args(Verb::Set, [
		Bytes::from_static(b"key"),
		Bytes::from_static(b"a longer binary value \x00\x01\x02"),
	]);

	let mut small = vec![0u8; 16];
	assert_eq!(encode_command(&mut small, 0, &cmd), Err(EncodeError::OutOfBounds));

	let mut large = vec![0u8; 128];
	let end = encode_command(&mut large, 0, &cmd).unwrap();
	assert_eq!(
		&large[..end],
		b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$25\r\na longer binary value \x00\x01\x02\r\n"
	);
}
