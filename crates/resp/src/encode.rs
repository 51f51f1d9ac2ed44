//! RESP v2 command encoder.
//!
//! The encoder writes into a caller-provided slice at a caller-provided
//! offset and reports [`EncodeError::OutOfBounds`] when it runs off the end.
//! It writes speculatively rather than pre-computing the frame size, so a
//! failed call leaves garbage past `offset`; the caller rolls its cursor
//! back, finds a bigger buffer and retries.

use crate::command::Command;
use crate::error::EncodeError;
use crate::utils::ARRAY;
use crate::utils::BULK_STRING;
use crate::utils::CRLF;

/// Write the full RESP frame for `command` into `dst` starting at `offset`.
///
/// Returns the offset one past the written frame. The layout is
/// `*<N>\r\n` followed by one `$<len>\r\n<bytes>\r\n` bulk string per verb
/// token and per argument, `N` being their combined count. Only ASCII is
/// produced outside argument payloads.
pub fn encode_command(dst: &mut [u8], offset: usize, command: &Command) -> Result<usize, EncodeError> {
	let mut cursor = Cursor { dst, pos: offset };

	let count = command.verb().tokens().len() + command.args().len();
	cursor.put_u8(ARRAY)?;
	cursor.put_decimal(count)?;
	cursor.put_slice(CRLF)?;

	for token in command.verb().tokens() {
		put_bulk(&mut cursor, token.as_bytes())?;
	}
	for arg in command.args() {
		put_bulk(&mut cursor, arg)?;
	}

	Ok(cursor.pos)
}

fn put_bulk(cursor: &mut Cursor<'_>, payload: &[u8]) -> Result<(), EncodeError> {
	cursor.put_u8(BULK_STRING)?;
	cursor.put_decimal(payload.len())?;
	cursor.put_slice(CRLF)?;
	cursor.put_slice(payload)?;
	cursor.put_slice(CRLF)
}

struct Cursor<'a> {
	dst: &'a mut [u8],
	pos: usize,
}

impl Cursor<'_> {
	fn put_u8(&mut self, byte: u8) -> Result<(), EncodeError> {
		if self.pos >= self.dst.len() {
			return Err(EncodeError::OutOfBounds);
		}
		self.dst[self.pos] = byte;
		self.pos += 1;
		Ok(())
	}

	fn put_slice(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
		let end = self.pos.saturating_add(bytes.len());
		if end > self.dst.len() {
			return Err(EncodeError::OutOfBounds);
		}
		self.dst[self.pos..end].copy_from_slice(bytes);
		self.pos = end;
		Ok(())
	}

	fn put_decimal(&mut self, n: usize) -> Result<(), EncodeError> {
		self.put_slice(n.to_string().as_bytes())
	}
}

#[cfg(test)]
mod tests {
	use bytes::Bytes;

	use super::*;
	use crate::command::Verb;

	#[test]
	fn test_encode_get() {
		let cmd = Command::with_text_args(Verb::Get, ["foo"]);
		let mut dst = vec![0u8; 64];

		let end = encode_command(&mut dst, 0, &cmd).unwrap();
		assert_eq!(&dst[..end], b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n");
	}

	#[test]
	fn test_encode_at_offset() {
		let cmd = Command::new(Verb::Ping);
		let mut dst = vec![b'x'; 32];

		let end = encode_command(&mut dst, 4, &cmd).unwrap();
		assert_eq!(&dst[..4], b"xxxx");
		assert_eq!(&dst[4..end], b"*1\r\n$4\r\nPING\r\n");
	}

	#[test]
	fn test_encode_multi_token_verb() {
		// Verb tokens count toward the element count like arguments do
		let cmd = Command::new(Verb::ClientGetname);
		let mut dst = vec![0u8; 64];

		let end = encode_command(&mut dst, 0, &cmd).unwrap();
		assert_eq!(&dst[..end], b"*2\r\n$6\r\nCLIENT\r\n$7\r\nGETNAME\r\n");
	}

	#[test]
	fn test_encode_binary_argument() {
		let cmd = Command::with_args(Verb::Set, [
			Bytes::from_static(b"k"),
			Bytes::from_static(b"a\r\nb\x00"),
		]);
		let mut dst = vec![0u8; 64];

		let end = encode_command(&mut dst, 0, &cmd).unwrap();
		assert_eq!(&dst[..end], b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$5\r\na\r\nb\x00\r\n");
	}

	#[test]
	fn test_encode_out_of_bounds() {
		let cmd = Command::with_text_args(Verb::Get, ["foo"]);
		let mut dst = vec![0u8; 8];

		assert_eq!(encode_command(&mut dst, 0, &cmd), Err(EncodeError::OutOfBounds));
	}

	#[test]
	fn test_encode_exact_fit() {
		let cmd = Command::with_text_args(Verb::Get, ["foo"]);
		let frame = b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n";
		let mut dst = vec![0u8; frame.len()];

		let end = encode_command(&mut dst, 0, &cmd).unwrap();
		assert_eq!(end, frame.len());
		assert_eq!(&dst[..], &frame[..]);
	}
}
