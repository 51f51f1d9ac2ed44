//! Decode a pipelined reply stream arriving in small fragments.

use bytes::Bytes;
use resp::ByteQueue;
use resp::ResponseDecoder;

fn main() {
	let wire: &[u8] = b"+OK\r\n:42\r\n*2\r\n$5\r\nhello\r\n$-1\r\n";

	let mut decoder = ResponseDecoder::new();
	let mut queue = ByteQueue::new();

	// Five bytes at a time, the way a slow socket might deliver them
	for fragment in wire.chunks(5) {
		queue.add(Bytes::copy_from_slice(fragment));
		loop {
			match decoder.try_decode(&mut queue) {
				Ok(Some(response)) => println!("decoded: {:?}", response),
				Ok(None) => break,
				Err(e) => {
					eprintln!("protocol error: {}", e);
					return;
				}
			}
		}
	}
}
