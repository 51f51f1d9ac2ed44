//! Adaptive staging buffer between the encoder and the transport.
//!
//! Commands are encoded speculatively into a fixed slice. When one does not
//! fit, the cursor rolls back so no partial frame is ever visible, the bytes
//! staged so far are pushed out, and a strictly larger buffer is allocated
//! before retrying. The target capacity grows immediately to the largest
//! command seen and decays geometrically back toward the configured initial
//! size on every flush.

use bytes::Bytes;
use resp::Command;
use resp::EncodeError;
use resp::encode_command;

#[derive(Debug)]
pub struct SendBuffer {
	initial_size: usize,
	buffer_size: usize,
	buf: Vec<u8>,
	tail: usize,
}

impl SendBuffer {
	pub fn new(initial_size: usize) -> Self {
		Self {
			initial_size,
			buffer_size: initial_size,
			buf: vec![0; initial_size],
			tail: 0,
		}
	}

	/// Append one encoded command.
	///
	/// Returns the previously staged bytes when the append had to push them
	/// out to make room (at most one non-empty hand-off per call); the
	/// caller must write them to the transport ahead of everything staged
	/// afterwards. The retry loop terminates because every round either
	/// succeeds or grows the buffer by at least half.
	pub fn stage(&mut self, command: &Command) -> Option<Bytes> {
		let mut pushed_out = None;
		loop {
			let begin = self.tail;
			match encode_command(&mut self.buf, begin, command) {
				Ok(end) => {
					self.tail = end;
					let frame_size = end - begin;
					if frame_size > self.buffer_size {
						// grow aggressively on evidence
						self.buffer_size = frame_size;
					}
					return pushed_out;
				}
				Err(EncodeError::OutOfBounds) => {
					self.tail = begin;
					let free = self.buf.len() - begin;
					if let Some(chunk) = self.detach() {
						debug_assert!(pushed_out.is_none());
						pushed_out = Some(chunk);
					}
					self.buf = vec![0; self.buffer_size.max(free + free / 2 + 1)];
					self.tail = 0;
				}
			}
		}
	}

	/// Hand the staged bytes over for a transport write, if there are any,
	/// and start a fresh buffer at the current target capacity.
	pub fn take(&mut self) -> Option<Bytes> {
		let staged = self.detach();
		if self.buf.len() != self.buffer_size {
			self.buf = vec![0; self.buffer_size];
		}
		staged
	}

	fn detach(&mut self) -> Option<Bytes> {
		if self.tail == 0 {
			return None;
		}
		let mut staged = std::mem::take(&mut self.buf);
		staged.truncate(self.tail);
		self.tail = 0;
		if self.buffer_size > self.initial_size {
			self.buffer_size =
				(self.buffer_size - (self.buffer_size >> 8)).max(self.initial_size);
		}
		Some(Bytes::from(staged))
	}

	pub fn has_staged(&self) -> bool {
		self.tail > 0
	}

	/// Current adaptive capacity target.
	pub fn buffer_size(&self) -> usize {
		self.buffer_size
	}

	/// Drop the buffer on session close.
	pub fn recycle(&mut self) {
		self.buf = Vec::new();
		self.tail = 0;
	}
}

#[cfg(test)]
mod tests {
	use resp::Verb;

	use super::*;

	fn canonical(command: &Command) -> Vec<u8> {
		let mut dst = vec![0u8; 4096];
		let end = encode_command(&mut dst, 0, command).unwrap();
		dst.truncate(end);
		dst
	}

	/// GET with a key sized so the whole frame is exactly `frame_len` bytes.
	fn get_of_frame_len(frame_len: usize) -> Command {
		// *2\r\n $3\r\nGET\r\n $<len>\r\n<key>\r\n
		let mut key_len = frame_len.saturating_sub(22);
		loop {
			let total = 13 + 1 + key_len.to_string().len() + 2 + key_len + 2;
			if total == frame_len {
				break;
			}
			key_len = if total > frame_len { key_len - 1 } else { key_len + 1 };
		}
		let key = "k".repeat(key_len);
		let cmd = Command::with_text_args(Verb::Get, [key.as_str()]);
		assert_eq!(canonical(&cmd).len(), frame_len);
		cmd
	}

	#[test]
	fn test_stage_and_take() {
		let mut buffer = SendBuffer::new(64);
		let cmd = Command::with_text_args(Verb::Get, ["foo"]);

		assert_eq!(buffer.stage(&cmd), None);
		assert!(buffer.has_staged());

		let staged = buffer.take().unwrap();
		assert_eq!(&staged[..], &canonical(&cmd)[..]);
		assert!(!buffer.has_staged());
		assert_eq!(buffer.take(), None);
	}

	#[test]
	fn test_take_coalesces_multiple_commands() {
		let mut buffer = SendBuffer::new(256);
		let ping = Command::new(Verb::Ping);
		let get = Command::with_text_args(Verb::Get, ["k"]);

		assert_eq!(buffer.stage(&ping), None);
		assert_eq!(buffer.stage(&get), None);

		let mut expected = canonical(&ping);
		expected.extend_from_slice(&canonical(&get));
		assert_eq!(&buffer.take().unwrap()[..], &expected[..]);
	}

	#[test]
	fn test_underestimate_grows_until_fit() {
		// An empty 8-byte buffer and a 64-byte frame: no flush is visible
		// (there was nothing staged) and the retry loop must end with the
		// canonical encoding staged whole.
		let mut buffer = SendBuffer::new(8);
		let cmd = get_of_frame_len(64);

		assert_eq!(buffer.stage(&cmd), None);
		assert_eq!(buffer.buffer_size(), 64);
		assert_eq!(&buffer.take().unwrap()[..], &canonical(&cmd)[..]);
	}

	#[test]
	fn test_underestimate_pushes_staged_bytes_out_once() {
		let mut buffer = SendBuffer::new(16);
		let ping = Command::new(Verb::Ping);
		let big = get_of_frame_len(64);

		assert_eq!(buffer.stage(&ping), None);
		// The retry hands back exactly the pre-append state
		let pushed = buffer.stage(&big).unwrap();
		assert_eq!(&pushed[..], &canonical(&ping)[..]);
		assert_eq!(&buffer.take().unwrap()[..], &canonical(&big)[..]);
	}

	#[test]
	fn test_buffer_size_grows_on_evidence() {
		let mut buffer = SendBuffer::new(8);
		let cmd = get_of_frame_len(50);

		buffer.stage(&cmd);
		assert!(buffer.buffer_size() >= 50);
	}

	#[test]
	fn test_buffer_size_decays_toward_initial() {
		let initial = 1024;
		let mut buffer = SendBuffer::new(initial);
		let big = get_of_frame_len(4000);

		buffer.stage(&big);
		assert_eq!(buffer.buffer_size(), 4000);

		let before = buffer.buffer_size();
		buffer.take().unwrap();
		let after = buffer.buffer_size();
		assert!(after <= before - before / 256);
		assert!(after >= initial);

		// Repeated empty flushes do not decay further
		assert_eq!(buffer.take(), None);
		assert_eq!(buffer.buffer_size(), after);
	}

	#[test]
	fn test_decay_floors_at_initial() {
		let mut buffer = SendBuffer::new(16);
		let cmd = get_of_frame_len(20);

		for _ in 0..1000 {
			buffer.stage(&cmd);
			buffer.take().unwrap();
		}
		assert!(buffer.buffer_size() >= 16);
	}
}
