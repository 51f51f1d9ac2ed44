//! An ordered queue of immutable byte chunks.

use std::collections::VecDeque;

use bytes::Bytes;
use bytes::BytesMut;

/// FIFO of transport chunks with byte-granular consumption.
///
/// Chunks enter whole as the transport produces them and leave in front-to-
/// back order, split wherever the consumer needs. All operations are
/// amortised O(1) per byte moved; taking bytes that fall inside the front
/// chunk is zero-copy.
#[derive(Debug, Default)]
pub struct ByteQueue {
	chunks: VecDeque<Bytes>,
	remaining: usize,
}

impl ByteQueue {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.remaining == 0
	}

	/// Total buffered bytes across all chunks.
	pub fn remaining_bytes(&self) -> usize {
		self.remaining
	}

	pub fn has_remaining_bytes(&self, n: usize) -> bool {
		self.remaining >= n
	}

	/// Append one chunk; empty chunks are dropped.
	pub fn add(&mut self, chunk: Bytes) {
		if chunk.is_empty() {
			return;
		}
		self.remaining += chunk.len();
		self.chunks.push_back(chunk);
	}

	/// Remove and return the first byte.
	///
	/// # Panics
	///
	/// Panics if the queue is empty.
	pub fn take_byte(&mut self) -> u8 {
		let front = self.chunks.front_mut().expect("take_byte on empty queue");
		let byte = front[0];
		if front.len() == 1 {
			self.chunks.pop_front();
		} else {
			let _ = front.split_to(1);
		}
		self.remaining -= 1;
		byte
	}

	/// Remove exactly `n` bytes as one contiguous chunk.
	///
	/// Zero-copy when the front chunk already holds `n` bytes or more.
	///
	/// # Panics
	///
	/// Panics if fewer than `n` bytes are buffered.
	pub fn take_exact(&mut self, n: usize) -> Bytes {
		assert!(self.remaining >= n, "take_exact past end of queue");
		if n == 0 {
			return Bytes::new();
		}

		let front = self.chunks.front_mut().expect("queue count out of sync");
		if front.len() >= n {
			let taken = front.split_to(n);
			if front.is_empty() {
				self.chunks.pop_front();
			}
			self.remaining -= n;
			return taken;
		}

		let mut assembled = BytesMut::with_capacity(n);
		let mut needed = n;
		while needed > 0 {
			let front = self.chunks.front_mut().expect("queue count out of sync");
			if front.len() <= needed {
				needed -= front.len();
				assembled.extend_from_slice(front);
				self.chunks.pop_front();
			} else {
				assembled.extend_from_slice(&front.split_to(needed));
				needed = 0;
			}
		}
		self.remaining -= n;
		assembled.freeze()
	}

	/// Remove and return the front chunk whole, if any.
	pub fn take_chunk(&mut self) -> Option<Bytes> {
		let chunk = self.chunks.pop_front()?;
		self.remaining -= chunk.len();
		Some(chunk)
	}

	/// Move up to `n` bytes into `dst`; returns how many were moved.
	pub fn drain_to(&mut self, dst: &mut BytesMut, n: usize) -> usize {
		let mut moved = 0;
		while moved < n {
			let Some(front) = self.chunks.front_mut() else {
				break;
			};
			let want = n - moved;
			if front.len() <= want {
				moved += front.len();
				dst.extend_from_slice(front);
				self.chunks.pop_front();
			} else {
				dst.extend_from_slice(&front.split_to(want));
				moved += want;
			}
		}
		self.remaining -= moved;
		moved
	}

	/// Discard exactly `n` bytes.
	///
	/// # Panics
	///
	/// Panics if fewer than `n` bytes are buffered.
	pub fn skip(&mut self, n: usize) {
		assert!(self.remaining >= n, "skip past end of queue");
		let mut left = n;
		while left > 0 {
			let front = self.chunks.front_mut().expect("queue count out of sync");
			if front.len() <= left {
				left -= front.len();
				self.chunks.pop_front();
			} else {
				let _ = front.split_to(left);
				left = 0;
			}
		}
		self.remaining -= n;
	}

	/// Drop all buffered chunks.
	pub fn recycle(&mut self) {
		self.chunks.clear();
		self.remaining = 0;
	}

	/// Iterate bytes in order across chunk boundaries, without consuming.
	pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
		self.chunks.iter().flat_map(|chunk| chunk.iter().copied())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_add_and_counts() {
		let mut queue = ByteQueue::new();
		assert!(queue.is_empty());

		queue.add(Bytes::from_static(b"abc"));
		queue.add(Bytes::new());
		queue.add(Bytes::from_static(b"de"));

		assert_eq!(queue.remaining_bytes(), 5);
		assert!(queue.has_remaining_bytes(5));
		assert!(!queue.has_remaining_bytes(6));
	}

	#[test]
	fn test_take_byte_across_chunks() {
		let mut queue = ByteQueue::new();
		queue.add(Bytes::from_static(b"a"));
		queue.add(Bytes::from_static(b"b"));

		assert_eq!(queue.take_byte(), b'a');
		assert_eq!(queue.take_byte(), b'b');
		assert!(queue.is_empty());
	}

	#[test]
	fn test_take_exact_zero_copy_and_assembled() {
		let mut queue = ByteQueue::new();
		queue.add(Bytes::from_static(b"hello "));
		queue.add(Bytes::from_static(b"world"));

		// Falls inside the front chunk
		assert_eq!(&queue.take_exact(5)[..], b"hello");
		// Spans the boundary
		assert_eq!(&queue.take_exact(6)[..], b" world");
		assert!(queue.is_empty());
	}

	#[test]
	fn test_drain_to_partial() {
		let mut queue = ByteQueue::new();
		queue.add(Bytes::from_static(b"abc"));

		let mut dst = BytesMut::new();
		assert_eq!(queue.drain_to(&mut dst, 10), 3);
		assert_eq!(&dst[..], b"abc");
		assert_eq!(queue.drain_to(&mut dst, 10), 0);
	}

	#[test]
	fn test_skip_and_iter() {
		let mut queue = ByteQueue::new();
		queue.add(Bytes::from_static(b"ab"));
		queue.add(Bytes::from_static(b"cd"));

		queue.skip(3);
		let rest: Vec<u8> = queue.iter().collect();
		assert_eq!(rest, b"d");
	}

	#[test]
	fn test_recycle() {
		let mut queue = ByteQueue::new();
		queue.add(Bytes::from_static(b"abc"));
		queue.recycle();
		assert!(queue.is_empty());
		assert_eq!(queue.remaining_bytes(), 0);
	}

	#[test]
	#[should_panic(expected = "take_exact past end")]
	fn test_take_exact_past_end_panics() {
		let mut queue = ByteQueue::new();
		queue.add(Bytes::from_static(b"ab"));
		let _ = queue.take_exact(3);
	}
}
