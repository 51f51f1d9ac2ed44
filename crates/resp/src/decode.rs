//! Streaming RESP v2 response decoder.
//!
//! The decoder is a resumable state machine over a [`ByteQueue`]: whenever
//! the queue runs dry mid-value it parks its progress (partial line, partial
//! bulk body, array-nesting stack) and picks up exactly where it left off on
//! the next call. Arrays are tracked with an explicit frame stack rather
//! than recursion, so a value may be suspended at any nesting depth.

use bytes::Bytes;
use bytes::BytesMut;

use crate::error::DecodeError;
use crate::queue::ByteQueue;
use crate::types::Response;
use crate::utils::ARRAY;
use crate::utils::BULK_STRING;
use crate::utils::CR;
use crate::utils::ERROR;
use crate::utils::INTEGER;
use crate::utils::INTEGER_MAX_LEN;
use crate::utils::LF;
use crate::utils::SIMPLE_STRING;
use crate::utils::STRING_MAX_LEN;

/// An array still being filled: how many elements are missing and the ones
/// collected so far.
#[derive(Debug)]
struct ArrayFrame {
	remaining: usize,
	elements: Vec<Response>,
}

/// One step of progress inside `try_decode`.
enum Step {
	/// A complete value (possibly an element of an enclosing array).
	Value(Response),
	/// An array header was consumed and a frame pushed; elements follow.
	FramePushed,
}

/// Resumable decoder for one connection's inbound byte stream.
///
/// All scratch state is owned here and reset whenever a top-level value is
/// returned. A decoder must not be fed from more than one stream.
#[derive(Debug, Default)]
pub struct ResponseDecoder {
	/// Type marker of the value currently being parsed.
	parsing: Option<u8>,
	/// Partial line or partial bulk body carried across calls.
	scratch: BytesMut,
	/// Bytes of the current bulk body still to be read.
	bulk_remaining: Option<usize>,
	/// Enclosing arrays, innermost last.
	frames: Vec<ArrayFrame>,
}

impl ResponseDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Whether the decoder sits between top-level values.
	///
	/// End-of-stream while idle is a clean close; end-of-stream while this
	/// is false means the peer cut a response short.
	pub fn is_idle(&self) -> bool {
		self.parsing.is_none()
			&& self.bulk_remaining.is_none()
			&& self.scratch.is_empty()
			&& self.frames.is_empty()
	}

	/// Consume as many bytes as form one complete top-level response.
	///
	/// Returns `Ok(None)` when the queue holds no complete value yet; call
	/// again once more bytes have been added. Errors are protocol
	/// violations and leave the decoder in an unspecified state.
	pub fn try_decode(&mut self, queue: &mut ByteQueue) -> Result<Option<Response>, DecodeError> {
		loop {
			let marker = match self.parsing {
				Some(marker) => marker,
				None => {
					if queue.is_empty() {
						return Ok(None);
					}
					let marker = queue.take_byte();
					self.parsing = Some(marker);
					marker
				}
			};

			let step = match marker {
				SIMPLE_STRING => self
					.decode_line(queue, STRING_MAX_LEN)?
					.map(|line| Step::Value(Response::SimpleString(into_text(line)))),
				ERROR => self
					.decode_line(queue, STRING_MAX_LEN)?
					.map(|line| Step::Value(Response::Error(into_text(line)))),
				INTEGER => match self.decode_line(queue, INTEGER_MAX_LEN)? {
					Some(line) => Some(Step::Value(Response::Integer(parse_integer(&line)?))),
					None => None,
				},
				BULK_STRING => self.decode_bulk(queue)?,
				ARRAY => self.decode_array_header(queue)?,
				other => {
					return Err(DecodeError::Malformed(format!(
						"unknown first byte '{}'",
						other as char
					)));
				}
			};

			match step {
				None => return Ok(None),
				Some(Step::FramePushed) => {
					self.parsing = None;
				}
				Some(Step::Value(value)) => {
					self.parsing = None;
					if let Some(top_level) = self.complete_value(value) {
						return Ok(Some(top_level));
					}
				}
			}
		}
	}

	/// Accumulate bytes until a CR LF pair; the returned line excludes it.
	///
	/// When no terminator is buffered yet, everything except the final byte
	/// is moved into scratch so the queue stays compact under small-chunk
	/// input, while a CR LF split across two chunks is still seen whole.
	fn decode_line(
		&mut self,
		queue: &mut ByteQueue,
		max_len: usize,
	) -> Result<Option<Bytes>, DecodeError> {
		match find_crlf(queue) {
			Some(pos) => {
				if self.scratch.len() + pos > max_len {
					return Err(line_too_long(max_len));
				}
				let head = queue.take_exact(pos);
				queue.skip(2);
				if self.scratch.is_empty() {
					Ok(Some(head))
				} else {
					self.scratch.extend_from_slice(&head);
					Ok(Some(self.scratch.split().freeze()))
				}
			}
			None => {
				let available = queue.remaining_bytes();
				if available > 1 {
					let stashed = queue.take_exact(available - 1);
					self.scratch.extend_from_slice(&stashed);
				}
				if self.scratch.len() > max_len {
					return Err(line_too_long(max_len));
				}
				Ok(None)
			}
		}
	}

	/// Bulk string: a length line, `len` payload bytes, then CR LF.
	fn decode_bulk(&mut self, queue: &mut ByteQueue) -> Result<Option<Step>, DecodeError> {
		let mut remaining = match self.bulk_remaining {
			Some(remaining) => remaining,
			None => {
				let Some(line) = self.decode_line(queue, INTEGER_MAX_LEN)? else {
					return Ok(None);
				};
				let length = parse_length(&line)?;
				if length == -1 {
					return Ok(Some(Step::Value(Response::Nil)));
				}
				length as usize
			}
		};

		remaining -= queue.drain_to(&mut self.scratch, remaining);
		self.bulk_remaining = Some(remaining);

		if remaining > 0 || !queue.has_remaining_bytes(2) {
			return Ok(None);
		}
		if queue.take_byte() != CR || queue.take_byte() != LF {
			return Err(DecodeError::Malformed(
				"missing CR LF after bulk string".into(),
			));
		}
		self.bulk_remaining = None;
		let payload = self.scratch.split().freeze();
		Ok(Some(Step::Value(Response::Bulk(payload))))
	}

	/// Array header: `-1` is nil, `0` completes immediately, anything else
	/// opens a frame whose elements are decoded next.
	fn decode_array_header(&mut self, queue: &mut ByteQueue) -> Result<Option<Step>, DecodeError> {
		let Some(line) = self.decode_line(queue, INTEGER_MAX_LEN)? else {
			return Ok(None);
		};
		let length = parse_length(&line)?;
		if length == -1 {
			return Ok(Some(Step::Value(Response::Nil)));
		}
		if length == 0 {
			return Ok(Some(Step::Value(Response::Array(Vec::new()))));
		}
		// Deliberately not sized up front: the declared length is attacker
		// controlled and elements have not arrived yet.
		self.frames.push(ArrayFrame {
			remaining: length as usize,
			elements: Vec::new(),
		});
		Ok(Some(Step::FramePushed))
	}

	/// Feed a finished value to the innermost open array, popping every
	/// frame it completes. Returns the top-level response once the stack
	/// empties.
	fn complete_value(&mut self, value: Response) -> Option<Response> {
		let mut value = value;
		loop {
			let Some(frame) = self.frames.last_mut() else {
				return Some(value);
			};
			frame.elements.push(value);
			frame.remaining -= 1;
			if frame.remaining > 0 {
				return None;
			}
			let frame = self.frames.pop().expect("frame stack out of sync");
			value = Response::Array(frame.elements);
		}
	}
}

/// Find the offset of the first CR immediately followed by LF.
///
/// A CR with anything else after it is skipped, so stray CRs end up inside
/// line payloads rather than terminating them.
fn find_crlf(queue: &ByteQueue) -> Option<usize> {
	let mut previous_was_cr = false;
	for (index, byte) in queue.iter().enumerate() {
		if previous_was_cr && byte == LF {
			return Some(index - 1);
		}
		previous_was_cr = byte == CR;
	}
	None
}

fn into_text(line: Bytes) -> String {
	String::from_utf8_lossy(&line).into_owned()
}

fn parse_integer(line: &[u8]) -> Result<i64, DecodeError> {
	std::str::from_utf8(line)
		.ok()
		.and_then(|text| text.parse::<i64>().ok())
		.ok_or_else(|| {
			DecodeError::Malformed(format!(
				"malformed integer '{}'",
				String::from_utf8_lossy(line)
			))
		})
}

/// Bulk-string and array length fields: `-1` is the nil sentinel, anything
/// below it or above the payload bound is rejected.
fn parse_length(line: &[u8]) -> Result<i64, DecodeError> {
	let length = std::str::from_utf8(line)
		.ok()
		.and_then(|text| text.parse::<i64>().ok())
		.ok_or_else(|| {
			DecodeError::Malformed(format!(
				"malformed length '{}'",
				String::from_utf8_lossy(line)
			))
		})?;
	if length < -1 || length > STRING_MAX_LEN as i64 {
		return Err(DecodeError::InvalidSize(length));
	}
	Ok(length)
}

fn line_too_long(max_len: usize) -> DecodeError {
	DecodeError::Malformed(format!("line exceeds {} bytes", max_len))
}

/// One-shot decode of a self-contained frame.
///
/// Fails with `Malformed` when `frame` holds less than one complete value;
/// trailing bytes are ignored.
pub fn decode_complete(frame: &[u8]) -> Result<Response, DecodeError> {
	let mut queue = ByteQueue::new();
	queue.add(Bytes::copy_from_slice(frame));
	let mut decoder = ResponseDecoder::new();
	decoder
		.try_decode(&mut queue)?
		.ok_or_else(|| DecodeError::Malformed("incomplete frame".into()))
}
