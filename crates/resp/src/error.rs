//! Error types for RESP decoding and encoding.

use thiserror::Error;

/// Errors raised by the streaming response decoder.
///
/// Both variants are protocol violations and terminal for the connection
/// they occurred on; the decoder's state is unspecified afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
	/// The input is not valid RESP v2 (unknown marker, non-numeric integer
	/// or length line, over-long line, missing CR LF after a bulk body).
	#[error("malformed data: {0}")]
	Malformed(String),

	/// A length field below `-1` or above the 512 MiB payload bound.
	#[error("unsupported length: {0}")]
	InvalidSize(i64),
}

/// Errors raised by the command encoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
	/// The destination slice is too small for the full frame. The caller
	/// must discard anything written past its offset and retry with a
	/// larger buffer.
	#[error("destination buffer too small for encoded command")]
	OutOfBounds,
}
