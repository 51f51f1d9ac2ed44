//! # RESP v2 wire codec
//!
//! The protocol layer of a Redis client: an outbound command encoder and a
//! resumable streaming decoder for server responses.
//!
//! The decoder consumes bytes from a [`ByteQueue`] of transport chunks and
//! yields one complete [`Response`] at a time. It keeps its own scratch state
//! between calls, so input may arrive fragmented at arbitrary byte
//! boundaries, including inside deeply nested arrays.
//!
//! ## Example
//!
//! ```rust
//! use resp::ByteQueue;
//! use resp::Response;
//! use resp::ResponseDecoder;
//!
//! let mut queue = ByteQueue::new();
//! let mut decoder = ResponseDecoder::new();
//!
//! queue.add(bytes::Bytes::from_static(b"+OK"));
//! assert_eq!(decoder.try_decode(&mut queue).unwrap(), None);
//!
//! queue.add(bytes::Bytes::from_static(b"\r\n"));
//! let response = decoder.try_decode(&mut queue).unwrap();
//! assert_eq!(response, Some(Response::SimpleString("OK".into())));
//! ```

mod command;
mod decode;
mod encode;
mod error;
mod queue;
mod types;
mod utils;

pub use command::Command;
pub use command::Verb;
pub use decode::ResponseDecoder;
pub use decode::decode_complete;
pub use encode::encode_command;
pub use error::DecodeError;
pub use error::EncodeError;
pub use queue::ByteQueue;
pub use types::Response;
