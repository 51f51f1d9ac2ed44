//! Session and client error taxonomy.

use resp::DecodeError;
use thiserror::Error;

/// Terminal session failures.
///
/// Every variant closes the session; later operations replay the original
/// cause, which is why the type is `Clone`. A server's `-` reply is *not*
/// here: it reaches the caller as a [`resp::Response::Error`] value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
	/// The peer violated the wire protocol.
	#[error("protocol error: {0}")]
	Protocol(#[from] DecodeError),

	/// The stream ended while a response was expected or half-decoded.
	#[error("stream ended in the middle of a response")]
	Truncated,

	/// The transport reported a read or write failure.
	#[error("transport error: {0}")]
	Transport(String),

	/// The session was closed.
	#[error("session is closed")]
	Closed,
}

/// Errors surfaced by the convenience [`crate::Client`] façade.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
	#[error(transparent)]
	Session(#[from] SessionError),

	/// A well-formed server error reply, promoted to a failure by the
	/// façade. At the session layer it is ordinary data.
	#[error("server error: {0}")]
	Server(String),

	/// The server answered with a differently-typed value than the
	/// command contract promises.
	#[error("unexpected response: {0}")]
	Unexpected(String),
}
