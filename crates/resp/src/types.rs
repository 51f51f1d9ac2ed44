//! The RESP v2 response value union.

use bytes::Bytes;

/// A single decoded server response.
///
/// Server errors (`-` replies) are values, not failures: whether an
/// [`Response::Error`] aborts anything is the caller's choice. `Nil` covers
/// both wire encodings of absence (`$-1\r\n` and `*-1\r\n`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
	/// Simple string: `+OK\r\n`
	SimpleString(String),

	/// Server error: `-ERR message\r\n`
	Error(String),

	/// Integer: `:1000\r\n`
	Integer(i64),

	/// Bulk string: `$6\r\nfoobar\r\n`, binary safe
	Bulk(Bytes),

	/// Null bulk string or null array
	Nil,

	/// Array: `*2\r\n...`, elements may recurse to any depth
	Array(Vec<Response>),
}

impl Response {
	/// Check if the value is a server error
	pub fn is_error(&self) -> bool {
		matches!(self, Response::Error(_))
	}

	/// Check if the value is nil
	pub fn is_nil(&self) -> bool {
		matches!(self, Response::Nil)
	}

	/// Try to view the value as text
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Response::SimpleString(s) | Response::Error(s) => Some(s),
			Response::Bulk(b) => std::str::from_utf8(b).ok(),
			_ => None,
		}
	}

	/// Try to view the value as raw bytes
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Response::SimpleString(s) | Response::Error(s) => Some(s.as_bytes()),
			Response::Bulk(b) => Some(b),
			_ => None,
		}
	}

	/// Try to convert to an integer
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			Response::Integer(i) => Some(*i),
			_ => None,
		}
	}

	/// Try to view the value as an array
	pub fn as_array(&self) -> Option<&[Response]> {
		match self {
			Response::Array(a) => Some(a),
			_ => None,
		}
	}

	/// Try to consume the value into its elements
	pub fn into_vec(self) -> Option<Vec<Response>> {
		match self {
			Response::Array(a) => Some(a),
			_ => None,
		}
	}

	/// Try to consume the value into its bulk payload
	pub fn into_bytes(self) -> Option<Bytes> {
		match self {
			Response::Bulk(b) => Some(b),
			_ => None,
		}
	}

	// Convenience constructors

	/// Create a simple string value
	pub fn simple_string(s: impl Into<String>) -> Self {
		Response::SimpleString(s.into())
	}

	/// Create a server error value
	pub fn error(message: impl Into<String>) -> Self {
		Response::Error(message.into())
	}

	/// Create an integer value
	pub fn integer(i: i64) -> Self {
		Response::Integer(i)
	}

	/// Create a bulk string value
	pub fn bulk(b: impl Into<Bytes>) -> Self {
		Response::Bulk(b.into())
	}

	/// Create an array value from an iterator
	pub fn array(items: impl IntoIterator<Item = Response>) -> Self {
		Response::Array(items.into_iter().collect())
	}

	/// Create a nil value
	pub fn nil() -> Self {
		Response::Nil
	}
}

impl From<i64> for Response {
	fn from(i: i64) -> Self {
		Response::Integer(i)
	}
}

impl From<&str> for Response {
	fn from(s: &str) -> Self {
		Response::Bulk(Bytes::copy_from_slice(s.as_bytes()))
	}
}

impl From<Bytes> for Response {
	fn from(b: Bytes) -> Self {
		Response::Bulk(b)
	}
}

impl<T: Into<Response>> From<Vec<T>> for Response {
	fn from(v: Vec<T>) -> Self {
		Response::Array(v.into_iter().map(|x| x.into()).collect())
	}
}

impl<T: Into<Response>> From<Option<T>> for Response {
	fn from(o: Option<T>) -> Self {
		match o {
			Some(v) => v.into(),
			None => Response::Nil,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_is_error() {
		assert!(Response::error("ERR boom").is_error());
		assert!(!Response::simple_string("OK").is_error());
	}

	#[test]
	fn test_as_str() {
		assert_eq!(Response::simple_string("OK").as_str(), Some("OK"));
		assert_eq!(Response::bulk(&b"hello"[..]).as_str(), Some("hello"));
		assert_eq!(Response::integer(42).as_str(), None);
	}

	#[test]
	fn test_nil_from_option() {
		let r: Response = Option::<i64>::None.into();
		assert!(r.is_nil());

		let r: Response = Some(7i64).into();
		assert_eq!(r.as_integer(), Some(7));
	}

	#[test]
	fn test_into_vec() {
		let arr = Response::array(vec![Response::integer(1), Response::Nil]);
		let items = arr.into_vec().unwrap();
		assert_eq!(items.len(), 2);
		assert!(items[1].is_nil());
	}
}
