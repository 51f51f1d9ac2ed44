//! Thin request/response façade over a [`Session`].
//!
//! One method per supported call, each a single send/receive pair. This is
//! where a server's `-` reply turns into an error for callers that asked a
//! question; the session itself treats it as data.

use bytes::Bytes;
use resp::Command;
use resp::Response;
use resp::Verb;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;

use crate::config::SessionConfig;
use crate::error::ClientError;
use crate::error::SessionError;
use crate::session::Session;

pub struct Client<S> {
	session: Session<S>,
}

impl Client<TcpStream> {
	/// Connect over TCP with the default session configuration.
	pub async fn connect(addr: &str) -> Result<Self, ClientError> {
		let stream = TcpStream::connect(addr)
			.await
			.map_err(|e| SessionError::Transport(e.to_string()))?;
		Ok(Self::new(Session::new(stream, SessionConfig::default())))
	}
}

impl<S: AsyncRead + AsyncWrite + 'static> Client<S> {
	pub fn new(session: Session<S>) -> Self {
		Self { session }
	}

	/// The underlying session, for raw commands or the binary escape
	/// hatches.
	pub fn session(&self) -> &Session<S> {
		&self.session
	}

	/// One command, one reply; server errors become `ClientError::Server`.
	pub async fn call(&self, command: Command) -> Result<Response, ClientError> {
		self.session.send(&command)?;
		match self.session.receive().await? {
			Response::Error(message) => Err(ClientError::Server(message)),
			response => Ok(response),
		}
	}

	pub async fn ping(&self) -> Result<String, ClientError> {
		match self.call(Command::new(Verb::Ping)).await? {
			Response::SimpleString(reply) => Ok(reply),
			other => Err(unexpected(other)),
		}
	}

	pub async fn echo(&self, message: &str) -> Result<Bytes, ClientError> {
		match self.call(Command::with_text_args(Verb::Echo, [message])).await? {
			Response::Bulk(payload) => Ok(payload),
			other => Err(unexpected(other)),
		}
	}

	pub async fn get(&self, key: &str) -> Result<Option<Bytes>, ClientError> {
		match self.call(Command::with_text_args(Verb::Get, [key])).await? {
			Response::Bulk(payload) => Ok(Some(payload)),
			Response::Nil => Ok(None),
			other => Err(unexpected(other)),
		}
	}

	pub async fn set(&self, key: &str, value: impl Into<Bytes>) -> Result<(), ClientError> {
		let command = Command::new(Verb::Set)
			.arg(Bytes::copy_from_slice(key.as_bytes()))
			.arg(value);
		match self.call(command).await? {
			Response::SimpleString(_) => Ok(()),
			other => Err(unexpected(other)),
		}
	}

	pub async fn del(&self, keys: &[&str]) -> Result<i64, ClientError> {
		let command = Command::with_text_args(Verb::Del, keys.iter().copied());
		match self.call(command).await? {
			Response::Integer(removed) => Ok(removed),
			other => Err(unexpected(other)),
		}
	}

	pub async fn client_getname(&self) -> Result<Option<String>, ClientError> {
		match self.call(Command::new(Verb::ClientGetname)).await? {
			Response::Bulk(name) => Ok(Some(String::from_utf8_lossy(&name).into_owned())),
			Response::Nil => Ok(None),
			other => Err(unexpected(other)),
		}
	}

	/// Say goodbye and half-close the write side.
	pub async fn quit(&self) -> Result<(), ClientError> {
		match self.call(Command::new(Verb::Quit)).await? {
			Response::SimpleString(_) => {}
			other => return Err(unexpected(other)),
		}
		self.session.send_end_of_stream().await?;
		Ok(())
	}
}

fn unexpected(response: Response) -> ClientError {
	ClientError::Unexpected(format!("{:?}", response))
}
