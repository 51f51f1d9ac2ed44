//! The duplex session: one transport, one codec, pipelining-safe.
//!
//! All state lives behind an `Rc<RefCell<_>>` shared with two helper tasks:
//! a writer task that owns the write half and performs writes in channel
//! order, and an at-most-one prefetch task that reads ahead while the caller
//! digests the previous response. Everything runs on one thread; borrows are
//! short and never held across an await. Deferred flushes ride on
//! `spawn_local`, which queues the callback behind already-scheduled work,
//! so every `send` within one scheduler turn lands in a single write.

use std::cell::RefCell;
use std::rc::Rc;
use std::rc::Weak;

use bytes::Bytes;
use bytes::BytesMut;
use resp::ByteQueue;
use resp::Command;
use resp::Response;
use resp::ResponseDecoder;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::ReadHalf;
use tokio::io::WriteHalf;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::trace;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::send_buffer::SendBuffer;

const READ_CHUNK_CAPACITY: usize = 8 * 1024;

enum WriteOp {
	Chunk(Bytes),
	Shutdown(oneshot::Sender<std::io::Result<()>>),
}

/// A duplex RESP session over one byte stream.
///
/// Must be created inside a [`tokio::task::LocalSet`]; the session is
/// deliberately `!Send`. Cloning yields another handle onto the same
/// connection, which is how one task sends while another receives.
pub struct Session<S> {
	inner: Rc<RefCell<Inner<S>>>,
}

impl<S> Clone for Session<S> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

struct Inner<S> {
	/// Absent while a read is in flight (the reading task owns it) or
	/// after close.
	read_half: Option<ReadHalf<S>>,
	/// Feed to the writer task; dropped on close to end it.
	write_tx: Option<mpsc::UnboundedSender<WriteOp>>,
	queue: ByteQueue,
	decoder: ResponseDecoder,
	staging: SendBuffer,
	prefetch: Option<JoinHandle<()>>,
	read_done: bool,
	write_done: bool,
	flush_posted: bool,
	closed: Option<SessionError>,
}

impl<S: AsyncRead + AsyncWrite + 'static> Session<S> {
	/// Bind `stream` and immediately prefetch the first read.
	pub fn new(stream: S, config: SessionConfig) -> Self {
		let (read_half, write_half) = tokio::io::split(stream);
		let (write_tx, write_rx) = mpsc::unbounded_channel();
		let inner = Rc::new(RefCell::new(Inner {
			read_half: Some(read_half),
			write_tx: Some(write_tx),
			queue: ByteQueue::new(),
			decoder: ResponseDecoder::new(),
			staging: SendBuffer::new(config.initial_buffer_size),
			prefetch: None,
			read_done: false,
			write_done: false,
			flush_posted: false,
			closed: None,
		}));
		tokio::task::spawn_local(write_loop(write_half, write_rx, Rc::downgrade(&inner)));

		let session = Session { inner };
		session.prefetch();
		session
	}

	/// Return the next complete response, reading as needed.
	///
	/// Responses come back in the order the peer issued them, which for a
	/// well-behaved server mirrors command submission order, so pipelining
	/// is safe. End-of-stream here, with a response outstanding, is a
	/// [`SessionError::Truncated`] failure.
	pub async fn receive(&self) -> Result<Response, SessionError> {
		loop {
			// A prefetch in flight owns the read half; let it settle so
			// its bytes (or its EOF flag) are visible before deciding.
			let pending = self.inner.borrow_mut().prefetch.take();
			if let Some(pending) = pending {
				let _ = pending.await;
			}

			{
				let mut session = self.inner.borrow_mut();
				if let Some(error) = &session.closed {
					return Err(error.clone());
				}
				let Inner { decoder, queue, .. } = &mut *session;
				match decoder.try_decode(queue) {
					Ok(Some(response)) => {
						drop(session);
						self.prefetch();
						return Ok(response);
					}
					Ok(None) => {}
					Err(e) => {
						drop(session);
						let error = SessionError::from(e);
						close_with(&self.inner, error.clone());
						return Err(error);
					}
				}
				if session.read_done {
					drop(session);
					close_with(&self.inner, SessionError::Truncated);
					return Err(SessionError::Truncated);
				}
			}

			let read_half = self.inner.borrow_mut().read_half.take();
			let Some(mut read_half) = read_half else {
				return Err(self.close_cause());
			};
			let result = read_chunk(&mut read_half).await;

			let mut session = self.inner.borrow_mut();
			if let Some(error) = &session.closed {
				return Err(error.clone());
			}
			session.read_half = Some(read_half);
			match result {
				Ok(Some(chunk)) => {
					trace!(len = chunk.len(), "received chunk");
					session.queue.add(chunk);
				}
				Ok(None) => {
					drop(session);
					close_with(&self.inner, SessionError::Truncated);
					return Err(SessionError::Truncated);
				}
				Err(e) => {
					drop(session);
					let error = SessionError::Transport(e.to_string());
					close_with(&self.inner, error.clone());
					return Err(error);
				}
			}
		}
	}

	/// Stage one command and schedule a deferred flush.
	///
	/// Returns as soon as the command is staged; everything staged within
	/// the current scheduler turn goes out in one transport write. Write
	/// failures surface through the shared close path, not here.
	pub fn send(&self, command: &Command) -> Result<(), SessionError> {
		let mut session = self.inner.borrow_mut();
		if let Some(error) = &session.closed {
			return Err(error.clone());
		}
		let Inner {
			staging, write_tx, ..
		} = &mut *session;
		if let Some(pushed_out) = staging.stage(command) {
			// an under-estimated buffer went out mid-append
			if let Some(write_tx) = write_tx.as_ref() {
				let _ = write_tx.send(WriteOp::Chunk(pushed_out));
			}
		}
		if !session.flush_posted {
			session.flush_posted = true;
			drop(session);
			let inner = Rc::clone(&self.inner);
			tokio::task::spawn_local(async move {
				let mut session = inner.borrow_mut();
				session.flush_posted = false;
				if session.closed.is_some() {
					return;
				}
				let Inner {
					staging, write_tx, ..
				} = &mut *session;
				if let Some(chunk) = staging.take() {
					trace!(len = chunk.len(), "flushing staged commands");
					if let Some(write_tx) = write_tx.as_ref() {
						let _ = write_tx.send(WriteOp::Chunk(chunk));
					}
				}
			});
		}
		Ok(())
	}

	/// Flush anything staged and half-close the write side.
	pub async fn send_end_of_stream(&self) -> Result<(), SessionError> {
		half_close(&self.inner).await
	}

	/// Escape hatch: tunnel raw bytes out over this session's transport.
	///
	/// Commands staged so far are flushed first so the raw stream starts
	/// after them on the wire.
	pub fn binary_stream_writer(&self) -> Result<BinaryStreamWriter<S>, SessionError> {
		let mut session = self.inner.borrow_mut();
		if let Some(error) = &session.closed {
			return Err(error.clone());
		}
		let Inner {
			staging, write_tx, ..
		} = &mut *session;
		if let Some(chunk) = staging.take() {
			if let Some(write_tx) = write_tx.as_ref() {
				let _ = write_tx.send(WriteOp::Chunk(chunk));
			}
		}
		drop(session);
		Ok(BinaryStreamWriter {
			inner: Rc::clone(&self.inner),
		})
	}

	/// Escape hatch: consume the remaining inbound bytes raw.
	///
	/// Bytes already prefetched into the queue are delivered before the
	/// transport is read again. The decoder should be idle when switching
	/// over; anything it had half-consumed stays consumed.
	pub fn binary_stream_reader(&self) -> BinaryStreamReader<S> {
		BinaryStreamReader {
			inner: Rc::clone(&self.inner),
		}
	}

	/// Close immediately. Idempotent; outstanding and future operations
	/// fail with the close cause.
	pub fn close(&self) {
		close_with(&self.inner, SessionError::Closed);
	}

	pub fn is_closed(&self) -> bool {
		self.inner.borrow().closed.is_some()
	}

	/// Issue one background read when nothing is buffered, so the next
	/// response is already in flight while the caller works, and a peer
	/// half-close is noticed early.
	fn prefetch(&self) {
		{
			let session = self.inner.borrow();
			if session.closed.is_some()
				|| session.read_done
				|| !session.queue.is_empty()
				|| session.prefetch.is_some()
				|| session.read_half.is_none()
			{
				return;
			}
		}
		let inner = Rc::clone(&self.inner);
		let handle = tokio::task::spawn_local(async move {
			let read_half = inner.borrow_mut().read_half.take();
			let Some(mut read_half) = read_half else {
				return;
			};
			let result = read_chunk(&mut read_half).await;

			let mut session = inner.borrow_mut();
			session.prefetch = None;
			if session.closed.is_some() {
				return;
			}
			session.read_half = Some(read_half);
			drop(session);
			match result {
				Ok(Some(chunk)) => {
					trace!(len = chunk.len(), "prefetched chunk");
					inner.borrow_mut().queue.add(chunk);
				}
				Ok(None) => {
					inner.borrow_mut().read_done = true;
					close_if_done(&inner);
				}
				Err(e) => {
					close_with(&inner, SessionError::Transport(e.to_string()));
				}
			}
		});
		self.inner.borrow_mut().prefetch = Some(handle);
	}

	fn close_cause(&self) -> SessionError {
		self.inner
			.borrow()
			.closed
			.clone()
			.unwrap_or(SessionError::Closed)
	}
}

/// Outbound raw-byte stream; see [`Session::binary_stream_writer`].
pub struct BinaryStreamWriter<S> {
	inner: Rc<RefCell<Inner<S>>>,
}

impl<S: AsyncRead + AsyncWrite + 'static> BinaryStreamWriter<S> {
	/// Queue one raw chunk, in order with everything queued before it.
	pub fn send(&self, chunk: Bytes) -> Result<(), SessionError> {
		let session = self.inner.borrow();
		if let Some(error) = &session.closed {
			return Err(error.clone());
		}
		let Some(write_tx) = session.write_tx.as_ref() else {
			return Err(SessionError::Closed);
		};
		let _ = write_tx.send(WriteOp::Chunk(chunk));
		Ok(())
	}

	/// End the stream: half-close the write side once everything queued
	/// has gone out.
	pub async fn finish(self) -> Result<(), SessionError> {
		half_close(&self.inner).await
	}
}

/// Inbound raw-byte stream; see [`Session::binary_stream_reader`].
pub struct BinaryStreamReader<S> {
	inner: Rc<RefCell<Inner<S>>>,
}

impl<S: AsyncRead + AsyncWrite + 'static> BinaryStreamReader<S> {
	/// Next chunk of raw bytes, or `None` at a clean end of stream.
	pub async fn next(&mut self) -> Result<Option<Bytes>, SessionError> {
		let pending = self.inner.borrow_mut().prefetch.take();
		if let Some(pending) = pending {
			let _ = pending.await;
		}

		{
			let mut session = self.inner.borrow_mut();
			if let Some(error) = &session.closed {
				return Err(error.clone());
			}
			// residual prefetched bytes are delivered before reading again
			if let Some(chunk) = session.queue.take_chunk() {
				return Ok(Some(chunk));
			}
			if session.read_done {
				return Ok(None);
			}
		}

		let read_half = self.inner.borrow_mut().read_half.take();
		let Some(mut read_half) = read_half else {
			let closed = self.inner.borrow().closed.clone();
			return Err(closed.unwrap_or(SessionError::Closed));
		};
		let result = read_chunk(&mut read_half).await;

		let mut session = self.inner.borrow_mut();
		if let Some(error) = &session.closed {
			return Err(error.clone());
		}
		session.read_half = Some(read_half);
		match result {
			Ok(Some(chunk)) => Ok(Some(chunk)),
			Ok(None) => {
				session.read_done = true;
				drop(session);
				close_if_done(&self.inner);
				Ok(None)
			}
			Err(e) => {
				drop(session);
				let error = SessionError::Transport(e.to_string());
				close_with(&self.inner, error.clone());
				Err(error)
			}
		}
	}
}

async fn read_chunk<S: AsyncRead>(read_half: &mut ReadHalf<S>) -> std::io::Result<Option<Bytes>> {
	let mut chunk = BytesMut::with_capacity(READ_CHUNK_CAPACITY);
	let n = read_half.read_buf(&mut chunk).await?;
	Ok(if n == 0 { None } else { Some(chunk.freeze()) })
}

/// Flush staged bytes, then shut the write side down and wait for it.
async fn half_close<S>(inner: &Rc<RefCell<Inner<S>>>) -> Result<(), SessionError> {
	let ack_rx = {
		let mut session = inner.borrow_mut();
		if let Some(error) = &session.closed {
			return Err(error.clone());
		}
		let Inner {
			staging, write_tx, ..
		} = &mut *session;
		let Some(write_tx) = write_tx.as_ref() else {
			return Err(SessionError::Closed);
		};
		if let Some(chunk) = staging.take() {
			let _ = write_tx.send(WriteOp::Chunk(chunk));
		}
		let (ack_tx, ack_rx) = oneshot::channel();
		let _ = write_tx.send(WriteOp::Shutdown(ack_tx));
		ack_rx
	};

	match ack_rx.await {
		Ok(Ok(())) => {
			inner.borrow_mut().write_done = true;
			close_if_done(inner);
			Ok(())
		}
		Ok(Err(e)) => {
			let error = SessionError::Transport(e.to_string());
			close_with(inner, error.clone());
			Err(error)
		}
		// writer task is gone, which only happens through the close path
		Err(_) => {
			let closed = inner.borrow().closed.clone();
			Err(closed.unwrap_or(SessionError::Closed))
		}
	}
}

/// Writes happen here, strictly in channel order. On failure the session is
/// closed with the error and the task ends, dropping the write half.
async fn write_loop<S: AsyncWrite>(
	mut write_half: WriteHalf<S>,
	mut write_rx: mpsc::UnboundedReceiver<WriteOp>,
	inner: Weak<RefCell<Inner<S>>>,
) {
	while let Some(op) = write_rx.recv().await {
		match op {
			WriteOp::Chunk(chunk) => {
				if let Err(e) = write_half.write_all(&chunk).await {
					if let Some(inner) = inner.upgrade() {
						close_with(&inner, SessionError::Transport(e.to_string()));
					}
					return;
				}
			}
			WriteOp::Shutdown(ack) => {
				let result = write_half.shutdown().await;
				let failed = result.is_err();
				let _ = ack.send(result);
				if failed {
					return;
				}
			}
		}
	}
}

fn close_with<S>(inner: &Rc<RefCell<Inner<S>>>, error: SessionError) {
	let mut session = inner.borrow_mut();
	if session.closed.is_some() {
		return;
	}
	debug!(%error, "closing session");
	session.closed = Some(error);
	session.staging.recycle();
	session.queue.recycle();
	// ends the writer task, which drops the write half
	session.write_tx = None;
	session.read_half = None;
	if let Some(prefetch) = session.prefetch.take() {
		prefetch.abort();
	}
}

fn close_if_done<S>(inner: &Rc<RefCell<Inner<S>>>) {
	let done = {
		let session = inner.borrow();
		session.read_done && session.write_done
	};
	if done {
		close_with(inner, SessionError::Closed);
	}
}
