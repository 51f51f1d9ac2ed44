//! # marlin
//!
//! The transport half of a Redis client: binds one duplex byte stream to the
//! RESP codec and exposes pipelining-safe `send`/`receive` plus raw-byte
//! escape hatches.
//!
//! A [`Session`] runs on a single-threaded cooperative model: create it
//! inside a [`tokio::task::LocalSet`] on a current-thread runtime. `send`
//! stages commands in an adaptive buffer and coalesces everything staged
//! within one scheduler turn into a single transport write; `receive`
//! decodes one response at a time and prefetches the next read so a
//! pipelined caller overlaps parsing with I/O.

mod client;
mod config;
mod error;
mod send_buffer;
mod session;

pub use client::Client;
pub use config::DEFAULT_INITIAL_BUFFER_SIZE;
pub use config::INITIAL_BUFFER_SIZE_ENV;
pub use config::SessionConfig;
pub use error::ClientError;
pub use error::SessionError;
pub use send_buffer::SendBuffer;
pub use session::BinaryStreamReader;
pub use session::BinaryStreamWriter;
pub use session::Session;
