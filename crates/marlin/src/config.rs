//! Session configuration.

use std::sync::OnceLock;

/// Initial send-buffer capacity when nothing overrides it.
pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 16 * 1024;

/// Environment variable overriding the process-wide initial buffer size.
pub const INITIAL_BUFFER_SIZE_ENV: &str = "MARLIN_INITIAL_BUFFER_SIZE";

/// Per-session tunables.
///
/// `Default` picks up the process-wide initial buffer size (environment
/// override included); construct the struct directly to configure one
/// session differently.
#[derive(Debug, Clone)]
pub struct SessionConfig {
	/// Starting capacity of the send staging buffer. The buffer adapts
	/// upward on large commands and decays back toward this value.
	pub initial_buffer_size: usize,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			initial_buffer_size: process_default_buffer_size(),
		}
	}
}

fn process_default_buffer_size() -> usize {
	static SIZE: OnceLock<usize> = OnceLock::new();
	*SIZE.get_or_init(|| {
		std::env::var(INITIAL_BUFFER_SIZE_ENV)
			.ok()
			.and_then(|value| value.parse().ok())
			.filter(|&size| size > 0)
			.unwrap_or(DEFAULT_INITIAL_BUFFER_SIZE)
	})
}
