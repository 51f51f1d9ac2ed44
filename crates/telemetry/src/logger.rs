use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Time formatter printing "[YYYY-MM-DD HH:MM:SS.micros]"
struct MicrosTimeFormat;

impl FormatTime for MicrosTimeFormat {
	fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
		let now: chrono::DateTime<chrono::Local> = std::time::SystemTime::now().into();
		write!(w, "{}", now.format("[%Y-%m-%d %H:%M:%S%.6f]"))
	}
}

/// Initialize console logging at the given level filter.
///
/// `level` is an `EnvFilter` directive string, so plain levels ("info",
/// "debug") and per-target filters ("marlin=trace") both work. Call once
/// per process, before any spans or events are emitted.
pub fn init(level: &str) {
	tracing_subscriber::registry()
		.with(EnvFilter::new(level))
		.with(
			fmt::layer()
				.with_timer(MicrosTimeFormat)
				.with_target(false)
				.with_line_number(false)
				.with_file(false),
		)
		.init();
}
