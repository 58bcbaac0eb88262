use tracing_subscriber::fmt::format::FmtSpan;

/// Installs the global log subscriber. Must be called once, at the very
/// start of every binary.
pub fn init() {
	tracing_subscriber::fmt()
		.with_target(false)
		.with_span_events(FmtSpan::NONE)
		.init();
}

/// Times a block of code, logging the duration at debug level.
#[macro_export]
macro_rules! timed {
	($label:expr, $code:block) => {{
		use std::time::Instant;
		let start = Instant::now();
		let result = { $code }; // Execute the code block
		let duration = start.elapsed();
		tracing::debug!("📊 {}: {:?}", $label, duration);
		result
	}};
}
