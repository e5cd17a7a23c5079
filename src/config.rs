use core::time::Duration;

/// Tuning knobs of an [`Engine`](`crate::Engine`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
	/// [`Engine::perform_work`](`crate::Engine::perform_work`) yields once less than this much time remains.
	pub yield_threshold: Duration,
	/// Maximum nesting of work nodes below a root.
	///
	/// Exceeding it aborts the render pass with [`EngineError::DepthLimit`](`crate::EngineError::DepthLimit`).
	pub depth_limit: usize,
}
impl Default for Config {
	fn default() -> Self {
		Self {
			yield_threshold: Duration::from_millis(1),
			depth_limit: 1024,
		}
	}
}
impl Config {
	#[must_use]
	pub fn with_yield_threshold(self, yield_threshold: Duration) -> Self {
		Self { yield_threshold, ..self }
	}

	#[must_use]
	pub fn with_depth_limit(self, depth_limit: usize) -> Self {
		Self { depth_limit, ..self }
	}
}
