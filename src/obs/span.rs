// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::Operation};

/// A span builder used by credential operations.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		let span =
			tracing::info_span!("zoom_gateway.credential", operation = operation.as_str(), stage);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn wrap<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn wrap_instruments_future() {
		let span = FlowSpan::new(Operation::Acquire, "wrap_instruments_future");
		let value = span.wrap(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
