// self
use crate::{_prelude::*, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// Span wrapper used by every portal and broker operation.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the operation and the endpoint stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("hqu_academic.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a portal authentication rejection that triggers a forced refresh.
pub fn log_auth_rejected(kind: OperationKind, status: u16, retried: bool) {
	#[cfg(feature = "tracing")]
	{
		if retried {
			tracing::warn!(operation = kind.as_str(), status, "Portal rejected the refreshed credential.");
		} else {
			tracing::info!(operation = kind.as_str(), status, "Portal rejected the credential, forcing a refresh.");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, status, retried);
	}
}

/// Logs a successful broker mint.
pub fn log_credential_minted(serial: u64, ttl: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(serial, ttl_secs = ttl.whole_seconds(), "Minted a portal credential.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (serial, ttl);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OperationSpan::new(OperationKind::TeachingWeek, "instrument_wraps_future");
		let value = span.instrument(async { 15 }).await;

		assert_eq!(value, 15);
	}

	#[test]
	fn log_helpers_are_callable_without_subscriber() {
		log_auth_rejected(OperationKind::CourseList, 401, false);
		log_credential_minted(1, Duration::minutes(30));
	}
}
