// self
use crate::obs::{OperationKind, OperationOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_operation_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"hqu_academic_operation_total",
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_match_tool_names() {
		assert_eq!(OperationKind::RoomsTimetable.as_str(), "get_rooms_timetable");
		assert_eq!(OperationOutcome::AuthRetry.to_string(), "auth_retry");

		record_operation_outcome(OperationKind::MintCredential, OperationOutcome::Failure);
	}
}
