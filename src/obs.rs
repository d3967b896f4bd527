//! Optional observability helpers for driver stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `strava_oauth2.flow` with the `flow` (driver
//!   stage kind) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `strava_oauth2_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Driver stages observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Building the authorization redirect.
	Redirect,
	/// Trading the callback code for an access token.
	CodeExchange,
	/// Loading and mapping the user-info payload.
	UserInfo,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Redirect => "redirect",
			FlowKind::CodeExchange => "code_exchange",
			FlowKind::UserInfo => "user_info",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a driver stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Picks the terminal outcome for a stage result.
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(FlowKind::CodeExchange.to_string(), "code_exchange");
		assert_eq!(FlowKind::UserInfo.as_str(), "user_info");
		assert_eq!(FlowOutcome::of::<(), ()>(&Ok(())), FlowOutcome::Success);
		assert_eq!(FlowOutcome::of::<(), ()>(&Err(())), FlowOutcome::Failure);
	}
}
