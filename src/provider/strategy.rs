//! Token-error classification hooks.
//!
//! The code exchange hands every rejected token response to a [`ProviderStrategy`], letting a
//! provider read its own error payloads before the RFC 6749 rules apply.

// self
use crate::_prelude::*;

const BODY_PREVIEW_LIMIT: usize = 256;

/// Classifies rejected token responses for one provider.
pub trait ProviderStrategy: Send + Sync {
	/// Picks the error category for a failed code exchange.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Categories a rejected code exchange can fall into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization grant (bad or reused code).
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes exceed what the token covers.
	InsufficientScope,
	/// Failure is temporary.
	Transient,
}

/// What the exchange learned about a rejected token response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// HTTP status of the token response.
	pub http_status: Option<u16>,
	/// RFC 6749 `error` code, when the body was a standard error document.
	pub oauth_error: Option<String>,
	/// RFC 6749 `error_description`.
	pub error_description: Option<String>,
	/// Truncated body of a non-standard error response.
	pub body_preview: Option<String>,
}
impl ProviderErrorContext {
	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records the HTTP status.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Records the RFC 6749 `error` code.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Records the RFC 6749 `error_description`.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Records the response body, cut to a short preview.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Classifies by RFC 6749 error code, then by HTTP status.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		classify_default(ctx)
	}
}

/// Rules behind [`DefaultProviderStrategy`], for provider strategies to fall back on.
///
/// Unknown codes and statuses are treated as transient.
pub fn classify_default(ctx: &ProviderErrorContext) -> ProviderErrorKind {
	ctx.oauth_error
		.as_deref()
		.and_then(classify_oauth_error)
		.unwrap_or_else(|| classify_status(ctx.http_status))
}

pub(crate) fn truncate_preview(body: String) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

fn classify_oauth_error(code: &str) -> Option<ProviderErrorKind> {
	let kind = match code {
		"invalid_grant" | "access_denied" => ProviderErrorKind::InvalidGrant,
		"invalid_client" | "unauthorized_client" => ProviderErrorKind::InvalidClient,
		"invalid_scope" | "insufficient_scope" => ProviderErrorKind::InsufficientScope,
		"temporarily_unavailable" | "server_error" => ProviderErrorKind::Transient,
		_ => return None,
	};

	Some(kind)
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		_ => ProviderErrorKind::Transient,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn preview_truncates_long_bodies() {
		let ctx = ProviderErrorContext::new().with_body_preview("x".repeat(BODY_PREVIEW_LIMIT + 10));
		let preview = ctx.body_preview.expect("Preview should be recorded.");

		assert_eq!(preview.chars().count(), BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
	}

	#[test]
	fn oauth_codes_win_over_status() {
		let ctx = ProviderErrorContext::new().with_http_status(401).with_oauth_error("invalid_grant");

		assert_eq!(classify_default(&ctx), ProviderErrorKind::InvalidGrant);

		let unknown = ProviderErrorContext::new().with_http_status(403).with_oauth_error("weird");

		assert_eq!(classify_default(&unknown), ProviderErrorKind::InsufficientScope);
	}

	#[test]
	fn unknown_statuses_are_transient() {
		assert_eq!(classify_status(Some(502)), ProviderErrorKind::Transient);
		assert_eq!(classify_status(None), ProviderErrorKind::Transient);
		assert_eq!(classify_status(Some(404)), ProviderErrorKind::InvalidGrant);
	}
}
