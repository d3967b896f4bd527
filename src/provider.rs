//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS (or loopback
//! HTTP) authorize, token, and user-info endpoints, the client authentication preference, and
//! provider quirks (scope delimiter, callback parameter names, state cookie, denial literal).
//! `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic hook that maps rejected
//! token responses into the crate's error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
