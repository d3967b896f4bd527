//! Auth-domain identifiers, scope lists, access tokens, and normalized users.

pub mod id;
pub mod scope;
pub mod token;
pub mod user;

pub use id::*;
pub use scope::*;
pub use token::*;
pub use user::*;
