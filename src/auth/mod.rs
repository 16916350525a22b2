//! Bearer-token verification. Accounts and token issuing belong to the
//! account service; this module only resolves the caller's id.

pub mod jwt;

pub use jwt::{AuthUser, JwtKeys};
