//! # Identity Module
//!
//! Sign-in time account linking: turns a verified external identity
//! (Google account, credentials account) into the internal profile id that
//! becomes the session subject.

pub mod models;
pub mod resolver;
pub mod username;


pub use models::{ProviderIdentity, SignInAttempt};
pub use resolver::{IdentityError, IdentityResolver};
