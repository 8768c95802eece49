// src/services/mod.rs
//
// Services shared by the domain modules: outgoing mail, Google token
// verification and request throttling

pub mod email;
pub mod google;
pub mod rate_limit;

pub use email::{LogMailer, Mailer, SesMailer};
pub use rate_limit::RateLimitService;
