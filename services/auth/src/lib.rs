//! Credential handling for the Clipshare services
//!
//! Session tokens, password generation and hashing, the bearer-token
//! middleware guarding protected routes, and delivery of account emails.

pub mod jwt;
pub mod middleware;
pub mod notifier;
pub mod password;

pub use jwt::{AuthUser, JwtConfig, JwtService};
pub use notifier::{MailConfig, MandrillNotifier, Notifier};
