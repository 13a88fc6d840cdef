//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for session tokens, app tokens and
//! symphony tokens. `SecretString` implements `Debug` with redaction, so any
//! struct deriving `Debug` that holds one is safe to log.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct Session {
//!     config_id: String,
//!     session_token: SecretString,
//! }
//!
//! let session = Session {
//!     config_id: "jira".to_string(),
//!     session_token: SecretString::from("session-token-value"),
//! };
//!
//! assert!(!format!("{session:?}").contains("session-token-value"));
//! assert_eq!(session.session_token.expose_secret(), "session-token-value");
//! ```
//!
//! # Usage Guidelines
//!
//! Use `SecretString` for:
//! - Pod session tokens
//! - Generated app tokens before they are handed to the caller
//! - Anything placed in a `sessionToken` header
//!
//! Values are zeroized on drop. Call `expose_secret()` only at the point the
//! raw value must leave the process (an HTTP header, a comparison).

pub use secrecy::{ExposeSecret, SecretString};
