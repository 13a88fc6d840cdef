//! Authentication components.
//!
//! - `certificate_cache` - TTL cache of pod signing keys with single-flight loads
//! - `claims` - Wire claims of pod user tokens
//! - `jwt` - Bearer header and JWT validation
//! - `orchestrator` - Token pair flows and the public facade
//! - `pod_identity` - Cached pod identity checks

pub mod certificate_cache;
pub mod claims;
pub mod jwt;
pub mod orchestrator;
pub mod pod_identity;

pub use certificate_cache::CertificateCache;
pub use jwt::JwtValidator;
pub use pod_identity::PodIdentityVerifier;
