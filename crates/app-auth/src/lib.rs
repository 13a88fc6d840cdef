//! # App Authentication Core
//!
//! Application-to-platform authentication for integration applications.
//!
//! - Mints opaque app tokens and exchanges them with the pod for a token pair
//! - Confirms presented token pairs against the pod's session authority
//! - Verifies pod-signed RS512 user JWTs against cached application certificates
//! - Checks the pod identity a request claims to come from
//!
//! # Architecture
//!
//! ```text
//! AuthenticationOrchestrator
//!   ├── JwtValidator ──> CertificateCache ──> RemoteCertificateProvider
//!   ├── PodIdentityVerifier ──> RemotePodInfoProvider
//!   └── RemoteAuthHandshake / RemoteSessionValidator
//! ```
//!
//! All remote collaborators are traits in [`services`]; [`services::PodApiClient`]
//! implements them over HTTP and [`services::mock`] provides in-memory doubles.
//!
//! # Modules
//!
//! - `auth` - JWT validation, certificate cache, pod identity, orchestration
//! - `config` - Configuration from environment
//! - `crypto` - PEM key decoding and random token generation
//! - `errors` - Error taxonomy
//! - `models` - Token pair, claims payload and pod data models
//! - `observability` - Metrics
//! - `services` - Collaborator traits, HTTP client and mocks

pub mod auth;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod models;
pub mod observability;
pub mod services;

pub use auth::orchestrator::{AuthDependencies, AuthenticationOrchestrator};
pub use errors::AuthError;
