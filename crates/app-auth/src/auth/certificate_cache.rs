//! Per-config-id cache of pod signing keys.
//!
//! Keys are fetched from the pod by application id, decoded once, and kept for
//! the registry's certificate cache duration.
//!
//! # Single flight
//!
//! At most one remote fetch runs per config id. The first caller to miss
//! becomes the leader and registers a watch channel in the pending table;
//! concurrent callers for the same key wait on that channel and share the
//! leader's result, failure included. The state mutex is never held across an
//! await. If a leader is cancelled its pending slot is released and waiters
//! retry, one of them taking over the load.
//!
//! Failures are never cached: the next call after a failed load fetches again.

use crate::crypto::decode_public_key_pem;
use crate::errors::AuthError;
use crate::observability::metrics::{record_certificate_cache, record_certificate_load};
use crate::services::{ApplicationRegistry, RemoteCertificateProvider};
use jsonwebtoken::DecodingKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::instrument;

type LoadOutcome = Result<Arc<DecodingKey>, AuthError>;

/// A decoded key and when it was stored.
struct CacheEntry {
    public_key: Arc<DecodingKey>,
    inserted_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    pending: HashMap<String, watch::Receiver<Option<LoadOutcome>>>,
}

enum Lookup<'a> {
    Hit(Arc<DecodingKey>),
    Wait(watch::Receiver<Option<LoadOutcome>>),
    Load(InFlightLoad<'a>),
}

/// Cache of RS512 verification keys keyed by config id.
pub struct CertificateCache {
    registry: Arc<dyn ApplicationRegistry>,
    provider: Arc<dyn RemoteCertificateProvider>,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl CertificateCache {
    /// Create an empty cache.
    ///
    /// The entry lifetime is read from the registry once, here.
    pub fn new(
        registry: Arc<dyn ApplicationRegistry>,
        provider: Arc<dyn RemoteCertificateProvider>,
    ) -> Self {
        let ttl = registry.get_public_certificate_cache_duration();
        Self {
            registry,
            provider,
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Get the verification key for a config id, loading it on a miss.
    ///
    /// # Errors
    ///
    /// `AuthError::CertificateLoad` wrapping the registry, fetch or decode
    /// failure. Every caller coalesced onto a failed load receives the same error.
    #[instrument(skip_all, fields(config_id = %config_id))]
    pub async fn get(&self, config_id: &str) -> Result<Arc<DecodingKey>, AuthError> {
        loop {
            match self.lookup(config_id) {
                Lookup::Hit(key) => {
                    record_certificate_cache("hit");
                    return Ok(key);
                }
                Lookup::Wait(mut rx) => {
                    record_certificate_cache("coalesced");
                    let outcome = match rx.wait_for(Option::is_some).await {
                        Ok(outcome) => outcome.clone(),
                        Err(_) => None,
                    };
                    match outcome {
                        Some(result) => return result,
                        None => {
                            tracing::debug!(
                                target: "auth.cert_cache",
                                config_id = %config_id,
                                "Certificate load abandoned by leader, retrying"
                            );
                        }
                    }
                }
                Lookup::Load(load) => {
                    record_certificate_cache("miss");
                    let start = std::time::Instant::now();
                    let result = self.load(config_id).await;
                    record_certificate_load(
                        if result.is_ok() { "success" } else { "error" },
                        start.elapsed(),
                    );
                    load.complete(&result);
                    return result;
                }
            }
        }
    }

    /// Drop the cached key for a config id.
    ///
    /// A load already in flight is unaffected and stores its result.
    pub fn invalidate(&self, config_id: &str) {
        if self.lock_state().entries.remove(config_id).is_some() {
            tracing::debug!(target: "auth.cert_cache", config_id = %config_id, "Certificate invalidated");
        }
    }

    /// Drop every cached key.
    pub fn clear(&self) {
        self.lock_state().entries.clear();
        tracing::debug!(target: "auth.cert_cache", "Certificate cache cleared");
    }

    /// Number of keys currently stored, expired or not.
    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, config_id: &str) -> Lookup<'_> {
        let mut state = self.lock_state();

        if let Some(entry) = state.entries.get(config_id) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Lookup::Hit(Arc::clone(&entry.public_key));
            }
            tracing::debug!(target: "auth.cert_cache", config_id = %config_id, "Cached certificate expired");
            state.entries.remove(config_id);
        }

        if let Some(rx) = state.pending.get(config_id) {
            return Lookup::Wait(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        state.pending.insert(config_id.to_string(), rx);
        Lookup::Load(InFlightLoad {
            cache: self,
            config_id: config_id.to_string(),
            tx,
            completed: false,
        })
    }

    /// Resolve the application, fetch its certificate and decode it.
    async fn load(&self, config_id: &str) -> LoadOutcome {
        let wrap = |e: AuthError| {
            tracing::warn!(
                target: "auth.cert_cache",
                config_id = %config_id,
                error = %e,
                "Failed to load public certificate"
            );
            AuthError::certificate_load(config_id, e)
        };

        let application_id = self.registry.get_application_id(config_id).map_err(wrap)?;

        tracing::debug!(
            target: "auth.cert_cache",
            config_id = %config_id,
            application_id = %application_id,
            "Fetching public certificate"
        );

        let certificate = self
            .provider
            .get_pod_public_certificate(&application_id)
            .await
            .map_err(wrap)?;
        let key = decode_public_key_pem(&certificate.certificate).map_err(wrap)?;

        tracing::info!(
            target: "auth.cert_cache",
            config_id = %config_id,
            application_id = %application_id,
            "Public certificate cached"
        );

        Ok(Arc::new(key))
    }
}

/// Leader's claim on a pending slot.
///
/// Dropping it without calling [`InFlightLoad::complete`] (the leader's future
/// was cancelled) releases the slot and closes the channel so waiters retry.
struct InFlightLoad<'a> {
    cache: &'a CertificateCache,
    config_id: String,
    tx: watch::Sender<Option<LoadOutcome>>,
    completed: bool,
}

impl InFlightLoad<'_> {
    fn complete(mut self, result: &LoadOutcome) {
        {
            let mut state = self.cache.lock_state();
            state.pending.remove(&self.config_id);
            if let Ok(key) = result {
                state.entries.insert(
                    self.config_id.clone(),
                    CacheEntry {
                        public_key: Arc::clone(key),
                        inserted_at: Instant::now(),
                    },
                );
            }
        }
        self.tx.send_replace(Some(result.clone()));
        self.completed = true;
    }
}

impl Drop for InFlightLoad<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.cache.lock_state().pending.remove(&self.config_id);
        }
    }
}
