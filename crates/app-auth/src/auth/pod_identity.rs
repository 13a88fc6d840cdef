//! Pod identity verification.
//!
//! The pod's identity is fetched on first use and kept until [`reset`] is
//! called; it has no TTL. Two callers racing on an empty slot may both fetch,
//! and the first stored value wins.
//!
//! [`reset`]: PodIdentityVerifier::reset

use crate::errors::AuthError;
use crate::models::PodInfo;
use crate::observability::metrics::record_pod_identity_check;
use crate::services::{RemotePodInfoProvider, SessionAuthority};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

pub struct PodIdentityVerifier {
    session_authority: Arc<dyn SessionAuthority>,
    provider: Arc<dyn RemotePodInfoProvider>,
    pod_info: RwLock<Option<PodInfo>>,
}

impl PodIdentityVerifier {
    pub fn new(
        session_authority: Arc<dyn SessionAuthority>,
        provider: Arc<dyn RemotePodInfoProvider>,
    ) -> Self {
        Self {
            session_authority,
            provider,
            pod_info: RwLock::new(None),
        }
    }

    /// Check whether `expected_pod_id` names the pod this integration runs against.
    ///
    /// A missing or empty expectation is `false` and makes no remote call.
    ///
    /// # Errors
    ///
    /// Session and pod info failures propagate unchanged.
    #[instrument(skip_all, fields(config_id = %config_id))]
    pub async fn check_pod_info(
        &self,
        config_id: &str,
        expected_pod_id: Option<&str>,
    ) -> Result<bool, AuthError> {
        let Some(expected) = expected_pod_id.filter(|id| !id.is_empty()) else {
            record_pod_identity_check("skipped");
            return Ok(false);
        };

        let pod_info = match self.pod_info(config_id).await {
            Ok(pod_info) => pod_info,
            Err(e) => {
                record_pod_identity_check("error");
                return Err(e);
            }
        };

        let matches = pod_info.verify_pod_id(expected);
        if matches {
            record_pod_identity_check("match");
        } else {
            tracing::warn!(
                target: "auth.pod",
                config_id = %config_id,
                expected_pod_id = %expected,
                pod_id = %pod_info.pod_id,
                "Pod id mismatch"
            );
            record_pod_identity_check("mismatch");
        }

        Ok(matches)
    }

    /// Forget the cached pod identity; the next check fetches it again.
    pub async fn reset(&self) {
        *self.pod_info.write().await = None;
        tracing::debug!(target: "auth.pod", "Pod info reset");
    }

    /// Cached pod identity, fetching it on first use.
    async fn pod_info(&self, config_id: &str) -> Result<PodInfo, AuthError> {
        if let Some(pod_info) = self.pod_info.read().await.as_ref() {
            return Ok(pod_info.clone());
        }

        let session_token = self.session_authority.get_session_token(config_id)?;
        let fetched = self.provider.get_pod_info(&session_token).await.map_err(|e| {
            tracing::warn!(target: "auth.pod", config_id = %config_id, error = %e, "Failed to fetch pod info");
            e
        })?;

        tracing::info!(target: "auth.pod", pod_id = %fetched.pod_id, "Pod info cached");

        let mut slot = self.pod_info.write().await;
        Ok(slot.get_or_insert(fetched).clone())
    }
}
