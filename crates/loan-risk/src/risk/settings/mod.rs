//! Authoritative in-memory risk policy with remote-primary, local-fallback
//! persistence.
//!
//! Every update takes a ticket from a monotonic counter and records it as the
//! slot revision. A `load` whose ticket is older than the slot revision, or
//! that completes while a save is in flight, is discarded, so a slow fetch can
//! never revert a newer edit. The slot mutex is never held across an await.

mod cache;
mod policy;

pub use cache::{
    CacheError, FallbackStore, FileFallbackStore, MemoryFallbackStore, SETTINGS_CACHE_KEY,
};
pub use policy::{
    PolicyAdvisory, RiskPolicy, DEFAULT_MAXIMUM_DTI, DEFAULT_MINIMUM_FICO, DEFAULT_THRESHOLD,
    MAXIMUM_DTI_RANGE, MINIMUM_FICO_RANGE, THRESHOLD_RANGE,
};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::client::{ServiceError, ServiceKind, SettingsSource};
use super::validation::ValidationError;

/// Where the current policy came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyOrigin {
    Remote,
    Cache,
    Default,
    /// Edited locally and not yet confirmed by the settings service.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PolicySnapshot {
    pub policy: RiskPolicy,
    pub origin: PolicyOrigin,
}

/// Result of a save. The policy is current in memory whatever the warnings say.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveOutcome {
    pub policy: RiskPolicy,
    pub warnings: Vec<SaveWarning>,
}

impl SaveOutcome {
    pub fn is_synced(&self) -> bool {
        !self
            .warnings
            .iter()
            .any(|warning| matches!(warning, SaveWarning::RemoteNotSynced(_)))
    }
}

/// Non-fatal problem during a save.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SaveWarning {
    #[error("saved locally only: {0}")]
    RemoteNotSynced(ServiceError),
    #[error("local fallback cache not updated: {0}")]
    CacheWriteFailed(String),
}

impl Serialize for SaveWarning {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct PolicySlot {
    policy: RiskPolicy,
    origin: PolicyOrigin,
    revision: u64,
    latest_save: u64,
    saves_in_flight: usize,
}

/// Sole owner of the current [`RiskPolicy`]. Readers always get copies.
pub struct RiskSettingsStore<S: ?Sized, C: ?Sized> {
    source: Arc<S>,
    cache: Arc<C>,
    slot: Mutex<PolicySlot>,
    sequence: AtomicU64,
}

impl<S, C> RiskSettingsStore<S, C>
where
    S: SettingsSource + ?Sized,
    C: FallbackStore + ?Sized,
{
    /// Starts on the hard-coded defaults until [`load`](Self::load) runs.
    pub fn new(source: Arc<S>, cache: Arc<C>) -> Self {
        Self {
            source,
            cache,
            slot: Mutex::new(PolicySlot {
                policy: RiskPolicy::default(),
                origin: PolicyOrigin::Default,
                revision: 0,
                latest_save: 0,
                saves_in_flight: 0,
            }),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> RiskPolicy {
        self.slot().policy
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        let slot = self.slot();
        PolicySnapshot {
            policy: slot.policy,
            origin: slot.origin,
        }
    }

    /// Fetch the policy, degrading remote → cache → defaults. Never fails.
    ///
    /// Returns the policy that is current once the load settles, which is a
    /// newer edit when this load was overtaken.
    pub async fn load(&self) -> RiskPolicy {
        let ticket = self.next_ticket();

        let fetched = self.source.fetch_policy().await.and_then(|policy| {
            policy
                .validate()
                .map(|_| policy)
                .map_err(|err| ServiceError::MalformedResponse {
                    service: ServiceKind::Settings,
                    detail: err.to_string(),
                })
        });

        let (policy, origin) = match fetched {
            Ok(policy) => (policy, PolicyOrigin::Remote),
            Err(err) => {
                warn!(error = %err, "settings service unreachable, using local fallback");
                match self.read_cache() {
                    Some(policy) => (policy, PolicyOrigin::Cache),
                    None => {
                        warn!("no usable cached settings, using default risk policy");
                        (RiskPolicy::default(), PolicyOrigin::Default)
                    }
                }
            }
        };

        let mut slot = self.slot();
        if ticket <= slot.revision || slot.saves_in_flight > 0 {
            debug!(
                ticket,
                revision = slot.revision,
                saves_in_flight = slot.saves_in_flight,
                "discarding stale settings load"
            );
            return slot.policy;
        }

        slot.policy = policy;
        slot.origin = origin;
        slot.revision = ticket;
        if origin == PolicyOrigin::Remote {
            if let Err(err) = self.write_cache(&policy) {
                warn!(error = %err, "failed to refresh settings cache");
            }
        }
        info!(?origin, "risk policy loaded");
        policy
    }

    /// Validate, apply in memory and to the cache immediately, then persist
    /// remotely.
    ///
    /// A failed remote write is reported as a warning; the in-memory and
    /// cached value is kept. An abandoned save leaves both in place too.
    pub async fn save(&self, policy: RiskPolicy) -> Result<SaveOutcome, ValidationError> {
        policy.validate()?;

        let mut warnings = Vec::new();
        let ticket = {
            let mut slot = self.slot();
            let ticket = self.next_ticket();
            slot.policy = policy;
            slot.origin = PolicyOrigin::Local;
            slot.revision = ticket;
            slot.latest_save = ticket;
            slot.saves_in_flight += 1;
            if let Err(err) = self.write_cache(&policy) {
                warn!(error = %err, "failed to write settings cache");
                warnings.push(SaveWarning::CacheWriteFailed(err.to_string()));
            }
            ticket
        };
        let in_flight = InFlightSave { slot: &self.slot };

        let published = self.source.publish_policy(&policy).await.and_then(|accepted| {
            accepted
                .validate()
                .map(|_| accepted)
                .map_err(|err| ServiceError::MalformedResponse {
                    service: ServiceKind::Settings,
                    detail: err.to_string(),
                })
        });

        let mut slot = in_flight.finish();

        let persisted = match published {
            Ok(accepted) => {
                if slot.revision == ticket {
                    slot.policy = accepted;
                    slot.origin = PolicyOrigin::Remote;
                }
                // Only the latest save may overwrite the optimistic entry.
                if slot.latest_save == ticket && accepted != policy {
                    if let Err(err) = self.write_cache(&accepted) {
                        warn!(error = %err, "failed to write settings cache");
                        warnings.push(SaveWarning::CacheWriteFailed(err.to_string()));
                    }
                }
                accepted
            }
            Err(err) => {
                warn!(error = %err, "risk policy saved locally only");
                warnings.push(SaveWarning::RemoteNotSynced(err));
                policy
            }
        };

        Ok(SaveOutcome {
            policy: persisted,
            warnings,
        })
    }

    /// Restore the defaults in memory. Nothing is persisted until `save`.
    pub fn reset(&self) -> RiskPolicy {
        let mut slot = self.slot();
        slot.policy = RiskPolicy::default();
        slot.origin = PolicyOrigin::Default;
        slot.revision = self.next_ticket();
        slot.policy
    }

    fn next_ticket(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn slot(&self) -> MutexGuard<'_, PolicySlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_cache(&self) -> Option<RiskPolicy> {
        match self.cache.read(SETTINGS_CACHE_KEY) {
            Ok(Some(bytes)) => {
                let decoded = cache::decode_policy(&bytes);
                if decoded.is_none() {
                    warn!("cached settings entry is unreadable");
                }
                decoded
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "settings cache unavailable");
                None
            }
        }
    }

    /// Callers hold the slot lock so cache order matches commit order.
    fn write_cache(&self, policy: &RiskPolicy) -> Result<(), CacheError> {
        self.cache
            .write(SETTINGS_CACHE_KEY, &cache::encode_policy(policy, Utc::now()))
    }
}

/// Releases the in-flight marker even when the save future is dropped mid-await.
struct InFlightSave<'a> {
    slot: &'a Mutex<PolicySlot>,
}

impl<'a> InFlightSave<'a> {
    fn finish(self) -> MutexGuard<'a, PolicySlot> {
        let slot = self.slot;
        std::mem::forget(self);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        guard.saves_in_flight = guard.saves_in_flight.saturating_sub(1);
        guard
    }
}

impl Drop for InFlightSave<'_> {
    fn drop(&mut self) {
        let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        guard.saves_in_flight = guard.saves_in_flight.saturating_sub(1);
    }
}
