use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tokio::sync::Notify;

use crate::risk::client::{ScoringService, ServiceError, ServiceKind, SettingsSource, StatsSource};
use crate::risk::domain::{
    ApplicantRecord, Decision, Grade, HomeOwnership, LoanPurpose, LoanTerm, PortfolioStats,
    ScoringRequest, ScoringResponse, VerificationStatus,
};
use crate::risk::settings::{
    MemoryFallbackStore, RiskPolicy, RiskSettingsStore, SETTINGS_CACHE_KEY,
};
use crate::risk::{dashboard_router, DashboardService};

pub(super) fn applicant() -> ApplicantRecord {
    ApplicantRecord {
        annual_income: 85_000.0,
        loan_amount: 12_000.0,
        fico_score: 720,
        debt_to_income: 12.5,
        interest_rate_apr: 10.5,
        grade: Grade::A,
        term: LoanTerm::ThirtySixMonths,
        purpose: LoanPurpose::CreditCard,
        home_ownership: HomeOwnership::Mortgage,
        verification_status: VerificationStatus::SourceVerified,
        revolving_utilization: 30.0,
        total_accounts: 25,
        open_accounts: 12,
        public_records: 0,
    }
}

pub(super) fn approval() -> ScoringResponse {
    ScoringResponse {
        probability_of_default: 0.12,
        decision: Decision::Approve,
        recommended_limit: 15_000.0,
        expected_profit: 412.46,
    }
}

pub(super) fn stats() -> PortfolioStats {
    PortfolioStats {
        total_volume: 12_400_000.0,
        total_transactions: 1_520,
        approval_rate: 0.958,
        default_rate: 0.042,
        avg_fico: 702,
        risk_alerts: 0.042,
        error: None,
    }
}

pub(super) fn strict_policy() -> RiskPolicy {
    RiskPolicy {
        default_probability_threshold: 0.10,
        minimum_fico: 680,
        maximum_dti: 30.0,
    }
}

pub(super) fn lenient_policy() -> RiskPolicy {
    RiskPolicy {
        default_probability_threshold: 0.25,
        minimum_fico: 580,
        maximum_dti: 55.0,
    }
}

pub(super) fn outage(service: ServiceKind) -> ServiceError {
    ServiceError::Unavailable {
        service,
        detail: "connection refused".to_string(),
    }
}

/// In-process engine. `remote == None` means the settings service is offline.
pub(super) struct FakeEngine {
    remote: Mutex<Option<RiskPolicy>>,
    scoring: Mutex<Result<ScoringResponse, ServiceError>>,
    stats: Mutex<Result<PortfolioStats, ServiceError>>,
    fetch_gate: Option<Arc<Notify>>,
    publish_gate: Option<Arc<Notify>>,
    submitted: Mutex<Vec<ScoringRequest>>,
    publishes: AtomicUsize,
}

impl FakeEngine {
    pub(super) fn online(policy: RiskPolicy) -> Self {
        Self {
            remote: Mutex::new(Some(policy)),
            scoring: Mutex::new(Ok(approval())),
            stats: Mutex::new(Ok(stats())),
            fetch_gate: None,
            publish_gate: None,
            submitted: Mutex::new(Vec::new()),
            publishes: AtomicUsize::new(0),
        }
    }

    pub(super) fn offline() -> Self {
        let engine = Self::online(RiskPolicy::default());
        *engine.remote.lock().expect("remote mutex poisoned") = None;
        engine
            .with_scoring(Err(outage(ServiceKind::Scoring)))
            .with_stats(Err(outage(ServiceKind::Stats)))
    }

    pub(super) fn with_scoring(self, result: Result<ScoringResponse, ServiceError>) -> Self {
        *self.scoring.lock().expect("scoring mutex poisoned") = result;
        self
    }

    pub(super) fn with_stats(self, result: Result<PortfolioStats, ServiceError>) -> Self {
        *self.stats.lock().expect("stats mutex poisoned") = result;
        self
    }

    /// Fetches read the remote value immediately but only return once notified.
    pub(super) fn with_fetch_gate(mut self, gate: Arc<Notify>) -> Self {
        self.fetch_gate = Some(gate);
        self
    }

    pub(super) fn with_publish_gate(mut self, gate: Arc<Notify>) -> Self {
        self.publish_gate = Some(gate);
        self
    }

    pub(super) fn remote(&self) -> Option<RiskPolicy> {
        *self.remote.lock().expect("remote mutex poisoned")
    }

    pub(super) fn set_remote(&self, policy: Option<RiskPolicy>) {
        *self.remote.lock().expect("remote mutex poisoned") = policy;
    }

    pub(super) fn submitted(&self) -> Vec<ScoringRequest> {
        self.submitted.lock().expect("submitted mutex poisoned").clone()
    }

    pub(super) fn publishes(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoringService for FakeEngine {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoringResponse, ServiceError> {
        self.submitted
            .lock()
            .expect("submitted mutex poisoned")
            .push(request.clone());
        self.scoring.lock().expect("scoring mutex poisoned").clone()
    }
}

#[async_trait]
impl SettingsSource for FakeEngine {
    async fn fetch_policy(&self) -> Result<RiskPolicy, ServiceError> {
        let observed = self.remote();
        if let Some(gate) = &self.fetch_gate {
            gate.notified().await;
        }
        observed.ok_or_else(|| outage(ServiceKind::Settings))
    }

    async fn publish_policy(&self, policy: &RiskPolicy) -> Result<RiskPolicy, ServiceError> {
        self.publishes.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.publish_gate {
            gate.notified().await;
        }
        let mut remote = self.remote.lock().expect("remote mutex poisoned");
        match remote.as_mut() {
            Some(stored) => {
                *stored = *policy;
                Ok(*policy)
            }
            None => Err(outage(ServiceKind::Settings)),
        }
    }
}

#[async_trait]
impl StatsSource for FakeEngine {
    async fn portfolio_stats(&self) -> Result<PortfolioStats, ServiceError> {
        self.stats.lock().expect("stats mutex poisoned").clone()
    }
}

pub(super) fn build_store(
    engine: FakeEngine,
) -> (
    RiskSettingsStore<FakeEngine, MemoryFallbackStore>,
    Arc<FakeEngine>,
    Arc<MemoryFallbackStore>,
) {
    let engine = Arc::new(engine);
    let cache = Arc::new(MemoryFallbackStore::default());
    let store = RiskSettingsStore::new(engine.clone(), cache.clone());
    (store, engine, cache)
}

pub(super) fn build_service(
    engine: FakeEngine,
) -> (
    Arc<DashboardService<FakeEngine, MemoryFallbackStore>>,
    Arc<FakeEngine>,
) {
    let engine = Arc::new(engine);
    let cache = Arc::new(MemoryFallbackStore::default());
    let service = Arc::new(DashboardService::new(engine.clone(), cache));
    (service, engine)
}

pub(super) fn router_with_service(
    service: Arc<DashboardService<FakeEngine, MemoryFallbackStore>>,
) -> axum::Router {
    dashboard_router(service)
}

pub(super) fn cached_policy(cache: &MemoryFallbackStore) -> Option<RiskPolicy> {
    cache
        .entry(SETTINGS_CACHE_KEY)
        .map(|bytes| serde_json::from_slice(&bytes).expect("cached policy json"))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
