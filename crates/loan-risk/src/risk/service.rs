use std::sync::Arc;

use super::assessment::{Assessment, AssessmentError, LoanAssessor};
use super::client::{RiskEngine, ServiceError};
use super::domain::{ApplicantRecord, PortfolioStats};
use super::settings::{
    FallbackStore, PolicySnapshot, RiskPolicy, RiskSettingsStore, SaveOutcome,
};
use super::validation::ValidationError;

/// Service composing the assessor, the settings store, and the stats feed.
///
/// The three pieces of state are independent, so concurrent requests against
/// different endpoints never contend.
pub struct DashboardService<E, C> {
    engine: Arc<E>,
    assessor: LoanAssessor<E>,
    settings: RiskSettingsStore<E, C>,
}

impl<E, C> DashboardService<E, C>
where
    E: RiskEngine + 'static,
    C: FallbackStore + 'static,
{
    pub fn new(engine: Arc<E>, cache: Arc<C>) -> Self {
        Self {
            assessor: LoanAssessor::new(engine.clone()),
            settings: RiskSettingsStore::new(engine.clone(), cache),
            engine,
        }
    }

    pub fn settings(&self) -> &RiskSettingsStore<E, C> {
        &self.settings
    }

    /// Score against the policy that is current when the request arrives.
    pub async fn assess(&self, applicant: &ApplicantRecord) -> Result<Assessment, AssessmentError> {
        let policy = self.settings.current();
        self.assessor.assess(applicant, &policy).await
    }

    pub fn policy_snapshot(&self) -> PolicySnapshot {
        self.settings.snapshot()
    }

    pub async fn reload_policy(&self) -> RiskPolicy {
        self.settings.load().await
    }

    pub async fn save_policy(&self, policy: RiskPolicy) -> Result<SaveOutcome, ValidationError> {
        self.settings.save(policy).await
    }

    pub fn reset_policy(&self) -> RiskPolicy {
        self.settings.reset()
    }

    pub async fn portfolio_stats(&self) -> Result<PortfolioStats, ServiceError> {
        self.engine.portfolio_stats().await
    }
}
