//! Risk decision and configuration core.
//!
//! Control flow runs applicant → [`installment`] → scoring engine → [`presentation`].
//! The [`settings`] store lives beside that flow and is loaded once at startup.

pub mod assessment;
pub mod client;
pub mod domain;
pub mod installment;
pub mod presentation;
pub mod router;
pub mod service;
pub mod settings;
pub mod validation;

#[cfg(test)]
mod tests;

pub use assessment::{Assessment, AssessmentError, AssessmentState, LoanAssessor};
pub use client::{
    RiskEngine, RiskEngineClient, ScoringService, ServiceError, ServiceKind, SettingsSource,
    StatsSource,
};
pub use domain::{
    quote_installment, ApplicantRecord, Decision, Grade, HomeOwnership, LoanPurpose, LoanTerm,
    PortfolioStats, ScoringRequest, ScoringResponse, VerificationStatus,
};
pub use installment::compute_installment;
pub use presentation::{present, DecisionLabel, GaugeBand, PresentationModel, RiskTier};
pub use router::dashboard_router;
pub use service::DashboardService;
pub use settings::{
    CacheError, FallbackStore, FileFallbackStore, MemoryFallbackStore, PolicyAdvisory,
    PolicyOrigin, PolicySnapshot, RiskPolicy, RiskSettingsStore, SaveOutcome, SaveWarning,
};
pub use validation::ValidationError;
