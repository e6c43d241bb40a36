use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::client::{ScoringService, ServiceError};
use super::domain::{ApplicantRecord, ScoringRequest};
use super::presentation::{present, PresentationModel};
use super::settings::{PolicyAdvisory, RiskPolicy};
use super::validation::ValidationError;

/// Outcome of scoring one applicant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub installment: f64,
    pub presentation: PresentationModel,
    pub advisories: Vec<PolicyAdvisory>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Submits applicants to the scoring service and maps the response for display.
pub struct LoanAssessor<S: ?Sized> {
    scoring: Arc<S>,
}

impl<S> LoanAssessor<S>
where
    S: ScoringService + ?Sized,
{
    pub fn new(scoring: Arc<S>) -> Self {
        Self { scoring }
    }

    pub async fn assess(
        &self,
        applicant: &ApplicantRecord,
        policy: &RiskPolicy,
    ) -> Result<Assessment, AssessmentError> {
        let request = ScoringRequest::prepare(applicant)?;
        let response = self.scoring.score(&request).await.map_err(|err| {
            warn!(error = %err, "scoring request failed");
            err
        })?;
        debug!(
            probability = response.probability_of_default,
            decision = ?response.decision,
            "applicant scored"
        );

        Ok(Assessment {
            installment: request.installment(),
            presentation: present(&response),
            advisories: policy.advisories(applicant, response.probability_of_default),
        })
    }
}

/// What the decision panel shows. An unreachable engine is its own state and
/// can never be read as a rejection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AssessmentState {
    Decided(Assessment),
    InvalidInput { field: &'static str, message: String },
    EngineUnavailable { title: &'static str, message: String },
}

impl From<Result<Assessment, AssessmentError>> for AssessmentState {
    fn from(result: Result<Assessment, AssessmentError>) -> Self {
        match result {
            Ok(assessment) => AssessmentState::Decided(assessment),
            Err(AssessmentError::Validation(err)) => AssessmentState::InvalidInput {
                field: err.field(),
                message: err.to_string(),
            },
            Err(AssessmentError::Service(err)) => AssessmentState::EngineUnavailable {
                title: "Risk engine unavailable",
                message: err.to_string(),
            },
        }
    }
}
