use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::risk::domain::ApplicantRecord;
use crate::risk::validation::{within, ValidationError};

pub const THRESHOLD_RANGE: RangeInclusive<f64> = 0.05..=0.30;
pub const MINIMUM_FICO_RANGE: RangeInclusive<f64> = 550.0..=750.0;
pub const MAXIMUM_DTI_RANGE: RangeInclusive<f64> = 20.0..=60.0;

pub const DEFAULT_THRESHOLD: f64 = 0.15;
pub const DEFAULT_MINIMUM_FICO: u16 = 600;
pub const DEFAULT_MAXIMUM_DTI: f64 = 40.0;

/// Configurable parameters governing automated approve/reject decisions.
///
/// Serialized with the settings service field names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    #[serde(rename = "threshold")]
    pub default_probability_threshold: f64,
    #[serde(rename = "min_fico")]
    pub minimum_fico: u16,
    #[serde(rename = "max_dti")]
    pub maximum_dti: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            default_probability_threshold: DEFAULT_THRESHOLD,
            minimum_fico: DEFAULT_MINIMUM_FICO,
            maximum_dti: DEFAULT_MAXIMUM_DTI,
        }
    }
}

impl RiskPolicy {
    pub fn validate(&self) -> Result<(), ValidationError> {
        within(
            "threshold",
            self.default_probability_threshold,
            THRESHOLD_RANGE,
        )?;
        within("min_fico", f64::from(self.minimum_fico), MINIMUM_FICO_RANGE)?;
        within("max_dti", self.maximum_dti, MAXIMUM_DTI_RANGE)?;
        Ok(())
    }

    /// Client-side view of the rules the engine applies with this policy.
    ///
    /// Advisories are informational; the displayed decision always comes from
    /// the engine.
    pub fn advisories(&self, applicant: &ApplicantRecord, probability: f64) -> Vec<PolicyAdvisory> {
        let mut advisories = Vec::new();

        if applicant.fico_score < self.minimum_fico {
            advisories.push(PolicyAdvisory::FicoBelowMinimum {
                fico: applicant.fico_score,
                minimum: self.minimum_fico,
            });
        }

        if applicant.debt_to_income > self.maximum_dti {
            advisories.push(PolicyAdvisory::DebtToIncomeAboveMaximum {
                dti: applicant.debt_to_income,
                maximum: self.maximum_dti,
            });
        }

        if probability > self.default_probability_threshold {
            advisories.push(PolicyAdvisory::ProbabilityAboveThreshold {
                probability,
                threshold: self.default_probability_threshold,
            });
        }

        advisories
    }
}

/// Policy rule an applicant trips.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PolicyAdvisory {
    FicoBelowMinimum { fico: u16, minimum: u16 },
    DebtToIncomeAboveMaximum { dti: f64, maximum: f64 },
    ProbabilityAboveThreshold { probability: f64, threshold: f64 },
}

impl PolicyAdvisory {
    pub fn summary(&self) -> String {
        match self {
            PolicyAdvisory::FicoBelowMinimum { fico, minimum } => {
                format!("FICO {fico} is below the policy minimum of {minimum}")
            }
            PolicyAdvisory::DebtToIncomeAboveMaximum { dti, maximum } => {
                format!("DTI {dti:.1}% exceeds the policy maximum of {maximum:.0}%")
            }
            PolicyAdvisory::ProbabilityAboveThreshold {
                probability,
                threshold,
            } => format!(
                "default probability {:.1}% exceeds the {:.1}% threshold",
                probability * 100.0,
                threshold * 100.0
            ),
        }
    }
}
