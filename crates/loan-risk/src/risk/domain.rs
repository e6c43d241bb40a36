use serde::{Deserialize, Serialize};

use super::installment::compute_installment;
use super::validation::{at_least, within, ValidationError};

pub const LOAN_AMOUNT_RANGE: std::ops::RangeInclusive<f64> = 500.0..=50_000.0;
pub const FICO_RANGE: std::ops::RangeInclusive<f64> = 300.0..=850.0;
pub const DTI_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

/// Lender-assigned loan grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

/// Repayment term; the engine only prices 36 and 60 month loans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum LoanTerm {
    ThirtySixMonths,
    SixtyMonths,
}

impl LoanTerm {
    pub fn months(self) -> u32 {
        match self {
            LoanTerm::ThirtySixMonths => 36,
            LoanTerm::SixtyMonths => 60,
        }
    }
}

impl TryFrom<u32> for LoanTerm {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            36 => Ok(LoanTerm::ThirtySixMonths),
            60 => Ok(LoanTerm::SixtyMonths),
            other => Err(format!("term_months must be 36 or 60 (got {other})")),
        }
    }
}

impl From<LoanTerm> for u32 {
    fn from(value: LoanTerm) -> Self {
        value.months()
    }
}

/// Fixed catalog of purposes the scoring model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPurpose {
    DebtConsolidation,
    CreditCard,
    HomeImprovement,
    MajorPurchase,
    SmallBusiness,
    Medical,
    Car,
    Vacation,
    Moving,
    House,
    Wedding,
    RenewableEnergy,
    Educational,
}

impl LoanPurpose {
    pub const ALL: [LoanPurpose; 13] = [
        LoanPurpose::DebtConsolidation,
        LoanPurpose::CreditCard,
        LoanPurpose::HomeImprovement,
        LoanPurpose::MajorPurchase,
        LoanPurpose::SmallBusiness,
        LoanPurpose::Medical,
        LoanPurpose::Car,
        LoanPurpose::Vacation,
        LoanPurpose::Moving,
        LoanPurpose::House,
        LoanPurpose::Wedding,
        LoanPurpose::RenewableEnergy,
        LoanPurpose::Educational,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HomeOwnership {
    Rent,
    Mortgage,
    Own,
    Other,
    None,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    Verified,
    #[serde(rename = "Source Verified")]
    SourceVerified,
    #[serde(rename = "Not Verified")]
    NotVerified,
}

/// Applicant and loan attributes captured by the simulator form.
///
/// The installment is intentionally absent: it is derived from the loan terms
/// whenever a [`ScoringRequest`] is prepared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    #[serde(rename = "annual_inc")]
    pub annual_income: f64,
    #[serde(rename = "loan_amnt")]
    pub loan_amount: f64,
    #[serde(rename = "fico_range_low")]
    pub fico_score: u16,
    #[serde(rename = "dti")]
    pub debt_to_income: f64,
    #[serde(rename = "int_rate")]
    pub interest_rate_apr: f64,
    pub grade: Grade,
    #[serde(rename = "term_months")]
    pub term: LoanTerm,
    pub purpose: LoanPurpose,
    pub home_ownership: HomeOwnership,
    pub verification_status: VerificationStatus,
    #[serde(rename = "revol_util")]
    pub revolving_utilization: f64,
    #[serde(rename = "total_acc")]
    pub total_accounts: u32,
    #[serde(rename = "open_acc")]
    pub open_accounts: u32,
    #[serde(rename = "pub_rec")]
    pub public_records: u32,
}

impl ApplicantRecord {
    pub fn validate(&self) -> Result<(), ValidationError> {
        at_least("annual_inc", self.annual_income, 0.0)?;
        within("loan_amnt", self.loan_amount, LOAN_AMOUNT_RANGE)?;
        within("fico_range_low", f64::from(self.fico_score), FICO_RANGE)?;
        within("dti", self.debt_to_income, DTI_RANGE)?;
        at_least("int_rate", self.interest_rate_apr, 0.0)?;
        at_least("revol_util", self.revolving_utilization, 0.0)?;
        Ok(())
    }

    /// Installment implied by the current loan terms.
    pub fn installment(&self) -> f64 {
        compute_installment(self.loan_amount, self.interest_rate_apr, self.term.months())
    }
}

/// Installment for standalone loan terms, rejecting out-of-range input first.
pub fn quote_installment(
    loan_amount: f64,
    interest_rate_apr: f64,
    term: LoanTerm,
) -> Result<f64, ValidationError> {
    within("loan_amnt", loan_amount, LOAN_AMOUNT_RANGE)?;
    at_least("int_rate", interest_rate_apr, 0.0)?;
    Ok(compute_installment(loan_amount, interest_rate_apr, term.months()))
}

/// Payload submitted to the scoring service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    #[serde(flatten)]
    applicant: ApplicantRecord,
    installment: f64,
}

impl ScoringRequest {
    /// Validate the applicant and derive a fresh installment from its terms.
    pub fn prepare(applicant: &ApplicantRecord) -> Result<Self, ValidationError> {
        applicant.validate()?;
        Ok(Self {
            installment: applicant.installment(),
            applicant: applicant.clone(),
        })
    }

    pub fn applicant(&self) -> &ApplicantRecord {
        &self.applicant
    }

    pub fn installment(&self) -> f64 {
        self.installment
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approve,
    Reject,
}

/// Scoring service output. `expected_profit` may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringResponse {
    pub probability_of_default: f64,
    pub decision: Decision,
    pub recommended_limit: f64,
    pub expected_profit: f64,
}

/// Aggregate portfolio metrics, passed through for display only.
///
/// `approval_rate`, `default_rate` and `risk_alerts` are fractions in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub total_volume: f64,
    pub total_transactions: u64,
    pub approval_rate: f64,
    pub default_rate: f64,
    pub avg_fico: u32,
    pub risk_alerts: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn applicant() -> ApplicantRecord {
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

    #[test]
    fn scoring_request_uses_engine_field_names() {
        let request = ScoringRequest::prepare(&applicant()).expect("valid applicant");
        let body = serde_json::to_value(&request).expect("serializes");

        assert_eq!(body["loan_amnt"], json!(12_000.0));
        assert_eq!(body["fico_range_low"], json!(720));
        assert_eq!(body["term_months"], json!(36));
        assert_eq!(body["purpose"], json!("credit_card"));
        assert_eq!(body["home_ownership"], json!("MORTGAGE"));
        assert_eq!(body["verification_status"], json!("Source Verified"));
        assert_eq!(body["installment"], json!(390.03));
    }

    #[test]
    fn installment_tracks_edited_terms() {
        let mut record = applicant();
        let first = ScoringRequest::prepare(&record).expect("valid");
        record.term = LoanTerm::SixtyMonths;
        let second = ScoringRequest::prepare(&record).expect("valid");

        assert_eq!(first.installment(), 390.03);
        assert_eq!(second.installment(), 257.93);
    }

    #[test]
    fn prepare_rejects_out_of_range_loan_amount() {
        let mut record = applicant();
        record.loan_amount = 75_000.0;
        let err = ScoringRequest::prepare(&record).expect_err("too large");
        assert_eq!(err.field(), "loan_amnt");
    }

    #[test]
    fn prepare_rejects_fico_below_floor() {
        let mut record = applicant();
        record.fico_score = 250;
        let err = ScoringRequest::prepare(&record).expect_err("fico below 300");
        assert_eq!(err.field(), "fico_range_low");
    }

    #[test]
    fn term_rejects_unpriced_lengths() {
        let parsed: Result<LoanTerm, _> = serde_json::from_value(json!(48));
        assert!(parsed.is_err());
        let parsed: LoanTerm = serde_json::from_value(json!(60)).expect("60 is priced");
        assert_eq!(parsed, LoanTerm::SixtyMonths);
    }

    #[test]
    fn purpose_catalog_has_thirteen_codes() {
        let codes: Vec<String> = LoanPurpose::ALL
            .iter()
            .map(|purpose| {
                serde_json::to_value(purpose)
                    .expect("serializes")
                    .as_str()
                    .expect("string code")
                    .to_string()
            })
            .collect();
        assert_eq!(codes.len(), 13);
        assert!(codes.contains(&"renewable_energy".to_string()));
        assert!(!codes.contains(&"other".to_string()));
    }

    #[test]
    fn stats_tolerate_engine_error_field() {
        let stats: PortfolioStats = serde_json::from_value(json!({
            "total_transactions": 0,
            "total_volume": 0.0,
            "default_rate": 0.0,
            "approval_rate": 0.0,
            "avg_fico": 0,
            "risk_alerts": 0.0,
            "error": "dataset missing"
        }))
        .expect("stats parse");
        assert_eq!(stats.error.as_deref(), Some("dataset missing"));
    }

    #[test]
    fn quote_rejects_out_of_range_terms() {
        assert_eq!(
            quote_installment(12_000.0, 10.5, LoanTerm::ThirtySixMonths),
            Ok(390.03)
        );
        let err = quote_installment(12_000.0, -2_400.0, LoanTerm::ThirtySixMonths)
            .expect_err("negative rate");
        assert_eq!(err.field(), "int_rate");
        let err = quote_installment(-500.0, 10.5, LoanTerm::SixtyMonths).expect_err("negative amount");
        assert_eq!(err.field(), "loan_amnt");
    }
}
