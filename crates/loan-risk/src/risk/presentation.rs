//! Maps a scoring response onto the gauge and decision panel.
//!
//! The gauge bands are fixed reference points. They are independent of the
//! configurable decision threshold in [`RiskPolicy`](super::settings::RiskPolicy),
//! which is why nothing here reads the policy.

use serde::{Deserialize, Serialize};

use super::domain::{Decision, ScoringResponse};

pub const MAX_CREDIT_SCORE: u16 = 850;
/// Upper edge (exclusive) of the SAFE band.
pub const SAFE_BAND_UPPER: f64 = 0.15;
/// Upper edge (exclusive) of the WARNING band.
pub const WARNING_BAND_UPPER: f64 = 0.30;
pub const NEEDLE_START_DEGREES: f64 = 180.0;
pub const NEEDLE_SWEEP_DEGREES: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Safe,
    Warning,
    Risky,
}

impl RiskTier {
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Safe => "Safe",
            RiskTier::Warning => "Warning",
            RiskTier::Risky => "Risky",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionLabel {
    Approved,
    Rejected,
}

impl DecisionLabel {
    pub fn banner(self) -> &'static str {
        match self {
            DecisionLabel::Approved => "APPLICATION APPROVED",
            DecisionLabel::Rejected => "APPLICATION REJECTED",
        }
    }
}

/// One colored arc of the half-circle gauge, as a probability interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeBand {
    pub tier: RiskTier,
    pub from: f64,
    pub to: f64,
}

impl GaugeBand {
    /// Share of the half circle this band occupies, in percent.
    pub fn width_percent(&self) -> f64 {
        (self.to - self.from) * 100.0
    }
}

pub const GAUGE_BANDS: [GaugeBand; 3] = [
    GaugeBand {
        tier: RiskTier::Safe,
        from: 0.0,
        to: SAFE_BAND_UPPER,
    },
    GaugeBand {
        tier: RiskTier::Warning,
        from: SAFE_BAND_UPPER,
        to: WARNING_BAND_UPPER,
    },
    GaugeBand {
        tier: RiskTier::Risky,
        from: WARNING_BAND_UPPER,
        to: 1.0,
    },
];

/// Everything the gauge and decision panel render for one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationModel {
    pub probability_of_default: f64,
    pub credit_score_estimate: u16,
    pub risk_tier: RiskTier,
    pub needle_angle_degrees: f64,
    pub decision_label: DecisionLabel,
    pub limit: f64,
    pub profit: f64,
    pub profit_display: String,
    pub limit_display: String,
}

/// Build the presentation model. Never fails; NaN probabilities are shown as
/// the worst case.
pub fn present(response: &ScoringResponse) -> PresentationModel {
    let probability = response.probability_of_default;
    let decision_label = match response.decision {
        Decision::Approve => DecisionLabel::Approved,
        Decision::Reject => DecisionLabel::Rejected,
    };

    PresentationModel {
        probability_of_default: probability,
        credit_score_estimate: credit_score_estimate(probability),
        risk_tier: risk_tier(probability),
        needle_angle_degrees: needle_angle_degrees(probability),
        decision_label,
        limit: response.recommended_limit,
        profit: response.expected_profit,
        profit_display: signed_currency(response.expected_profit),
        limit_display: currency(response.recommended_limit),
    }
}

pub fn credit_score_estimate(probability: f64) -> u16 {
    let p = sanitize(probability);
    let score = ((1.0 - p) * f64::from(MAX_CREDIT_SCORE)).round();
    score.clamp(0.0, f64::from(MAX_CREDIT_SCORE)) as u16
}

pub fn risk_tier(probability: f64) -> RiskTier {
    let p = sanitize(probability);
    if p < SAFE_BAND_UPPER {
        RiskTier::Safe
    } else if p < WARNING_BAND_UPPER {
        RiskTier::Warning
    } else {
        RiskTier::Risky
    }
}

/// 180° points left (no risk), 360° points right (certain default).
pub fn needle_angle_degrees(probability: f64) -> f64 {
    let p = sanitize(probability);
    (NEEDLE_START_DEGREES + p * NEEDLE_SWEEP_DEGREES).clamp(
        NEEDLE_START_DEGREES,
        NEEDLE_START_DEGREES + NEEDLE_SWEEP_DEGREES,
    )
}

fn sanitize(probability: f64) -> f64 {
    if probability.is_nan() {
        1.0
    } else {
        probability
    }
}

/// `$1,234.50`, or `-$1,234.50` for negative amounts.
pub fn currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(value.abs()))
}

/// Like [`currency`] but always carries a sign.
pub fn signed_currency(value: f64) -> String {
    if value < 0.0 {
        currency(value)
    } else {
        format!("+{}", currency(value))
    }
}

fn group_thousands(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(probability: f64, decision: Decision) -> ScoringResponse {
        ScoringResponse {
            probability_of_default: probability,
            decision,
            recommended_limit: 3_000.0,
            expected_profit: 412.456_7,
        }
    }

    #[test]
    fn score_endpoints() {
        assert_eq!(credit_score_estimate(0.0), 850);
        assert_eq!(credit_score_estimate(1.0), 0);
        assert_eq!(credit_score_estimate(0.1), 765);
        assert_eq!(credit_score_estimate(1.2), 0);
        assert_eq!(credit_score_estimate(-0.1), 850);
    }

    #[test]
    fn tier_boundaries_are_exact() {
        assert_eq!(risk_tier(0.149_999), RiskTier::Safe);
        assert_eq!(risk_tier(0.15), RiskTier::Warning);
        assert_eq!(risk_tier(0.299_999), RiskTier::Warning);
        assert_eq!(risk_tier(0.30), RiskTier::Risky);
        assert_eq!(risk_tier(1.0), RiskTier::Risky);
        assert_eq!(risk_tier(0.0), RiskTier::Safe);
    }

    #[test]
    fn needle_spans_half_circle() {
        assert_eq!(needle_angle_degrees(0.0), 180.0);
        assert_eq!(needle_angle_degrees(1.0), 360.0);
        assert_eq!(needle_angle_degrees(0.5), 270.0);
        assert_eq!(needle_angle_degrees(1.000_000_1), 360.0);
        assert_eq!(needle_angle_degrees(-0.000_001), 180.0);
    }

    #[test]
    fn nan_probability_renders_as_worst_case() {
        let model = present(&response(f64::NAN, Decision::Reject));
        assert_eq!(model.credit_score_estimate, 0);
        assert_eq!(model.risk_tier, RiskTier::Risky);
        assert_eq!(model.needle_angle_degrees, 360.0);
    }

    #[test]
    fn decision_is_relabelled_not_recomputed() {
        let approved_but_risky = present(&response(0.9, Decision::Approve));
        assert_eq!(approved_but_risky.decision_label, DecisionLabel::Approved);
        assert_eq!(approved_but_risky.risk_tier, RiskTier::Risky);

        let rejected_but_safe = present(&response(0.02, Decision::Reject));
        assert_eq!(rejected_but_safe.decision_label, DecisionLabel::Rejected);
        assert_eq!(rejected_but_safe.risk_tier, RiskTier::Safe);
    }

    #[test]
    fn profit_keeps_precision_and_formats_to_cents() {
        let model = present(&response(0.05, Decision::Approve));
        assert_eq!(model.profit, 412.456_7);
        assert_eq!(model.profit_display, "+$412.46");
        assert_eq!(model.limit, 3_000.0);
        assert_eq!(model.limit_display, "$3,000.00");
    }

    #[test]
    fn negative_profit_keeps_its_sign() {
        assert_eq!(signed_currency(-1_234.5), "-$1,234.50");
        assert_eq!(currency(1_234_567.891), "$1,234,567.89");
        assert_eq!(currency(0.0), "$0.00");
    }

    #[test]
    fn bands_cover_the_gauge() {
        let total: f64 = GAUGE_BANDS.iter().map(GaugeBand::width_percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(GAUGE_BANDS[2].width_percent().round(), 70.0);
    }
}
