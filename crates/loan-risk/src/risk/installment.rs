//! Fixed monthly payment for an amortizing loan.
//!
//! The result is rounded to cents half away from zero (`f64::round`), so
//! `0.125` becomes `0.13` and `-0.125` becomes `-0.13`.

/// Monthly installment for `principal` borrowed at `annual_rate_percent` APR
/// over `term_months`.
///
/// Total over `principal >= 0`, `annual_rate_percent >= 0`, `term_months >= 1`;
/// callers validate ranges before getting here. A zero rate falls back to
/// straight-line repayment so the annuity formula never divides by zero. A
/// `term_months` of zero is treated as one.
pub fn compute_installment(principal: f64, annual_rate_percent: f64, term_months: u32) -> f64 {
    let periods = term_months.max(1);
    let monthly_rate = annual_rate_percent / 100.0 / 12.0;

    let payment = if monthly_rate == 0.0 {
        principal / f64::from(periods)
    } else {
        let growth = (1.0 + monthly_rate).powi(periods as i32);
        principal * monthly_rate * growth / (growth - 1.0)
    };

    round_to_cents(payment)
}

pub(crate) fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
