use crate::infra::{build_service, parse_wire, ConsoleService};
use clap::{Args, Subcommand};
use loan_risk::config::AppConfig;
use loan_risk::error::AppError;
use loan_risk::risk::presentation::{currency, GAUGE_BANDS};
use loan_risk::risk::{
    quote_installment, ApplicantRecord, Assessment, AssessmentState, Grade, HomeOwnership,
    LoanPurpose, LoanTerm, PolicySnapshot, PortfolioStats, RiskPolicy, SaveOutcome,
    VerificationStatus,
};
use loan_risk::telemetry;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct InstallmentArgs {
    /// Principal in dollars
    #[arg(long, default_value_t = 12_000.0)]
    pub(crate) amount: f64,
    /// Annual interest rate in percent
    #[arg(long, default_value_t = 10.5)]
    pub(crate) rate: f64,
    /// Term in months (36 or 60)
    #[arg(long, default_value = "36", value_parser = parse_term)]
    pub(crate) term: LoanTerm,
}

/// Applicant fields; defaults match the simulator form.
#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    #[arg(long, default_value_t = 85_000.0)]
    pub(crate) annual_income: f64,
    #[arg(long, default_value_t = 12_000.0)]
    pub(crate) amount: f64,
    #[arg(long, default_value_t = 720)]
    pub(crate) fico: u16,
    /// Debt-to-income ratio in percent
    #[arg(long, default_value_t = 12.5)]
    pub(crate) dti: f64,
    #[arg(long, default_value_t = 10.5)]
    pub(crate) rate: f64,
    #[arg(long, default_value = "A", value_parser = parse_wire::<Grade>)]
    pub(crate) grade: Grade,
    #[arg(long, default_value = "36", value_parser = parse_term)]
    pub(crate) term: LoanTerm,
    #[arg(long, default_value = "credit_card", value_parser = parse_wire::<LoanPurpose>)]
    pub(crate) purpose: LoanPurpose,
    #[arg(long, default_value = "MORTGAGE", value_parser = parse_wire::<HomeOwnership>)]
    pub(crate) home_ownership: HomeOwnership,
    #[arg(
        long,
        default_value = "Source Verified",
        value_parser = parse_wire::<VerificationStatus>
    )]
    pub(crate) verification: VerificationStatus,
    #[arg(long, default_value_t = 30.0)]
    pub(crate) revol_util: f64,
    #[arg(long, default_value_t = 25)]
    pub(crate) total_acc: u32,
    #[arg(long, default_value_t = 12)]
    pub(crate) open_acc: u32,
    #[arg(long, default_value_t = 0)]
    pub(crate) pub_rec: u32,
}

impl AssessArgs {
    fn applicant(&self) -> ApplicantRecord {
        ApplicantRecord {
            annual_income: self.annual_income,
            loan_amount: self.amount,
            fico_score: self.fico,
            debt_to_income: self.dti,
            interest_rate_apr: self.rate,
            grade: self.grade,
            term: self.term,
            purpose: self.purpose,
            home_ownership: self.home_ownership,
            verification_status: self.verification,
            revolving_utilization: self.revol_util,
            total_accounts: self.total_acc,
            open_accounts: self.open_acc,
            public_records: self.pub_rec,
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum SettingsCommand {
    /// Load and print the current risk policy
    Show,
    /// Change one or more policy values and save them
    Set(SetPolicyArgs),
    /// Restore the default policy
    Reset {
        /// Save the defaults instead of only showing them
        #[arg(long)]
        persist: bool,
    },
}

#[derive(Args, Debug)]
pub(crate) struct SetPolicyArgs {
    /// Default probability threshold (0.05 - 0.30)
    #[arg(long)]
    pub(crate) threshold: Option<f64>,
    /// Minimum FICO score (550 - 750)
    #[arg(long)]
    pub(crate) min_fico: Option<u16>,
    /// Maximum debt-to-income percent (20 - 60)
    #[arg(long)]
    pub(crate) max_dti: Option<f64>,
}

impl SetPolicyArgs {
    fn apply(&self, mut policy: RiskPolicy) -> RiskPolicy {
        if let Some(threshold) = self.threshold {
            policy.default_probability_threshold = threshold;
        }
        if let Some(min_fico) = self.min_fico {
            policy.minimum_fico = min_fico;
        }
        if let Some(max_dti) = self.max_dti {
            policy.maximum_dti = max_dti;
        }
        policy
    }
}

fn parse_term(raw: &str) -> Result<LoanTerm, String> {
    let months: u32 = raw
        .trim()
        .parse()
        .map_err(|err| format!("'{raw}' is not a number of months ({err})"))?;
    LoanTerm::try_from(months)
}

pub(crate) fn run_installment(args: InstallmentArgs) -> Result<(), AppError> {
    let installment = quote_installment(args.amount, args.rate, args.term)?;
    println!(
        "{} at {:.2}% over {} months: {} per month",
        currency(args.amount),
        args.rate,
        args.term.months(),
        currency(installment)
    );
    Ok(())
}

pub(crate) async fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let service = connect()?;
    service.reload_policy().await;

    let result = service.assess(&args.applicant()).await;
    match result {
        Ok(assessment) => {
            render_assessment(&assessment);
            Ok(())
        }
        Err(err) => {
            render_failure(&AssessmentState::from(Err::<Assessment, _>(err.clone())));
            Err(err.into())
        }
    }
}

pub(crate) async fn run_settings(command: SettingsCommand) -> Result<(), AppError> {
    let service = connect()?;
    service.reload_policy().await;

    match command {
        SettingsCommand::Show => render_snapshot(&service.policy_snapshot()),
        SettingsCommand::Set(args) => {
            let policy = args.apply(service.policy_snapshot().policy);
            let outcome = service.save_policy(policy).await?;
            render_save(&outcome);
        }
        SettingsCommand::Reset { persist } => {
            let defaults = service.reset_policy();
            if persist {
                let outcome = service.save_policy(defaults).await?;
                render_save(&outcome);
            } else {
                render_snapshot(&service.policy_snapshot());
                println!("Defaults are not saved; pass --persist to store them.");
            }
        }
    }
    Ok(())
}

pub(crate) async fn run_stats() -> Result<(), AppError> {
    let service = connect()?;
    let stats = service.portfolio_stats().await?;
    render_stats(&stats);
    Ok(())
}

fn connect() -> Result<Arc<ConsoleService>, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    build_service(&config)
}

fn render_assessment(assessment: &Assessment) {
    let view = &assessment.presentation;
    println!("{}", view.decision_label.banner());
    println!("- Monthly installment: {}", currency(assessment.installment));
    println!(
        "- Probability of default: {:.1}% ({})",
        view.probability_of_default * 100.0,
        view.risk_tier.label()
    );
    println!("- Estimated credit score: {}", view.credit_score_estimate);
    println!("- Gauge needle: {:.1} deg", view.needle_angle_degrees);
    let bands: Vec<String> = GAUGE_BANDS
        .iter()
        .map(|band| format!("{} {:.0}%", band.tier.label(), band.width_percent()))
        .collect();
    println!("  Bands: {}", bands.join(" | "));
    println!("- Recommended limit: {}", view.limit_display);
    println!("- Expected profit: {}", view.profit_display);

    if !assessment.advisories.is_empty() {
        println!("Policy advisories:");
        for advisory in &assessment.advisories {
            println!("  - {}", advisory.summary());
        }
    }
}

fn render_failure(state: &AssessmentState) {
    match state {
        AssessmentState::Decided(assessment) => render_assessment(assessment),
        AssessmentState::InvalidInput { field, message } => {
            println!("Invalid input for {field}: {message}");
        }
        AssessmentState::EngineUnavailable { title, message } => {
            println!("{title}");
            println!("  {message}");
        }
    }
}

fn render_snapshot(snapshot: &PolicySnapshot) {
    let policy = &snapshot.policy;
    println!("Risk policy ({:?})", snapshot.origin);
    println!(
        "- Default probability threshold: {:.0}%",
        policy.default_probability_threshold * 100.0
    );
    println!("- Minimum FICO: {}", policy.minimum_fico);
    println!("- Maximum DTI: {:.0}%", policy.maximum_dti);
}

fn render_save(outcome: &SaveOutcome) {
    if outcome.is_synced() {
        println!("Risk policy saved.");
    } else {
        println!("Risk policy applied locally; the settings service was not updated.");
    }
    for warning in &outcome.warnings {
        println!("  warning: {warning}");
    }
    println!(
        "- threshold {:.2} | min FICO {} | max DTI {:.0}%",
        outcome.policy.default_probability_threshold,
        outcome.policy.minimum_fico,
        outcome.policy.maximum_dti
    );
}

fn render_stats(stats: &PortfolioStats) {
    for line in stats_lines(stats) {
        println!("{line}");
    }
}

fn stats_lines(stats: &PortfolioStats) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(error) = &stats.error {
        lines.push(format!("Engine reported a problem: {error}"));
    }
    lines.push("Portfolio overview".to_string());
    lines.push(format!("- Total volume: {}", currency(stats.total_volume)));
    lines.push(format!("- Transactions: {}", stats.total_transactions));
    lines.push(format!(
        "- Approval rate: {:.1}%",
        stats.approval_rate * 100.0
    ));
    lines.push(format!("- Default rate: {:.1}%", stats.default_rate * 100.0));
    lines.push(format!("- Average FICO: {}", stats.avg_fico));
    lines.push(format!("- Risk alerts: {:.1}%", stats.risk_alerts * 100.0));
    lines
}
