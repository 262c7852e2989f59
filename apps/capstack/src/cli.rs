//! # CLI Commands
//!
//! clap definitions and the `cmd_*` entry points behind them. Commands
//! print to stdout; `--json` switches to machine-readable output.

use crate::api::{AppState, create_router};
use crate::auth::TokenSigner;
use crate::config::{ConfigError, ServerConfig, load_tables};
use capstack_core::allocation;
use capstack_core::emergency;
use capstack_core::insights::{self, InsightSources};
use capstack_core::savings;
use capstack_core::storage::{Store, StoreError};
use capstack_core::{
    CoreError, FinancialProfile, ProfileSource, ScoringTables, UserId, health, income,
    resolve_profile, survival,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("database already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("database not found at {0} (run `capstack init` first)")]
    MissingDatabase(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Profile(#[from] CoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "capstack", version, about = "Personal-finance scoring server")]
pub struct Cli {
    /// Path to the database file
    #[arg(
        short,
        long,
        global = true,
        env = "CAPSTACK_DATABASE",
        default_value = "capstack.redb"
    )]
    pub database: PathBuf,

    /// Scoring tables JSON file (defaults to the built-in tables)
    #[arg(long, global = true, env = "CAPSTACK_TABLES")]
    pub tables: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServerConfig),

    /// Create an empty database
    Init {
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },

    /// Show row counts
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Run one calculator against a profile
    Score {
        kind: ScoreKind,

        /// Score the profile stored for this user
        #[arg(long, conflicts_with = "profile")]
        user: Option<u64>,

        /// Score a profile read from a JSON file
        #[arg(long)]
        profile: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Manage stored profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Store a profile from a JSON file
    Import {
        file: PathBuf,
        #[arg(long)]
        user: u64,
    },
    /// Print a user's profile (or the default profile)
    Show {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScoreKind {
    Health,
    Survival,
    Income,
    Allocation,
    Emergency,
    Insights,
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let db = cli.database.as_path();
    match cli.command {
        Commands::Serve(config) => {
            let tables = load_tables(cli.tables.as_deref())?;
            cmd_serve(db, tables, config).await
        }
        Commands::Init { force } => cmd_init(db, force),
        Commands::Status { json } => cmd_status(db, json),
        Commands::Score {
            kind,
            user,
            profile,
            json,
        } => {
            let tables = load_tables(cli.tables.as_deref())?;
            let input = load_profile_input(db, user.map(UserId), profile.as_deref())?;
            cmd_score(kind, &input, &tables, json)
        }
        Commands::Profile { action } => match action {
            ProfileCommand::Import { file, user } => cmd_profile_import(db, UserId(user), &file),
            ProfileCommand::Show { user, json } => cmd_profile_show(db, UserId(user), json),
        },
    }
}

// =============================================================================
// SERVER
// =============================================================================

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

/// Serve the HTTP API until Ctrl-C.
pub async fn cmd_serve(
    db_path: &Path,
    tables: ScoringTables,
    config: ServerConfig,
) -> Result<(), CliError> {
    let signer = TokenSigner::new(config.secret()?, config.token_ttl_hours);
    let addr = config.socket_addr()?;
    let store = Store::open(db_path)?;
    let app = create_router(AppState::new(store, tables, signer), &config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, database = %db_path.display(), "capstack listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

// =============================================================================
// DATABASE
// =============================================================================

/// Create the database file with all tables.
pub fn cmd_init(db_path: &Path, force: bool) -> Result<(), CliError> {
    if db_path.exists() {
        if !force {
            return Err(CliError::AlreadyExists(db_path.to_path_buf()));
        }
        std::fs::remove_file(db_path)?;
    }
    Store::open(db_path)?;
    println!("Initialized database at {}", db_path.display());
    Ok(())
}

fn open_existing(db_path: &Path) -> Result<Store, CliError> {
    if !db_path.exists() {
        return Err(CliError::MissingDatabase(db_path.to_path_buf()));
    }
    Ok(Store::open(db_path)?)
}

pub fn cmd_status(db_path: &Path, json: bool) -> Result<(), CliError> {
    let stats = open_existing(db_path)?.stats()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Database: {}", db_path.display());
        println!("  users:    {}", stats.users);
        println!("  profiles: {}", stats.profiles);
        println!("  plans:    {}", stats.plans);
        println!("  locks:    {}", stats.locks);
    }
    Ok(())
}

// =============================================================================
// PROFILES
// =============================================================================

fn read_profile_file(path: &Path) -> Result<FinancialProfile, CliError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// The profile to score: from a file, from the store, or the default.
pub fn load_profile_input(
    db_path: &Path,
    user: Option<UserId>,
    file: Option<&Path>,
) -> Result<FinancialProfile, CliError> {
    if let Some(file) = file {
        return read_profile_file(file);
    }
    let Some(user) = user else {
        return Ok(FinancialProfile::fallback());
    };
    let store = open_existing(db_path)?;
    let resolved = resolve_profile(&store, user);
    if let ProfileSource::Default { reason } = &resolved.source {
        tracing::warn!(%user, %reason, "falling back to default profile");
    }
    Ok(resolved.profile)
}

pub fn cmd_profile_import(db_path: &Path, user: UserId, file: &Path) -> Result<(), CliError> {
    let profile = read_profile_file(file)?;
    profile.validate()?;
    let store = open_existing(db_path)?;
    store.put_profile(user, &profile)?;
    println!("Stored profile for user {user}");
    Ok(())
}

pub fn cmd_profile_show(db_path: &Path, user: UserId, json: bool) -> Result<(), CliError> {
    let store = open_existing(db_path)?;
    let resolved = resolve_profile(&store, user);
    if json {
        println!("{}", serde_json::to_string_pretty(&resolved.profile)?);
        return Ok(());
    }
    let p = &resolved.profile;
    match &resolved.source {
        ProfileSource::Stored => println!("Profile for user {user}"),
        ProfileSource::Default { reason } => println!("Default profile ({reason})"),
    }
    println!("  monthly income:   {}", p.monthly_income);
    println!("  monthly expenses: {}", p.monthly_expenses);
    println!("  emergency fund:   {}", p.emergency_fund);
    println!("  debt:             {}", p.debt_amount);
    println!("  job stability:    {}/10", p.job_stability_score);
    println!("  risk tolerance:   {:?}", p.risk_tolerance);
    Ok(())
}

// =============================================================================
// SCORING
// =============================================================================

fn bullet_list(title: &str, items: &[String]) -> String {
    let mut out = format!("{title}:\n");
    for item in items {
        out.push_str(&format!("  - {item}\n"));
    }
    out
}

/// Render one calculator's result for `profile`.
pub fn render_score(
    kind: ScoreKind,
    profile: &FinancialProfile,
    tables: &ScoringTables,
    json: bool,
) -> Result<String, CliError> {
    let rendered = match kind {
        ScoreKind::Health => {
            let r = health::score_profile(profile, tables);
            if json {
                serde_json::to_string_pretty(&r)?
            } else {
                let c = &r.category_scores;
                format!(
                    "Health score: {} ({})\n  income stability:       {}\n  expense management:     {}\n  savings discipline:     {}\n  emergency preparedness: {}\n  debt management:        {}\n  investment strategy:    {}\n{}{}",
                    r.total_score,
                    r.grade,
                    c.income_stability,
                    c.expense_management,
                    c.savings_discipline,
                    c.emergency_preparedness,
                    c.debt_management,
                    c.investment_strategy,
                    bullet_list("Insights", &r.insights),
                    bullet_list("Recommendations", &r.recommendations),
                )
            }
        }
        ScoreKind::Survival => {
            let r = survival::estimate_profile(profile, tables);
            if json {
                serde_json::to_string_pretty(&r)?
            } else {
                let b = &r.breakdown;
                format!(
                    "Survival: {} months ({} risk)\n  conservative: {}\n  moderate:     {}\n  optimistic:   {}\n  job loss: {}, medical emergency: {}, market crash: {}\n{}",
                    r.months,
                    r.risk_level.as_str(),
                    b.conservative_months,
                    b.moderate_months,
                    b.optimistic_months,
                    r.scenarios.job_loss,
                    r.scenarios.medical_emergency,
                    r.scenarios.market_crash,
                    bullet_list("Recommendations", &r.recommendations),
                )
            }
        }
        ScoreKind::Income => {
            let r = income::score(profile, tables);
            if json {
                serde_json::to_string_pretty(&r)?
            } else {
                format!(
                    "Income score: {} ({}, {:?} risk)\n  next year: {}\n  five year: {}\n  confidence: {}\n{}{}",
                    r.total_score,
                    r.grade,
                    r.risk_level,
                    r.projections.next_year,
                    r.projections.five_year,
                    r.projections.confidence,
                    bullet_list("Insights", &r.insights),
                    bullet_list("Recommendations", &r.recommendations),
                )
            }
        }
        ScoreKind::Allocation => {
            let a = allocation::allocate(profile, tables);
            let f = allocation::formulas(profile, &a, tables);
            if json {
                serde_json::to_string_pretty(&serde_json::json!({
                    "allocation": a,
                    "formulas": f,
                }))?
            } else {
                format!(
                    "Allocation: SIP {}%, stocks {}%, bonds {}%, lifestyle {}%, emergency {}%\n  stability index: {}\n  investment risk: {}/10\n{}",
                    a.sip_percentage,
                    a.stocks_percentage,
                    a.bonds_percentage,
                    a.lifestyle_percentage,
                    a.emergency_fund_percentage,
                    f.stability_index,
                    f.investment_risk_score,
                    bullet_list("Reasoning", &a.reasoning),
                )
            }
        }
        ScoreKind::Emergency => {
            let t = &tables.emergency;
            let status = emergency::status(profile.emergency_fund, profile.monthly_expenses, t);
            let risk = emergency::depletion_risk(
                profile.emergency_fund,
                profile.monthly_expenses,
                profile.monthly_income,
                profile.job_stability_score,
            );
            if json {
                serde_json::to_string_pretty(&serde_json::json!({
                    "status": status,
                    "depletionRisk": risk,
                }))?
            } else {
                let coverage = status
                    .months_coverage
                    .map(|m| format!("{m} months"))
                    .unwrap_or_else(|| "unbounded".to_string());
                format!(
                    "Emergency fund: {:?} ({coverage})\n  {}\n{}",
                    status.status,
                    status.recommended_action,
                    bullet_list("Risk factors", &risk.factors),
                )
            }
        }
        ScoreKind::Insights => {
            let h = health::score_profile(profile, tables);
            let s = survival::estimate_profile(profile, tables);
            let i = income::score(profile, tables);
            let sv = savings::savings_status(
                Vec::new(),
                &[],
                profile.monthly_income,
                &tables.savings,
            );
            let report = insights::build_report(
                UserId(0),
                InsightSources {
                    health: &h,
                    survival: &s,
                    income: &i,
                    savings: &sv,
                },
                chrono::Utc::now().timestamp_millis(),
            );
            if json {
                serde_json::to_string_pretty(&report)?
            } else {
                report.to_text()
            }
        }
    };
    Ok(rendered)
}

pub fn cmd_score(
    kind: ScoreKind,
    profile: &FinancialProfile,
    tables: &ScoringTables,
    json: bool,
) -> Result<(), CliError> {
    println!("{}", render_score(kind, profile, tables, json)?);
    Ok(())
}
