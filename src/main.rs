//! Command-line front end for the tool hub
//!
//! Every subcommand prints JSON on stdout. Logs go to stderr and are
//! controlled with `RUST_LOG`.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use tool_hub_lib::config;
use tool_hub_lib::core::catalog::{self, ToolCategory};
use tool_hub_lib::core::features::currency::{parse_money, RateTable};
use tool_hub_lib::core::features::unit_converter::all_units;
use tool_hub_lib::core::{execute_tool_request, CalculationHistory};
use tool_hub_lib::shared::types::{
    CompoundInterestRequest, ConvertCurrencyRequest, ConvertTextRequest, ConvertUnitsRequest, EmiRequest,
    EvaluateRequest, SipRequest, ToolRequest,
};
use tool_hub_lib::{AppError, AppResult, AppSettings};

#[derive(Parser, Debug)]
#[command(name = "tool-hub")]
#[command(about = "Unit, currency and financial calculators", version)]
struct Cli {
    /// Do not record this run in the history
    #[arg(long, global = true)]
    no_history: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a value between two units
    Convert {
        amount: f64,
        from: String,
        to: String,
        /// Unit category (length, weight, temperature, ...)
        #[arg(long)]
        category: Option<String>,
    },
    /// Convert free text such as "5 km" into a target unit
    ConvertText { text: String, to: String },
    /// Monthly installment and amortization schedule
    Emi {
        principal: f64,
        /// Annual interest rate in percent
        rate: f64,
        /// Tenure in years
        years: f64,
        /// Print every month of the schedule
        #[arg(long)]
        full_schedule: bool,
    },
    /// Future value of a monthly investment
    Sip {
        monthly: f64,
        /// Expected annual return in percent
        rate: f64,
        years: u32,
    },
    /// Lump-sum compound interest
    Compound {
        principal: f64,
        /// Annual rate in percent
        rate: f64,
        years: u32,
        /// Compounding periods per year
        #[arg(long, default_value = "12")]
        frequency: u32,
    },
    /// Convert money, e.g. `currency "$10" EUR`
    Currency {
        amount: String,
        to: Option<String>,
        /// Source currency when the amount carries no symbol
        #[arg(long)]
        from: Option<String>,
    },
    /// Evaluate an arithmetic expression
    Eval { expression: String },
    /// Search the tool catalog
    Search {
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        popular: bool,
    },
    /// List units, optionally for one category
    Units {
        #[arg(long)]
        category: Option<String>,
    },
    /// List supported currency codes
    Currencies,
    /// Run a catalog entry with its default inputs
    Run { entry: String },
    /// Show or clear the calculation history
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Manage favorite catalog entries
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },
}

#[derive(Subcommand, Debug)]
enum FavoriteAction {
    Add { entry: String },
    Remove { entry: String },
    List,
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_request(command: &Command, settings: &AppSettings) -> AppResult<Option<ToolRequest>> {
    let request = match command {
        Command::Convert { amount, from, to, category } => ToolRequest::ConvertUnit(ConvertUnitsRequest {
            amount: *amount,
            from_unit: from.clone(),
            to_unit: to.clone(),
            category: category.clone(),
        }),
        Command::ConvertText { text, to } => ToolRequest::ConvertText(ConvertTextRequest {
            text: text.clone(),
            target_unit: to.clone(),
        }),
        Command::Emi { principal, rate, years, .. } => ToolRequest::CalculateEmi(EmiRequest {
            principal: *principal,
            annual_rate_percent: *rate,
            tenure_years: *years,
        }),
        Command::Sip { monthly, rate, years } => ToolRequest::CalculateSip(SipRequest {
            monthly_investment: *monthly,
            annual_return_percent: *rate,
            years: *years,
        }),
        Command::Compound { principal, rate, years, frequency } => {
            ToolRequest::CalculateCompoundInterest(CompoundInterestRequest {
                principal: *principal,
                annual_rate_percent: *rate,
                years: *years,
                compounding_frequency: *frequency,
            })
        }
        Command::Currency { amount, to, from } => {
            let default_from = from.as_deref().unwrap_or(&settings.preferences.default_currency_from);
            let (amount, from): (Decimal, String) = parse_money(amount, default_from)
                .ok_or_else(|| AppError::Parse(format!("Could not read an amount from '{}'", amount)))?;
            ToolRequest::ConvertCurrency(ConvertCurrencyRequest {
                amount,
                from,
                to: to.clone().unwrap_or_else(|| settings.preferences.default_currency_to.clone()),
            })
        }
        Command::Eval { expression } => ToolRequest::Evaluate(EvaluateRequest {
            expression: expression.clone(),
        }),
        Command::Run { entry } => config::default_request(entry, settings)
            .ok_or_else(|| AppError::Validation(format!("Unknown catalog entry: {}", entry)))?,
        _ => return Ok(None),
    };
    Ok(Some(request))
}

fn run(cli: Cli) -> AppResult<()> {
    let mut settings = AppSettings::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load settings, using defaults");
        AppSettings::default()
    });
    if let Command::Emi { full_schedule: true, .. } = cli.command {
        settings.schedule.row_cap = None;
    }

    if let Some(request) = build_request(&cli.command, &settings)? {
        let response = execute_tool_request(&request, &settings)?;
        if !cli.no_history {
            let history = CalculationHistory::open(&settings.history);
            if let Err(e) = history.record(&request, &response) {
                tracing::warn!(error = %e, "failed to record history");
            }
        }
        return print_json(&response);
    }

    match cli.command {
        Command::Search { query, category, popular } => {
            let history = CalculationHistory::open(&settings.history);
            let metrics = history.usage_metrics().unwrap_or_default();
            let wanted = match category.as_deref() {
                Some(id) => Some(
                    ToolCategory::from_id(id).ok_or_else(|| AppError::CategoryNotFound(id.to_string()))?,
                ),
                None => None,
            };
            let hits: Vec<_> = catalog::search_with_usage(&query, &metrics)
                .into_iter()
                .filter(|entry| wanted.map_or(true, |c| entry.category == c))
                .filter(|entry| !popular || entry.popular)
                .collect();
            print_json(&hits)
        }
        Command::Units { category } => {
            let units: Vec<_> = all_units()
                .into_iter()
                .filter(|unit| category.as_deref().map_or(true, |c| unit.category == c))
                .collect();
            if units.is_empty() {
                if let Some(id) = category {
                    return Err(AppError::CategoryNotFound(id));
                }
            }
            print_json(&units)
        }
        Command::Currencies => print_json(&RateTable::snapshot().codes()),
        Command::History { clear } => {
            let history = CalculationHistory::open(&settings.history);
            if clear {
                history.clear()?;
            }
            print_json(&history.recent()?)
        }
        Command::Favorite { action } => {
            let history = CalculationHistory::open(&settings.history);
            match action {
                FavoriteAction::Add { entry } => {
                    history.add_favorite(&entry)?;
                }
                FavoriteAction::Remove { entry } => {
                    history.remove_favorite(&entry)?;
                }
                FavoriteAction::List => {}
            }
            print_json(&history.favorites()?)
        }
        _ => Ok(()),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("{}", serde_json::to_string(&e).unwrap_or_else(|_| e.to_string()));
            ExitCode::FAILURE
        }
    }
}
