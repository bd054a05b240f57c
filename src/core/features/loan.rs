//! EMI (equated monthly installment) calculator with amortization schedule

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::{AppSettings, ScheduleSettings};
use crate::shared::types::{AmortizationRow, LoanCalculationResult, ToolRequest, ToolResponse};
use super::{require_finite_non_negative, Tool};
use serde_json::json;

/// Rows rendered by default; long tenures are truncated for display
pub const DEFAULT_SCHEDULE_ROWS: usize = 60;

/// Upper bound on rendered rows (1000 years of months)
pub const MAX_SCHEDULE_ROWS: usize = 12_000;

/// Shape of the generated amortization schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOptions {
    /// Maximum number of rows; `None` renders the whole tenure
    pub row_cap: Option<usize>,
    /// Also build rows when the rate is zero (each row is pure principal)
    pub zero_rate_schedule: bool,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            row_cap: Some(DEFAULT_SCHEDULE_ROWS),
            zero_rate_schedule: false,
        }
    }
}

impl From<&ScheduleSettings> for ScheduleOptions {
    fn from(settings: &ScheduleSettings) -> Self {
        Self {
            row_cap: settings.row_cap,
            zero_rate_schedule: settings.zero_rate_schedule,
        }
    }
}

/// EMI with the default schedule: 60 rows, none at zero rate
pub fn calculate_emi(principal: f64, annual_rate_percent: f64, tenure_years: f64) -> AppResult<LoanCalculationResult> {
    calculate_emi_with(principal, annual_rate_percent, tenure_years, &ScheduleOptions::default())
}

pub fn calculate_emi_with(
    principal: f64,
    annual_rate_percent: f64,
    tenure_years: f64,
    options: &ScheduleOptions,
) -> AppResult<LoanCalculationResult> {
    require_finite_non_negative("principal", principal)?;
    require_finite_non_negative("annual rate", annual_rate_percent)?;
    require_finite_non_negative("tenure", tenure_years)?;

    let r = annual_rate_percent / 100.0 / 12.0;
    let n = tenure_years * 12.0;
    if n <= 0.0 {
        return Err(AppError::Validation("Tenure must be greater than zero".to_string()));
    }

    if r == 0.0 {
        let emi = principal / n;
        let schedule = if options.zero_rate_schedule {
            build_schedule(principal, emi, r, n, options.row_cap)?
        } else {
            Vec::new()
        };
        return Ok(LoanCalculationResult {
            monthly_payment: emi,
            total_interest: 0.0,
            total_amount: principal,
            schedule,
        });
    }

    // P*r / (1 - (1+r)^-n): stays finite when (1+r)^n would overflow
    let emi = principal * r / (1.0 - (1.0 + r).powf(-n));
    let total_amount = emi * n;
    let total_interest = total_amount - principal;

    tracing::debug!(principal, annual_rate_percent, tenure_years, emi, "computed EMI");

    Ok(LoanCalculationResult {
        monthly_payment: emi,
        total_interest,
        total_amount,
        schedule: build_schedule(principal, emi, r, n, options.row_cap)?,
    })
}

fn build_schedule(
    principal: f64,
    emi: f64,
    r: f64,
    n: f64,
    row_cap: Option<usize>,
) -> AppResult<Vec<AmortizationRow>> {
    let months = n.floor() as usize;
    let rows = row_cap.map_or(months, |cap| months.min(cap));
    if rows > MAX_SCHEDULE_ROWS {
        return Err(AppError::Validation(format!(
            "Schedule of {} months exceeds the {} row limit; set a row cap",
            rows, MAX_SCHEDULE_ROWS
        )));
    }

    let mut balance = principal;
    let mut schedule = Vec::with_capacity(rows);
    for month in 1..=rows {
        let interest = balance * r;
        let principal_part = emi - interest;
        balance = (balance - principal_part).max(0.0);
        schedule.push(AmortizationRow {
            month: month as u32,
            payment: emi,
            principal: principal_part,
            interest,
            balance,
        });
    }
    Ok(schedule)
}

#[derive(Clone)]
pub struct LoanTool;

impl Tool for LoanTool {
    fn id(&self) -> &'static str {
        "emi_calculator"
    }

    fn handles(&self, request: &ToolRequest) -> bool {
        matches!(request, ToolRequest::CalculateEmi(_))
    }

    fn execute(&self, request: &ToolRequest, settings: &AppSettings) -> AppResult<ToolResponse> {
        let ToolRequest::CalculateEmi(req) = request else {
            return Err(AppError::UnsupportedAction(request.kind().to_string()));
        };

        let options = ScheduleOptions::from(&settings.schedule);
        let result = calculate_emi_with(req.principal, req.annual_rate_percent, req.tenure_years, &options)?;

        Ok(ToolResponse {
            tool_id: self.id().to_string(),
            summary: format!("EMI {:.2} / month", result.monthly_payment),
            data: json!(result),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_home_loan() {
        let result = calculate_emi(500_000.0, 8.5, 20.0).unwrap();
        assert_relative_eq!(result.monthly_payment, 4339.116166827671, epsilon = 1e-6);
        assert_relative_eq!(result.total_amount, result.monthly_payment * 240.0, max_relative = 1e-12);
        assert_relative_eq!(result.total_interest, result.total_amount - 500_000.0, max_relative = 1e-12);
        assert_eq!(result.schedule.len(), 60);
    }

    #[test]
    fn test_truncated_schedule_invariants() {
        let result = calculate_emi(500_000.0, 8.5, 20.0).unwrap();
        let schedule = &result.schedule;

        assert_eq!(schedule.first().map(|r| r.month), Some(1));
        assert_eq!(schedule.last().map(|r| r.month), Some(60));
        for pair in schedule.windows(2) {
            assert!(pair[1].balance < pair[0].balance, "balance must strictly decrease");
        }
        for row in schedule {
            assert_relative_eq!(row.payment, row.principal + row.interest, max_relative = 1e-12);
        }
        assert_relative_eq!(schedule[59].balance, 440635.9155478886, epsilon = 1e-4);
    }

    #[test]
    fn test_full_schedule_pays_off_loan() {
        let options = ScheduleOptions { row_cap: None, zero_rate_schedule: false };
        let result = calculate_emi_with(250_000.0, 7.2, 15.0, &options).unwrap();

        assert_eq!(result.schedule.len(), 180);
        let repaid: f64 = result.schedule.iter().map(|r| r.principal).sum();
        assert_relative_eq!(repaid, 250_000.0, max_relative = 1e-9);
        let last = result.schedule.last().unwrap();
        assert!(last.balance >= 0.0 && last.balance < 1e-6);
    }

    #[test]
    fn test_short_loan_has_fewer_rows_than_cap() {
        let result = calculate_emi(10_000.0, 12.0, 1.0).unwrap();
        assert_eq!(result.schedule.len(), 12);
    }

    #[test]
    fn test_zero_rate_defaults_to_empty_schedule() {
        let result = calculate_emi(120_000.0, 0.0, 10.0).unwrap();
        assert_eq!(result.monthly_payment, 1000.0);
        assert_eq!(result.total_interest, 0.0);
        assert_eq!(result.total_amount, 120_000.0);
        assert!(result.schedule.is_empty());
    }

    #[test]
    fn test_zero_rate_schedule_when_enabled() {
        let options = ScheduleOptions { row_cap: Some(60), zero_rate_schedule: true };
        let result = calculate_emi_with(120_000.0, 0.0, 10.0, &options).unwrap();

        assert_eq!(result.schedule.len(), 60);
        let first = &result.schedule[0];
        assert_eq!(first.interest, 0.0);
        assert_eq!(first.principal, 1000.0);
        assert_eq!(first.balance, 119_000.0);
        assert_eq!(result.schedule[59].balance, 60_000.0);
    }

    #[test]
    fn test_oversized_full_schedule_is_rejected() {
        let options = ScheduleOptions { row_cap: None, zero_rate_schedule: true };
        assert!(matches!(
            calculate_emi_with(100_000.0, 0.0, 1e15, &options),
            Err(AppError::Validation(_))
        ));

        let options = ScheduleOptions { row_cap: Some(usize::MAX), zero_rate_schedule: false };
        assert!(matches!(
            calculate_emi_with(100_000.0, 8.0, 1e15, &options),
            Err(AppError::Validation(_))
        ));

        let options = ScheduleOptions { row_cap: None, zero_rate_schedule: false };
        let result = calculate_emi_with(100_000.0, 6.0, 1000.0, &options).unwrap();
        assert_eq!(result.schedule.len(), MAX_SCHEDULE_ROWS);
    }

    #[test]
    fn test_capped_schedule_on_huge_tenure() {
        let result = calculate_emi(100_000.0, 0.0, 1e15).unwrap();
        assert!(result.schedule.is_empty());

        let options = ScheduleOptions { row_cap: Some(12), zero_rate_schedule: true };
        let result = calculate_emi_with(100_000.0, 0.0, 1e15, &options).unwrap();
        assert_eq!(result.schedule.len(), 12);
    }

    #[test]
    fn test_very_long_tenure_stays_finite() {
        let result = calculate_emi(100_000.0, 12.0, 6000.0).unwrap();
        // Interest-only limit: P * r
        assert_relative_eq!(result.monthly_payment, 1000.0, max_relative = 1e-12);
        assert!(result.total_amount.is_finite());
        assert!(result.total_interest.is_finite());
        assert_eq!(result.schedule.len(), 60);
        assert!(result.schedule.iter().all(|row| row.balance.is_finite()));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(matches!(calculate_emi(-1.0, 8.5, 20.0), Err(AppError::Validation(_))));
        assert!(matches!(calculate_emi(1000.0, -2.0, 20.0), Err(AppError::Validation(_))));
        assert!(matches!(calculate_emi(1000.0, 8.5, 0.0), Err(AppError::Validation(_))));
        assert!(matches!(calculate_emi(f64::NAN, 8.5, 20.0), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_tool_uses_schedule_settings() {
        let mut settings = AppSettings::default();
        settings.schedule.row_cap = Some(12);
        let request = ToolRequest::CalculateEmi(crate::shared::types::EmiRequest {
            principal: 500_000.0,
            annual_rate_percent: 8.5,
            tenure_years: 20.0,
        });

        let response = LoanTool.execute(&request, &settings).unwrap();
        assert_eq!(response.tool_id, "emi_calculator");
        assert_eq!(response.summary, "EMI 4339.12 / month");
        assert_eq!(response.data["schedule"].as_array().map(Vec::len), Some(12));
    }
}
