//! Contract and project reports.
//!
//! Reports are read-only views assembled from stored records and the
//! derived figures in [`crate::calculation`]. Localized names are resolved
//! in the configured report language.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rusqlite::Connection;
use serde::Serialize;

use crate::calculation::{ContractFinancials, checked_add, checked_sum, progress_percent};
use crate::db::{queries, repo};
use crate::error::AppResult;
use crate::models::{
    ApprovalStatus, Contract, ContractIndicator, Contractor, Indicator, Language, Project,
};

/// Number of reports in one approval status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    /// Approval status.
    pub status: ApprovalStatus,
    /// Number of reports in it.
    pub count: i64,
}

/// Progress against one indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorLine {
    /// Indicator id.
    pub indicator_id: i64,
    /// Indicator code.
    pub code: String,
    /// Name in the report language.
    pub name: String,
    /// Unit of measure.
    pub unit: String,
    /// Target.
    pub target_value: Decimal,
    /// Value counted from finally approved reports.
    pub achieved_value: Decimal,
    /// Achieved value in percent of the target.
    pub progress_percent: Decimal,
}

/// Everything known about one contract.
#[derive(Debug, Clone, Serialize)]
pub struct ContractReport {
    /// The contract record.
    pub contract: Contract,
    /// Name of the contractor.
    pub contractor_name: String,
    /// Derived amounts and dates.
    pub financials: ContractFinancials,
    /// Progress per contract indicator.
    pub indicators: Vec<IndicatorLine>,
    /// Physical progress of the latest finally approved report.
    pub latest_progress_percent: Option<Decimal>,
    /// Date of that report.
    pub latest_report_date: Option<NaiveDate>,
    /// Reports per approval status.
    pub status_counts: Vec<StatusCount>,
}

/// One contract line of a project report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractSummary {
    /// Contract id.
    pub contract_id: i64,
    /// Contract number.
    pub number: String,
    /// Contract title.
    pub title: String,
    /// Final contract amount.
    pub final_amount: Decimal,
    /// Paid so far.
    pub paid_amount: Decimal,
    /// Paid amount in percent of the final amount.
    pub paid_percent: Decimal,
    /// Days to the effective end date.
    pub remaining_days: i64,
}

/// Totals over every contract of a project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    /// Project id.
    pub project_id: i64,
    /// Project code.
    pub code: String,
    /// Project name in the report language.
    pub name: String,
    /// Project budget.
    pub budget: Decimal,
    /// Number of contracts.
    pub contract_count: usize,
    /// Sum of final contract amounts.
    pub total_contract_amount: Decimal,
    /// Sum of paid amounts.
    pub total_paid_amount: Decimal,
    /// Paid total in percent of the contract total.
    pub paid_percent: Decimal,
    /// Share of the budget committed to contracts.
    pub budget_utilization_percent: Decimal,
    /// One line per contract.
    pub contracts: Vec<ContractSummary>,
    /// Reports per approval status.
    pub status_counts: Vec<StatusCount>,
    /// Contract indicators summed per indicator.
    pub indicators: Vec<IndicatorLine>,
}

fn status_lines(counts: Vec<(ApprovalStatus, i64)>) -> Vec<StatusCount> {
    counts
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect()
}

fn contract_indicators(conn: &Connection, contract_id: i64) -> AppResult<Vec<ContractIndicator>> {
    repo::list(conn, &[("contract_id".to_string(), contract_id.to_string())])
}

fn indicator_line(
    indicator: &Indicator,
    target_value: Decimal,
    achieved_value: Decimal,
    language: Language,
) -> AppResult<IndicatorLine> {
    Ok(IndicatorLine {
        indicator_id: indicator.id,
        code: indicator.code.clone(),
        name: indicator.name.resolve(language).to_string(),
        unit: indicator.unit.clone(),
        target_value,
        achieved_value,
        progress_percent: progress_percent(achieved_value, target_value)?,
    })
}

/// Builds the report of contract `contract_id` as of `today`.
pub fn contract_report(
    conn: &Connection,
    contract_id: i64,
    today: NaiveDate,
    language: Language,
) -> AppResult<ContractReport> {
    let contract: Contract = repo::get(conn, contract_id)?;
    let contractor: Contractor = repo::get(conn, contract.contractor_id)?;
    let payments = queries::payments_for_contract(conn, contract_id)?;
    let financials = ContractFinancials::compute(&contract, &payments, today)?;

    let mut indicators = Vec::new();
    for ci in contract_indicators(conn, contract_id)? {
        let indicator: Indicator = repo::get(conn, ci.indicator_id)?;
        indicators.push(indicator_line(
            &indicator,
            ci.target_value,
            ci.achieved_value,
            language,
        )?);
    }

    let latest = queries::latest_approved_progress(conn, contract_id)?;
    Ok(ContractReport {
        contractor_name: contractor.name,
        financials,
        indicators,
        latest_progress_percent: latest.as_ref().map(|wp| wp.progress_percent),
        latest_report_date: latest.as_ref().map(|wp| wp.report_date),
        status_counts: status_lines(queries::status_counts(conn, &[contract_id])?),
        contract,
    })
}

/// Builds the report of project `project_id` as of `today`.
pub fn project_report(
    conn: &Connection,
    project_id: i64,
    today: NaiveDate,
    language: Language,
) -> AppResult<ProjectReport> {
    let project: Project = repo::get(conn, project_id)?;
    let contracts: Vec<Contract> =
        repo::list(conn, &[("project_id".to_string(), project_id.to_string())])?;

    let mut summaries = Vec::with_capacity(contracts.len());
    let mut indicators: Vec<(Indicator, Decimal, Decimal)> = Vec::new();
    for contract in &contracts {
        let payments = queries::payments_for_contract(conn, contract.id)?;
        let figures = ContractFinancials::compute(contract, &payments, today)?;
        summaries.push(ContractSummary {
            contract_id: contract.id,
            number: contract.number.clone(),
            title: contract.title.clone(),
            final_amount: figures.final_amount,
            paid_amount: figures.paid_amount,
            paid_percent: figures.paid_percent,
            remaining_days: figures.remaining_days,
        });

        for ci in contract_indicators(conn, contract.id)? {
            match indicators.iter_mut().find(|(i, _, _)| i.id == ci.indicator_id) {
                Some((_, target, achieved)) => {
                    *target = checked_add(*target, ci.target_value, "target_value")?;
                    *achieved = checked_add(*achieved, ci.achieved_value, "achieved_value")?;
                }
                None => {
                    let indicator: Indicator = repo::get(conn, ci.indicator_id)?;
                    indicators.push((indicator, ci.target_value, ci.achieved_value));
                }
            }
        }
    }
    indicators.sort_by(|a, b| a.0.code.cmp(&b.0.code));

    let total_contract_amount =
        checked_sum(summaries.iter().map(|s| s.final_amount), "total_contract_amount")?;
    let total_paid_amount =
        checked_sum(summaries.iter().map(|s| s.paid_amount), "total_paid_amount")?;
    let contract_ids: Vec<i64> = contracts.iter().map(|c| c.id).collect();

    Ok(ProjectReport {
        project_id: project.id,
        code: project.code.clone(),
        name: project.name.resolve(language).to_string(),
        budget: project.budget,
        contract_count: contracts.len(),
        total_contract_amount,
        total_paid_amount,
        paid_percent: progress_percent(total_paid_amount, total_contract_amount)?,
        budget_utilization_percent: progress_percent(total_contract_amount, project.budget)?,
        contracts: summaries,
        status_counts: status_lines(queries::status_counts(conn, &contract_ids)?),
        indicators: indicators
            .iter()
            .map(|(indicator, target, achieved)| {
                indicator_line(indicator, *target, *achieved, language)
            })
            .collect::<AppResult<_>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{date, seed_contract, seed_indicator, seed_report, seed_user};
    use crate::db::{Database, WriteContext};
    use crate::error::AppError;
    use crate::models::{
        ContractIndicatorProgress, Payment, PaymentStatus, PaymentType, RoleKind,
    };

    fn count(lines: &[StatusCount], status: ApprovalStatus) -> i64 {
        lines
            .iter()
            .find(|l| l.status == status)
            .map(|l| l.count)
            .unwrap_or_default()
    }

    #[test]
    fn test_contract_report_combines_finance_indicators_and_status() {
        let db = Database::open_in_memory().unwrap();
        let (contract_id, project_id) = db
            .with_conn_mut(|conn| {
                let curator = seed_user(conn, "curator", RoleKind::Curator)?;
                let ctx = WriteContext::now(curator.id);
                let contract = seed_contract(conn, Some(curator.id))?;
                let indicator = seed_indicator(conn, "IR-2")?;
                let ci = repo::insert(
                    conn,
                    ContractIndicator {
                        id: 0,
                        contract_id: contract.id,
                        indicator_id: indicator.id,
                        target_value: Decimal::new(8, 0),
                        achieved_value: Decimal::ZERO,
                    },
                    &ctx,
                )?;
                let approved = seed_report(conn, &ctx, contract.id, "AVR-1")?;
                repo::insert(
                    conn,
                    ContractIndicatorProgress {
                        id: 0,
                        contract_indicator_id: ci.id,
                        work_progress_id: approved.id,
                        value: Decimal::new(3, 0),
                        notes: None,
                    },
                    &ctx,
                )?;
                crate::db::test_support::set_status(conn, &approved, ApprovalStatus::DirectorApproved)?;
                queries::refresh_contract_indicators(conn, contract.id)?;
                seed_report(conn, &ctx, contract.id, "AVR-2")?;

                repo::insert(
                    conn,
                    Payment {
                        id: 0,
                        contract_id: contract.id,
                        work_progress_id: Some(approved.id),
                        amount: Decimal::new(250_000, 0),
                        payment_date: date(2025, 6, 15),
                        payment_type: PaymentType::Interim,
                        status: PaymentStatus::Paid,
                        description: None,
                    },
                    &ctx,
                )?;
                Ok((contract.id, contract.project_id))
            })
            .unwrap();

        let report = db
            .with_conn(|conn| contract_report(conn, contract_id, date(2025, 12, 1), Language::En))
            .unwrap();
        assert_eq!(report.contractor_name, "Sohtmon LLC");
        assert_eq!(report.financials.paid_percent, Decimal::new(25, 0));
        assert_eq!(report.financials.remaining_days, 30);
        assert_eq!(report.indicators.len(), 1);
        assert_eq!(report.indicators[0].name, "Schools rehabilitated");
        assert_eq!(report.indicators[0].progress_percent, Decimal::new(3750, 2));
        assert_eq!(report.latest_progress_percent, Some(Decimal::new(30, 0)));
        assert_eq!(count(&report.status_counts, ApprovalStatus::Draft), 1);
        assert_eq!(count(&report.status_counts, ApprovalStatus::DirectorApproved), 1);

        let project = db
            .with_conn(|conn| project_report(conn, project_id, date(2025, 12, 1), Language::Ru))
            .unwrap();
        assert_eq!(project.contract_count, 1);
        assert_eq!(project.total_paid_amount, Decimal::new(250_000, 0));
        assert_eq!(project.paid_percent, Decimal::new(25, 0));
        assert_eq!(project.budget_utilization_percent, Decimal::new(10, 0));
        assert_eq!(project.indicators[0].achieved_value, Decimal::new(3, 0));
        assert_eq!(project.indicators[0].name, "Отремонтированные школы");
    }

    #[test]
    fn test_contract_without_reports_has_no_latest_progress() {
        let db = Database::open_in_memory().unwrap();
        let contract = db.with_conn_mut(|conn| seed_contract(conn, None)).unwrap();
        let report = db
            .with_conn(|conn| contract_report(conn, contract.id, date(2025, 1, 1), Language::Ru))
            .unwrap();
        assert_eq!(report.latest_progress_percent, None);
        assert!(report.indicators.is_empty());
        assert!(report.status_counts.iter().all(|s| s.count == 0));
    }

    #[test]
    fn test_unknown_project_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let result = db.with_conn(|conn| project_report(conn, 42, date(2025, 1, 1), Language::Ru));
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }
}
