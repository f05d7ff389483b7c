//! Seed helpers for unit tests.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::error::AppResult;
use crate::models::{
    ApprovalStatus, Contract, ContractStatus, Contractor, District, Indicator, IndicatorCategory,
    Jamoat, LocalizedText, Project, Role, RoleKind, User, Village, WorkProgress,
};

use super::record::enum_text;
use super::{WriteContext, queries, repo};

fn next_number(conn: &Connection, table: &str) -> AppResult<i64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
    Ok(count + 1)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn seed_user(conn: &mut Connection, username: &str, kind: RoleKind) -> AppResult<User> {
    let ctx = WriteContext::now(0);
    let existing: Option<i64> = conn
        .query_row("SELECT id FROM roles WHERE kind = ?1", [enum_text(&kind)], |row| row.get(0))
        .optional()?;
    let role_id = match existing {
        Some(id) => id,
        None => {
            repo::insert(conn, Role { id: 0, name: enum_text(&kind), kind }, &ctx)?.id
        }
    };
    repo::insert(
        conn,
        User {
            id: 0,
            username: username.to_string(),
            full_name: username.to_uppercase(),
            email: None,
            role_id,
            supervisor_id: None,
            is_active: true,
        },
        &ctx,
    )
}

pub fn seed_contract(conn: &mut Connection, curator_id: Option<i64>) -> AppResult<Contract> {
    let ctx = WriteContext::now(0);
    let n = next_number(conn, "contracts")?;
    let project = repo::insert(
        conn,
        Project {
            id: 0,
            code: format!("P-{}", n),
            name: LocalizedText::new("Проект", "", "Project"),
            donor: "IDA".to_string(),
            start_date: date(2024, 1, 1),
            end_date: None,
            budget: Decimal::new(10_000_000, 0),
        },
        &ctx,
    )?;
    let contractor = repo::insert(
        conn,
        Contractor {
            id: 0,
            name: "Sohtmon LLC".to_string(),
            tax_id: format!("5200000{}", n),
            address: None,
            contact_person: None,
            phone: None,
            email: None,
        },
        &ctx,
    )?;
    repo::insert(
        conn,
        Contract {
            id: 0,
            number: format!("W-{:02}", n),
            title: "Water supply".to_string(),
            project_id: project.id,
            sub_component_id: None,
            contractor_id: contractor.id,
            curator_id,
            signing_date: date(2025, 1, 1),
            contract_end_date: date(2025, 12, 31),
            extended_to_date: None,
            contract_amount: Decimal::new(1_000_000, 0),
            additional_amount: Decimal::ZERO,
            saved_amount: Decimal::ZERO,
            currency: "TJS".to_string(),
            status: ContractStatus::Active,
        },
        &ctx,
    )
}

pub fn seed_report(
    conn: &mut Connection,
    ctx: &WriteContext,
    contract_id: i64,
    number: &str,
) -> AppResult<WorkProgress> {
    let report: WorkProgress = serde_json::from_value(serde_json::json!({
        "contract_id": contract_id,
        "report_number": number,
        "report_date": "2025-05-31",
        "progress_percent": "30",
        "completed_amount": "300000"
    }))
    .unwrap();
    repo::insert(conn, report, ctx)
}

pub fn set_status(conn: &Connection, report: &WorkProgress, status: ApprovalStatus) -> AppResult<()> {
    let mut moved = report.clone();
    moved.approval_status = status;
    queries::save_workflow_state(conn, &moved)
}

pub fn seed_indicator(conn: &mut Connection, code: &str) -> AppResult<Indicator> {
    repo::insert(
        conn,
        Indicator {
            id: 0,
            code: code.to_string(),
            name: LocalizedText::new("Отремонтированные школы", "", "Schools rehabilitated"),
            category: IndicatorCategory::Intermediate,
            unit: "schools".to_string(),
            baseline_value: Decimal::ZERO,
            target_value: Decimal::new(20, 0),
        },
        &WriteContext::now(0),
    )
}

pub fn seed_village(conn: &mut Connection) -> AppResult<Village> {
    let ctx = WriteContext::now(0);
    let d = repo::insert(conn, District { id: 0, name: LocalizedText::new("Рашт", "", "") }, &ctx)?;
    let j = repo::insert(
        conn,
        Jamoat { id: 0, district_id: d.id, name: LocalizedText::new("Навдонак", "", "") },
        &ctx,
    )?;
    repo::insert(
        conn,
        Village {
            id: 0,
            jamoat_id: j.id,
            name: LocalizedText::new("Ғарм", "", ""),
            population: Some(900),
            households: Some(140),
        },
        &ctx,
    )
}
