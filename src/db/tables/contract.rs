use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::db::queries::{self, approval_status};
use crate::db::record::{
    Record, WriteContext, decimal, decimal_text, enum_column, enum_text, ensure_exists,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    ApprovalStatus, Contract, Contractor, MenuKey, Payment, ProcurementPlan, Project,
    SubComponent, User, WorkProgress,
};

impl Record for Contractor {
    const TABLE: &'static str = "contractors";
    const ENTITY: &'static str = "contractor";
    const MENU: MenuKey = MenuKey::Contractors;
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "tax_id",
        "address",
        "contact_person",
        "phone",
        "email",
    ];
    const FILTERS: &'static [&'static str] = &["tax_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            tax_id: row.get("tax_id")?,
            address: row.get("address")?,
            contact_person: row.get("contact_person")?,
            phone: row.get("phone")?,
            email: row.get("email")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.name.clone()),
            Box::new(self.tax_id.clone()),
            Box::new(self.address.clone()),
            Box::new(self.contact_person.clone()),
            Box::new(self.phone.clone()),
            Box::new(self.email.clone()),
        ]
    }

    fn check(&self, _conn: &Connection) -> AppResult<()> {
        self.validate()
    }
}

impl Record for Contract {
    const TABLE: &'static str = "contracts";
    const ENTITY: &'static str = "contract";
    const MENU: MenuKey = MenuKey::Contracts;
    const COLUMNS: &'static [&'static str] = &[
        "number",
        "title",
        "project_id",
        "sub_component_id",
        "contractor_id",
        "curator_id",
        "signing_date",
        "contract_end_date",
        "extended_to_date",
        "contract_amount",
        "additional_amount",
        "saved_amount",
        "currency",
        "status",
    ];
    const FILTERS: &'static [&'static str] = &[
        "project_id",
        "sub_component_id",
        "contractor_id",
        "curator_id",
        "status",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            number: row.get("number")?,
            title: row.get("title")?,
            project_id: row.get("project_id")?,
            sub_component_id: row.get("sub_component_id")?,
            contractor_id: row.get("contractor_id")?,
            curator_id: row.get("curator_id")?,
            signing_date: row.get("signing_date")?,
            contract_end_date: row.get("contract_end_date")?,
            extended_to_date: row.get("extended_to_date")?,
            contract_amount: decimal(row, "contract_amount")?,
            additional_amount: decimal(row, "additional_amount")?,
            saved_amount: decimal(row, "saved_amount")?,
            currency: row.get("currency")?,
            status: enum_column(row, "status")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.number.clone()),
            Box::new(self.title.clone()),
            Box::new(self.project_id),
            Box::new(self.sub_component_id),
            Box::new(self.contractor_id),
            Box::new(self.curator_id),
            Box::new(self.signing_date),
            Box::new(self.contract_end_date),
            Box::new(self.extended_to_date),
            Box::new(decimal_text(self.contract_amount)),
            Box::new(decimal_text(self.additional_amount)),
            Box::new(decimal_text(self.saved_amount)),
            Box::new(self.currency.trim().to_uppercase()),
            Box::new(enum_text(&self.status)),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        self.validate()?;
        ensure_exists(conn, Project::TABLE, Project::ENTITY, self.project_id)?;
        ensure_exists(conn, Contractor::TABLE, Contractor::ENTITY, self.contractor_id)?;
        if let Some(curator_id) = self.curator_id {
            ensure_exists(conn, User::TABLE, "curator", curator_id)?;
        }
        if let Some(sub_component_id) = self.sub_component_id {
            let owner: Option<i64> = conn
                .query_row(
                    "SELECT c.project_id FROM sub_components s
                     JOIN components c ON c.id = s.component_id WHERE s.id = ?1",
                    [sub_component_id],
                    |row| row.get(0),
                )
                .optional()?;
            match owner {
                None => {
                    return Err(AppError::validation(
                        Self::ENTITY,
                        "sub_component_id",
                        format!("{} {} does not exist", SubComponent::ENTITY, sub_component_id),
                    ));
                }
                Some(project_id) if project_id != self.project_id => {
                    return Err(AppError::validation(
                        Self::ENTITY,
                        "sub_component_id",
                        "belongs to another project",
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl Record for WorkProgress {
    const TABLE: &'static str = "work_progress";
    const ENTITY: &'static str = "work progress";
    const MENU: MenuKey = MenuKey::WorkProgress;
    const COLUMNS: &'static [&'static str] = &[
        "contract_id",
        "report_number",
        "report_date",
        "period_start",
        "period_end",
        "progress_percent",
        "completed_amount",
        "description",
        "approval_status",
        "created_by",
        "created_at",
        "submitted_by",
        "submitted_at",
        "submission_comment",
        "manager_id",
        "manager_approved_at",
        "manager_comment",
        "director_id",
        "director_approved_at",
        "director_comment",
        "rejected_by",
        "rejected_at",
        "rejection_reason",
    ];
    const FILTERS: &'static [&'static str] = &["contract_id", "approval_status", "created_by"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            contract_id: row.get("contract_id")?,
            report_number: row.get("report_number")?,
            report_date: row.get("report_date")?,
            period_start: row.get("period_start")?,
            period_end: row.get("period_end")?,
            progress_percent: decimal(row, "progress_percent")?,
            completed_amount: decimal(row, "completed_amount")?,
            description: row.get("description")?,
            approval_status: approval_status(row)?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
            submitted_by: row.get("submitted_by")?,
            submitted_at: row.get("submitted_at")?,
            submission_comment: row.get("submission_comment")?,
            manager_id: row.get("manager_id")?,
            manager_approved_at: row.get("manager_approved_at")?,
            manager_comment: row.get("manager_comment")?,
            director_id: row.get("director_id")?,
            director_approved_at: row.get("director_approved_at")?,
            director_comment: row.get("director_comment")?,
            rejected_by: row.get("rejected_by")?,
            rejected_at: row.get("rejected_at")?,
            rejection_reason: row.get("rejection_reason")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.contract_id),
            Box::new(self.report_number.clone()),
            Box::new(self.report_date),
            Box::new(self.period_start),
            Box::new(self.period_end),
            Box::new(decimal_text(self.progress_percent)),
            Box::new(decimal_text(self.completed_amount)),
            Box::new(self.description.clone()),
            Box::new(self.approval_status.as_i64()),
            Box::new(self.created_by),
            Box::new(self.created_at),
            Box::new(self.submitted_by),
            Box::new(self.submitted_at),
            Box::new(self.submission_comment.clone()),
            Box::new(self.manager_id),
            Box::new(self.manager_approved_at),
            Box::new(self.manager_comment.clone()),
            Box::new(self.director_id),
            Box::new(self.director_approved_at),
            Box::new(self.director_comment.clone()),
            Box::new(self.rejected_by),
            Box::new(self.rejected_at),
            Box::new(self.rejection_reason.clone()),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        self.validate()?;
        ensure_exists(conn, Contract::TABLE, Contract::ENTITY, self.contract_id)
    }

    fn before_insert(&mut self, ctx: &WriteContext) {
        self.reset_workflow();
        self.created_by = Some(ctx.actor_id);
        self.created_at = ctx.now;
    }

    fn before_update(&mut self, existing: &Self, _ctx: &WriteContext) -> AppResult<()> {
        if !existing.approval_status.is_editable() {
            return Err(AppError::InvalidTransition {
                action: "edit".to_string(),
                status: existing.approval_status.label().to_string(),
            });
        }
        if self.contract_id != existing.contract_id {
            return Err(AppError::validation(
                Self::ENTITY,
                "contract_id",
                "a report cannot be moved to another contract",
            ));
        }
        self.copy_workflow_from(existing);
        Ok(())
    }

    fn before_delete(&self, _conn: &Connection) -> AppResult<()> {
        if !self.approval_status.is_editable() {
            return Err(AppError::InvalidTransition {
                action: "delete".to_string(),
                status: self.approval_status.label().to_string(),
            });
        }
        Ok(())
    }

    fn after_delete(&self, conn: &Connection) -> AppResult<()> {
        queries::refresh_contract_indicators(conn, self.contract_id)
    }
}

impl Record for Payment {
    const TABLE: &'static str = "payments";
    const ENTITY: &'static str = "payment";
    const MENU: MenuKey = MenuKey::Payments;
    const COLUMNS: &'static [&'static str] = &[
        "contract_id",
        "work_progress_id",
        "amount",
        "payment_date",
        "payment_type",
        "status",
        "description",
    ];
    const FILTERS: &'static [&'static str] =
        &["contract_id", "work_progress_id", "payment_type", "status"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            contract_id: row.get("contract_id")?,
            work_progress_id: row.get("work_progress_id")?,
            amount: decimal(row, "amount")?,
            payment_date: row.get("payment_date")?,
            payment_type: enum_column(row, "payment_type")?,
            status: enum_column(row, "status")?,
            description: row.get("description")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.contract_id),
            Box::new(self.work_progress_id),
            Box::new(decimal_text(self.amount)),
            Box::new(self.payment_date),
            Box::new(enum_text(&self.payment_type)),
            Box::new(enum_text(&self.status)),
            Box::new(self.description.clone()),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        self.validate()?;
        ensure_exists(conn, Contract::TABLE, Contract::ENTITY, self.contract_id)?;
        if let Some(work_progress_id) = self.work_progress_id {
            let (contract_id, status) = queries::work_progress_state(conn, work_progress_id)
                .map_err(|_| {
                    AppError::validation(
                        Self::ENTITY,
                        "work_progress_id",
                        format!("work progress {} does not exist", work_progress_id),
                    )
                })?;
            if contract_id != self.contract_id {
                return Err(AppError::validation(
                    Self::ENTITY,
                    "work_progress_id",
                    "belongs to another contract",
                ));
            }
            if status != ApprovalStatus::DirectorApproved {
                return Err(AppError::validation(
                    Self::ENTITY,
                    "work_progress_id",
                    format!("work progress is {}, not director_approved", status.label()),
                ));
            }
        }
        Ok(())
    }
}

impl Record for ProcurementPlan {
    const TABLE: &'static str = "procurement_plans";
    const ENTITY: &'static str = "procurement plan";
    const MENU: MenuKey = MenuKey::Procurement;
    const COLUMNS: &'static [&'static str] = &[
        "project_id",
        "reference_no",
        "description",
        "method",
        "estimated_amount",
        "planned_date",
        "actual_date",
        "status",
        "contract_id",
    ];
    const FILTERS: &'static [&'static str] = &["project_id", "method", "status", "contract_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            reference_no: row.get("reference_no")?,
            description: row.get("description")?,
            method: enum_column(row, "method")?,
            estimated_amount: decimal(row, "estimated_amount")?,
            planned_date: row.get("planned_date")?,
            actual_date: row.get("actual_date")?,
            status: enum_column(row, "status")?,
            contract_id: row.get("contract_id")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.project_id),
            Box::new(self.reference_no.clone()),
            Box::new(self.description.clone()),
            Box::new(enum_text(&self.method)),
            Box::new(decimal_text(self.estimated_amount)),
            Box::new(self.planned_date),
            Box::new(self.actual_date),
            Box::new(enum_text(&self.status)),
            Box::new(self.contract_id),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        self.validate()?;
        ensure_exists(conn, Project::TABLE, Project::ENTITY, self.project_id)?;
        if let Some(contract_id) = self.contract_id {
            let project_id: Option<i64> = conn
                .query_row(
                    "SELECT project_id FROM contracts WHERE id = ?1",
                    [contract_id],
                    |row| row.get(0),
                )
                .optional()?;
            if project_id != Some(self.project_id) {
                return Err(AppError::validation(
                    Self::ENTITY,
                    "contract_id",
                    "must be a contract of the same project",
                ));
            }
        }
        Ok(())
    }
}
