use rusqlite::{Connection, Row, ToSql};

use crate::db::record::{Record, WriteContext, enum_column, enum_text, ensure_exists};
use crate::error::AppResult;
use crate::models::{
    Contract, Document, EntityKind, MenuKey, Payment, ProcurementPlan, Project, ProjectTask,
    WorkProgress,
};

/// Table and display name of the entity a document is attached to.
fn attachment_target(kind: EntityKind) -> (&'static str, &'static str) {
    match kind {
        EntityKind::Project => (Project::TABLE, Project::ENTITY),
        EntityKind::Contract => (Contract::TABLE, Contract::ENTITY),
        EntityKind::WorkProgress => (WorkProgress::TABLE, WorkProgress::ENTITY),
        EntityKind::Payment => (Payment::TABLE, Payment::ENTITY),
        EntityKind::ProcurementPlan => (ProcurementPlan::TABLE, ProcurementPlan::ENTITY),
        EntityKind::ProjectTask => (ProjectTask::TABLE, ProjectTask::ENTITY),
    }
}

impl Record for Document {
    const TABLE: &'static str = "documents";
    const ENTITY: &'static str = "document";
    const MENU: MenuKey = MenuKey::Documents;
    const COLUMNS: &'static [&'static str] = &[
        "entity_type",
        "entity_id",
        "title",
        "file_name",
        "file_path",
        "content_type",
        "size_bytes",
        "uploaded_by",
        "uploaded_at",
    ];
    const FILTERS: &'static [&'static str] = &["entity_type", "entity_id", "uploaded_by"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            entity_type: enum_column(row, "entity_type")?,
            entity_id: row.get("entity_id")?,
            title: row.get("title")?,
            file_name: row.get("file_name")?,
            file_path: row.get("file_path")?,
            content_type: row.get("content_type")?,
            size_bytes: row.get("size_bytes")?,
            uploaded_by: row.get("uploaded_by")?,
            uploaded_at: row.get("uploaded_at")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(enum_text(&self.entity_type)),
            Box::new(self.entity_id),
            Box::new(self.title.clone()),
            Box::new(self.file_name.clone()),
            Box::new(self.file_path.clone()),
            Box::new(self.content_type.clone()),
            Box::new(self.size_bytes),
            Box::new(self.uploaded_by),
            Box::new(self.uploaded_at),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        self.validate()?;
        let (table, entity) = attachment_target(self.entity_type);
        ensure_exists(conn, table, entity, self.entity_id)
    }

    fn before_insert(&mut self, ctx: &WriteContext) {
        self.uploaded_by = Some(ctx.actor_id);
        self.uploaded_at = ctx.now;
    }

    fn before_update(&mut self, existing: &Self, _ctx: &WriteContext) -> AppResult<()> {
        self.uploaded_by = existing.uploaded_by;
        self.uploaded_at = existing.uploaded_at;
        Ok(())
    }
}
