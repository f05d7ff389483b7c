use rusqlite::{Connection, Row, ToSql};

use crate::db::record::{
    Record, WriteContext, decimal, decimal_text, enum_column, enum_text, ensure_exists, localized,
    push_localized,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    Component, MenuKey, Project, ProjectTask, SubComponent, TaskChecklistItem, TaskComment, User,
};

impl Record for Project {
    const TABLE: &'static str = "projects";
    const ENTITY: &'static str = "project";
    const MENU: MenuKey = MenuKey::Projects;
    const COLUMNS: &'static [&'static str] = &[
        "code", "name_ru", "name_tj", "name_en", "donor", "start_date", "end_date", "budget",
    ];
    const FILTERS: &'static [&'static str] = &["code", "donor"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            code: row.get("code")?,
            name: localized(row, "name")?,
            donor: row.get("donor")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            budget: decimal(row, "budget")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(self.code.clone())];
        push_localized(&mut values, &self.name);
        values.push(Box::new(self.donor.clone()));
        values.push(Box::new(self.start_date));
        values.push(Box::new(self.end_date));
        values.push(Box::new(decimal_text(self.budget)));
        values
    }

    fn check(&self, _conn: &Connection) -> AppResult<()> {
        self.validate()
    }
}

fn check_numbered(entity: &str, number: &str, name_blank: bool) -> AppResult<()> {
    if number.trim().is_empty() {
        return Err(AppError::validation(entity, "number", "must not be empty"));
    }
    if name_blank {
        return Err(AppError::validation(entity, "name", "russian name is required"));
    }
    Ok(())
}

impl Record for Component {
    const TABLE: &'static str = "components";
    const ENTITY: &'static str = "component";
    const MENU: MenuKey = MenuKey::Projects;
    const COLUMNS: &'static [&'static str] =
        &["project_id", "number", "name_ru", "name_tj", "name_en"];
    const FILTERS: &'static [&'static str] = &["project_id"];

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
            number: row.get("number")?,
            name: localized(row, "name")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        let mut values: Vec<Box<dyn ToSql>> =
            vec![Box::new(self.project_id), Box::new(self.number.clone())];
        push_localized(&mut values, &self.name);
        values
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        check_numbered(Self::ENTITY, &self.number, self.name.is_blank())?;
        ensure_exists(conn, Project::TABLE, Project::ENTITY, self.project_id)
    }
}

impl Record for SubComponent {
    const TABLE: &'static str = "sub_components";
    const ENTITY: &'static str = "sub component";
    const MENU: MenuKey = MenuKey::Projects;
    const COLUMNS: &'static [&'static str] =
        &["component_id", "number", "name_ru", "name_tj", "name_en"];
    const FILTERS: &'static [&'static str] = &["component_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            component_id: row.get("component_id")?,
            number: row.get("number")?,
            name: localized(row, "name")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        let mut values: Vec<Box<dyn ToSql>> =
            vec![Box::new(self.component_id), Box::new(self.number.clone())];
        push_localized(&mut values, &self.name);
        values
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        check_numbered(Self::ENTITY, &self.number, self.name.is_blank())?;
        ensure_exists(conn, Component::TABLE, Component::ENTITY, self.component_id)
    }
}

impl Record for ProjectTask {
    const TABLE: &'static str = "project_tasks";
    const ENTITY: &'static str = "task";
    const MENU: MenuKey = MenuKey::Tasks;
    const COLUMNS: &'static [&'static str] = &[
        "project_id",
        "title",
        "description",
        "assignee_id",
        "start_date",
        "due_date",
        "status",
        "priority",
        "progress_percent",
    ];
    const FILTERS: &'static [&'static str] = &["project_id", "assignee_id", "status", "priority"];

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
            title: row.get("title")?,
            description: row.get("description")?,
            assignee_id: row.get("assignee_id")?,
            start_date: row.get("start_date")?,
            due_date: row.get("due_date")?,
            status: enum_column(row, "status")?,
            priority: enum_column(row, "priority")?,
            progress_percent: decimal(row, "progress_percent")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.project_id),
            Box::new(self.title.clone()),
            Box::new(self.description.clone()),
            Box::new(self.assignee_id),
            Box::new(self.start_date),
            Box::new(self.due_date),
            Box::new(enum_text(&self.status)),
            Box::new(enum_text(&self.priority)),
            Box::new(decimal_text(self.progress_percent)),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        self.validate()?;
        ensure_exists(conn, Project::TABLE, Project::ENTITY, self.project_id)?;
        if let Some(assignee_id) = self.assignee_id {
            ensure_exists(conn, User::TABLE, "assignee", assignee_id)?;
        }
        Ok(())
    }
}

impl Record for TaskComment {
    const TABLE: &'static str = "task_comments";
    const ENTITY: &'static str = "task comment";
    const MENU: MenuKey = MenuKey::Tasks;
    const COLUMNS: &'static [&'static str] = &["task_id", "author_id", "body", "created_at"];
    const FILTERS: &'static [&'static str] = &["task_id", "author_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            task_id: row.get("task_id")?,
            author_id: row.get("author_id")?,
            body: row.get("body")?,
            created_at: row.get("created_at")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.task_id),
            Box::new(self.author_id),
            Box::new(self.body.clone()),
            Box::new(self.created_at),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        if self.body.trim().is_empty() {
            return Err(AppError::validation(Self::ENTITY, "body", "must not be empty"));
        }
        ensure_exists(conn, ProjectTask::TABLE, ProjectTask::ENTITY, self.task_id)
    }

    fn before_insert(&mut self, ctx: &WriteContext) {
        self.author_id = Some(ctx.actor_id);
        self.created_at = ctx.now;
    }

    fn before_update(&mut self, existing: &Self, _ctx: &WriteContext) -> AppResult<()> {
        self.task_id = existing.task_id;
        self.author_id = existing.author_id;
        self.created_at = existing.created_at;
        Ok(())
    }
}

impl Record for TaskChecklistItem {
    const TABLE: &'static str = "task_checklist_items";
    const ENTITY: &'static str = "checklist item";
    const MENU: MenuKey = MenuKey::Tasks;
    const COLUMNS: &'static [&'static str] = &["task_id", "title", "is_done", "position"];
    const FILTERS: &'static [&'static str] = &["task_id", "is_done"];
    const BOOL_FILTERS: &'static [&'static str] = &["is_done"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            task_id: row.get("task_id")?,
            title: row.get("title")?,
            is_done: row.get("is_done")?,
            position: row.get("position")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.task_id),
            Box::new(self.title.clone()),
            Box::new(self.is_done),
            Box::new(self.position),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation(Self::ENTITY, "title", "must not be empty"));
        }
        ensure_exists(conn, ProjectTask::TABLE, ProjectTask::ENTITY, self.task_id)
    }
}
