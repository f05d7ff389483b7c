//! Database schema definitions.
//!
//! Relationship rules live in the DDL: cascades follow ownership (a district
//! owns its jamoats, a contract owns its payments), `SET NULL` is used for
//! optional references to users and `RESTRICT` protects shared reference data
//! (contractors, indicators, roles) from being deleted while in use.
//! Money and indicator values are TEXT columns holding exact decimals.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::AppResult;

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

/// Initialize the database schema when missing.
pub fn init_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;

    let current: Option<i64> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    match current {
        None => {
            info!(version = SCHEMA_VERSION, "Creating database schema");
            conn.execute_batch(ACCESS_SCHEMA)?;
            conn.execute_batch(PROJECT_SCHEMA)?;
            conn.execute_batch(GEOGRAPHY_SCHEMA)?;
            conn.execute_batch(CONTRACT_SCHEMA)?;
            conn.execute_batch(INDICATOR_SCHEMA)?;
            conn.execute_batch(SUPPORT_SCHEMA)?;
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
        }
        Some(version) => {
            info!(version, "Database schema is up to date");
        }
    }
    Ok(())
}

const ACCESS_SCHEMA: &str = r#"
CREATE TABLE roles (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE,
    kind  TEXT NOT NULL CHECK (kind IN ('administrator','director','manager','curator','specialist','observer'))
);

CREATE TABLE menu_permissions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    role_id     INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    menu        TEXT NOT NULL,
    can_view    INTEGER NOT NULL DEFAULT 0,
    can_create  INTEGER NOT NULL DEFAULT 0,
    can_edit    INTEGER NOT NULL DEFAULT 0,
    can_delete  INTEGER NOT NULL DEFAULT 0,
    UNIQUE (role_id, menu)
);

CREATE TABLE users (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    username       TEXT NOT NULL UNIQUE,
    full_name      TEXT NOT NULL,
    email          TEXT,
    role_id        INTEGER NOT NULL REFERENCES roles(id) ON DELETE RESTRICT,
    supervisor_id  INTEGER REFERENCES users(id) ON DELETE SET NULL,
    is_active      INTEGER NOT NULL DEFAULT 1
);
"#;

const PROJECT_SCHEMA: &str = r#"
CREATE TABLE projects (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    code        TEXT NOT NULL UNIQUE,
    name_ru     TEXT NOT NULL,
    name_tj     TEXT NOT NULL DEFAULT '',
    name_en     TEXT NOT NULL DEFAULT '',
    donor       TEXT NOT NULL DEFAULT '',
    start_date  TEXT NOT NULL,
    end_date    TEXT,
    budget      TEXT NOT NULL DEFAULT '0'
);

CREATE TABLE components (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id  INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    number      TEXT NOT NULL,
    name_ru     TEXT NOT NULL,
    name_tj     TEXT NOT NULL DEFAULT '',
    name_en     TEXT NOT NULL DEFAULT '',
    UNIQUE (project_id, number)
);

CREATE TABLE sub_components (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    component_id  INTEGER NOT NULL REFERENCES components(id) ON DELETE CASCADE,
    number        TEXT NOT NULL,
    name_ru       TEXT NOT NULL,
    name_tj       TEXT NOT NULL DEFAULT '',
    name_en       TEXT NOT NULL DEFAULT '',
    UNIQUE (component_id, number)
);

CREATE TABLE project_tasks (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id        INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title             TEXT NOT NULL,
    description       TEXT,
    assignee_id       INTEGER REFERENCES users(id) ON DELETE SET NULL,
    start_date        TEXT,
    due_date          TEXT,
    status            TEXT NOT NULL,
    priority          TEXT NOT NULL,
    progress_percent  TEXT NOT NULL DEFAULT '0'
);

CREATE TABLE task_comments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id     INTEGER NOT NULL REFERENCES project_tasks(id) ON DELETE CASCADE,
    author_id   INTEGER REFERENCES users(id) ON DELETE SET NULL,
    body        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE task_checklist_items (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id   INTEGER NOT NULL REFERENCES project_tasks(id) ON DELETE CASCADE,
    title     TEXT NOT NULL,
    is_done   INTEGER NOT NULL DEFAULT 0,
    position  INTEGER NOT NULL DEFAULT 0
);
"#;

const GEOGRAPHY_SCHEMA: &str = r#"
CREATE TABLE districts (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    name_ru  TEXT NOT NULL,
    name_tj  TEXT NOT NULL DEFAULT '',
    name_en  TEXT NOT NULL DEFAULT ''
);

CREATE TABLE jamoats (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    district_id  INTEGER NOT NULL REFERENCES districts(id) ON DELETE CASCADE,
    name_ru      TEXT NOT NULL,
    name_tj      TEXT NOT NULL DEFAULT '',
    name_en      TEXT NOT NULL DEFAULT ''
);

CREATE TABLE villages (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    jamoat_id   INTEGER NOT NULL REFERENCES jamoats(id) ON DELETE CASCADE,
    name_ru     TEXT NOT NULL,
    name_tj     TEXT NOT NULL DEFAULT '',
    name_en     TEXT NOT NULL DEFAULT '',
    population  INTEGER,
    households  INTEGER
);

CREATE TABLE schools (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    village_id     INTEGER NOT NULL REFERENCES villages(id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    student_count  INTEGER
);

CREATE TABLE health_facilities (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    village_id     INTEGER NOT NULL REFERENCES villages(id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    facility_type  TEXT NOT NULL
);

CREATE INDEX idx_jamoats_district ON jamoats(district_id);
CREATE INDEX idx_villages_jamoat ON villages(jamoat_id);
"#;

const CONTRACT_SCHEMA: &str = r#"
CREATE TABLE contractors (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    tax_id          TEXT NOT NULL UNIQUE,
    address         TEXT,
    contact_person  TEXT,
    phone           TEXT,
    email           TEXT
);

CREATE TABLE contracts (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    number             TEXT NOT NULL UNIQUE,
    title              TEXT NOT NULL,
    project_id         INTEGER NOT NULL REFERENCES projects(id) ON DELETE RESTRICT,
    sub_component_id   INTEGER REFERENCES sub_components(id) ON DELETE SET NULL,
    contractor_id      INTEGER NOT NULL REFERENCES contractors(id) ON DELETE RESTRICT,
    curator_id         INTEGER REFERENCES users(id) ON DELETE SET NULL,
    signing_date       TEXT NOT NULL,
    contract_end_date  TEXT NOT NULL,
    extended_to_date   TEXT,
    contract_amount    TEXT NOT NULL,
    additional_amount  TEXT NOT NULL DEFAULT '0',
    saved_amount       TEXT NOT NULL DEFAULT '0',
    currency           TEXT NOT NULL,
    status             TEXT NOT NULL
);

CREATE TABLE work_progress (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id           INTEGER NOT NULL REFERENCES contracts(id) ON DELETE CASCADE,
    report_number         TEXT NOT NULL,
    report_date           TEXT NOT NULL,
    period_start          TEXT,
    period_end            TEXT,
    progress_percent      TEXT NOT NULL,
    completed_amount      TEXT NOT NULL DEFAULT '0',
    description           TEXT,
    approval_status       INTEGER NOT NULL DEFAULT 0 CHECK (approval_status BETWEEN 0 AND 4),
    created_by            INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at            TEXT NOT NULL,
    submitted_by          INTEGER REFERENCES users(id) ON DELETE SET NULL,
    submitted_at          TEXT,
    submission_comment    TEXT,
    manager_id            INTEGER REFERENCES users(id) ON DELETE SET NULL,
    manager_approved_at   TEXT,
    manager_comment       TEXT,
    director_id           INTEGER REFERENCES users(id) ON DELETE SET NULL,
    director_approved_at  TEXT,
    director_comment      TEXT,
    rejected_by           INTEGER REFERENCES users(id) ON DELETE SET NULL,
    rejected_at           TEXT,
    rejection_reason      TEXT,
    UNIQUE (contract_id, report_number)
);

CREATE TABLE approval_history (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    work_progress_id  INTEGER NOT NULL REFERENCES work_progress(id) ON DELETE CASCADE,
    action            TEXT NOT NULL,
    from_status       INTEGER NOT NULL,
    to_status         INTEGER NOT NULL,
    actor_id          INTEGER REFERENCES users(id) ON DELETE SET NULL,
    comment           TEXT,
    occurred_at       TEXT NOT NULL
);

CREATE TABLE payments (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id       INTEGER NOT NULL REFERENCES contracts(id) ON DELETE CASCADE,
    work_progress_id  INTEGER REFERENCES work_progress(id) ON DELETE SET NULL,
    amount            TEXT NOT NULL,
    payment_date      TEXT NOT NULL,
    payment_type      TEXT NOT NULL,
    status            TEXT NOT NULL,
    description       TEXT
);

CREATE TABLE procurement_plans (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id        INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    reference_no      TEXT NOT NULL UNIQUE,
    description       TEXT NOT NULL,
    method            TEXT NOT NULL,
    estimated_amount  TEXT NOT NULL,
    planned_date      TEXT NOT NULL,
    actual_date       TEXT,
    status            TEXT NOT NULL,
    contract_id       INTEGER REFERENCES contracts(id) ON DELETE SET NULL
);

CREATE INDEX idx_contracts_project ON contracts(project_id);
CREATE INDEX idx_work_progress_contract ON work_progress(contract_id);
CREATE INDEX idx_payments_contract ON payments(contract_id);
"#;

const INDICATOR_SCHEMA: &str = r#"
CREATE TABLE indicators (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    code            TEXT NOT NULL UNIQUE,
    name_ru         TEXT NOT NULL,
    name_tj         TEXT NOT NULL DEFAULT '',
    name_en         TEXT NOT NULL DEFAULT '',
    category        TEXT NOT NULL,
    unit            TEXT NOT NULL,
    baseline_value  TEXT NOT NULL DEFAULT '0',
    target_value    TEXT NOT NULL
);

CREATE TABLE indicator_values (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    indicator_id  INTEGER NOT NULL REFERENCES indicators(id) ON DELETE CASCADE,
    village_id    INTEGER NOT NULL REFERENCES villages(id) ON DELETE CASCADE,
    value         TEXT NOT NULL,
    recorded_on   TEXT NOT NULL,
    UNIQUE (indicator_id, village_id, recorded_on)
);

CREATE TABLE contract_indicators (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id     INTEGER NOT NULL REFERENCES contracts(id) ON DELETE CASCADE,
    indicator_id    INTEGER NOT NULL REFERENCES indicators(id) ON DELETE RESTRICT,
    target_value    TEXT NOT NULL,
    achieved_value  TEXT NOT NULL DEFAULT '0',
    UNIQUE (contract_id, indicator_id)
);

CREATE TABLE contract_indicator_villages (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_indicator_id  INTEGER NOT NULL REFERENCES contract_indicators(id) ON DELETE CASCADE,
    village_id             INTEGER NOT NULL REFERENCES villages(id) ON DELETE CASCADE,
    UNIQUE (contract_indicator_id, village_id)
);

CREATE TABLE contract_indicator_progress (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_indicator_id  INTEGER NOT NULL REFERENCES contract_indicators(id) ON DELETE CASCADE,
    work_progress_id       INTEGER NOT NULL REFERENCES work_progress(id) ON DELETE CASCADE,
    value                  TEXT NOT NULL DEFAULT '0',
    notes                  TEXT,
    UNIQUE (contract_indicator_id, work_progress_id)
);

CREATE TABLE indicator_progress_items (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    progress_id         INTEGER NOT NULL REFERENCES contract_indicator_progress(id) ON DELETE CASCADE,
    item_type           TEXT NOT NULL,
    village_id          INTEGER REFERENCES villages(id) ON DELETE CASCADE,
    school_id           INTEGER REFERENCES schools(id) ON DELETE CASCADE,
    health_facility_id  INTEGER REFERENCES health_facilities(id) ON DELETE CASCADE,
    is_completed        INTEGER NOT NULL DEFAULT 0,
    numeric_value       TEXT,
    notes               TEXT,
    CHECK (
        (item_type = 'village' AND village_id IS NOT NULL AND school_id IS NULL AND health_facility_id IS NULL) OR
        (item_type = 'school' AND school_id IS NOT NULL AND village_id IS NULL AND health_facility_id IS NULL) OR
        (item_type = 'health_facility' AND health_facility_id IS NOT NULL AND village_id IS NULL AND school_id IS NULL)
    )
);

CREATE INDEX idx_progress_contract_indicator ON contract_indicator_progress(contract_indicator_id);
CREATE INDEX idx_progress_items_progress ON indicator_progress_items(progress_id);
"#;

const SUPPORT_SCHEMA: &str = r#"
CREATE TABLE documents (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type   TEXT NOT NULL,
    entity_id     INTEGER NOT NULL,
    title         TEXT NOT NULL,
    file_name     TEXT NOT NULL,
    file_path     TEXT NOT NULL,
    content_type  TEXT,
    size_bytes    INTEGER NOT NULL DEFAULT 0,
    uploaded_by   INTEGER REFERENCES users(id) ON DELETE SET NULL,
    uploaded_at   TEXT NOT NULL
);

CREATE TABLE notifications (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title          TEXT NOT NULL,
    message        TEXT NOT NULL,
    entity_type    TEXT,
    entity_id      INTEGER,
    is_read        INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,
    scheduled_for  TEXT
);

CREATE INDEX idx_documents_entity ON documents(entity_type, entity_id);
CREATE INDEX idx_notifications_user ON notifications(user_id, is_read);
"#;
