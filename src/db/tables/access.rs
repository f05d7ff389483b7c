use rusqlite::{Connection, Row, ToSql};

use crate::db::queries;
use crate::db::record::{Record, enum_column, enum_text, ensure_exists};
use crate::error::{AppError, AppResult};
use crate::models::{MenuKey, MenuPermission, Role, User};

impl Record for Role {
    const TABLE: &'static str = "roles";
    const ENTITY: &'static str = "role";
    const MENU: MenuKey = MenuKey::Roles;
    const COLUMNS: &'static [&'static str] = &["name", "kind"];
    const FILTERS: &'static [&'static str] = &["kind"];

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
            kind: enum_column(row, "kind")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![Box::new(self.name.clone()), Box::new(enum_text(&self.kind))]
    }

    fn check(&self, _conn: &Connection) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation(Self::ENTITY, "name", "must not be empty"));
        }
        Ok(())
    }
}

impl Record for MenuPermission {
    const TABLE: &'static str = "menu_permissions";
    const ENTITY: &'static str = "menu permission";
    const MENU: MenuKey = MenuKey::Roles;
    const COLUMNS: &'static [&'static str] =
        &["role_id", "menu", "can_view", "can_create", "can_edit", "can_delete"];
    const FILTERS: &'static [&'static str] = &["role_id", "menu"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            role_id: row.get("role_id")?,
            menu: enum_column(row, "menu")?,
            can_view: row.get("can_view")?,
            can_create: row.get("can_create")?,
            can_edit: row.get("can_edit")?,
            can_delete: row.get("can_delete")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.role_id),
            Box::new(enum_text(&self.menu)),
            Box::new(self.can_view),
            Box::new(self.can_create),
            Box::new(self.can_edit),
            Box::new(self.can_delete),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        ensure_exists(conn, Role::TABLE, Role::ENTITY, self.role_id)
    }
}

impl Record for User {
    const TABLE: &'static str = "users";
    const ENTITY: &'static str = "user";
    const MENU: MenuKey = MenuKey::Users;
    const COLUMNS: &'static [&'static str] = &[
        "username",
        "full_name",
        "email",
        "role_id",
        "supervisor_id",
        "is_active",
    ];
    const FILTERS: &'static [&'static str] = &["role_id", "supervisor_id", "is_active"];
    const BOOL_FILTERS: &'static [&'static str] = &["is_active"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            full_name: row.get("full_name")?,
            email: row.get("email")?,
            role_id: row.get("role_id")?,
            supervisor_id: row.get("supervisor_id")?,
            is_active: row.get("is_active")?,
        })
    }

    fn to_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.username.clone()),
            Box::new(self.full_name.clone()),
            Box::new(self.email.clone()),
            Box::new(self.role_id),
            Box::new(self.supervisor_id),
            Box::new(self.is_active),
        ]
    }

    fn check(&self, conn: &Connection) -> AppResult<()> {
        self.validate()?;
        ensure_exists(conn, Role::TABLE, Role::ENTITY, self.role_id)?;
        if let Some(supervisor_id) = self.supervisor_id {
            ensure_exists(conn, Self::TABLE, "supervisor", supervisor_id)?;
            // A new user has no subordinates yet.
            if self.id != 0 && queries::is_in_supervisor_chain(conn, supervisor_id, self.id)? {
                return Err(AppError::validation(
                    Self::ENTITY,
                    "supervisor_id",
                    "would create a supervision cycle",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, WriteContext, repo};
    use crate::error::AppError;
    use crate::models::{MenuKey, MenuPermission, Role, RoleKind, User};

    fn setup() -> (Database, Role) {
        let db = Database::open_in_memory().unwrap();
        let role = db
            .with_conn_mut(|conn| {
                repo::insert(
                    conn,
                    Role { id: 0, name: "Managers".to_string(), kind: RoleKind::Manager },
                    &WriteContext::now(0),
                )
            })
            .unwrap();
        (db, role)
    }

    fn user(name: &str, role_id: i64, supervisor_id: Option<i64>) -> User {
        User {
            id: 0,
            username: name.to_string(),
            full_name: name.to_uppercase(),
            email: None,
            role_id,
            supervisor_id,
            is_active: true,
        }
    }

    #[test]
    fn test_role_kind_round_trips_through_storage() {
        let (db, role) = setup();
        let read: Role = db.with_conn(|conn| repo::get(conn, role.id)).unwrap();
        assert_eq!(read.kind, RoleKind::Manager);
    }

    #[test]
    fn test_user_with_unknown_role_is_rejected() {
        let (db, _) = setup();
        let result = db.with_conn_mut(|conn| repo::insert(conn, user("m1", 77, None), &WriteContext::now(0)));
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_supervision_cycle_is_rejected() {
        let (db, role) = setup();
        let ctx = WriteContext::now(0);
        let (boss, worker) = db
            .with_conn_mut(|conn| {
                let boss = repo::insert(conn, user("boss", role.id, None), &ctx)?;
                let worker = repo::insert(conn, user("worker", role.id, Some(boss.id)), &ctx)?;
                Ok((boss, worker))
            })
            .unwrap();

        let mut edited = boss.clone();
        edited.supervisor_id = Some(worker.id);
        let result = db.with_conn_mut(|conn| repo::update(conn, boss.id, edited, &ctx));
        assert!(matches!(result, Err(AppError::Validation { field, .. }) if field == "supervisor_id"));
    }

    #[test]
    fn test_role_in_use_cannot_be_deleted() {
        let (db, role) = setup();
        db.with_conn_mut(|conn| repo::insert(conn, user("m1", role.id, None), &WriteContext::now(0)))
            .unwrap();
        let result = db.with_conn_mut(|conn| repo::delete::<Role>(conn, role.id));
        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[test]
    fn test_duplicate_permission_row_is_conflict() {
        let (db, role) = setup();
        let row = MenuPermission {
            id: 0,
            role_id: role.id,
            menu: MenuKey::Contracts,
            can_view: true,
            can_create: false,
            can_edit: false,
            can_delete: false,
        };
        let ctx = WriteContext::now(0);
        db.with_conn_mut(|conn| repo::insert(conn, row.clone(), &ctx)).unwrap();
        let result = db.with_conn_mut(|conn| repo::insert(conn, row, &ctx));
        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }
}
