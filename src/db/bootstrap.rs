//! First-run setup.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::config::BootstrapSettings;
use crate::error::AppResult;
use crate::models::{MenuKey, MenuPermission, Role, RoleKind, User};

use super::record::{WriteContext, enum_text};
use super::repo;

/// Name of the role created for the first administrator.
pub const ADMIN_ROLE_NAME: &str = "Administrator";

/// Creates an administrator role and account when no user exists yet.
///
/// Returns the created user, or `None` when users were already present.
pub fn ensure_administrator(
    conn: &mut Connection,
    settings: &BootstrapSettings,
) -> AppResult<Option<User>> {
    let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    if users > 0 {
        return Ok(None);
    }

    let ctx = WriteContext::now(0);
    let existing_role: Option<i64> = conn
        .query_row(
            "SELECT id FROM roles WHERE kind = ?1 ORDER BY id LIMIT 1",
            [enum_text(&RoleKind::Administrator)],
            |row| row.get(0),
        )
        .optional()?;
    let role_id = match existing_role {
        Some(id) => id,
        None => {
            let role = repo::insert(
                conn,
                Role {
                    id: 0,
                    name: ADMIN_ROLE_NAME.to_string(),
                    kind: RoleKind::Administrator,
                },
                &ctx,
            )?;
            for menu in MenuKey::ALL {
                repo::insert(
                    conn,
                    MenuPermission {
                        id: 0,
                        role_id: role.id,
                        menu,
                        can_view: true,
                        can_create: true,
                        can_edit: true,
                        can_delete: true,
                    },
                    &ctx,
                )?;
            }
            role.id
        }
    };

    let admin = repo::insert(
        conn,
        User {
            id: 0,
            username: settings.admin_username.clone(),
            full_name: settings.admin_full_name.clone(),
            email: None,
            role_id,
            supervisor_id: None,
            is_active: true,
        },
        &ctx,
    )?;
    info!(user_id = admin.id, username = %admin.username, "Created initial administrator");
    Ok(Some(admin))
}
