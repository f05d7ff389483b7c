//! Access control.
//!
//! Two independent checks gate every write:
//!
//! - the menu permission matrix decides which records a role may view,
//!   create, edit or delete;
//! - the role kind decides which approval stages a user may act on.
//!
//! Administrators pass both.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{queries, repo};
use crate::error::{AppError, AppResult};
use crate::models::{MenuKey, MenuPermission, PermissionAction, Role, RoleKind, User};

/// The acting user with everything needed to authorize requests.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    /// The account.
    pub user: User,
    /// Its role.
    pub role: Role,
    /// The role's permission matrix rows.
    pub permissions: Vec<MenuPermission>,
}

impl CurrentUser {
    /// Loads the user `user_id` with role and permissions.
    ///
    /// Unknown users are `Unauthorized`; inactive users are `Forbidden`.
    pub fn load(conn: &Connection, user_id: i64) -> AppResult<Self> {
        let user: User = repo::find(conn, user_id)?.ok_or_else(|| AppError::Unauthorized {
            message: format!("unknown user {}", user_id),
        })?;
        if !user.is_active {
            return Err(AppError::Forbidden {
                username: user.username,
                action: "act".to_string(),
                resource: "while the account is inactive".to_string(),
            });
        }
        let role: Role = repo::get(conn, user.role_id)?;
        let permissions = queries::permissions_for_role(conn, role.id)?;
        Ok(Self {
            user,
            role,
            permissions,
        })
    }

    /// User id.
    pub fn id(&self) -> i64 {
        self.user.id
    }

    /// Whether the user bypasses every check.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether the matrix grants `action` on `menu`.
    pub fn can(&self, menu: MenuKey, action: PermissionAction) -> bool {
        self.is_admin()
            || self
                .permissions
                .iter()
                .any(|p| p.menu == menu && p.allows(action))
    }

    /// Fails with `Forbidden` unless the matrix grants `action` on `menu`.
    pub fn authorize(&self, menu: MenuKey, action: PermissionAction) -> AppResult<()> {
        if self.can(menu, action) {
            return Ok(());
        }
        Err(AppError::Forbidden {
            username: self.user.username.clone(),
            action: action.verb().to_string(),
            resource: menu.label().to_string(),
        })
    }

    /// Fails with `Forbidden` unless the user may act as `required`.
    ///
    /// `assigned` narrows a curator stage to the contract's own curator.
    pub fn authorize_stage(
        &self,
        required: RoleKind,
        assigned: Option<i64>,
        action: &str,
    ) -> AppResult<()> {
        if self.is_admin() {
            return Ok(());
        }
        let kind_matches = self.role.kind == required;
        let assignment_matches = required != RoleKind::Curator
            || assigned.is_none_or(|curator_id| curator_id == self.user.id);
        if kind_matches && assignment_matches {
            return Ok(());
        }
        Err(AppError::Forbidden {
            username: self.user.username.clone(),
            action: action.to_string(),
            resource: "this work progress".to_string(),
        })
    }
}
