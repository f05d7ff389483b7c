//! Users, roles and the role/menu permission matrix.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// The organisational function a role stands for.
///
/// The kind decides which approval stages a role may act on; the menu
/// permission matrix decides which records it may see and change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// Passes every check.
    Administrator,
    /// PMU director: final approval.
    Director,
    /// Component manager: first-level review.
    Manager,
    /// Contract curator: prepares and submits reports.
    Curator,
    /// Specialist (engineer, M&E, procurement).
    Specialist,
    /// Read-mostly access.
    Observer,
}

/// A named role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Unique role name.
    pub name: String,
    /// Organisational function.
    pub kind: RoleKind,
}

impl Role {
    /// Whether holders of the role bypass permission checks.
    pub fn is_admin(&self) -> bool {
        self.kind == RoleKind::Administrator
    }
}

/// A menu section of the application; the unit permissions are granted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuKey {
    /// Projects, components and sub-components.
    Projects,
    /// Contracts.
    Contracts,
    /// Payments.
    Payments,
    /// Work progress reports.
    WorkProgress,
    /// Contractors.
    Contractors,
    /// Procurement plans.
    Procurement,
    /// Districts, jamoats and villages.
    Geography,
    /// Schools and health facilities.
    Facilities,
    /// Indicators, their values and contract indicators.
    Indicators,
    /// Attached documents.
    Documents,
    /// Project tasks.
    Tasks,
    /// User accounts.
    Users,
    /// Roles and permissions.
    Roles,
}

impl MenuKey {
    /// Every menu section.
    pub const ALL: [MenuKey; 13] = [
        MenuKey::Projects,
        MenuKey::Contracts,
        MenuKey::Payments,
        MenuKey::WorkProgress,
        MenuKey::Contractors,
        MenuKey::Procurement,
        MenuKey::Geography,
        MenuKey::Facilities,
        MenuKey::Indicators,
        MenuKey::Documents,
        MenuKey::Tasks,
        MenuKey::Users,
        MenuKey::Roles,
    ];

    /// Snake-case label, also the stored value.
    pub fn label(self) -> &'static str {
        match self {
            MenuKey::Projects => "projects",
            MenuKey::Contracts => "contracts",
            MenuKey::Payments => "payments",
            MenuKey::WorkProgress => "work_progress",
            MenuKey::Contractors => "contractors",
            MenuKey::Procurement => "procurement",
            MenuKey::Geography => "geography",
            MenuKey::Facilities => "facilities",
            MenuKey::Indicators => "indicators",
            MenuKey::Documents => "documents",
            MenuKey::Tasks => "tasks",
            MenuKey::Users => "users",
            MenuKey::Roles => "roles",
        }
    }
}

/// A CRUD action gated by the permission matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Read records.
    View,
    /// Create records.
    Create,
    /// Change records.
    Edit,
    /// Remove records.
    Delete,
}

impl PermissionAction {
    /// Lower-case verb for messages.
    pub fn verb(self) -> &'static str {
        match self {
            PermissionAction::View => "view",
            PermissionAction::Create => "create",
            PermissionAction::Edit => "edit",
            PermissionAction::Delete => "delete",
        }
    }
}

/// One row of the permission matrix: what a role may do in a menu section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuPermission {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Role granted.
    pub role_id: i64,
    /// Menu section.
    pub menu: MenuKey,
    /// May read.
    #[serde(default)]
    pub can_view: bool,
    /// May create.
    #[serde(default)]
    pub can_create: bool,
    /// May change.
    #[serde(default)]
    pub can_edit: bool,
    /// May remove.
    #[serde(default)]
    pub can_delete: bool,
}

impl MenuPermission {
    /// Whether this row grants `action`.
    pub fn allows(&self, action: PermissionAction) -> bool {
        match action {
            PermissionAction::View => self.can_view,
            PermissionAction::Create => self.can_create,
            PermissionAction::Edit => self.can_edit,
            PermissionAction::Delete => self.can_delete,
        }
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Row identifier (ignored on create).
    #[serde(default)]
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// E-mail address.
    #[serde(default)]
    pub email: Option<String>,
    /// Assigned role.
    pub role_id: i64,
    /// Line manager; cleared when the supervisor is deleted.
    #[serde(default)]
    pub supervisor_id: Option<i64>,
    /// Disabled accounts are refused by the API.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Checks field-level invariants.
    pub fn validate(&self) -> AppResult<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::validation("user", "username", "must not be empty"));
        }
        if self.username.chars().any(char::is_whitespace) {
            return Err(AppError::validation(
                "user",
                "username",
                "must not contain whitespace",
            ));
        }
        if self.id != 0 && self.supervisor_id == Some(self.id) {
            return Err(AppError::validation(
                "user",
                "supervisor_id",
                "a user cannot supervise themselves",
            ));
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(AppError::validation("user", "email", "is not an e-mail address"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 5,
            username: "curator1".to_string(),
            full_name: "Curator One".to_string(),
            email: Some("curator1@pmu.tj".to_string()),
            role_id: 2,
            supervisor_id: None,
            is_active: true,
        }
    }

    #[test]
    fn test_permission_row_allows_granted_actions_only() {
        let row = MenuPermission {
            id: 1,
            role_id: 2,
            menu: MenuKey::Contracts,
            can_view: true,
            can_create: false,
            can_edit: true,
            can_delete: false,
        };
        assert!(row.allows(PermissionAction::View));
        assert!(row.allows(PermissionAction::Edit));
        assert!(!row.allows(PermissionAction::Create));
        assert!(!row.allows(PermissionAction::Delete));
    }

    #[test]
    fn test_self_supervision_is_rejected() {
        let mut u = user();
        u.supervisor_id = Some(5);
        assert!(u.validate().is_err());
    }

    #[test]
    fn test_username_with_space_is_rejected() {
        let mut u = user();
        u.username = "cur ator".to_string();
        assert!(u.validate().is_err());
    }

    #[test]
    fn test_user_defaults_to_active() {
        let json = r#"{"username": "m1", "full_name": "Manager", "role_id": 3}"#;
        let u: User = serde_json::from_str(json).unwrap();
        assert!(u.is_active);
        assert_eq!(u.supervisor_id, None);
    }

    #[test]
    fn test_menu_key_labels_match_serde() {
        for key in MenuKey::ALL {
            assert_eq!(
                serde_json::to_string(&key).unwrap(),
                format!("\"{}\"", key.label())
            );
        }
    }

    #[test]
    fn test_admin_role() {
        let role = Role {
            id: 1,
            name: "Admin".to_string(),
            kind: RoleKind::Administrator,
        };
        assert!(role.is_admin());
    }
}
