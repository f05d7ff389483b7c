//! Core data models of the system.
//!
//! Plain records for the project hierarchy, contracting, work progress,
//! geography, indicators, documents, tasks and access control.

mod bounds;
mod contract;
mod document;
mod geography;
mod indicator;
mod localized;
mod project;
mod task;
mod user;
mod work_progress;

pub use bounds::{MAX_MAGNITUDE, check_magnitude};
pub use contract::{
    Contract, ContractStatus, Contractor, Payment, PaymentStatus, PaymentType, ProcurementMethod,
    ProcurementPlan, ProcurementStatus,
};
pub use document::{Document, EntityKind, Notification};
pub use geography::{District, FacilityType, HealthFacility, Jamoat, School, Village};
pub use indicator::{
    ContractIndicator, ContractIndicatorProgress, ContractIndicatorVillage, Indicator,
    IndicatorCategory, IndicatorProgressItem, IndicatorValue, ProgressItemTarget,
};
pub use localized::{Language, LocalizedText};
pub use project::{Component, Project, SubComponent};
pub use task::{ProjectTask, TaskChecklistItem, TaskComment, TaskPriority, TaskStatus};
pub use user::{MenuKey, MenuPermission, PermissionAction, Role, RoleKind, User};
pub use work_progress::{ApprovalAction, ApprovalHistoryEntry, ApprovalStatus, WorkProgress};
