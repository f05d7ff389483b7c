//! Integration tests for PMMIS.
//!
//! Drives the HTTP router over an in-memory database:
//! - Permission matrix and identity checks
//! - Work progress approval cycle, history and notifications
//! - Indicator rollup from checklist items to contract reports
//! - Payments against approved reports
//! - Delete rules (restrict, cascade with rollup refresh)
//! - Error cases

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tower::ServiceExt;

use pmmis::api::{create_router, AppState};
use pmmis::config::{AppConfig, ConfigLoader};
use pmmis::db::{bootstrap, Database};

// =============================================================================
// Test Helpers
// =============================================================================

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal string")).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Pmu {
    router: Router,
    admin: i64,
    curator: i64,
    manager: i64,
    director: i64,
    observer: i64,
    project_id: i64,
    contract_id: i64,
    contract_indicator_id: i64,
    village_ids: [i64; 2],
    school_id: i64,
}

impl Pmu {
    async fn call(&self, user: i64, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-User-Id", user.to_string());
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn get(&self, user: i64, uri: &str) -> (StatusCode, Value) {
        self.call(user, "GET", uri, None).await
    }

    async fn post(&self, user: i64, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(user, "POST", uri, Some(body)).await
    }

    /// Creates a record and returns its id, failing the test otherwise.
    async fn create(&self, user: i64, uri: &str, body: Value) -> i64 {
        let (status, json) = self.post(user, uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "POST {} failed: {}", uri, json);
        json["id"].as_i64().unwrap()
    }

    async fn action(&self, user: i64, report: i64, action: &str, comment: Option<&str>) -> (StatusCode, Value) {
        self.post(
            user,
            &format!("/api/work-progress/{}/{}", report, action),
            json!({ "comment": comment }),
        )
        .await
    }

    async fn new_report(&self, number: &str) -> i64 {
        self.create(
            self.curator,
            "/api/work-progress",
            json!({
                "contract_id": self.contract_id,
                "report_number": number,
                "report_date": "2025-06-30",
                "progress_percent": "40",
                "completed_amount": "400000"
            }),
        )
        .await
    }

    /// A report with a progress row whose checklist sums to 3.
    async fn report_with_checklist(&self, number: &str) -> (i64, i64) {
        let report = self.new_report(number).await;
        let progress = self
            .create(
                self.curator,
                "/api/contract-indicator-progress",
                json!({
                    "contract_indicator_id": self.contract_indicator_id,
                    "work_progress_id": report,
                    "value": "0"
                }),
            )
            .await;
        for (target, done, value) in [
            (json!({"kind": "village", "id": self.village_ids[0]}), true, Value::Null),
            (json!({"kind": "school", "id": self.school_id}), true, json!("2")),
            (json!({"kind": "village", "id": self.village_ids[1]}), false, json!("5")),
        ] {
            self.create(
                self.curator,
                "/api/indicator-progress-items",
                json!({
                    "progress_id": progress,
                    "target": target,
                    "is_completed": done,
                    "numeric_value": value
                }),
            )
            .await;
        }
        (report, progress)
    }

    async fn approve(&self, report: i64) {
        for (user, action) in [
            (self.curator, "submit"),
            (self.manager, "manager-approve"),
            (self.director, "director-approve"),
        ] {
            let (status, body) = self.action(user, report, action, None).await;
            assert_eq!(status, StatusCode::OK, "{} failed: {}", action, body);
        }
    }
}

async fn grant(pmu: &Pmu, role: i64, menu: &str, view: bool, create: bool, edit: bool, delete: bool) {
    pmu
        .create(
            pmu.admin,
            "/api/menu-permissions",
            json!({
                "role_id": role,
                "menu": menu,
                "can_view": view,
                "can_create": create,
                "can_edit": edit,
                "can_delete": delete
            }),
        )
        .await;
}

/// Builds a PMU with one contract, one contract indicator and two villages.
async fn setup() -> Pmu {
    let config = ConfigLoader::from_config(AppConfig::for_tests()).unwrap();
    let db = Database::open_in_memory().unwrap();
    let admin = db
        .with_conn_mut(|conn| bootstrap::ensure_administrator(conn, &config.config().bootstrap))
        .unwrap()
        .unwrap();
    let mut pmu = Pmu {
        router: create_router(AppState::new(config, db)),
        admin: admin.id,
        curator: 0,
        manager: 0,
        director: 0,
        observer: 0,
        project_id: 0,
        contract_id: 0,
        contract_indicator_id: 0,
        village_ids: [0, 0],
        school_id: 0,
    };

    let mut roles = Vec::new();
    for (name, kind) in [
        ("Curators", "curator"),
        ("Managers", "manager"),
        ("Directors", "director"),
        ("Observers", "observer"),
    ] {
        roles.push(
            pmu.create(pmu.admin, "/api/roles", json!({ "name": name, "kind": kind }))
                .await,
        );
    }
    let [curator_role, manager_role, director_role, observer_role]: [i64; 4] =
        roles.try_into().unwrap();
    grant(&pmu, curator_role, "work_progress", true, true, true, true).await;
    grant(&pmu, curator_role, "indicators", true, true, true, true).await;
    grant(&pmu, curator_role, "contracts", true, false, false, false).await;
    for role in [manager_role, director_role] {
        grant(&pmu, role, "work_progress", true, false, true, false).await;
        grant(&pmu, role, "contracts", true, false, false, false).await;
        grant(&pmu, role, "projects", true, false, false, false).await;
    }
    grant(&pmu, observer_role, "contracts", true, false, false, false).await;

    pmu.director = pmu
        .create(
            pmu.admin,
            "/api/users",
            json!({"username": "d.rahimov", "full_name": "Director", "role_id": director_role}),
        )
        .await;
    pmu.manager = pmu
        .create(
            pmu.admin,
            "/api/users",
            json!({"username": "m.saidova", "full_name": "Manager", "role_id": manager_role, "supervisor_id": pmu.director}),
        )
        .await;
    pmu.curator = pmu
        .create(
            pmu.admin,
            "/api/users",
            json!({"username": "k.nazarov", "full_name": "Curator", "role_id": curator_role, "supervisor_id": pmu.manager}),
        )
        .await;
    pmu.observer = pmu
        .create(
            pmu.admin,
            "/api/users",
            json!({"username": "o.karimov", "full_name": "Observer", "role_id": observer_role}),
        )
        .await;

    pmu.project_id = pmu
        .create(
            pmu.admin,
            "/api/projects",
            json!({
                "code": "RRP-1",
                "name": {"ru": "Проект восстановления", "en": "Rural Rehabilitation"},
                "donor": "IDA",
                "start_date": "2024-01-01",
                "budget": "2000000"
            }),
        )
        .await;
    let contractor = pmu
        .create(
            pmu.admin,
            "/api/contractors",
            json!({"name": "Sohtmon LLC", "tax_id": "520012345"}),
        )
        .await;
    pmu.contract_id = pmu
        .create(
            pmu.admin,
            "/api/contracts",
            json!({
                "number": "RRP/W-01",
                "title": "School rehabilitation",
                "project_id": pmu.project_id,
                "contractor_id": contractor,
                "curator_id": pmu.curator,
                "signing_date": "2025-01-01",
                "contract_end_date": "2025-12-31",
                "contract_amount": "1000000",
                "currency": "tjs"
            }),
        )
        .await;
    let indicator = pmu
        .create(
            pmu.admin,
            "/api/indicators",
            json!({
                "code": "IR-1",
                "name": {"ru": "Отремонтированные школы", "en": "Schools rehabilitated"},
                "category": "intermediate",
                "unit": "schools",
                "target_value": "20"
            }),
        )
        .await;
    pmu.contract_indicator_id = pmu
        .create(
            pmu.admin,
            "/api/contract-indicators",
            json!({
                "contract_id": pmu.contract_id,
                "indicator_id": indicator,
                "target_value": "10",
                "achieved_value": "999"
            }),
        )
        .await;

    let district = pmu
        .create(pmu.admin, "/api/districts", json!({"name": {"ru": "Рашт"}}))
        .await;
    let jamoat = pmu
        .create(
            pmu.admin,
            "/api/jamoats",
            json!({"district_id": district, "name": {"ru": "Навдонак"}}),
        )
        .await;
    for (index, name) in ["Ғарм", "Хоҷаи Ҳоҷӣ"].into_iter().enumerate() {
        pmu.village_ids[index] = pmu
            .create(
                pmu.admin,
                "/api/villages",
                json!({"jamoat_id": jamoat, "name": {"ru": name}}),
            )
            .await;
    }
    pmu.school_id = pmu
        .create(
            pmu.admin,
            "/api/schools",
            json!({"village_id": pmu.village_ids[0], "name": "Школа №1"}),
        )
        .await;
    pmu
}

// =============================================================================
// Approval workflow
// =============================================================================

#[tokio::test]
async fn test_full_approval_cycle_rolls_up_indicator() {
    let pmu = setup().await;

    let (ci_status, ci) = pmu
        .get(pmu.admin, &format!("/api/contract-indicators/{}", pmu.contract_indicator_id))
        .await;
    assert_eq!(ci_status, StatusCode::OK);
    assert_eq!(decimal(&ci["achieved_value"]), Decimal::ZERO);

    let (report, progress) = pmu.report_with_checklist("AVR-1").await;
    let (_, row) = pmu
        .get(pmu.curator, &format!("/api/contract-indicator-progress/{}", progress))
        .await;
    assert_eq!(decimal(&row["value"]), dec("3"));

    let (status, body) = pmu.action(pmu.curator, report, "submit", Some("works done")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["work_progress"]["approval_status"], "submitted_for_review");
    assert_eq!(body["work_progress"]["submission_comment"], "works done");
    assert_eq!(body["notified"], json!([pmu.manager]));

    let (_, inbox) = pmu.get(pmu.manager, "/api/notifications").await;
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    assert_eq!(inbox[0]["entity_type"], "work_progress");
    assert_eq!(inbox[0]["entity_id"], report);

    let (status, body) = pmu.action(pmu.manager, report, "manager-approve", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notified"], json!([pmu.director]));

    // Not yet counted: only final approval contributes.
    let (_, report_view) = pmu
        .get(pmu.director, &format!("/api/reports/contracts/{}?as_of=2025-12-01", pmu.contract_id))
        .await;
    assert_eq!(decimal(&report_view["indicators"][0]["achieved_value"]), Decimal::ZERO);

    let (status, body) = pmu.action(pmu.director, report, "director-approve", Some("accepted")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["work_progress"]["approval_status"], "director_approved");
    assert_eq!(body["work_progress"]["director_id"], pmu.director);

    let (status, report_view) = pmu
        .get(
            pmu.director,
            &format!("/api/reports/contracts/{}?as_of=2025-12-01&lang=en", pmu.contract_id),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let line = &report_view["indicators"][0];
    assert_eq!(line["name"], "Schools rehabilitated");
    assert_eq!(decimal(&line["achieved_value"]), dec("3"));
    assert_eq!(decimal(&line["progress_percent"]), dec("30"));
    assert_eq!(decimal(&report_view["latest_progress_percent"]), dec("40"));
    assert_eq!(report_view["financials"]["remaining_days"], 30);

    let (_, history) = pmu
        .get(pmu.manager, &format!("/api/work-progress/{}/history", report))
        .await;
    let steps: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["action"].as_str().unwrap())
        .collect();
    assert_eq!(steps, vec!["submit", "manager_approve", "director_approve"]);
}

#[tokio::test]
async fn test_client_cannot_set_workflow_fields_or_achieved_value() {
    let pmu = setup().await;
    let (status, created) = pmu
        .post(
            pmu.curator,
            "/api/work-progress",
            json!({
                "contract_id": pmu.contract_id,
                "report_number": "AVR-X",
                "report_date": "2025-06-30",
                "progress_percent": "10",
                "approval_status": "director_approved",
                "director_id": pmu.director
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["approval_status"], "draft");
    assert_eq!(created["director_id"], Value::Null);
    assert_eq!(created["created_by"], pmu.curator);

    // "achieved_value": "999" was sent on create
    let (_, ci) = pmu
        .get(pmu.admin, &format!("/api/contract-indicators/{}", pmu.contract_indicator_id))
        .await;
    assert_eq!(decimal(&ci["achieved_value"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_submitted_report_is_locked() {
    let pmu = setup().await;
    let (report, progress) = pmu.report_with_checklist("AVR-1").await;
    pmu.action(pmu.curator, report, "submit", None).await;

    let (status, body) = pmu
        .call(
            pmu.curator,
            "PUT",
            &format!("/api/work-progress/{}", report),
            Some(json!({
                "contract_id": pmu.contract_id,
                "report_number": "AVR-1",
                "report_date": "2025-06-30",
                "progress_percent": "90"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let (status, _) = pmu
        .post(
            pmu.curator,
            "/api/indicator-progress-items",
            json!({"progress_id": progress, "target": {"kind": "village", "id": pmu.village_ids[1]}, "is_completed": true}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = pmu
        .call(pmu.curator, "DELETE", &format!("/api/work-progress/{}", report), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reject_requires_reason_and_revise_reopens() {
    let pmu = setup().await;
    let report = pmu.new_report("AVR-1").await;
    pmu.action(pmu.curator, report, "submit", None).await;

    let (status, body) = pmu.action(pmu.manager, report, "reject", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = pmu
        .action(pmu.manager, report, "reject", Some("Photos of the roof are missing"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["work_progress"]["approval_status"], "rejected");
    assert_eq!(body["work_progress"]["rejected_by"], pmu.manager);
    assert_eq!(body["notified"], json!([pmu.curator]));

    let (status, body) = pmu.action(pmu.curator, report, "submit", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let (status, body) = pmu.action(pmu.curator, report, "revise", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["work_progress"]["approval_status"], "draft");

    let (status, body) = pmu.action(pmu.curator, report, "submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["work_progress"]["rejection_reason"], Value::Null);
}

#[tokio::test]
async fn test_stage_authority_is_enforced() {
    let pmu = setup().await;
    let report = pmu.new_report("AVR-1").await;

    let (status, body) = pmu.action(pmu.manager, report, "submit", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    pmu.action(pmu.curator, report, "submit", None).await;
    let (status, _) = pmu.action(pmu.director, report, "manager-approve", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = pmu.action(pmu.manager, report, "director-approve", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Administrators hold every authority.
    let (status, _) = pmu.action(pmu.admin, report, "manager-approve", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_read_notifications() {
    let pmu = setup().await;
    let report = pmu.new_report("AVR-1").await;
    pmu.approve(report).await;

    let (_, inbox) = pmu.get(pmu.curator, "/api/notifications").await;
    let inbox = inbox.as_array().unwrap().clone();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["is_read"], false);

    let id = inbox[0]["id"].as_i64().unwrap();
    let (status, _) = pmu
        .post(pmu.manager, &format!("/api/notifications/{}/read", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = pmu
        .post(pmu.curator, &format!("/api/notifications/{}/read", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_read"], true);

    let (status, body) = pmu.post(pmu.manager, "/api/notifications/read-all", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);
}

// =============================================================================
// Access control
// =============================================================================

#[tokio::test]
async fn test_permission_matrix_gates_crud() {
    let pmu = setup().await;

    let (status, contracts) = pmu.get(pmu.observer, "/api/contracts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(contracts.as_array().unwrap().len(), 1);

    let (status, body) = pmu
        .post(pmu.observer, "/api/contractors", json!({"name": "X", "tax_id": "1"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "User 'o.karimov' may not create contractors");

    let (status, _) = pmu
        .get(pmu.observer, &format!("/api/work-progress/{}/history", 1))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, me) = pmu.get(pmu.curator, "/api/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"]["kind"], "curator");
    assert_eq!(me["permissions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_permission_is_checked_before_the_body() {
    let pmu = setup().await;

    let (status, body) = pmu
        .post(pmu.observer, "/api/contractors", json!({"name": 42, "tax_id": []}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = pmu
        .call(
            pmu.observer,
            "PUT",
            &format!("/api/contracts/{}", pmu.contract_id),
            Some(json!({"contract_amount": "not a number"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_identity_errors() {
    let pmu = setup().await;

    let (status, body) = pmu.get(9_999, "/api/contracts").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, observer) = pmu.get(pmu.admin, &format!("/api/users/{}", pmu.observer)).await;
    assert_eq!(status, StatusCode::OK);
    let mut inactive = observer.clone();
    inactive["is_active"] = json!(false);
    let (status, _) = pmu
        .call(pmu.admin, "PUT", &format!("/api/users/{}", pmu.observer), Some(inactive))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = pmu.get(pmu.observer, "/api/contracts").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_subordinates_follow_the_supervisor_chain() {
    let pmu = setup().await;
    let (status, subordinates) = pmu
        .get(pmu.director, &format!("/api/users/{}/subordinates", pmu.director))
        .await;
    assert_eq!(status, StatusCode::OK);
    let mut ids: Vec<i64> = subordinates
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_i64().unwrap())
        .collect();
    ids.sort_unstable();
    let mut expected = vec![pmu.manager, pmu.curator];
    expected.sort_unstable();
    assert_eq!(ids, expected);

    // Someone else's chain needs view rights on users.
    let (status, _) = pmu
        .get(pmu.manager, &format!("/api/users/{}/subordinates", pmu.director))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Payments and reports
// =============================================================================

#[tokio::test]
async fn test_payment_requires_final_approval() {
    let pmu = setup().await;
    let report = pmu.new_report("AVR-1").await;
    let payment = json!({
        "contract_id": pmu.contract_id,
        "work_progress_id": report,
        "amount": "250000",
        "payment_date": "2025-07-15",
        "payment_type": "interim",
        "status": "paid"
    });

    let (status, body) = pmu.post(pmu.admin, "/api/payments", payment.clone()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    pmu.approve(report).await;
    pmu.create(pmu.admin, "/api/payments", payment).await;

    let (_, view) = pmu
        .get(pmu.director, &format!("/api/reports/contracts/{}?as_of=2026-01-10", pmu.contract_id))
        .await;
    assert_eq!(decimal(&view["financials"]["paid_percent"]), dec("25"));
    assert_eq!(decimal(&view["financials"]["remaining_amount"]), dec("750000"));
    assert_eq!(view["financials"]["remaining_days"], -10);
    assert_eq!(view["contract"]["currency"], "TJS");

    let (status, project) = pmu
        .get(pmu.director, &format!("/api/reports/projects/{}?as_of=2025-12-01", pmu.project_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["contract_count"], 1);
    assert_eq!(decimal(&project["paid_percent"]), dec("25"));
    assert_eq!(decimal(&project["budget_utilization_percent"]), dec("50"));
    assert_eq!(project["name"], "Проект восстановления");
}

// =============================================================================
// Delete rules
// =============================================================================

#[tokio::test]
async fn test_project_with_contracts_cannot_be_deleted() {
    let pmu = setup().await;
    let (status, body) = pmu
        .call(pmu.admin, "DELETE", &format!("/api/projects/{}", pmu.project_id), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_deleting_a_village_releases_its_checklist_items() {
    let pmu = setup().await;
    let (report, progress) = pmu.report_with_checklist("AVR-1").await;
    pmu.approve(report).await;

    let (status, _) = pmu
        .call(pmu.admin, "DELETE", &format!("/api/villages/{}", pmu.village_ids[0]), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The village and its school are gone; only the open item remains.
    let (_, items) = pmu
        .get(pmu.curator, &format!("/api/indicator-progress-items?progress_id={}", progress))
        .await;
    assert_eq!(items.as_array().unwrap().len(), 1);

    let (_, row) = pmu
        .get(pmu.curator, &format!("/api/contract-indicator-progress/{}", progress))
        .await;
    assert_eq!(decimal(&row["value"]), Decimal::ZERO);
    let (_, ci) = pmu
        .get(pmu.admin, &format!("/api/contract-indicators/{}", pmu.contract_indicator_id))
        .await;
    assert_eq!(decimal(&ci["achieved_value"]), Decimal::ZERO);
}

// =============================================================================
// Error cases
// =============================================================================

#[tokio::test]
async fn test_list_filters() {
    let pmu = setup().await;
    pmu.new_report("AVR-1").await;
    pmu.new_report("AVR-2").await;

    let (status, reports) = pmu
        .get(pmu.curator, &format!("/api/work-progress?contract_id={}", pmu.contract_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reports.as_array().unwrap().len(), 2);

    let (status, body) = pmu.get(pmu.curator, "/api/work-progress?colour=red").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_duplicate_and_missing_records() {
    let pmu = setup().await;

    let (status, body) = pmu
        .post(
            pmu.admin,
            "/api/projects",
            json!({"code": "RRP-1", "name": {"ru": "Дубликат"}, "start_date": "2024-01-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = pmu.get(pmu.admin, "/api/contracts/4040").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "contract 4040 not found");

    let (status, body) = pmu
        .post(
            pmu.admin,
            "/api/jamoats",
            json!({"district_id": 4040, "name": {"ru": "Нет"}}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_missing_content_type() {
    let pmu = setup().await;
    let response = pmu
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/districts")
                .header("X-User-Id", pmu.admin.to_string())
                .body(Body::from(r#"{"name": {"ru": "Рашт"}}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "MISSING_CONTENT_TYPE");
}

// =============================================================================
// Amount limits
// =============================================================================

#[tokio::test]
async fn test_oversized_amounts_do_not_take_the_service_down() {
    let config = ConfigLoader::from_config(AppConfig::for_tests()).unwrap();
    let db = Database::open_in_memory().unwrap();
    let admin = db
        .with_conn_mut(|conn| bootstrap::ensure_administrator(conn, &config.config().bootstrap))
        .unwrap()
        .unwrap();
    // A row written before amounts were bounded.
    let (project_id, contractor_id, contract_id) = db
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (code, name_ru, start_date) VALUES ('OLD-1', 'Old', '2020-01-01')",
                [],
            )?;
            let project_id = conn.last_insert_rowid();
            conn.execute(
                "INSERT INTO contractors (name, tax_id) VALUES ('Old LLC', '100200300')",
                [],
            )?;
            let contractor_id = conn.last_insert_rowid();
            conn.execute(
                "INSERT INTO contracts
                    (number, title, project_id, contractor_id, signing_date, contract_end_date,
                     contract_amount, additional_amount, currency, status)
                 VALUES ('OLD/W-01', 'Imported', ?1, ?2, '2020-01-01', '2020-12-31',
                     '79228162514264337593543950335', '1', 'tjs', 'active')",
                [project_id, contractor_id],
            )?;
            Ok((project_id, contractor_id, conn.last_insert_rowid()))
        })
        .unwrap();
    let pmu = Pmu {
        router: create_router(AppState::new(config, db)),
        admin: admin.id,
        curator: 0,
        manager: 0,
        director: 0,
        observer: 0,
        project_id,
        contract_id,
        contract_indicator_id: 0,
        village_ids: [0, 0],
        school_id: 0,
    };

    let (status, body) = pmu
        .post(
            pmu.admin,
            "/api/contracts",
            json!({
                "number": "OLD/W-02",
                "title": "Oversized",
                "project_id": project_id,
                "contractor_id": contractor_id,
                "signing_date": "2025-01-01",
                "contract_end_date": "2025-12-31",
                "contract_amount": "79228162514264337593543950335",
                "additional_amount": "1",
                "currency": "tjs"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    for uri in [
        format!("/api/reports/contracts/{}", contract_id),
        format!("/api/reports/projects/{}", project_id),
    ] {
        let (status, body) = pmu.get(pmu.admin, &uri).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "GET {}: {}", uri, body);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    let (status, _) = pmu.get(pmu.admin, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let (status, projects) = pmu.get(pmu.admin, "/api/projects").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(projects.as_array().unwrap().len(), 1);
}
