mod common;

use axum::http::StatusCode;
use certregistry::auth::token::SessionSigner;
use certregistry::model::{AdminRole, AdminUser};
use chrono::Utc;
use common::{ADMIN_EMAIL, ADMIN_PASSWORD, PUBLIC_BASE_URL, read_json, read_text, test_app};
use http_helpers::{authed_json_request, authed_request, get, json_request};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

type App = axum::routing::RouterIntoService<axum::body::Body, ()>;

async fn login(app: &App) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    body["token"].as_str().expect("token").to_string()
}

async fn create(app: &App, token: &str, body: Value) -> Value {
    let response = app
        .clone()
        .oneshot(authed_json_request("POST", "/v1/certificates", token, body))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

fn accreditation(name: &str) -> Value {
    json!({
        "type": "ACCREDITATION",
        "organizationName": name,
        "address": "456 Innovation Blvd, San Francisco, CA 94102",
        "issueDate": "2024-03-01",
        "expirationDate": "2027-03-01",
        "accreditedAs": "ISO 17025:2017",
        "scope": "Chemical Testing Laboratory",
        "issueNo": "001",
        "initialAccreditationDate": "2024-03-01"
    })
}

fn assert_number_format(number: &str) {
    let parts: Vec<&str> = number.split('-').collect();
    assert_eq!(parts.len(), 4, "{number}");
    assert_eq!(parts[0], "AAA");
    assert!(["IM", "AC", "OM"].contains(&parts[1]), "{number}");
    assert!(parts[2].len() == 4 && parts[2].chars().all(|c| c.is_ascii_digit()));
    assert!(
        parts[3].len() == 6
            && parts[3]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    );
}

#[tokio::test]
async fn login_and_session_smoke() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            json!({"email": ADMIN_EMAIL, "password": "wrong"}),
        ))
        .await
        .expect("bad login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["message"], "Invalid email or password");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            json!({"email": "nobody@aaa.org", "password": ADMIN_PASSWORD}),
        ))
        .await
        .expect("unknown login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = login(&app).await;
    let response = app
        .clone()
        .oneshot(authed_request("GET", "/v1/auth/session", &token))
        .await
        .expect("session");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["admin"]["email"], ADMIN_EMAIL);
    assert_eq!(body["admin"]["role"], "SUPER_ADMIN");
}

#[tokio::test]
async fn session_for_a_removed_admin_is_rejected() {
    let app = test_app().await;
    let signer = SessionSigner::from_secret(&[42u8; 32], Duration::from_secs(3600)).expect("signer");
    let ghost = AdminUser {
        id: Uuid::new_v4(),
        email: "former@aaa.org".to_string(),
        name: "Former Admin".to_string(),
        password_hash: String::new(),
        role: AdminRole::Admin,
        created_at: Utc::now(),
    };
    let issued = signer.mint(&ghost).expect("mint");

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/v1/auth/session", &issued.token))
        .await
        .expect("session");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["message"], "Session is no longer valid");
}

#[tokio::test]
async fn certificate_types_report_default_expirations() {
    let app = test_app().await;
    let token = login(&app).await;

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/v1/certificate-types?issueDate=2024-02-29",
            &token,
        ))
        .await
        .expect("types");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["issueDate"], "2024-02-29");
    let types = body["types"].as_array().expect("types");
    assert_eq!(types.len(), 3);
    assert_eq!(types[0]["type"], "INDIVIDUAL_MEMBERSHIP");
    assert_eq!(types[0]["defaultExpirationDate"], "2026-02-28");
    assert_eq!(types[1]["prefix"], "AC");
    assert_eq!(types[1]["validityYears"], 3);
    assert_eq!(types[1]["defaultExpirationDate"], "2027-02-28");
    assert_eq!(types[2]["displayName"], "Organizational Membership");
    assert_eq!(types[2]["defaultExpirationDate"], "2025-02-28");

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/v1/certificate-types?issueDate=someday",
            &token,
        ))
        .await
        .expect("bad date");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/v1/certificate-types"))
        .await
        .expect("anonymous");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_require_a_valid_session() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(get("/v1/certificates"))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/v1/dashboard", "not-a-token"))
        .await
        .expect("dashboard");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/certificates",
            accreditation("Excellence Labs Inc."),
        ))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["code"], "unauthorized");
}

#[tokio::test]
async fn certificate_crud_smoke() {
    let app = test_app().await;
    let token = login(&app).await;

    let created = create(&app, &token, accreditation("Excellence Labs Inc.")).await;
    assert_eq!(created["status"], "ACTIVE");
    assert_eq!(created["type"], "ACCREDITATION");
    let number = created["certificateNumber"].as_str().expect("number");
    assert_number_format(number);
    assert!(number.starts_with("AAA-AC-"));
    assert_eq!(created["publicSlug"].as_str().expect("slug").len(), 12);
    let id = created["id"].as_str().expect("id").to_string();

    // Reads by id are public.
    let response = app
        .clone()
        .oneshot(get(&format!("/v1/certificates/{id}")))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["organizationName"], "Excellence Labs Inc.");

    let mut update = accreditation("Excellence Labs International");
    update["status"] = json!("ACTIVE");
    update
        .as_object_mut()
        .expect("object")
        .remove("initialAccreditationDate");
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PUT",
            &format!("/v1/certificates/{id}"),
            &token,
            update,
        ))
        .await
        .expect("update");
    assert_eq!(response.status(), StatusCode::OK);
    let updated = read_json(response).await;
    assert_eq!(updated["organizationName"], "Excellence Labs International");
    assert_eq!(updated["certificateNumber"], number);
    assert!(updated["initialAccreditationDate"].is_null());

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &format!("/v1/certificates/{id}/status"),
            &token,
            json!({"status": "DORMANT"}),
        ))
        .await
        .expect("bad status");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &format!("/v1/certificates/{id}/status"),
            &token,
            json!({"status": "REVOKED"}),
        ))
        .await
        .expect("status");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "REVOKED");

    for expected in ["ACTIVE", "PAUSED", "ACTIVE"] {
        let response = app
            .clone()
            .oneshot(authed_request(
                "POST",
                &format!("/v1/certificates/{id}/toggle"),
                &token,
            ))
            .await
            .expect("toggle");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["status"], expected);
    }

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/v1/certificates/{id}/layout"),
            &token,
        ))
        .await
        .expect("layout");
    assert_eq!(response.status(), StatusCode::OK);
    let layout = read_json(response).await;
    assert_eq!(layout["template"], "accreditation");
    assert_eq!(layout["width"], 1024);
    assert_eq!(layout["height"], 723);

    let response = app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/v1/certificates/{id}"),
            &token,
        ))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["success"], true);

    let response = app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/v1/certificates/{id}"),
            &token,
        ))
        .await
        .expect("delete again");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(get("/v1/certificates/not-a-uuid"))
        .await
        .expect("bad id");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_missing_fields() {
    let app = test_app().await;
    let token = login(&app).await;

    let mut body = accreditation("Excellence Labs Inc.");
    body["address"] = json!("   ");
    let response = app
        .clone()
        .oneshot(authed_json_request("POST", "/v1/certificates", &token, body))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["message"], "Missing required fields");

    let mut body = accreditation("Excellence Labs Inc.");
    body["type"] = json!("APPRENTICESHIP");
    let response = app
        .clone()
        .oneshot(authed_json_request("POST", "/v1/certificates", &token, body))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_paginates_and_filters() {
    let app = test_app().await;
    let token = login(&app).await;

    for index in 0..12 {
        let mut body = accreditation(&format!("Lab {index:02}"));
        if index % 3 == 0 {
            body["type"] = json!("ORGANIZATIONAL_MEMBERSHIP");
        }
        create(&app, &token, body).await;
    }

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/v1/certificates?limit=5&page=3", &token))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["pagination"]["total"], 12);
    assert_eq!(body["pagination"]["pages"], 3);
    assert_eq!(body["certificates"].as_array().expect("page").len(), 2);

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/v1/certificates?type=ORGANIZATIONAL_MEMBERSHIP&status=ACTIVE&page=abc",
            &token,
        ))
        .await
        .expect("filtered");
    let body = read_json(response).await;
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/v1/certificates?page=18446744073709551615",
            &token,
        ))
        .await
        .expect("far page");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["pagination"]["total"], 12);
    assert!(body["certificates"].as_array().expect("page").is_empty());

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/v1/certificates?search=lab%2011", &token))
        .await
        .expect("search");
    let body = read_json(response).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["certificates"][0]["organizationName"], "Lab 11");

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/v1/certificates?type=BOGUS", &token))
        .await
        .expect("bad type");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn public_search_and_views_respect_status() {
    let app = test_app().await;
    let token = login(&app).await;

    let active = create(&app, &token, accreditation("Acme Testing Active")).await;
    let paused = create(&app, &token, accreditation("Acme Testing Paused")).await;
    let paused_id = paused["id"].as_str().expect("id");
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            &format!("/v1/certificates/{paused_id}/toggle"),
            &token,
        ))
        .await
        .expect("pause");
    assert_eq!(read_json(response).await["status"], "PAUSED");

    let response = app
        .clone()
        .oneshot(get("/v1/search?q=a"))
        .await
        .expect("short");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/v1/search?q=acme"))
        .await
        .expect("search");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["found"], true);
    assert_eq!(body["certificate"]["id"], active["id"]);

    let response = app
        .clone()
        .oneshot(get("/v1/search?q=zz-no-match"))
        .await
        .expect("miss");
    let body = read_json(response).await;
    assert_eq!(body["found"], false);
    assert!(body["certificate"].is_null());

    let slug = active["publicSlug"].as_str().expect("slug");
    let response = app
        .clone()
        .oneshot(get(&format!("/v1/public/certificates/{slug}")))
        .await
        .expect("public view");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["state"], "available");
    assert_eq!(body["publicUrl"], format!("{PUBLIC_BASE_URL}/certificate/{slug}"));
    assert_eq!(body["layout"]["template"], "accreditation");

    let paused_slug = paused["publicSlug"].as_str().expect("slug");
    let response = app
        .clone()
        .oneshot(get(&format!("/v1/public/certificates/{paused_slug}")))
        .await
        .expect("restricted view");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["state"], "restricted");
    assert_eq!(body["status"], "PAUSED");
    assert!(body.get("certificate").is_none());

    let response = app
        .clone()
        .oneshot(get("/v1/public/certificates/unknown-slug"))
        .await
        .expect("unknown");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn certificate_page_renders_html() {
    let app = test_app().await;
    let token = login(&app).await;

    let created = create(&app, &token, accreditation("Excellence Labs Inc.")).await;
    let slug = created["publicSlug"].as_str().expect("slug");
    let number = created["certificateNumber"].as_str().expect("number");

    let response = app
        .clone()
        .oneshot(get(&format!("/certificate/{slug}")))
        .await
        .expect("page");
    assert_eq!(response.status(), StatusCode::OK);
    let html = read_text(response).await;
    assert!(html.contains("Excellence Labs Inc."));
    assert!(html.contains(&format!("data-filename=\"{number}.png\"")));

    let id = created["id"].as_str().expect("id");
    app.clone()
        .oneshot(authed_json_request(
            "PATCH",
            &format!("/v1/certificates/{id}/status"),
            &token,
            json!({"status": "REVOKED"}),
        ))
        .await
        .expect("revoke");
    let response = app
        .clone()
        .oneshot(get(&format!("/certificate/{slug}")))
        .await
        .expect("restricted page");
    let html = read_text(response).await;
    assert!(html.contains("Certificate Revoked"));
    assert!(!html.contains("Excellence Labs Inc."));

    let response = app
        .clone()
        .oneshot(get("/certificate/unknown-slug"))
        .await
        .expect("missing page");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_and_system_smoke() {
    let app = test_app().await;
    let token = login(&app).await;

    let first = create(&app, &token, accreditation("Lab One")).await;
    create(&app, &token, accreditation("Lab Two")).await;
    let id = first["id"].as_str().expect("id");
    app.clone()
        .oneshot(authed_request(
            "POST",
            &format!("/v1/certificates/{id}/toggle"),
            &token,
        ))
        .await
        .expect("toggle");

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/v1/dashboard", &token))
        .await
        .expect("dashboard");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["active"], 1);
    assert_eq!(body["paused"], 1);
    assert_eq!(body["recent"].as_array().expect("recent").len(), 2);
    let accreditation_count = body["byType"]
        .as_array()
        .expect("by type")
        .iter()
        .find(|entry| entry["type"] == "ACCREDITATION")
        .map(|entry| entry["count"].clone());
    assert_eq!(accreditation_count, Some(json!(2)));

    let response = app
        .clone()
        .oneshot(get("/v1/system/health"))
        .await
        .expect("health");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "ok");

    let response = app
        .clone()
        .oneshot(get("/v1/system/info"))
        .await
        .expect("info");
    let body = read_json(response).await;
    assert_eq!(body["storage_backend"], "memory");
    assert_eq!(body["durable_storage"], false);

    let response = app
        .clone()
        .oneshot(get("/v1/openapi.json"))
        .await
        .expect("openapi");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["paths"]["/v1/certificates"].is_object());
}
