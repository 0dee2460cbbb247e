//! Router-level tests that never reach the database.

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_reports_database_down() {
    let (app, _) = offline_app();

    let response = send(&app, get_request("/api/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["database"], "down");
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let (app, _) = offline_app();

    for uri in [
        "/api/trips",
        "/api/auth/session",
        "/api/invitations",
        "/api/notifications",
        "/api/crm/clients",
        "/api/landing-pages",
    ] {
        let response = send(&app, get_request(uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let (app, _) = offline_app();
    let forged = format!("Bearer {}.9999999999.deadbeef", Uuid::new_v4());

    let response = send(&app, get_request("/api/trips", Some(&forged))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bulk_rejects_empty_id_list() {
    let (app, state) = offline_app();
    let auth = bearer(&state, Uuid::new_v4());

    let response = send(
        &app,
        json_request("POST", "/api/trips/bulk/archive", Some(&auth), &json!({ "tripIds": [] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["details"][0]["field"], "tripIds");
}

#[tokio::test]
async fn test_bulk_rejects_more_than_one_hundred_ids() {
    let (app, state) = offline_app();
    let auth = bearer(&state, Uuid::new_v4());
    let ids: Vec<Uuid> = (0..101).map(|_| Uuid::new_v4()).collect();

    for path in ["/api/trips/bulk/archive", "/api/trips/bulk/delete"] {
        let response = send(
            &app,
            json_request("POST", path, Some(&auth), &json!({ "tripIds": ids })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", path);
    }

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/trips/bulk/tag",
            Some(&auth),
            &json!({ "tripIds": ids, "tags": ["beach"], "mode": "add" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_rejects_duplicate_ids() {
    let (app, state) = offline_app();
    let auth = bearer(&state, Uuid::new_v4());
    let id = Uuid::new_v4();

    let response = send(
        &app,
        json_request("POST", "/api/trips/bulk/delete", Some(&auth), &json!({ "tripIds": [id, id] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trip_validation_lists_every_field() {
    let (app, state) = offline_app();
    let auth = bearer(&state, Uuid::new_v4());

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/trips",
            Some(&auth),
            &json!({
                "title": "   ",
                "startDate": "2024-06-10",
                "endDate": "2024-06-01",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .expect("details array")
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"endDate"));
}

#[tokio::test]
async fn test_malformed_json_uses_error_shape() {
    let (app, state) = offline_app();
    let auth = bearer(&state, Uuid::new_v4());

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/trips")
        .header("content-type", "application/json")
        .header("authorization", &auth)
        .body(axum::body::Body::from("{ not json"))
        .expect("request");

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_register_validates_before_touching_the_database() {
    let (app, _) = offline_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            &json!({ "email": "not-an-email", "name": "", "password": "short" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["details"].as_array().map(|d| d.len() >= 2).unwrap_or(false));
}

#[tokio::test]
async fn test_logout_clears_the_cookie() {
    let (app, _) = offline_app();

    let response = send(&app, json_request("POST", "/api/auth/logout", None, &json!({}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("wp_session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_invalid_path_id_is_a_client_error() {
    let (app, state) = offline_app();
    let auth = bearer(&state, Uuid::new_v4());

    let response = send(&app, get_request("/api/trips/not-a-uuid", Some(&auth))).await;
    assert!(response.status().is_client_error());
}
