use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use schedule_cell::router::schedule_routes;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, auth: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", auth)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", auth)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn requests_without_token_are_rejected() {
    let config = TestConfig::default();
    let app = schedule_routes(config.to_state());

    let response = app
        .oneshot(Request::builder().uri("/adjustments").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn only_admins_create_blocks() {
    let config = TestConfig::default();
    let state = config.to_state();
    let doctor_id = Uuid::new_v4();
    let payload = json!({
        "doctor_id": doctor_id,
        "day_of_week": "MONDAY",
        "start_time": "09:00:00",
        "end_time": "11:00:00",
        "max_patients": 2
    });

    let doctor = TestUser::with_id(doctor_id, "doctor");
    let response = schedule_routes(state.clone())
        .oneshot(json_request("POST", "/", &JwtTestUtils::bearer(&doctor, &config), payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = TestUser::admin("admin@example.com");
    let admin_auth = JwtTestUtils::bearer(&admin, &config);
    let response = schedule_routes(state.clone())
        .oneshot(json_request("POST", "/", &admin_auth, payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["max_patients"], 2);

    let duplicate = schedule_routes(state.clone())
        .oneshot(json_request("POST", "/", &admin_auth, payload))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let slots = schedule_routes(state)
        .oneshot(get(
            &format!("/doctors/{}/slots?date=2024-01-01", doctor_id),
            &JwtTestUtils::bearer(&doctor, &config),
        ))
        .await
        .unwrap();
    assert_eq!(slots.status(), StatusCode::OK);
    let body = body_json(slots).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert_eq!(body["data"][0]["start_time"], "2024-01-01T09:00:00");
}

#[tokio::test]
async fn adjustment_round_trip_over_http() {
    let config = TestConfig::default();
    let state = config.to_state();
    let doctor = TestUser::doctor("doc@example.com");
    let doctor_auth = JwtTestUtils::bearer(&doctor, &config);
    let admin_auth = JwtTestUtils::bearer(&TestUser::admin("admin@example.com"), &config);

    let response = schedule_routes(state.clone())
        .oneshot(json_request(
            "POST",
            "/adjustments",
            &doctor_auth,
            json!({
                "day_of_week": "WEDNESDAY",
                "start_time": "14:00:00",
                "end_time": "16:00:00",
                "reason": "Cover for a colleague"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["doctor_id"], doctor.id.to_string());
    let request_id = body["data"]["id"].as_str().unwrap().to_string();

    // doctors cannot decide their own requests
    let response = schedule_routes(state.clone())
        .oneshot(json_request(
            "POST",
            &format!("/adjustments/{}/approve", request_id),
            &doctor_auth,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = schedule_routes(state.clone())
        .oneshot(json_request(
            "POST",
            &format!("/adjustments/{}/approve", request_id),
            &admin_auth,
            json!({ "response_text": "Approved" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "APPROVED");

    let response = schedule_routes(state.clone())
        .oneshot(json_request(
            "POST",
            &format!("/adjustments/{}/reject", request_id),
            &admin_auth,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = schedule_routes(state)
        .oneshot(get("/adjustments/mine", &doctor_auth))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

fn empty_post(uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", auth)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn decisions_without_a_body_use_no_response_text() {
    let config = TestConfig::default();
    let state = config.to_state();
    let doctor = TestUser::doctor("doc@example.com");
    let doctor_auth = JwtTestUtils::bearer(&doctor, &config);
    let admin_auth = JwtTestUtils::bearer(&TestUser::admin("admin@example.com"), &config);

    let mut request_ids = Vec::new();
    for (start, end) in [("08:00:00", "10:00:00"), ("14:00:00", "16:00:00")] {
        let response = schedule_routes(state.clone())
            .oneshot(json_request(
                "POST",
                "/adjustments",
                &doctor_auth,
                json!({
                    "day_of_week": "FRIDAY",
                    "start_time": start,
                    "end_time": end,
                }),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        request_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let response = schedule_routes(state.clone())
        .oneshot(empty_post(&format!("/adjustments/{}/approve", request_ids[0]), &admin_auth))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "APPROVED");
    assert_eq!(body["data"]["admin_response"], Value::Null);

    let response = schedule_routes(state.clone())
        .oneshot(empty_post(&format!("/adjustments/{}/reject", request_ids[1]), &admin_auth))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "REJECTED");

    let response = schedule_routes(state)
        .oneshot(get(&format!("/doctors/{}", doctor.id), &doctor_auth))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["start_time"], "08:00:00");
}
