use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use admin_cell::router::admin_routes;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, auth: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", auth);
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn admin_routes_reject_other_roles() {
    let config = TestConfig::default();
    let state = config.to_state();

    for user in [TestUser::doctor("doc@example.com"), TestUser::patient("pat@example.com")] {
        let response = admin_routes(state.clone())
            .oneshot(request("GET", "/stats/overview", &JwtTestUtils::bearer(&user, &config), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let response = admin_routes(state)
        .oneshot(request("GET", "/stats/overview", "Bearer nonsense", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn directory_round_trip() {
    let config = TestConfig::default();
    let state = config.to_state();
    let auth = JwtTestUtils::bearer(&TestUser::admin("admin@example.com"), &config);

    let response = admin_routes(state.clone())
        .oneshot(request("POST", "/departments", &auth, Some(json!({ "name": "Cardiology" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let department_id = body_json(response).await["data"]["id"].as_str().unwrap().to_string();

    let response = admin_routes(state.clone())
        .oneshot(request("POST", "/departments", &auth, Some(json!({ "name": "CARDIOLOGY" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = admin_routes(state.clone())
        .oneshot(request(
            "POST",
            "/doctors",
            &auth,
            Some(json!({ "name": "Dr. House", "department_id": department_id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doctor_id = body_json(response).await["data"]["id"].as_str().unwrap().to_string();

    let response = admin_routes(state.clone())
        .oneshot(request("GET", &format!("/departments/{}/doctors", department_id), &auth, None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["id"], doctor_id);

    let response = admin_routes(state.clone())
        .oneshot(request("DELETE", &format!("/doctors/{}", doctor_id), &auth, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = admin_routes(state)
        .oneshot(request("DELETE", &format!("/doctors/{}", doctor_id), &auth, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_endpoints() {
    let config = TestConfig::default();
    let state = config.to_state();
    let auth = JwtTestUtils::bearer(&TestUser::admin("admin@example.com"), &config);

    let response = admin_routes(state.clone())
        .oneshot(request("GET", "/stats/overview", &auth, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["total_doctors"], 0);

    let response = admin_routes(state.clone())
        .oneshot(request(
            "GET",
            "/stats/daily?start_date=2024-03-01&end_date=2024-03-03",
            &auth,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"][0]["date"], "2024-03-01");

    let response = admin_routes(state)
        .oneshot(request(
            "GET",
            "/stats/workload?start_date=2024-03-05&end_date=2024-03-01",
            &auth,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
