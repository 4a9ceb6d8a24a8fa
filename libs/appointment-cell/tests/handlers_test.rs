use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Local};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::{appointment_routes, schedule_routes};
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

fn future_date_str() -> String {
    (Local::now().date_naive() + Duration::days(7))
        .format("%Y-%m-%d")
        .to_string()
}

async fn mount_empty_availability(mock_server: &MockServer) {
    for resource in ["appointments", "disabled_days", "disabled_hours"] {
        Mock::given(method("GET"))
            .and(path(format!("/rest/v1/{}", resource)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(mock_server)
            .await;
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn appointment_app(mock_server: &MockServer) -> Router {
    appointment_routes(TestConfig::for_mock_server(&mock_server.uri()).to_arc())
}

#[tokio::test]
async fn day_schedule_lists_every_working_hour_slot() {
    let mock_server = MockServer::start().await;
    mount_empty_availability(&mock_server).await;
    let app = appointment_app(&mock_server).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/slots?date={}", future_date_str()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 9);
    assert_eq!(slots[0]["time"], "08:00:00");
    assert_eq!(slots[8]["time"], "16:00:00");
    assert!(slots.iter().all(|slot| slot["bookable"] == true));
}

#[tokio::test]
async fn booking_through_the_router_returns_the_created_appointment() {
    let mock_server = MockServer::start().await;
    let date_str = future_date_str();
    let patient_id = Uuid::new_v4();

    mount_empty_availability(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::appointment(Uuid::new_v4(), patient_id, &date_str, "10:00:00", "pending")
        ])))
        .mount(&mock_server)
        .await;

    let app = appointment_app(&mock_server).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/",
            json!({
                "patient_id": patient_id,
                "date": date_str,
                "time": "10:00:00",
                "patient_note": "First visit"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["appointment"]["status"], "pending");
}

#[tokio::test]
async fn booking_on_a_disabled_day_returns_bad_request() {
    let mock_server = MockServer::start().await;
    let date_str = future_date_str();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/disabled_days"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::disabled_day(&date_str, None)
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/disabled_hours"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = appointment_app(&mock_server).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/",
            json!({
                "patient_id": Uuid::new_v4(),
                "date": date_str,
                "time": "10:00:00",
                "patient_note": null
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "That day is disabled");
}

#[tokio::test]
async fn invalid_status_transition_returns_conflict() {
    let mock_server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let date_str = future_date_str();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment(appointment_id, Uuid::new_v4(), &date_str, "10:00:00", "cancelled")
        ])))
        .mount(&mock_server)
        .await;

    let app = appointment_app(&mock_server).await;

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/{}/status", appointment_id),
            json!({ "status": "confirmed", "admin_note": null, "source": null }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn disabling_a_day_through_the_schedule_router_returns_the_blackout() {
    let mock_server = MockServer::start().await;
    let date_str = future_date_str();

    Mock::given(method("POST"))
        .and(path("/rest/v1/disabled_days"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::disabled_day(&date_str, Some("Conference"))
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = schedule_routes(TestConfig::for_mock_server(&mock_server.uri()).to_arc());

    let response = app
        .oneshot(json_request(
            "POST",
            "/disabled-days",
            json!({ "date": date_str, "admin_note": "Conference" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["date"], date_str);
    assert_eq!(body["admin_note"], "Conference");
}
