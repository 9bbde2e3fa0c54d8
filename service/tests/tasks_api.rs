//! End-to-end checks of the `/v1/tasks` endpoints through the full app.

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::test;
use openapi_kit::ServiceSettings;
use openapi_kit::server::{AppState, build_app};
use rstest::rstest;
use serde_json::{Value, json};

fn state() -> AppState {
    AppState::build(&ServiceSettings::default()).expect("state")
}

async fn create<S, B>(app: &S, body: Value) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let request = test::TestRequest::post()
        .uri("/v1/tasks")
        .set_json(body)
        .to_request();
    let response = test::call_service(app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    test::read_body_json(response).await
}

#[rstest]
#[actix_web::test]
async fn created_tasks_can_be_read_updated_and_deleted() {
    let app = test::init_service(build_app(state())).await;
    let task = create(&app, json!({ "title": "Write docs", "severity": "4" })).await;
    let id = task["id"].as_str().expect("id").to_owned();
    assert_eq!(task["severity"], 4);
    assert_eq!(task["kind"], "feature");
    assert_eq!(task["done"], false);

    let fetched: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri(&format!("/v1/tasks/{id}")).to_request(),
    )
    .await;
    assert_eq!(fetched, task);

    let updated: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/v1/tasks/{id}"))
            .set_json(json!({ "done": true }))
            .to_request(),
    )
    .await;
    assert_eq!(updated["done"], true);
    assert_eq!(updated["title"], "Write docs");

    let deleted = test::call_service(
        &app,
        test::TestRequest::delete().uri(&format!("/v1/tasks/{id}")).to_request(),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = test::call_service(
        &app,
        test::TestRequest::get().uri(&format!("/v1/tasks/{id}")).to_request(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(missing).await;
    assert_eq!(body, json!({ "message": "Task not found" }));
}

#[rstest]
#[actix_web::test]
async fn invalid_payloads_use_the_bad_data_message() {
    let app = test::init_service(build_app(state())).await;
    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/v1/tasks")
            .set_json(json!({ "severity": 9 }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "Invalid data format");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .expect("errors")
        .iter()
        .filter_map(|error| error["field"].as_str())
        .collect();
    assert_eq!(fields, ["title", "severity"]);
}

#[rstest]
#[actix_web::test]
async fn null_updates_reset_defaults_but_not_required_fields() {
    let app = test::init_service(build_app(state())).await;
    let task = create(&app, json!({ "title": "Triage inbox", "severity": 5 })).await;
    let uri = format!("/v1/tasks/{}", task["id"].as_str().expect("id"));

    let reset: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({ "severity": null }))
            .to_request(),
    )
    .await;
    assert_eq!(reset["severity"], 3);

    let response = test::call_service(
        &app,
        test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({ "title": null }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["errors"], json!([{ "field": "title", "message": "required" }]));

    let stored: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(stored["title"], "Triage inbox");
}

#[rstest]
#[actix_web::test]
async fn malformed_json_is_unprocessable() {
    let app = test::init_service(build_app(state())).await;
    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/v1/tasks")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "Invalid data format");
}

#[rstest]
#[actix_web::test]
async fn listing_paginates_and_filters() {
    let app = test::init_service(build_app(state())).await;
    for (title, severity) in [("alpha", 1), ("bravo", 3), ("charlie", 5)] {
        create(&app, json!({ "title": title, "severity": severity })).await;
    }

    let page = test::call_service(
        &app,
        test::TestRequest::get().uri("/v1/tasks?limit=2").to_request(),
    )
    .await;
    assert_eq!(page.status(), StatusCode::OK);
    assert_eq!(
        page.headers().get("X-Total-Count").and_then(|v| v.to_str().ok()),
        Some("3")
    );
    let link = page
        .headers()
        .get(header::LINK)
        .and_then(|v| v.to_str().ok())
        .expect("link header")
        .to_owned();
    assert!(link.contains(r#"rel="next""#));
    let body: Value = test::read_body_json(page).await;
    let titles: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|task| task["title"].as_str())
        .collect();
    assert_eq!(titles, ["alpha", "bravo"]);

    let filtered: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/v1/tasks?severity:gt=2&limit=10")
            .to_request(),
    )
    .await;
    assert_eq!(filtered.as_array().map(Vec::len), Some(2));
}

#[rstest]
#[case("/v1/tasks?limit=zero", "limit")]
#[case("/v1/tasks?offset=-1", "offset")]
#[case("/v1/tasks?colour=red", "colour")]
#[case("/v1/tasks?title:gt=a", "title:gt")]
#[actix_web::test]
async fn bad_queries_are_rejected(#[case] uri: &str, #[case] field: &str) {
    let app = test::init_service(build_app(state())).await;
    let response = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["errors"][0]["field"], field);
}
