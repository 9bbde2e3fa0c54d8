//! The OpenAPI document served by the application.

use actix_web::http::StatusCode;
use actix_web::test;
use openapi_kit::ServiceSettings;
use openapi_kit::server::{AppState, build_app};
use rstest::rstest;
use serde_json::Value;

#[rstest]
#[actix_web::test]
async fn document_describes_tasks_and_their_schemas() {
    let state = AppState::build(&ServiceSettings::default()).expect("state");
    let app = test::init_service(build_app(state)).await;
    let response = test::call_service(&app, test::TestRequest::get().uri("/spec").to_request()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc: Value = test::read_body_json(response).await;

    let task = &doc["components"]["schemas"]["Task"];
    assert_eq!(task["properties"]["severity"]["type"], "integer");
    assert_eq!(task["properties"]["severity"]["minimum"], 1);
    assert_eq!(task["properties"]["severity"]["maximum"], 5);
    assert_eq!(task["properties"]["kind"]["enum"][0], "bug");
    assert_eq!(task["properties"]["created"]["format"], "date-time");

    let create = &doc["paths"]["/v1/tasks"]["post"];
    assert_eq!(create["responses"]["201"]["description"], "Task created");
    assert_eq!(
        create["requestBody"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/TaskCreate"
    );
    assert!(doc["components"]["schemas"]["ErrorBody"].is_object());
}
