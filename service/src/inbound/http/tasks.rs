//! `/v1/tasks` CRUD endpoints.
//!
//! Payloads are validated by the task data schemas; responses are dumped
//! through the stored task schema. Listing supports `limit`/`offset`
//! pagination plus filters on any field query key (`severity:gt=2`).

use std::collections::HashMap;

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, web};
use chrono::Utc;
use pagination::{PageRequest, Pagination, TOTAL_COUNT_HEADER};
use serde_json::Value;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::domain::Task;

use super::error::{ApiError, ApiResult, ErrorBody};
use super::state::HttpState;

const TASK: &str = "Task";
const LIMIT_PARAM: &str = "limit";
const OFFSET_PARAM: &str = "offset";

fn served(state: &HttpState, task: &Task) -> Value {
    Value::Object(state.task_schema.dump(task.to_map()))
}

/// Normalise any UUID spelling to the stored hex form; unknown ids are 404s.
fn task_id(raw: &str) -> ApiResult<String> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.simple().to_string())
        .map_err(|_| ApiError::not_found(TASK))
}

fn request_url(req: &HttpRequest) -> Option<Url> {
    let info = req.connection_info();
    Url::parse(&format!("{}://{}{}", info.scheme(), info.host(), req.uri())).ok()
}

/// List tasks.
#[utoipa::path(
    get,
    path = "/v1/tasks",
    tags = ["tasks"],
    params(
        ("limit" = Option<u32>, Query, description = "Page size, clamped to MAX_PAGINATION_LIMIT"),
        ("offset" = Option<u64>, Query, description = "Items to skip")
    ),
    responses(
        (status = 200, description = "One page of tasks", body = [Task],
            headers(
                ("X-Total-Count" = u64, description = "Matching tasks across all pages"),
                ("Link" = String, description = "RFC 8288 navigation links")
            )),
        (status = 422, description = "Invalid pagination or filter", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ErrorBody)
    )
)]
#[get("/v1/tasks")]
pub async fn list_tasks(
    state: web::Data<HttpState>,
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
) -> ApiResult<HttpResponse> {
    let mut params = query.into_inner();
    let limit = params.remove(LIMIT_PARAM);
    let offset = params.remove(OFFSET_PARAM);
    let page = PageRequest::from_query(limit.as_deref(), offset.as_deref(), &state.pagination)
        .map_err(|error| state.bad_page(&error))?;
    let filters = state
        .task_schema
        .parse_filters(&params)
        .map_err(|errors| state.bad_data(errors))?;

    let tasks = state
        .tasks
        .list(&filters)
        .await
        .map_err(|error| state.internal(error))?;
    let total = tasks.len();
    let body: Vec<Value> = tasks[page.window(total)]
        .iter()
        .map(|task| served(&state, task))
        .collect();

    let mut response = HttpResponse::Ok();
    response.insert_header((TOTAL_COUNT_HEADER, total.to_string()));
    let links = request_url(&req)
        .and_then(|url| Pagination::links(&url, page, u64::try_from(total).unwrap_or(u64::MAX)));
    if let Some(links) = links {
        response.insert_header((header::LINK, links));
    }
    Ok(response.json(body))
}

/// Create a task.
#[utoipa::path(
    post,
    path = "/v1/tasks",
    tags = ["tasks"],
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 422, description = "Invalid payload", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ErrorBody)
    )
)]
#[post("/v1/tasks")]
pub async fn create_task(
    state: web::Data<HttpState>,
    payload: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let data = state
        .new_task_schema
        .validate(&payload)
        .map_err(|errors| state.bad_data(errors))?;
    let task = Task::create(data, Uuid::new_v4(), Utc::now()).map_err(|errors| state.internal(errors))?;
    state
        .tasks
        .insert(task.clone())
        .await
        .map_err(|error| state.internal(error))?;
    info!(task_id = %task.id, "task created");
    Ok(HttpResponse::Created().json(served(&state, &task)))
}

/// Fetch one task.
#[utoipa::path(
    get,
    path = "/v1/tasks/{id}",
    tags = ["tasks"],
    params(("id" = String, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "The task", body = Task),
        (status = 404, description = "No such task", body = ErrorBody)
    )
)]
#[get("/v1/tasks/{id}")]
pub async fn get_task(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = task_id(&path)?;
    let task = state
        .tasks
        .get(&id)
        .await
        .map_err(|error| state.internal(error))?
        .ok_or_else(|| ApiError::not_found(TASK))?;
    Ok(HttpResponse::Ok().json(served(&state, &task)))
}

/// Update some fields of a task.
#[utoipa::path(
    patch,
    path = "/v1/tasks/{id}",
    tags = ["tasks"],
    params(("id" = String, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "The updated task", body = Task),
        (status = 404, description = "No such task", body = ErrorBody),
        (status = 422, description = "Invalid payload", body = ErrorBody)
    )
)]
#[patch("/v1/tasks/{id}")]
pub async fn update_task(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let id = task_id(&path)?;
    let update = state
        .new_task_schema
        .validate_partial(&payload)
        .map_err(|errors| state.bad_data(errors))?;
    // Merging a validated payload only fails if schema and record drift.
    let updated = state
        .tasks
        .update(&id, Box::new(move |task: &Task| task.apply(update)))
        .await
        .map_err(|error| state.internal(error))?
        .ok_or_else(|| ApiError::not_found(TASK))?;
    Ok(HttpResponse::Ok().json(served(&state, &updated)))
}

/// Delete a task.
#[utoipa::path(
    delete,
    path = "/v1/tasks/{id}",
    tags = ["tasks"],
    params(("id" = String, Path, description = "Task identifier")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "No such task", body = ErrorBody)
    )
)]
#[delete("/v1/tasks/{id}")]
pub async fn delete_task(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = task_id(&path)?;
    let deleted = state
        .tasks
        .delete(&id)
        .await
        .map_err(|error| state.internal(error))?;
    if deleted {
        info!(task_id = %id, "task deleted");
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::not_found(TASK))
    }
}

/// Register the task endpoints.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_tasks)
        .service(create_task)
        .service(get_task)
        .service(update_task)
        .service(delete_task);
}
