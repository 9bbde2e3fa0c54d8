//! OpenAPI documentation generated from handler annotations.
//!
//! Data schemas are merged in at render time by
//! [`SpecDocument`](crate::inbound::http::spec::SpecDocument).

use utoipa::OpenApi;

use crate::domain::{Task, ValidationError};
use crate::inbound::http::error::ErrorBody;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "openapi-kit",
        description = "JSON micro-service with validated resources, health probes and a WebSocket RPC endpoint."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::tasks::list_tasks,
        crate::inbound::http::tasks::create_task,
        crate::inbound::http::tasks::get_task,
        crate::inbound::http::tasks::update_task,
        crate::inbound::http::tasks::delete_task,
    ),
    components(schemas(Task, ErrorBody, ValidationError)),
    tags(
        (name = "tasks", description = "Task resource"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
