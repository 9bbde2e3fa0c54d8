//! The OpenAPI document served at `SPEC_ROUTE`.
//!
//! Paths come from the `utoipa` annotations collected in [`ApiDoc`]. Data
//! schemas are not Rust types, so their JSON schemas are merged into
//! `components.schemas` afterwards and wired up as request bodies.

use actix_web::{HttpResponse, web};
use serde_json::{Map, Value, json};
use utoipa::OpenApi;

use crate::doc::ApiDoc;
use crate::domain::DataSchema;
use crate::domain::tasks::{NEW_TASK_SCHEMA, new_task_schema, task_schema};

/// A request body to attach to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestBody {
    /// Path template, as declared on the handler.
    pub path: &'static str,
    /// Lower-case HTTP method.
    pub method: &'static str,
    /// Component name of the body schema.
    pub schema: &'static str,
}

const TASK_BODIES: [RequestBody; 2] = [
    RequestBody {
        path: "/v1/tasks",
        method: "post",
        schema: NEW_TASK_SCHEMA,
    },
    RequestBody {
        path: "/v1/tasks/{id}",
        method: "patch",
        schema: NEW_TASK_SCHEMA,
    },
];

/// Rendered OpenAPI document, built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument(Value);

impl SpecDocument {
    /// The document for this service.
    ///
    /// # Errors
    ///
    /// Fails only if the generated document cannot be serialised.
    pub fn build() -> Result<Self, serde_json::Error> {
        let base = serde_json::to_value(ApiDoc::openapi())?;
        Ok(Self::from_parts(
            base,
            &[task_schema(), new_task_schema()],
            &TASK_BODIES,
        ))
    }

    /// Merge `schemas` and `bodies` into a generated document.
    pub fn from_parts(mut base: Value, schemas: &[DataSchema], bodies: &[RequestBody]) -> Self {
        if let Some(components) = object_entry(&mut base, "components")
            .and_then(|components| object_entry(components, "schemas"))
            .and_then(Value::as_object_mut)
        {
            for schema in schemas {
                components.insert(schema.name().to_owned(), schema.openapi_schema());
            }
        }

        for body in bodies {
            let operation = base
                .get_mut("paths")
                .and_then(|paths| paths.get_mut(body.path))
                .and_then(|item| item.get_mut(body.method))
                .and_then(Value::as_object_mut);
            if let Some(operation) = operation {
                operation.insert(
                    "requestBody".to_owned(),
                    json!({
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": format!("#/components/schemas/{}", body.schema) }
                            }
                        }
                    }),
                );
            }
        }
        Self(base)
    }

    /// The document as JSON.
    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

/// Fetch `key` from an object value, inserting an empty object if missing.
fn object_entry<'a>(value: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    value
        .as_object_mut()
        .map(|map| map.entry(key).or_insert_with(|| Value::Object(Map::new())))
}

/// Serve the OpenAPI document.
pub async fn spec(document: web::Data<SpecDocument>) -> HttpResponse {
    HttpResponse::Ok().json(document.as_json())
}
