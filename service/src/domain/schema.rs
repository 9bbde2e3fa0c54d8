//! Data schemas: ordered collections of fields validated as one payload.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::domain::fields::Field;
use crate::domain::filters::{Filter, FilterOp};
use crate::domain::{ValidationError, ValidationErrors};

/// A named set of fields describing one JSON object.
///
/// # Examples
/// ```
/// use openapi_kit::domain::DataSchema;
/// use openapi_kit::domain::fields::{Field, StrValidator};
/// use serde_json::json;
///
/// let schema = DataSchema::new("Note")
///     .field(Field::string("text", StrValidator::new().min_length(1)).required());
/// let errors = schema.validate(&json!({})).unwrap_err();
/// assert_eq!(errors.for_field("text").unwrap().message, "required");
/// ```
#[derive(Debug, Clone)]
pub struct DataSchema {
    name: String,
    description: Option<String>,
    fields: Vec<Field>,
}

impl DataSchema {
    /// Start an empty schema named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Document the schema.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Schema name used as the OpenAPI component key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Validate a complete payload.
    ///
    /// Unknown keys are dropped. Missing or `null` values fail for required
    /// fields and fall back to the field default otherwise. Every failing
    /// field is reported, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns the collected [`ValidationErrors`] when the payload is not an
    /// object or any field fails.
    pub fn validate(&self, data: &Value) -> Result<Map<String, Value>, ValidationErrors> {
        self.validate_with(data, false)
    }

    /// Validate only the fields present in `data`, as used by partial updates.
    ///
    /// An explicit `null` restores a field's default, clears an optional
    /// field without one, and is rejected as `required` on required fields.
    ///
    /// # Errors
    ///
    /// Returns the collected [`ValidationErrors`] when the payload is not an
    /// object or a present field fails.
    pub fn validate_partial(&self, data: &Value) -> Result<Map<String, Value>, ValidationErrors> {
        self.validate_with(data, true)
    }

    fn validate_with(
        &self,
        data: &Value,
        partial: bool,
    ) -> Result<Map<String, Value>, ValidationErrors> {
        let Value::Object(input) = data else {
            return Err(ValidationError::new("", "Expected a JSON object").into());
        };

        let mut output = Map::new();
        let mut errors = ValidationErrors::new();
        for field in &self.fields {
            match input.get(field.name()) {
                Some(value) if !value.is_null() => match field.validate(value) {
                    Ok(validated) => {
                        output.insert(field.name().to_owned(), validated);
                    }
                    Err(error) => errors.push(error),
                },
                // Null resets a defaulted field and clears an optional one.
                Some(_) if partial && !field.is_required() => {
                    let reset = field.default().cloned().unwrap_or(Value::Null);
                    output.insert(field.name().to_owned(), reset);
                }
                None if partial => {}
                _ if field.is_required() => {
                    errors.push(ValidationError::new(field.name(), "required"));
                }
                _ => {
                    if let Some(default) = field.default() {
                        output.insert(field.name().to_owned(), default.clone());
                    }
                }
            }
        }
        errors.into_result(output)
    }

    /// Convert stored values into their served form, field by field.
    pub fn dump(&self, mut data: Map<String, Value>) -> Map<String, Value> {
        for field in &self.fields {
            if let Some(value) = data.remove(field.name()) {
                data.insert(field.name().to_owned(), field.dump(value));
            }
        }
        data
    }

    /// JSON schema object for the OpenAPI `components.schemas` section.
    pub fn openapi_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| (field.name().to_owned(), field.openapi_property()))
            .collect();
        let required: Vec<Value> = self
            .fields
            .iter()
            .filter(|field| field.is_required())
            .map(|field| Value::from(field.name()))
            .collect();

        let mut schema = Map::new();
        schema.insert("type".to_owned(), Value::from("object"));
        if let Some(description) = &self.description {
            schema.insert("description".to_owned(), Value::from(description.as_str()));
        }
        schema.insert("properties".to_owned(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_owned(), Value::Array(required));
        }
        Value::Object(schema)
    }

    /// Every query key accepted for filtering.
    pub fn query_keys(&self) -> Vec<String> {
        self.fields.iter().flat_map(Field::ops_names).collect()
    }

    /// Parse query parameters into filters.
    ///
    /// Keys take the form `name` (equality) or `name:op`; the op must be
    /// declared on the field. Values are validated by the field's validator.
    ///
    /// # Errors
    ///
    /// Returns one error per unknown key, unsupported op or invalid value.
    pub fn parse_filters(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Filter>, ValidationErrors> {
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();

        let mut filters = Vec::new();
        let mut errors = ValidationErrors::new();
        for key in keys {
            let raw = params.get(key).map(String::as_str).unwrap_or_default();
            match self.parse_filter(key, raw) {
                Ok(filter) => filters.push(filter),
                Err(error) => errors.push(error),
            }
        }
        errors.into_result(filters)
    }

    fn parse_filter(&self, key: &str, raw: &str) -> Result<Filter, ValidationError> {
        let unknown = || ValidationError::new(key, format!("{key} not a valid filter"));
        let (name, op) = match key.split_once(':') {
            Some((name, op)) => (name, Some(op)),
            None => (key, None),
        };
        let field = self.get(name).ok_or_else(unknown)?;
        let op = match op {
            None => FilterOp::Eq,
            Some(op) if field.declared_ops().iter().any(|declared| declared == op) => {
                op.parse::<FilterOp>().map_err(|_| unknown())?
            }
            Some(_) => return Err(unknown()),
        };
        let value = field.validate(&Value::String(raw.to_owned()))?;
        Ok(Filter::new(name, op, value))
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
