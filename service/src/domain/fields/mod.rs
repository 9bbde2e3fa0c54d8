//! Data fields: named values with validation, serialisation and OpenAPI hints.
//!
//! A [`Field`] pairs a name with an optional [`Validator`] and the metadata
//! needed to document it (description, format, default). Constructors such
//! as [`Field::string`] or [`Field::integer`] pick the matching validator.

mod validators;

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

pub use validators::{
    BoolValidator, Bounds, ChoiceValidator, DateTimeValidator, DateValidator, DecimalValidator,
    EmailValidator, EnumValidator, FnValidator, IntegerValidator, JsonValidator, ListValidator,
    NumberValidator, StrValidator, UuidValidator, Validator,
};
pub(crate) use validators::display_value;

use crate::domain::ValidationError;

type PostProcessFn = dyn Fn(Value) -> Value + Send + Sync;

/// A named, optionally validated member of a [`DataSchema`](crate::domain::DataSchema).
///
/// # Examples
/// ```
/// use openapi_kit::domain::fields::{Field, StrValidator};
/// use serde_json::json;
///
/// let title = Field::string("title", StrValidator::new().max_length(64)).required();
/// assert!(title.is_required());
/// assert_eq!(title.validate(&json!("Write docs")).unwrap(), json!("Write docs"));
/// ```
#[derive(Clone)]
pub struct Field {
    name: String,
    required: bool,
    validator: Option<Arc<dyn Validator>>,
    description: Option<String>,
    format: Option<String>,
    default: Option<Value>,
    ops: Vec<String>,
    post_process: Option<Arc<PostProcessFn>>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("validator", &self.validator)
            .field("description", &self.description)
            .field("format", &self.format)
            .field("default", &self.default)
            .field("ops", &self.ops)
            .field("post_process", &self.post_process.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Field {
    /// A field accepting any value unless a validator is attached.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            validator: None,
            description: None,
            format: None,
            default: None,
            ops: Vec::new(),
            post_process: None,
        }
    }

    /// String field with length constraints.
    pub fn string(name: impl Into<String>, lengths: StrValidator) -> Self {
        Self::new(name).validator(lengths)
    }

    /// Boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name).validator(BoolValidator)
    }

    /// UUID field stored as 32 hex digits.
    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name).validator(UuidValidator)
    }

    /// Floating point field.
    pub fn number(name: impl Into<String>, validator: NumberValidator) -> Self {
        Self::new(name).validator(validator)
    }

    /// Integer field.
    pub fn integer(name: impl Into<String>, validator: IntegerValidator) -> Self {
        Self::new(name).validator(validator)
    }

    /// Arbitrary precision decimal field.
    pub fn decimal(name: impl Into<String>, validator: DecimalValidator) -> Self {
        Self::new(name).validator(validator)
    }

    /// Email address field with length constraints.
    pub fn email(name: impl Into<String>, lengths: StrValidator) -> Self {
        Self::new(name).validator(EmailValidator::new(lengths))
    }

    /// Field restricted to a set of variant names.
    pub fn enumeration<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name).validator(EnumValidator::new(variants))
    }

    /// Calendar date field.
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name).validator(DateValidator)
    }

    /// Date-time field; `timezone` requires an explicit offset.
    pub fn date_time(name: impl Into<String>, timezone: bool) -> Self {
        Self::new(name).validator(DateTimeValidator::new(timezone))
    }

    /// Arbitrary JSON field.
    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name).validator(JsonValidator)
    }

    /// Attach or replace the validator.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Attach a shared validator.
    pub fn shared_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Document the field.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override the JSON schema `format`.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Value used when an optional field is missing.
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Extra query operations (`gt`, `lt`, ...) exposed for filtering.
    pub fn ops<I, S>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ops = ops.into_iter().map(Into::into).collect();
        self
    }

    /// Transformation applied after successful validation.
    pub fn post_process<F>(mut self, post_process: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.post_process = Some(Arc::new(post_process));
        self
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the field must be present.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Default used for missing optional values.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Declared query operations.
    pub fn declared_ops(&self) -> &[String] {
        &self.ops
    }

    /// Query keys this field answers to: its name followed by `name:op` for
    /// every declared operation.
    ///
    /// # Examples
    /// ```
    /// use openapi_kit::domain::fields::{Field, IntegerValidator};
    ///
    /// let field = Field::integer("severity", IntegerValidator::new()).ops(["gt", "lt"]);
    /// let keys: Vec<String> = field.ops_names().collect();
    /// assert_eq!(keys, ["severity", "severity:gt", "severity:lt"]);
    /// ```
    pub fn ops_names(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.name.clone()).chain(
            self.ops
                .iter()
                .map(move |op| format!("{}:{op}", self.name)),
        )
    }

    /// Validate a present value and run the post-processor.
    pub fn validate(&self, value: &Value) -> Result<Value, ValidationError> {
        let validated = match &self.validator {
            Some(validator) => validator.validate(&self.name, value)?,
            None => value.clone(),
        };
        Ok(match &self.post_process {
            Some(post_process) => post_process(validated),
            None => validated,
        })
    }

    /// Convert a stored value into its served form.
    pub fn dump(&self, value: Value) -> Value {
        match &self.validator {
            Some(validator) => validator.dump(value),
            None => value,
        }
    }

    /// OpenAPI property describing this field.
    pub fn openapi_property(&self) -> Value {
        let mut prop = Map::new();
        if let Some(validator) = &self.validator {
            if let Some(schema_type) = validator.schema_type() {
                prop.insert("type".to_owned(), Value::from(schema_type));
            }
            validator.openapi(&mut prop);
        }
        if let Some(format) = &self.format {
            prop.insert("format".to_owned(), Value::from(format.as_str()));
        }
        if let Some(description) = &self.description {
            prop.insert("description".to_owned(), Value::from(description.as_str()));
        }
        if let Some(default) = &self.default {
            prop.insert("default".to_owned(), default.clone());
        }
        Value::Object(prop)
    }
}
