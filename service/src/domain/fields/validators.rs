//! Field validators.
//!
//! A [`Validator`] converts an incoming JSON value into its canonical form or
//! rejects it with a [`ValidationError`]. Validators also describe themselves
//! to the OpenAPI document through [`Validator::openapi`], which writes JSON
//! schema keywords (`minLength`, `maximum`, `format`, ...) into the property,
//! so each constraint is declared exactly once.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::domain::ValidationError;

/// Converts and checks the value of a single field.
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validate `value` for `field`, returning the canonical value.
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError>;

    /// Convert a stored value into the form served in responses.
    fn dump(&self, value: Value) -> Value {
        value
    }

    /// JSON schema type of values accepted by this validator; `None` for any.
    fn schema_type(&self) -> Option<&'static str> {
        None
    }

    /// Attach OpenAPI constraints (lengths, bounds, formats) to a property.
    fn openapi(&self, _prop: &mut Map<String, Value>) {}
}

/// Render a value the way it appears inside error messages.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn json_number(value: f64) -> Option<Value> {
    Number::from_f64(value).map(Value::Number)
}

// Whole bounds are emitted as JSON integers.
fn schema_number(value: f64) -> Option<Value> {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Some(Value::from(value as i64))
    } else {
        json_number(value)
    }
}

/// String length constraints. Zero disables a bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrValidator {
    min_length: usize,
    max_length: usize,
}

impl StrValidator {
    /// Accept any string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require at least `min_length` characters.
    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Allow at most `max_length` characters.
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    fn check<'a>(&self, field: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
        let Value::String(text) = value else {
            return Err(ValidationError::new(field, "Must be a string"));
        };
        let length = text.chars().count();
        if self.min_length > 0 && length < self.min_length {
            return Err(ValidationError::new(field, "Too short"));
        }
        if self.max_length > 0 && length > self.max_length {
            return Err(ValidationError::new(field, "Too long"));
        }
        Ok(text)
    }
}

impl Validator for StrValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        self.check(field, value).map(|text| Value::String(text.to_owned()))
    }

    fn schema_type(&self) -> Option<&'static str> {
        Some("string")
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        if self.min_length > 0 {
            prop.insert("minLength".to_owned(), Value::from(self.min_length));
        }
        if self.max_length > 0 {
            prop.insert("maxLength".to_owned(), Value::from(self.max_length));
        }
    }
}

/// String holding a syntactically valid email address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmailValidator {
    lengths: StrValidator,
}

impl EmailValidator {
    /// Email validator with the given length constraints.
    pub fn new(lengths: StrValidator) -> Self {
        Self { lengths }
    }
}

impl Validator for EmailValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        let text = self.lengths.check(field, value)?;
        if !text.validate_email() {
            return Err(ValidationError::new(
                field,
                format!("{text} not a valid email"),
            ));
        }
        Ok(Value::String(text.to_owned()))
    }

    fn schema_type(&self) -> Option<&'static str> {
        Some("string")
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        self.lengths.openapi(prop);
        prop.insert("format".to_owned(), Value::from("email"));
    }
}

/// UUID text in any accepted layout, normalised to 32 lowercase hex digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UuidValidator;

impl Validator for UuidValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        value
            .as_str()
            .and_then(|text| Uuid::parse_str(text.trim()).ok())
            .map(|uuid| Value::String(uuid.simple().to_string()))
            .ok_or_else(|| {
                ValidationError::new(field, format!("{} not a valid uuid", display_value(value)))
            })
    }

    fn schema_type(&self) -> Option<&'static str> {
        Some("string")
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        prop.insert("format".to_owned(), Value::from("uuid"));
    }
}

/// A value restricted to a fixed set of variant names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValidator {
    variants: Vec<String>,
}

impl EnumValidator {
    /// Accept only the listed variant names.
    pub fn new<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Accepted variant names in declaration order.
    pub fn variants(&self) -> &[String] {
        &self.variants
    }
}

impl Validator for EnumValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        match value.as_str() {
            Some(name) if self.variants.iter().any(|variant| variant == name) => {
                Ok(Value::String(name.to_owned()))
            }
            _ => Err(ValidationError::new(
                field,
                format!("{} not valid", display_value(value)),
            )),
        }
    }

    fn schema_type(&self) -> Option<&'static str> {
        Some("string")
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        let variants = self.variants.iter().cloned().map(Value::String).collect();
        prop.insert("enum".to_owned(), Value::Array(variants));
    }
}

/// A value that must equal one of a list of JSON values.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceValidator {
    choices: Vec<Value>,
}

impl ChoiceValidator {
    /// Accept only the listed values.
    pub fn new<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for ChoiceValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        if self.choices.contains(value) {
            Ok(value.clone())
        } else {
            Err(ValidationError::new(
                field,
                format!("{} not valid", display_value(value)),
            ))
        }
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        prop.insert("enum".to_owned(), Value::Array(self.choices.clone()));
    }
}

const NAIVE_DATE_TIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_naive_date_time(text: &str) -> Option<NaiveDateTime> {
    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| parse_naive_date_time(text).map(|dt| dt.date()))
}

/// Calendar date, served as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateValidator;

impl Validator for DateValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        value
            .as_str()
            .and_then(|text| parse_date(text.trim()))
            .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| {
                ValidationError::new(field, format!("{} not valid format", display_value(value)))
            })
    }

    fn schema_type(&self) -> Option<&'static str> {
        Some("string")
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        prop.insert("format".to_owned(), Value::from("date"));
    }
}

/// Date and time, served as ISO 8601 text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTimeValidator {
    timezone: bool,
}

impl DateTimeValidator {
    /// Date-time validator; `timezone` rejects values without an offset.
    pub fn new(timezone: bool) -> Self {
        Self { timezone }
    }
}

impl Validator for DateTimeValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        let invalid =
            || ValidationError::new(field, format!("{} not valid format", display_value(value)));
        let text = value.as_str().map(str::trim).ok_or_else(invalid)?;

        if let Ok(aware) = DateTime::parse_from_rfc3339(text) {
            return Ok(Value::String(aware.to_rfc3339()));
        }

        let naive = parse_naive_date_time(text)
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(invalid)?;
        if self.timezone {
            return Err(ValidationError::new(field, "Timezone information required"));
        }
        Ok(Value::String(
            naive.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        ))
    }

    fn schema_type(&self) -> Option<&'static str> {
        Some("string")
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        prop.insert("format".to_owned(), Value::from("date-time"));
    }
}

/// Inclusive numeric bounds shared by the numeric validators.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min: Option<f64>,
    max: Option<f64>,
}

impl Bounds {
    /// Bounds from optional minimum and maximum.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    fn check(&self, field: &str, value: f64, shown: &str) -> Result<(), ValidationError> {
        if let Some(min) = self.min {
            if value < min {
                return Err(ValidationError::new(field, format!("{shown} less than {min}")));
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return Err(ValidationError::new(
                    field,
                    format!("{shown} greater than {max}"),
                ));
            }
        }
        Ok(())
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        if let Some(min) = self.min.and_then(schema_number) {
            prop.insert("minimum".to_owned(), min);
        }
        if let Some(max) = self.max.and_then(schema_number) {
            prop.insert("maximum".to_owned(), max);
        }
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10_f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    (value * factor).round() / factor
}

/// Floating point number with optional bounds and rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumberValidator {
    bounds: Bounds,
    precision: Option<u32>,
}

impl NumberValidator {
    /// Accept any JSON number.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject values below `min`.
    pub fn min(mut self, min: f64) -> Self {
        self.bounds.min = Some(min);
        self
    }

    /// Reject values above `max`.
    pub fn max(mut self, max: f64) -> Self {
        self.bounds.max = Some(max);
        self
    }

    /// Round accepted values to `precision` decimal places.
    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }
}

impl Validator for NumberValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        let invalid =
            || ValidationError::new(field, format!("{} not valid number", display_value(value)));
        let Value::Number(number) = value else {
            return Err(invalid());
        };
        let raw = number.as_f64().ok_or_else(invalid)?;
        let (checked, canonical) = match self.precision {
            Some(precision) if number.is_f64() => {
                let rounded = round_to(raw, precision);
                (rounded, json_number(rounded).ok_or_else(invalid)?)
            }
            _ => (raw, value.clone()),
        };
        self.bounds
            .check(field, checked, &display_value(&canonical))?;
        Ok(canonical)
    }

    fn dump(&self, value: Value) -> Value {
        match (self.precision, value.as_f64()) {
            (Some(precision), Some(raw)) => json_number(round_to(raw, precision)).unwrap_or(value),
            _ => value,
        }
    }

    fn schema_type(&self) -> Option<&'static str> {
        Some("number")
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        self.bounds.openapi(prop);
    }
}

/// Whole number, accepted as a JSON integer or integer text.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntegerValidator {
    bounds: Bounds,
}

impl IntegerValidator {
    /// Accept any integer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject values below `min`.
    pub fn min(mut self, min: i64) -> Self {
        self.bounds.min = Some(min as f64);
        self
    }

    /// Reject values above `max`.
    pub fn max(mut self, max: i64) -> Self {
        self.bounds.max = Some(max as f64);
        self
    }
}

impl Validator for IntegerValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        let parsed = match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        };
        let integer = parsed.ok_or_else(|| {
            ValidationError::new(
                field,
                format!("{} not valid integer", display_value(value)),
            )
        })?;
        self.bounds
            .check(field, integer as f64, &integer.to_string())?;
        Ok(Value::from(integer))
    }

    fn schema_type(&self) -> Option<&'static str> {
        Some("integer")
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        self.bounds.openapi(prop);
    }
}

/// Arbitrary precision decimal, accepted as a number or numeric text.
///
/// Bounds are compared as decimals, so values closer to a bound than an
/// `f64` can tell apart are still judged exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecimalValidator {
    min: Option<BigDecimal>,
    max: Option<BigDecimal>,
    precision: Option<u32>,
}

impl DecimalValidator {
    /// Accept any decimal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject values below `min`.
    pub fn min(mut self, min: f64) -> Self {
        self.min = decimal_bound(min);
        self
    }

    /// Reject values above `max`.
    pub fn max(mut self, max: f64) -> Self {
        self.max = decimal_bound(max);
        self
    }

    /// Round accepted values to `precision` decimal places.
    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    fn parse(value: &Value) -> Option<BigDecimal> {
        match value {
            Value::Number(number) => BigDecimal::from_str(&number.to_string()).ok(),
            Value::String(text) => BigDecimal::from_str(text.trim()).ok(),
            _ => None,
        }
    }

    fn check(&self, field: &str, decimal: &BigDecimal) -> Result<(), ValidationError> {
        if let Some(min) = self.min.as_ref().filter(|min| decimal < *min) {
            return Err(ValidationError::new(field, format!("{decimal} less than {min}")));
        }
        if let Some(max) = self.max.as_ref().filter(|max| decimal > *max) {
            return Err(ValidationError::new(field, format!("{decimal} greater than {max}")));
        }
        Ok(())
    }
}

// Parsed from the shortest decimal text of `bound`, so `0.1` stays `0.1`.
fn decimal_bound(bound: f64) -> Option<BigDecimal> {
    BigDecimal::from_str(&bound.to_string()).ok()
}

fn decimal_hint(bound: Option<&BigDecimal>) -> Option<Value> {
    bound
        .and_then(|bound| bound.to_string().parse::<f64>().ok())
        .and_then(schema_number)
}

impl Validator for DecimalValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        let invalid =
            || ValidationError::new(field, format!("{} not valid Decimal", display_value(value)));
        let decimal = Self::parse(value).ok_or_else(invalid)?;
        let decimal = match self.precision {
            Some(precision) => decimal.round(i64::from(precision)),
            None => decimal,
        };
        self.check(field, &decimal)?;
        let approx = decimal.to_string().parse::<f64>().map_err(|_| invalid())?;
        json_number(approx).ok_or_else(invalid)
    }

    fn schema_type(&self) -> Option<&'static str> {
        Some("number")
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        if let Some(min) = decimal_hint(self.min.as_ref()) {
            prop.insert("minimum".to_owned(), min);
        }
        if let Some(max) = decimal_hint(self.max.as_ref()) {
            prop.insert("maximum".to_owned(), max);
        }
    }
}

/// Boolean, accepted as `true`/`false` in any letter case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolValidator;

impl Validator for BoolValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        let text = display_value(value).to_lowercase();
        match text.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(ValidationError::new(field, format!("{text} not valid"))),
        }
    }

    fn dump(&self, value: Value) -> Value {
        Value::Bool(display_value(&value).to_lowercase() == "true")
    }

    fn schema_type(&self) -> Option<&'static str> {
        Some("boolean")
    }
}

/// Arbitrary JSON; strings are parsed as JSON documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonValidator;

impl Validator for JsonValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        match value {
            Value::String(text) => serde_json::from_str(text)
                .map_err(|_| ValidationError::new(field, format!("{text} not valid"))),
            other => Ok(other.clone()),
        }
    }
}

/// Applies several validators in order, feeding each the previous output.
#[derive(Debug, Clone, Default)]
pub struct ListValidator {
    validators: Vec<Arc<dyn Validator>>,
}

impl ListValidator {
    /// Chain the given validators.
    pub fn new(validators: Vec<Arc<dyn Validator>>) -> Self {
        Self { validators }
    }
}

impl Validator for ListValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        self.validators
            .iter()
            .try_fold(value.clone(), |current, validator| {
                validator.validate(field, &current)
            })
    }

    fn dump(&self, value: Value) -> Value {
        self.validators
            .iter()
            .fold(value, |current, validator| validator.dump(current))
    }

    fn schema_type(&self) -> Option<&'static str> {
        self.validators
            .iter()
            .find_map(|validator| validator.schema_type())
    }

    fn openapi(&self, prop: &mut Map<String, Value>) {
        for validator in &self.validators {
            validator.openapi(prop);
        }
    }
}

type ValidateFn = dyn Fn(&str, &Value) -> Result<Value, ValidationError> + Send + Sync;

/// Validator backed by a closure, for one-off rules.
#[derive(Clone)]
pub struct FnValidator {
    inner: Arc<ValidateFn>,
}

impl FnValidator {
    /// Wrap `validate`.
    pub fn new<F>(validate: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(validate),
        }
    }
}

impl fmt::Debug for FnValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnValidator")
    }
}

impl Validator for FnValidator {
    fn validate(&self, field: &str, value: &Value) -> Result<Value, ValidationError> {
        (self.inner)(field, value)
    }
}

#[cfg(test)]
#[path = "validators_tests.rs"]
mod tests;
