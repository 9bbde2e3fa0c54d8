//! Unit tests for the field validators.

use super::*;
use rstest::rstest;
use serde_json::json;

fn message(result: Result<Value, ValidationError>) -> String {
    match result {
        Ok(value) => panic!("expected a validation error, got {value}"),
        Err(error) => {
            assert_eq!(error.field, "f");
            error.message
        }
    }
}

fn hints(validator: &dyn Validator) -> Value {
    let mut prop = Map::new();
    validator.openapi(&mut prop);
    Value::Object(prop)
}

#[rstest]
#[case(json!("abc"), None)]
#[case(json!(12), Some("Must be a string"))]
#[case(json!("a"), Some("Too short"))]
#[case(json!("abcdef"), Some("Too long"))]
fn strings_respect_length_limits(#[case] value: Value, #[case] expected: Option<&str>) {
    let validator = StrValidator::new().min_length(2).max_length(5);
    let result = validator.validate("f", &value);
    match expected {
        None => assert_eq!(result.expect("valid"), value),
        Some(text) => assert_eq!(message(result), text),
    }
}

#[rstest]
fn string_lengths_count_characters() {
    let validator = StrValidator::new().max_length(3);
    assert!(validator.validate("f", &json!("ééé")).is_ok());
}

#[rstest]
fn string_hints_only_declare_set_bounds() {
    assert_eq!(hints(&StrValidator::new()), json!({}));
    assert_eq!(
        hints(&StrValidator::new().min_length(3).max_length(64)),
        json!({ "minLength": 3, "maxLength": 64 })
    );
}

#[rstest]
fn email_checks_address_syntax() {
    let validator = EmailValidator::new(StrValidator::new().max_length(40));
    assert_eq!(
        validator.validate("f", &json!("ada@example.com")).expect("valid"),
        json!("ada@example.com")
    );
    assert_eq!(
        message(validator.validate("f", &json!("not-an-email"))),
        "not-an-email not a valid email"
    );
    assert_eq!(
        hints(&validator),
        json!({ "maxLength": 40, "format": "email" })
    );
}

#[rstest]
#[case("67e55044-10b1-426f-9247-bb680e5fe0c8")]
#[case("67E5504410B1426F9247BB680E5FE0C8")]
#[case("urn:uuid:67e55044-10b1-426f-9247-bb680e5fe0c8")]
fn uuids_are_normalised_to_hex(#[case] raw: &str) {
    assert_eq!(
        UuidValidator.validate("f", &json!(raw)).expect("valid"),
        json!("67e5504410b1426f9247bb680e5fe0c8")
    );
}

#[rstest]
fn uuids_reject_garbage() {
    assert_eq!(message(UuidValidator.validate("f", &json!("xyz"))), "xyz not a valid uuid");
    assert_eq!(message(UuidValidator.validate("f", &json!(7))), "7 not a valid uuid");
}

#[rstest]
fn enums_accept_variant_names_only() {
    let validator = EnumValidator::new(["bug", "feature"]);
    assert_eq!(validator.validate("f", &json!("bug")).expect("valid"), json!("bug"));
    assert_eq!(message(validator.validate("f", &json!("epic"))), "epic not valid");
    assert_eq!(message(validator.validate("f", &json!(1))), "1 not valid");
    assert_eq!(hints(&validator), json!({ "enum": ["bug", "feature"] }));
}

#[rstest]
fn choices_compare_json_values() {
    let validator = ChoiceValidator::new([json!(1), json!("two")]);
    assert!(validator.validate("f", &json!(1)).is_ok());
    assert!(validator.validate("f", &json!("two")).is_ok());
    assert_eq!(message(validator.validate("f", &json!(3))), "3 not valid");
}

#[rstest]
#[case("2024-05-01", "2024-05-01")]
#[case("2024-05-01T23:10:00+02:00", "2024-05-01")]
#[case("2024-05-01 08:00:00", "2024-05-01")]
fn dates_accept_date_and_date_time_text(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(DateValidator.validate("f", &json!(raw)).expect("valid"), json!(expected));
}

#[rstest]
fn dates_reject_other_values() {
    assert_eq!(
        message(DateValidator.validate("f", &json!("yesterday"))),
        "yesterday not valid format"
    );
    assert_eq!(message(DateValidator.validate("f", &json!(20240501))), "20240501 not valid format");
}

#[rstest]
#[case("2024-05-01T10:30:00Z", "2024-05-01T10:30:00+00:00")]
#[case("2024-05-01T10:30:00+02:00", "2024-05-01T10:30:00+02:00")]
fn date_times_keep_offsets(#[case] raw: &str, #[case] expected: &str) {
    let validator = DateTimeValidator::new(true);
    assert_eq!(validator.validate("f", &json!(raw)).expect("valid"), json!(expected));
}

#[rstest]
#[case("2024-05-01T10:30:00", "2024-05-01T10:30:00")]
#[case("2024-05-01 10:30:00", "2024-05-01T10:30:00")]
#[case("2024-05-01", "2024-05-01T00:00:00")]
fn naive_date_times_are_accepted_without_timezone_requirement(
    #[case] raw: &str,
    #[case] expected: &str,
) {
    let validator = DateTimeValidator::new(false);
    assert_eq!(validator.validate("f", &json!(raw)).expect("valid"), json!(expected));
}

#[rstest]
fn naive_date_times_fail_when_timezone_required() {
    let validator = DateTimeValidator::new(true);
    assert_eq!(
        message(validator.validate("f", &json!("2024-05-01T10:30:00"))),
        "Timezone information required"
    );
    assert_eq!(
        message(validator.validate("f", &json!("soon"))),
        "soon not valid format"
    );
}

#[rstest]
fn numbers_round_then_check_bounds() {
    let validator = NumberValidator::new().min(0.0).max(10.0).precision(2);
    assert_eq!(validator.validate("f", &json!(3.14159)).expect("valid"), json!(3.14));
    assert_eq!(message(validator.validate("f", &json!(-1))), "-1 less than 0");
    assert_eq!(message(validator.validate("f", &json!(10.5))), "10.5 greater than 10");
    assert_eq!(validator.dump(json!(2.555_55)), json!(2.56));
}

#[rstest]
#[case(json!("3"))]
#[case(json!(true))]
#[case(Value::Null)]
fn numbers_reject_non_numbers(#[case] value: Value) {
    let text = display_value(&value);
    assert_eq!(
        message(NumberValidator::new().validate("f", &value)),
        format!("{text} not valid number")
    );
}

#[rstest]
fn numbers_without_precision_keep_their_representation() {
    assert_eq!(NumberValidator::new().validate("f", &json!(4)).expect("valid"), json!(4));
}

#[rstest]
#[case(json!(4), json!(4))]
#[case(json!("5"), json!(5))]
#[case(json!(" 1 "), json!(1))]
fn integers_accept_numbers_and_text(#[case] value: Value, #[case] expected: Value) {
    let validator = IntegerValidator::new().min(1).max(5);
    assert_eq!(validator.validate("f", &value).expect("valid"), expected);
}

#[rstest]
#[case(json!(2.5), "2.5 not valid integer")]
#[case(json!(true), "true not valid integer")]
#[case(json!("two"), "two not valid integer")]
#[case(json!(0), "0 less than 1")]
#[case(json!(6), "6 greater than 5")]
fn integers_reject_invalid_values(#[case] value: Value, #[case] expected: &str) {
    let validator = IntegerValidator::new().min(1).max(5);
    assert_eq!(message(validator.validate("f", &value)), expected);
}

#[rstest]
fn integer_hints_declare_bounds() {
    let validator = IntegerValidator::new().min(1).max(5);
    assert_eq!(hints(&validator), json!({ "minimum": 1, "maximum": 5 }));
    assert_eq!(validator.schema_type(), Some("integer"));
}

#[rstest]
#[case(json!("12.346"), json!(12.35))]
#[case(json!(7), json!(7.0))]
#[case(json!(0.1), json!(0.1))]
fn decimals_round_to_precision(#[case] value: Value, #[case] expected: Value) {
    let validator = DecimalValidator::new().min(0.0).precision(2);
    assert_eq!(validator.validate("f", &value).expect("valid"), expected);
}

#[rstest]
fn decimals_reject_invalid_values() {
    let validator = DecimalValidator::new().min(0.0);
    assert_eq!(message(validator.validate("f", &json!("abc"))), "abc not valid Decimal");
    assert_eq!(message(validator.validate("f", &json!(false))), "false not valid Decimal");
    assert_eq!(message(validator.validate("f", &json!("-0.5"))), "-0.5 less than 0");
}

#[rstest]
fn decimal_bounds_are_exact() {
    let validator = DecimalValidator::new().min(0.1).max(0.3);
    assert_eq!(
        message(validator.validate("f", &json!("0.30000000000000001"))),
        "0.30000000000000001 greater than 0.3"
    );
    assert_eq!(
        message(validator.validate("f", &json!("0.09999999999999999"))),
        "0.09999999999999999 less than 0.1"
    );
    assert_eq!(validator.validate("f", &json!("0.3")).expect("on the bound"), json!(0.3));
    assert_eq!(hints(&validator), json!({ "minimum": 0.1, "maximum": 0.3 }));
}

#[rstest]
#[case(json!(true), true)]
#[case(json!("TRUE"), true)]
#[case(json!("False"), false)]
fn booleans_accept_true_and_false_text(#[case] value: Value, #[case] expected: bool) {
    assert_eq!(BoolValidator.validate("f", &value).expect("valid"), json!(expected));
}

#[rstest]
fn booleans_reject_other_values() {
    assert_eq!(message(BoolValidator.validate("f", &json!("Yes"))), "yes not valid");
    assert_eq!(message(BoolValidator.validate("f", &json!(1))), "1 not valid");
    assert_eq!(BoolValidator.dump(json!("true")), json!(true));
}

#[rstest]
fn json_values_parse_text_and_pass_structures() {
    assert_eq!(
        JsonValidator.validate("f", &json!("{\"a\": [1, 2]}")).expect("valid"),
        json!({ "a": [1, 2] })
    );
    assert_eq!(
        JsonValidator.validate("f", &json!({ "b": true })).expect("valid"),
        json!({ "b": true })
    );
    assert_eq!(message(JsonValidator.validate("f", &json!("{oops"))), "{oops not valid");
    assert_eq!(JsonValidator.schema_type(), None);
}

#[rstest]
fn lists_chain_validators_in_order() {
    let lower = FnValidator::new(|_, value| {
        Ok(Value::String(display_value(value).to_lowercase()))
    });
    let validator = ListValidator::new(vec![
        Arc::new(StrValidator::new().max_length(5)),
        Arc::new(lower),
        Arc::new(EnumValidator::new(["low", "high"])),
    ]);

    assert_eq!(validator.validate("f", &json!("HIGH")).expect("valid"), json!("high"));
    assert_eq!(message(validator.validate("f", &json!("medium"))), "Too long");
    assert_eq!(message(validator.validate("f", &json!("Mid"))), "mid not valid");
    assert_eq!(validator.schema_type(), Some("string"));
    assert_eq!(
        hints(&validator),
        json!({ "maxLength": 5, "enum": ["low", "high"] })
    );
}
