//! Field rules shared by the payload `#[derive(Validate)]` attributes, and the
//! translation of [`validator::ValidationErrors`] into client messages.
//!
//! Stored strings are trimmed, so length rules count the characters of the
//! trimmed value. A blank required string reports `blank` rather than
//! `length`.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use validator::{ValidationError, ValidationErrors};

const BLANK: &str = "Поле обязательно для заполнения";

fn trimmed_length(value: &str, min: u64, max: u64) -> Result<(), ValidationError> {
    let count = value.trim().chars().count() as u64;
    if count == 0 {
        return Err(ValidationError::new("blank"));
    }
    if count < min || count > max {
        let mut error = ValidationError::new("length");
        error.add_param(Cow::Borrowed("min"), &min);
        error.add_param(Cow::Borrowed("max"), &max);
        return Err(error);
    }
    Ok(())
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Student names and group names.
pub fn short_text(value: &str) -> Result<(), ValidationError> {
    trimmed_length(value, 3, 30)
}

/// Teacher names and profession titles.
pub fn long_text(value: &str) -> Result<(), ValidationError> {
    trimmed_length(value, 3, 50)
}

pub fn phone(value: &str) -> Result<(), ValidationError> {
    trimmed_length(value, 5, 15)
}

/// A group may not end before it starts.
pub fn end_not_before_start(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationErrors> {
    match end {
        Some(end) if end < start => {
            let mut error = ValidationError::new("end_before_start");
            error.message = Some(Cow::Borrowed("Дата окончания раньше даты начала"));
            let mut errors = ValidationErrors::new();
            errors.add("end_date", error);
            Err(errors)
        }
        _ => Ok(()),
    }
}

fn bound(params: &HashMap<Cow<'static, str>, Value>, key: &str) -> Option<String> {
    let value = params.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .map(|n| n.to_string())
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    match error.code.as_ref() {
        "blank" => BLANK.to_string(),
        "email" => "Некорректный адрес электронной почты".to_string(),
        "length" => match (bound(&error.params, "min"), bound(&error.params, "max")) {
            (Some(min), Some(max)) => format!("Длина должна быть от {} до {} символов", min, max),
            (None, Some(max)) => format!("Длина должна быть не более {} символов", max),
            (Some(min), None) => format!("Длина должна быть не менее {} символов", min),
            (None, None) => "Некорректная длина".to_string(),
        },
        "range" => match (bound(&error.params, "min"), bound(&error.params, "max")) {
            (Some(min), Some(max)) => format!("Значение должно быть от {} до {}", min, max),
            (Some(min), None) => format!("Значение должно быть не меньше {}", min),
            (None, Some(max)) => format!("Значение должно быть не больше {}", max),
            (None, None) => "Значение вне допустимого диапазона".to_string(),
        },
        _ => "Некорректное значение".to_string(),
    }
}

/// One message per failing field. A `blank` error wins over the rest.
pub fn field_errors(errors: &ValidationErrors) -> HashMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errors)| {
            let chosen = errors
                .iter()
                .find(|e| e.code == "blank")
                .or_else(|| errors.first())?;
            Some((field.to_string(), describe(chosen)))
        })
        .collect()
}
