//! Derived Feature Calculator
//!
//! Pure, total functions that turn raw account attributes into the numeric
//! features the classifier was trained on. None of them can fail.

/// Round to 2 decimals, ties-to-even on the exact binary value.
///
/// This is the rounding the training data was produced with, so
/// `0.125` becomes `0.12` rather than `0.13`.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Count of whitespace-separated tokens
pub fn fullname_word_count(name: &str) -> u32 {
    name.split_whitespace().count() as u32
}

/// Share of digit characters in `s`, rounded to 2 decimals. `0.0` for "".
pub fn digit_ratio(s: &str) -> f64 {
    let length = s.chars().count();
    if length == 0 {
        return 0.0;
    }
    let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
    round2(digits as f64 / length as f64)
}

/// 1 when name and username match ignoring case
pub fn name_equals_username(name: &str, username: &str) -> u8 {
    u8::from(name.to_lowercase() == username.to_lowercase())
}

/// Character count of the bio
pub fn description_length(description: &str) -> u32 {
    description.chars().count() as u32
}

/// `numerator / max(1, denominator)`, rounded to 2 decimals.
///
/// A true denominator of 0 is divided as 1; the trained model saw inputs
/// computed this way.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    round2(numerator / denominator.max(1.0))
}

/// Truthiness of a raw attribute
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for str {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for bool {
    fn is_present(&self) -> bool {
        *self
    }
}

impl Presence for f64 {
    fn is_present(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl<T: Presence + ?Sized> Presence for Option<&T> {
    fn is_present(&self) -> bool {
        self.map_or(false, Presence::is_present)
    }
}

impl Presence for serde_json::Value {
    fn is_present(&self) -> bool {
        match self {
            serde_json::Value::Null => false,
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
            serde_json::Value::String(s) => !s.is_empty(),
            serde_json::Value::Array(a) => !a.is_empty(),
            serde_json::Value::Object(o) => !o.is_empty(),
        }
    }
}

/// 1 if the attribute is non-empty / non-null / truthy
pub fn presence_flag<T: Presence + ?Sized>(value: &T) -> u8 {
    u8::from(value.is_present())
}
