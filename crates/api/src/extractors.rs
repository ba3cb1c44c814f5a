//! Request extractors that validate their payload, plus shared field validators.

use std::borrow::Cow;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use validator::{Validate, ValidationError};

use crate::error::ApiError;

/// JSON body that passed `validator` checks.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string that passed `validator` checks.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// A date given as `YYYY-MM-DD` or an RFC 3339 timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInput {
    /// Calendar date.
    Day(NaiveDate),
    /// Exact instant.
    Instant(DateTime<Utc>),
}

impl DateInput {
    /// Parses either accepted format.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(Self::Day(day));
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| Self::Instant(dt.with_timezone(&Utc)))
    }

    /// The UTC calendar date.
    #[must_use]
    pub fn date(self) -> NaiveDate {
        match self {
            Self::Day(day) => day,
            Self::Instant(at) => at.date_naive(),
        }
    }

    /// The instant; a bare date means midnight UTC.
    #[must_use]
    pub fn instant(self) -> DateTime<Utc> {
        match self {
            Self::Day(day) => day.and_time(NaiveTime::MIN).and_utc(),
            Self::Instant(at) => at,
        }
    }
}

impl<'de> Deserialize<'de> for DateInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid date `{raw}`; expected YYYY-MM-DD or RFC 3339"
            ))
        })
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Largest amount a `NUMERIC(12, 2)` column holds.
const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Accepts positive amounts in whole cents that fit `NUMERIC(12, 2)`.
pub fn validate_positive(amount: &Decimal) -> Result<(), ValidationError> {
    if !amount.is_sign_positive() || amount.is_zero() {
        return Err(invalid("positive", "Amount must be positive"));
    }
    if amount.normalize().scale() > 2 {
        return Err(invalid("cents", "Amount must have at most 2 decimal places"));
    }
    if *amount > MAX_AMOUNT {
        return Err(invalid("max_amount", "Amount must not exceed 9999999999.99"));
    }
    Ok(())
}

/// Accepts `#RRGGBB`.
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let digits = color.strip_prefix('#').unwrap_or_default();
    if digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(invalid("color", "Invalid color format"))
    }
}

/// Accepts exactly six ASCII digits.
pub fn validate_otp(otp: &str) -> Result<(), ValidationError> {
    if otp.len() == 6 && otp.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(invalid("otp", "OTP must be 6 digits"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("2024-01-31", NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())]
    #[case("2024-01-31T23:30:00Z", NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())]
    #[case("2024-02-01T01:00:00+05:00", NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())]
    fn test_date_input_calendar_day(#[case] raw: &str, #[case] expected: NaiveDate) {
        assert_eq!(DateInput::parse(raw).unwrap().date(), expected);
    }

    #[test]
    fn test_bare_date_is_midnight_utc() {
        let at = DateInput::parse("2024-03-05").unwrap().instant();
        assert_eq!(at.to_rfc3339(), "2024-03-05T00:00:00+00:00");
    }

    #[rstest]
    #[case("")]
    #[case("31/01/2024")]
    #[case("2024-13-01")]
    fn test_date_input_rejects(#[case] raw: &str) {
        assert!(DateInput::parse(raw).is_none());
    }

    #[rstest]
    #[case(dec!(0.01), true)]
    #[case(dec!(12.500), true)]
    #[case(dec!(9999999999.99), true)]
    #[case(dec!(0), false)]
    #[case(dec!(-5), false)]
    #[case(dec!(0.001), false)]
    #[case(dec!(19.999), false)]
    #[case(dec!(10000000000), false)]
    fn test_validate_positive(#[case] amount: Decimal, #[case] ok: bool) {
        assert_eq!(validate_positive(&amount).is_ok(), ok);
    }

    #[rstest]
    #[case("#1890ff", true)]
    #[case("#ABCDEF", true)]
    #[case("1890ff", false)]
    #[case("#12345", false)]
    #[case("#12345g", false)]
    fn test_validate_hex_color(#[case] color: &str, #[case] ok: bool) {
        assert_eq!(validate_hex_color(color).is_ok(), ok);
    }

    #[rstest]
    #[case("123456", true)]
    #[case("12345", false)]
    #[case("12345a", false)]
    fn test_validate_otp(#[case] otp: &str, #[case] ok: bool) {
        assert_eq!(validate_otp(otp).is_ok(), ok);
    }
}
