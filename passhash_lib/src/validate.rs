use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {reason}")]
pub struct Error {
    pub field: &'static str,
    pub reason: String,
}

impl Error {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Checks that `value` lies in the inclusive range `min..=max`.
pub fn range<T>(field: &'static str, value: T, min: T, max: T) -> Result<T, Error>
where
    T: PartialOrd + Display + Copy,
{
    if value < min || value > max {
        return Err(Error::new(
            field,
            format!("must be between {min} and {max}, got {value}"),
        ));
    }

    Ok(value)
}

pub fn one_of<T>(field: &'static str, value: T, allowed: &[T]) -> Result<T, Error>
where
    T: PartialEq + Display + Copy,
{
    if allowed.contains(&value) {
        return Ok(value);
    }

    let allowed = allowed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    Err(Error::new(
        field,
        format!("must be one of [{allowed}], got {value}"),
    ))
}

pub fn power_of_two(field: &'static str, value: u64) -> Result<u64, Error> {
    if !value.is_power_of_two() {
        return Err(Error::new(
            field,
            format!("must be a power of two, got {value}"),
        ));
    }

    Ok(value)
}

/// Narrows a decoded parameter to the integer width a primitive expects.
pub fn narrow<T>(field: &'static str, value: u64) -> Result<T, Error>
where
    T: TryFrom<u64>,
{
    T::try_from(value).map_err(|_| Error::new(field, format!("is out of range, got {value}")))
}
