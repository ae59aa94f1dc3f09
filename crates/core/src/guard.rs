//! Guard clauses for fail-fast validation in value object constructors.
//!
//! Every clause takes the name of the value being checked so the resulting
//! [`DomainError::Validation`] message reads like `"Email cannot be empty"`.
//!
//! ```ignore
//! impl Email {
//!     pub fn new(value: Option<&str>) -> DomainResult<Self> {
//!         let value = Guard::is_not_null_or_empty("Email", value)?;
//!         Guard::maximum_length("Email", value, 254)?;
//!         Ok(Self(value.to_string()))
//!     }
//! }
//! ```

use core::fmt::Display;

use crate::error::{DomainError, DomainResult};

/// Namespace for guard clauses.
#[derive(Debug, Clone, Copy)]
pub struct Guard;

fn fail<T>(msg: String) -> DomainResult<T> {
    Err(DomainError::Validation(msg))
}

impl Guard {
    /// Ensures a value is present, returning it.
    pub fn is_not_null<'a, T: ?Sized>(name: &str, value: Option<&'a T>) -> DomainResult<&'a T> {
        match value {
            Some(v) => Ok(v),
            None => fail(format!("{name} cannot be null")),
        }
    }

    /// Ensures a string is not empty or whitespace.
    pub fn is_not_empty(name: &str, value: &str) -> DomainResult<()> {
        if value.trim().is_empty() {
            return fail(format!("{name} cannot be empty"));
        }
        Ok(())
    }

    /// Ensures a string is present and not empty or whitespace, returning it.
    pub fn is_not_null_or_empty<'a>(name: &str, value: Option<&'a str>) -> DomainResult<&'a str> {
        match value {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => fail(format!("{name} cannot be null nor empty")),
        }
    }

    /// Opposite of [`Guard::is_not_null`].
    pub fn is_null<T: ?Sized>(name: &str, value: Option<&T>) -> DomainResult<()> {
        if value.is_some() {
            return fail(format!("{name} must be null"));
        }
        Ok(())
    }

    /// Opposite of [`Guard::is_not_empty`].
    pub fn is_empty(name: &str, value: &str) -> DomainResult<()> {
        if !value.trim().is_empty() {
            return fail(format!("{name} must be empty"));
        }
        Ok(())
    }

    pub fn is_equal<T: PartialEq + Display>(name: &str, value: &T, reference: &T) -> DomainResult<()> {
        if value != reference {
            return fail(format!("{name} should be equal to {reference}"));
        }
        Ok(())
    }

    pub fn is_not_equal<T: PartialEq + Display>(name: &str, value: &T, reference: &T) -> DomainResult<()> {
        if value == reference {
            return fail(format!("{name} should not be equal to {reference}"));
        }
        Ok(())
    }

    /// Length is counted in characters, not bytes.
    pub fn maximum_length(name: &str, value: &str, max_length: usize) -> DomainResult<()> {
        if value.chars().count() > max_length {
            return fail(format!("{name} must be {max_length} characters or less"));
        }
        Ok(())
    }

    pub fn minimum_length(name: &str, value: &str, min_length: usize) -> DomainResult<()> {
        if value.chars().count() < min_length {
            return fail(format!("{name} must be {min_length} characters or more"));
        }
        Ok(())
    }

    pub fn is_less_than<T: PartialOrd + Display>(name: &str, value: T, reference: T) -> DomainResult<()> {
        if !(value < reference) {
            return fail(format!("{name} must be less than {reference}"));
        }
        Ok(())
    }

    pub fn is_less_than_or_equal<T: PartialOrd + Display>(
        name: &str,
        value: T,
        reference: T,
    ) -> DomainResult<()> {
        if !(value <= reference) {
            return fail(format!("{name} must be less than or equal to {reference}"));
        }
        Ok(())
    }

    pub fn is_greater_than<T: PartialOrd + Display>(name: &str, value: T, reference: T) -> DomainResult<()> {
        if !(value > reference) {
            return fail(format!("{name} must be greater than {reference}"));
        }
        Ok(())
    }

    pub fn is_greater_than_or_equal<T: PartialOrd + Display>(
        name: &str,
        value: T,
        reference: T,
    ) -> DomainResult<()> {
        if !(value >= reference) {
            return fail(format!("{name} must be greater than or equal to {reference}"));
        }
        Ok(())
    }
}
