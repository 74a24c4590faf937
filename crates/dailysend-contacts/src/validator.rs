//! Phone normalization: turns raw cells into canonical contact addresses.
//!
//! The rule is deliberately narrow: strip every non-digit character and
//! accept only an exact digit count. No country-code awareness.

use std::fmt::Display;
use std::sync::LazyLock;

use dailysend_core::error::{DailySendError, Result};
use dailysend_core::types::{Contact, RawRecord};
use regex::Regex;

static NON_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9]").expect("static regex"));

pub const INVALID_PHONE: &str = "invalid phone format";

/// Validates raw records against a fixed phone length.
#[derive(Debug, Clone, Copy)]
pub struct ContactValidator {
    digits: usize,
}

impl ContactValidator {
    pub fn new(digits: usize) -> Self {
        Self { digits }
    }

    /// Normalize any phone representation; `Err` carries the rejection reason.
    pub fn validate_phone<T: Display + ?Sized>(&self, raw: &T) -> Result<String> {
        let text = raw.to_string();
        let trimmed = text.trim();
        let clean = NON_DIGIT.replace_all(trimmed, "");

        if clean.len() == self.digits {
            Ok(clean.into_owned())
        } else {
            Err(DailySendError::Validation {
                raw: trimmed.to_string(),
                reason: INVALID_PHONE.into(),
            })
        }
    }

    /// Turn one raw row into a contact. The name passes through untouched.
    pub fn validate(&self, record: &RawRecord) -> Result<Contact> {
        let phone = self.validate_phone(&record.phone)?;
        Ok(Contact::new(phone, record.name.clone()))
    }

    /// Split rows into valid contacts (order preserved) and a rejection count.
    pub fn partition(&self, records: &[RawRecord]) -> (Vec<Contact>, usize) {
        let mut valid = Vec::with_capacity(records.len());
        let mut rejected = 0;
        for record in records {
            match self.validate(record) {
                Ok(contact) => valid.push(contact),
                Err(e) => {
                    tracing::debug!("Skipping record: {e}");
                    rejected += 1;
                }
            }
        }
        (valid, rejected)
    }
}

impl Default for ContactValidator {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_separators() {
        let v = ContactValidator::default();
        assert_eq!(v.validate_phone("98-123 45678").unwrap(), "9812345678");
        assert_eq!(v.validate_phone("(981) 234-5678").unwrap(), "9812345678");
    }

    #[test]
    fn test_rejects_wrong_length() {
        let v = ContactValidator::default();
        let err = v.validate_phone("123").unwrap_err();
        assert!(err.to_string().contains(INVALID_PHONE));
        assert!(v.validate_phone("").is_err());
        assert!(v.validate_phone("no digits here").is_err());
    }

    #[test]
    fn test_country_code_is_not_stripped() {
        let v = ContactValidator::default();
        assert!(v.validate_phone("+91 9876543210").is_err());
    }

    #[test]
    fn test_numeric_inputs() {
        let v = ContactValidator::default();
        assert_eq!(v.validate_phone(&9876543210u64).unwrap(), "9876543210");
        assert_eq!(v.validate_phone(&9876543210.0f64).unwrap(), "9876543210");
        assert!(v.validate_phone("98765.43210").is_ok());
        assert!(v.validate_phone(&42i32).is_err());
    }

    #[test]
    fn test_accepts_iff_stripped_digits_match() {
        let v = ContactValidator::default();
        // "9876543210.0" strips to eleven digits.
        assert!(v.validate_phone("9876543210.0").is_err());
        assert_eq!(v.validate_phone("987654321.0").unwrap(), "9876543210");
    }

    #[test]
    fn test_configurable_length() {
        let v = ContactValidator::new(12);
        assert_eq!(v.validate_phone("+91 98765 43210").unwrap(), "919876543210");
        assert!(v.validate_phone("9876543210").is_err());
    }

    #[test]
    fn test_partition_preserves_order_and_name() {
        let v = ContactValidator::default();
        let records = vec![
            RawRecord::new("9876543210", "Asha Patil"),
            RawRecord::new("12", "Broken"),
            RawRecord::new("91234 56789", "  Ravi  "),
        ];
        let (valid, rejected) = v.partition(&records);
        assert_eq!(rejected, 1);
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0], Contact::new("9876543210", "Asha Patil"));
        assert_eq!(valid[1].name, "  Ravi  ");
    }
}
