//! Validation results
//!
//! [`ValidationStatus`] is an immutable value: combining statuses always
//! produces a new one, so a status handed to one caller can never change
//! under another.

use crate::pointer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One schema violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Dotted property path (`Links.2.Url`)
    pub property: String,
    /// JSON Pointer into the validated blob (`/Links/2/Url`)
    pub pointer: String,
    /// Human-readable description of the violation
    pub message_literal: String,
    /// Machine-readable details (violated keyword, schema path, ...)
    #[serde(default)]
    pub additional_data: Map<String, Value>,
}

impl ValidationError {
    /// Create error at `pointer`, deriving the dotted property path
    pub fn new(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        let pointer = pointer.into();
        Self {
            property: pointer::to_property_path(&pointer),
            pointer,
            message_literal: message.into(),
            additional_data: Map::new(),
        }
    }

    /// Attach one additional data entry
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.additional_data.insert(key.into(), value);
        self
    }

    /// Violated keyword, when known
    #[must_use]
    pub fn keyword(&self) -> Option<&str> {
        self.additional_data.get("keyword").and_then(Value::as_str)
    }
}

/// Aggregate outcome of validating one blob
///
/// `errors` are fatal; `warnings` are violations tolerated by permissive
/// validation. A status is good when it carries no errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStatus {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl ValidationStatus {
    /// Good status without warnings
    #[inline]
    #[must_use]
    pub fn good() -> Self {
        Self::default()
    }

    /// Status failing with `errors` (good if `errors` is empty)
    #[must_use]
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            errors,
            warnings: Vec::new(),
        }
    }

    /// Good status carrying `warnings`
    #[must_use]
    pub fn from_warnings(warnings: Vec<ValidationError>) -> Self {
        Self {
            errors: Vec::new(),
            warnings,
        }
    }

    /// Status failing with a single error
    #[must_use]
    pub fn fatal(error: ValidationError) -> Self {
        Self::from_errors(vec![error])
    }

    /// No fatal errors
    #[inline]
    #[must_use]
    pub fn is_good(&self) -> bool {
        self.errors.is_empty()
    }

    /// At least one fatal error
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !self.is_good()
    }

    /// Good and without warnings
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Fatal errors
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Tolerated violations
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Errors followed by warnings
    pub fn issues(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().chain(&self.warnings)
    }

    /// New status holding every error and warning of both statuses
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            errors: self.errors.iter().chain(&other.errors).cloned().collect(),
            warnings: self.warnings.iter().chain(&other.warnings).cloned().collect(),
        }
    }

    /// New good status with every error demoted to a warning
    #[must_use]
    pub fn into_warnings(self) -> Self {
        let mut warnings = self.errors;
        warnings.extend(self.warnings);
        Self::from_warnings(warnings)
    }

    /// Issues addressed at exactly `pointer`
    pub fn issues_at<'a>(&'a self, pointer: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.issues().filter(move |issue| issue.pointer == pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn error_derives_property_path() {
        let error = ValidationError::new("/Links/2/Url", "not a URL").with_data("keyword", json!("format"));
        assert_eq!(error.property, "Links.2.Url");
        assert_eq!(error.keyword(), Some("format"));
    }

    #[test]
    fn good_and_fatal() {
        assert!(ValidationStatus::good().is_good());
        assert!(ValidationStatus::good().is_ok());
        assert!(ValidationStatus::from_errors(Vec::new()).is_good());

        let fatal = ValidationStatus::fatal(ValidationError::new("/a", "bad"));
        assert!(fatal.is_fatal());
        assert!(!fatal.is_ok());
    }

    #[test]
    fn warnings_keep_status_good() {
        let status = ValidationStatus::from_warnings(vec![ValidationError::new("/a", "stale")]);
        assert!(status.is_good());
        assert!(!status.is_ok());
        assert_eq!(status.warnings().len(), 1);
    }

    #[test]
    fn merge_preserves_everything_and_leaves_inputs_alone() {
        let a = ValidationStatus::fatal(ValidationError::new("/a", "bad a"));
        let b = ValidationStatus::from_warnings(vec![ValidationError::new("/b", "stale b")])
            .merge(&ValidationStatus::fatal(ValidationError::new("/c", "bad c")));

        let merged = a.merge(&b);
        assert_eq!(merged.errors().len(), 2);
        assert_eq!(merged.warnings().len(), 1);
        assert_eq!(merged.issues().count(), 3);

        assert_eq!(a.errors().len(), 1);
        assert_eq!(b.errors().len(), 1);
        assert_eq!(b.warnings().len(), 1);
    }

    #[test]
    fn into_warnings_demotes() {
        let status = ValidationStatus::fatal(ValidationError::new("/a", "bad")).into_warnings();
        assert!(status.is_good());
        assert_eq!(status.warnings()[0].pointer, "/a");
    }

    #[test]
    fn issues_at_pointer() {
        let status = ValidationStatus::from_errors(vec![
            ValidationError::new("/a", "one"),
            ValidationError::new("/b", "two"),
            ValidationError::new("/a", "three"),
        ]);
        assert_eq!(status.issues_at("/a").count(), 2);
    }

    #[test]
    fn serializes_camel_case() {
        let error = ValidationError::new("/a", "bad");
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["messageLiteral"], json!("bad"));
        assert_eq!(value["additionalData"], json!({}));
    }
}
