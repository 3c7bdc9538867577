//! Risk classification of registration codes.
//!
//! Classification is fail-closed: anything that is not a string carrying the
//! authorized prefix is unsafe, including missing and empty codes.

use crate::models::Category;
use crate::rules::DEFAULT_AUTHORIZED_PREFIX;
use serde_json::Value;

/// Strategy mapping a raw registration code to a category.
pub trait Classifier: Send + Sync {
    /// Classify any JSON value. Must be total.
    fn classify(&self, code: Option<&Value>) -> Category;

    /// Convenience for codes already known to be strings.
    fn classify_str(&self, code: &str) -> Category {
        self.classify(Some(&Value::String(code.to_string())))
    }
}

/// Classifies codes by a leading authorized prefix.
#[derive(Debug, Clone)]
pub struct PrefixClassifier {
    prefix: String,
}

impl PrefixClassifier {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for PrefixClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_AUTHORIZED_PREFIX)
    }
}

impl Classifier for PrefixClassifier {
    fn classify(&self, code: Option<&Value>) -> Category {
        match code {
            // An empty prefix would authorize everything; treat it as misconfigured.
            Some(Value::String(s)) if !s.is_empty() && !self.prefix.is_empty() => {
                if s.starts_with(self.prefix.as_str()) {
                    Category::Safe
                } else {
                    Category::Unsafe
                }
            }
            _ => Category::Unsafe,
        }
    }
}

/// Classify with the default authorized prefix.
pub fn classify(code: Option<&Value>) -> Category {
    PrefixClassifier::default().classify(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_and_empty_codes_are_unsafe() {
        assert_eq!(classify(None), Category::Unsafe);
        assert_eq!(classify(Some(&Value::Null)), Category::Unsafe);
        assert_eq!(classify(Some(&json!(""))), Category::Unsafe);
    }

    #[test]
    fn non_string_codes_are_unsafe() {
        assert_eq!(classify(Some(&json!(42))), Category::Unsafe);
        assert_eq!(classify(Some(&json!(true))), Category::Unsafe);
        assert_eq!(classify(Some(&json!(["B0042"]))), Category::Unsafe);
        assert_eq!(classify(Some(&json!({"code": "B0042"}))), Category::Unsafe);
    }

    #[test]
    fn authorized_prefix_is_safe() {
        assert_eq!(classify(Some(&json!("B0042"))), Category::Safe);
        assert_eq!(classify(Some(&json!("G0042"))), Category::Unsafe);
        // Prefix match is case-sensitive
        assert_eq!(classify(Some(&json!("b0042"))), Category::Unsafe);
    }

    #[test]
    fn custom_prefix() {
        let classifier = PrefixClassifier::new("FAA-");
        assert_eq!(classifier.classify_str("FAA-123"), Category::Safe);
        assert_eq!(classifier.classify_str("B0042"), Category::Unsafe);
    }

    #[test]
    fn empty_prefix_authorizes_nothing() {
        let classifier = PrefixClassifier::new("");
        assert_eq!(classifier.classify_str("B0042"), Category::Unsafe);
    }
}
