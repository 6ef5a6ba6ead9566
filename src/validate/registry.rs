//! Validator registry.
//!
//! The [`ValidatorRegistry`] stores validators keyed by error code. A code
//! may be shared by several validators (the autonomous-pack rules do this);
//! iteration is always in lexicographic code order, then registration order.

use std::collections::BTreeMap;

use super::context::RunContext;
use super::rules;
use super::validator::Validator;

/// Registry of all available validators.
pub struct ValidatorRegistry {
    validators: BTreeMap<String, Vec<Box<dyn Validator>>>,
}

impl ValidatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            validators: BTreeMap::new(),
        }
    }

    /// Create a registry with the full built-in catalog.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for validator in rules::builtins() {
            registry.register(validator);
        }
        registry
    }

    pub fn register(&mut self, validator: Box<dyn Validator>) {
        self.validators
            .entry(validator.code().to_string())
            .or_default()
            .push(validator);
    }

    /// Validators registered under `code`.
    pub fn get(&self, code: &str) -> impl Iterator<Item = &dyn Validator> {
        self.validators
            .get(code)
            .into_iter()
            .flatten()
            .map(|v| v.as_ref())
    }

    /// Every validator, in code order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Validator> {
        self.validators.values().flatten().map(|v| v.as_ref())
    }

    /// Validators the run's select/ignore sets leave enabled.
    pub fn enabled<'a>(&'a self, run: &'a RunContext) -> impl Iterator<Item = &'a dyn Validator> + 'a {
        self.iter().filter(move |v| run.code_enabled(v.code()))
    }

    /// Distinct codes, sorted.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    /// Number of registered validators.
    pub fn len(&self) -> usize {
        self.validators.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Artifact;
    use crate::error::Result;
    use crate::validate::context::{ExecutionMode, ValidationContext};
    use crate::validate::results::ValidationResult;
    use crate::validate::validator::ValidatorInfo;

    struct MockValidator(&'static str);

    impl Validator for MockValidator {
        fn info(&self) -> ValidatorInfo {
            ValidatorInfo {
                code: self.0,
                ..ValidatorInfo::BASE
            }
        }

        fn obtain_invalid_content_items(
            &self,
            _items: &[&Artifact],
            _ctx: &ValidationContext<'_>,
        ) -> Result<Vec<ValidationResult>> {
            Ok(vec![])
        }
    }

    #[test]
    fn registry_new_is_empty() {
        let registry = ValidatorRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn iteration_is_in_code_order_and_keeps_shared_codes() {
        let mut registry = ValidatorRegistry::new();
        registry.register(Box::new(MockValidator("PB100")));
        registry.register(Box::new(MockValidator("BA101")));
        registry.register(Box::new(MockValidator("PB100")));

        let codes: Vec<_> = registry.iter().map(|v| v.code()).collect();
        assert_eq!(codes, vec!["BA101", "PB100", "PB100"]);
        assert_eq!(registry.get("PB100").count(), 2);
        assert_eq!(registry.codes().count(), 2);
    }

    #[test]
    fn enabled_honours_select_and_ignore() {
        let mut registry = ValidatorRegistry::new();
        registry.register(Box::new(MockValidator("BA101")));
        registry.register(Box::new(MockValidator("RM104")));

        let mut run = RunContext::new("/c", ExecutionMode::AllFiles);
        run.ignore.insert("RM104".into());
        let codes: Vec<_> = registry.enabled(&run).map(|v| v.code()).collect();
        assert_eq!(codes, vec!["BA101"]);
    }

    #[test]
    fn builtins_have_unique_well_formed_codes() {
        let registry = ValidatorRegistry::with_builtins();
        assert!(!registry.is_empty());
        for validator in registry.iter() {
            let code = validator.code();
            assert_eq!(code.len(), 5, "{}", code);
            assert!(code[..2].chars().all(|c| c.is_ascii_uppercase()), "{}", code);
            assert!(code[2..].chars().all(|c| c.is_ascii_digit()), "{}", code);
            assert!(!validator.info().description.is_empty(), "{}", code);
            assert!(!validator.info().content_types.is_empty(), "{}", code);
        }
    }

    #[test]
    fn fixable_builtins_declare_fix_messages() {
        let registry = ValidatorRegistry::with_builtins();
        for validator in registry.iter().filter(|v| v.info().auto_fixable) {
            assert!(validator.info().fix_message.is_some(), "{}", validator.code());
        }
    }
}
