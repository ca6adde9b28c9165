use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// Trait for validating configuration values
pub trait ConfigValidator<T: ?Sized> {
    /// Validate a configuration value
    fn validate(&self, value: &T) -> Result<(), ConfigError>;
}

/// Log level validator
pub struct LogLevelValidator;

impl LogLevelValidator {
    pub const LEVELS: [&'static str; 5] = ["error", "warn", "info", "debug", "trace"];
}

impl ConfigValidator<str> for LogLevelValidator {
    fn validate(&self, value: &str) -> Result<(), ConfigError> {
        if !Self::LEVELS.contains(&value) {
            return Err(ConfigError::invalid_value(
                "log_level",
                value,
                format!("one of: {}", Self::LEVELS.join(", ")),
            ));
        }
        Ok(())
    }
}

/// Positive integer validator
pub struct NonZeroValidator {
    pub field: &'static str,
}

impl ConfigValidator<u64> for NonZeroValidator {
    fn validate(&self, value: &u64) -> Result<(), ConfigError> {
        if *value == 0 {
            return Err(ConfigError::invalid_value(
                self.field,
                value.to_string(),
                "value greater than 0",
            ));
        }
        Ok(())
    }
}

/// Capability tag validator
pub struct CapabilityTagValidator;

impl ConfigValidator<str> for CapabilityTagValidator {
    fn validate(&self, value: &str) -> Result<(), ConfigError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.starts_with(':') || trimmed.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid_value(
                "required_capabilities",
                value,
                "non-empty capability tag without whitespace",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_validator() {
        assert!(LogLevelValidator.validate("info").is_ok());
        assert!(LogLevelValidator.validate("trace").is_ok());
        assert!(LogLevelValidator.validate("verbose").is_err());
    }

    #[test]
    fn test_capability_tag_validator() {
        assert!(CapabilityTagValidator.validate("storage").is_ok());
        assert!(CapabilityTagValidator.validate("command:help").is_ok());
        assert!(CapabilityTagValidator.validate("").is_err());
        assert!(CapabilityTagValidator.validate(":help").is_err());
        assert!(CapabilityTagValidator.validate("two words").is_err());
    }

    #[test]
    fn test_non_zero_validator() {
        let validator = NonZeroValidator { field: "teardown_grace_ms" };
        assert!(validator.validate(&1).is_ok());
        assert!(validator.validate(&0).is_err());
    }
}
