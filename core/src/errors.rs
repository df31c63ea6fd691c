use thiserror::Error;

/// Code reported when a required dependency cannot be produced anywhere in
/// the delegation chain.
pub const DEPENDENCY_NOT_FOUND: &str = "LINCHPIN_RESOLVER_DEPENDENCY_NOT_FOUND";

#[derive(Debug, Error)]
pub enum LinchpinError {
    #[error("RESOLUTION ERROR: {code} - {message}")]
    Resolution { code: String, message: String },

    #[error("CONFIGURATION ERROR: {code} - {message}")]
    Configuration { code: String, message: String },

    #[error("CODEC ERROR: {code} - {message}")]
    Codec { code: String, message: String },

    #[error("SYSTEM ERROR: {code} - {message}")]
    System { code: String, message: String },
}

impl LinchpinError {
    /// Required resolution of `name` as `expected` failed.
    pub fn unresolved(name: &str, expected: &str) -> Self {
        LinchpinError::Resolution {
            code: DEPENDENCY_NOT_FOUND.to_string(),
            message: format!("Dependency '{}' not resolved as {}", name, expected),
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &str {
        match self {
            LinchpinError::Resolution { code, .. }
            | LinchpinError::Configuration { code, .. }
            | LinchpinError::Codec { code, .. }
            | LinchpinError::System { code, .. } => code,
        }
    }
}

pub type LinchpinResult<T> = Result<T, LinchpinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_carries_name_and_code() {
        let err = LinchpinError::unresolved("Temp_1", "alloc::string::String");
        assert_eq!(err.code(), DEPENDENCY_NOT_FOUND);

        let rendered = err.to_string();
        assert!(rendered.starts_with("RESOLUTION ERROR"));
        assert!(rendered.contains("'Temp_1'"));
        assert!(rendered.contains("alloc::string::String"));
    }

    #[test]
    fn test_code_accessor_covers_every_variant() {
        let errors = [
            LinchpinError::Configuration {
                code: "A".into(),
                message: String::new(),
            },
            LinchpinError::Codec {
                code: "B".into(),
                message: String::new(),
            },
            LinchpinError::System {
                code: "C".into(),
                message: String::new(),
            },
        ];
        let codes: Vec<&str> = errors.iter().map(LinchpinError::code).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
    }
}
