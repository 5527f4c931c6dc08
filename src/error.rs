use std::fmt::{self, Debug, Display};

/// Provides `InterventionError` and maps other errors to
/// convert to an `InterventionError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum InterventionError {
    /// Malformed or type-invalid policy parameters. Only raised while
    /// building policies, never while querying them.
    ConfigurationError(String),
    /// A stateful policy refers to a key its collaborator table does not know.
    PolicyError(String),
    /// A parameter record could not be deserialized into its typed form.
    JsonError(serde_json::Error),
}

impl InterventionError {
    /// Both malformed records and records that fail to deserialize are
    /// configuration problems.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            InterventionError::ConfigurationError(_) | InterventionError::JsonError(_)
        )
    }

    #[must_use]
    pub fn is_policy_error(&self) -> bool {
        matches!(self, InterventionError::PolicyError(_))
    }
}

impl From<serde_json::Error> for InterventionError {
    fn from(error: serde_json::Error) -> Self {
        InterventionError::JsonError(error)
    }
}

impl From<String> for InterventionError {
    fn from(error: String) -> Self {
        InterventionError::ConfigurationError(error)
    }
}

impl From<&str> for InterventionError {
    fn from(error: &str) -> Self {
        InterventionError::ConfigurationError(error.to_string())
    }
}

impl std::error::Error for InterventionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InterventionError::JsonError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for InterventionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InterventionError::ConfigurationError(message) => {
                write!(f, "configuration error: {message}")
            }
            InterventionError::PolicyError(message) => write!(f, "policy error: {message}"),
            InterventionError::JsonError(error) => {
                write!(f, "configuration error: invalid policy parameters: {error}")
            }
        }
    }
}
