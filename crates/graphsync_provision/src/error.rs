//! Error types for provisioning.

use thiserror::Error;

/// Result type for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Errors that can occur while provisioning auth providers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    /// A provider list did not hold complete `<name> <url>` pairs.
    #[error("{var}: expecting even number of providers, got {count} values")]
    OddProviderList {
        /// Variable holding the list.
        var: String,
        /// Number of values found.
        count: usize,
    },

    /// A provider spec had fewer parts than its kind requires.
    #[error("{var}: expecting \"{expected}\"")]
    MalformedProviderSpec {
        /// Variable holding the spec.
        var: String,
        /// The expected layout.
        expected: &'static str,
    },

    /// The registrar refused a provider.
    #[error("could not register provider {name}: {reason}")]
    Registration {
        /// Provider name or handle.
        name: String,
        /// Registrar message.
        reason: String,
    },
}

impl ProvisionError {
    /// Creates a registration error.
    pub fn registration(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Registration {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for errors caused by malformed configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ProvisionError::OddProviderList { .. } | ProvisionError::MalformedProviderSpec { .. }
        )
    }
}
