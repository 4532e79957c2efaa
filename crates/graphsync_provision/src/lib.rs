//! # graphsync provision
//!
//! Provisions external authentication providers from configuration
//! variables on startup.
//!
//! - `PROVISION_OIDC_PROVIDER` lists `<name> <url>` pairs registered
//!   through OpenID Connect discovery.
//! - `PROVISION_SETTINGS_AUTH_FEDERATED_<KIND>` configures one federated
//!   provider per kind (`GITHUB`, `FACEBOOK`, `GOOGLE`, `LINKEDIN`, `OIDC`).
//!
//! ```rust
//! use graphsync_provision::{provision_auth, LoggingRegistrar, MapEnv};
//!
//! let env = MapEnv::new().with("PROVISION_SETTINGS_AUTH_FEDERATED_GITHUB", "key secret");
//! let registrar = LoggingRegistrar::new();
//! let report = provision_auth(&env, &registrar).unwrap();
//! assert_eq!(report.federated, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod env;
mod error;
mod provider;

pub use auth::{
    add_external_providers, oidc_auto_discovery, provision_auth, ProvisionReport,
    FEDERATED_KINDS, FEDERATED_VAR_PREFIX, OIDC_PROVIDER_VAR,
};
pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use error::{ProvisionError, ProvisionResult};
pub use provider::{
    ExternalAuthProvider, LoggingRegistrar, OidcRegistration, ProviderRegistrar,
    OIDC_PROVIDER_PREFIX,
};
