//! External auth providers and their registrars.

use crate::error::ProvisionResult;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Handle prefix of OpenID Connect providers.
pub const OIDC_PROVIDER_PREFIX: &str = "openid-connect.";

/// An external authentication provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAuthProvider {
    /// Provider handle (`github`, `openid-connect.<name>`, ...).
    pub handle: String,
    /// Client key.
    #[serde(default)]
    pub key: String,
    /// Client secret.
    #[serde(default, skip_serializing)]
    pub secret: String,
    /// Issuer URL, OpenID Connect only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub issuer_url: String,
    /// Whether the provider may be used to log in.
    #[serde(default)]
    pub enabled: bool,
}

/// An OpenID Connect discovery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcRegistration {
    /// Provider name; the handle is [`OIDC_PROVIDER_PREFIX`] + name.
    pub name: String,
    /// Issuer URL to discover the provider at.
    pub url: String,
    /// Overwrite an existing provider.
    pub force: bool,
    /// Validate the provider through its discovery endpoint.
    pub validate: bool,
    /// Enable the provider.
    pub enable: bool,
}

impl OidcRegistration {
    /// Returns the handle the provider is registered under.
    pub fn handle(&self) -> String {
        format!("{OIDC_PROVIDER_PREFIX}{}", self.name)
    }
}

/// Where provisioned providers go.
pub trait ProviderRegistrar {
    /// Registers a provider through OpenID Connect discovery.
    ///
    /// Returns `None` when the provider exists and `force` is not set.
    fn register_oidc(
        &self,
        req: &OidcRegistration,
    ) -> ProvisionResult<Option<ExternalAuthProvider>>;

    /// Adds a provider; an existing one is only replaced with `force`.
    fn add_provider(&self, provider: &ExternalAuthProvider, force: bool) -> ProvisionResult<()>;
}

/// A registrar that keeps providers in memory and logs every change.
#[derive(Debug, Default)]
pub struct LoggingRegistrar {
    providers: Mutex<Vec<ExternalAuthProvider>>,
}

impl LoggingRegistrar {
    /// Creates an empty registrar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the registered providers in registration order.
    pub fn providers(&self) -> Vec<ExternalAuthProvider> {
        self.providers.lock().clone()
    }

    /// Inserts or replaces a provider; returns false when it existed and
    /// `force` was not set.
    fn put(&self, provider: ExternalAuthProvider, force: bool) -> bool {
        let mut pp = self.providers.lock();
        match pp.iter_mut().find(|p| p.handle == provider.handle) {
            Some(_) if !force => false,
            Some(slot) => {
                *slot = provider;
                true
            }
            None => {
                pp.push(provider);
                true
            }
        }
    }
}

impl ProviderRegistrar for LoggingRegistrar {
    fn register_oidc(
        &self,
        req: &OidcRegistration,
    ) -> ProvisionResult<Option<ExternalAuthProvider>> {
        let provider = ExternalAuthProvider {
            handle: req.handle(),
            key: req.name.clone(),
            issuer_url: req.url.clone(),
            enabled: req.enable,
            ..Default::default()
        };
        if !self.put(provider.clone(), req.force) {
            return Ok(None);
        }
        info!(
            handle = %provider.handle,
            url = %req.url,
            validate = req.validate,
            "oidc provider registered"
        );
        Ok(Some(provider))
    }

    fn add_provider(&self, provider: &ExternalAuthProvider, force: bool) -> ProvisionResult<()> {
        if self.put(provider.clone(), force) {
            info!(handle = %provider.handle, "provider added");
        } else {
            info!(handle = %provider.handle, "provider exists, kept");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(force: bool) -> OidcRegistration {
        OidcRegistration {
            name: "corp".into(),
            url: "https://id.example.com".into(),
            force,
            validate: false,
            enable: true,
        }
    }

    #[test]
    fn existing_oidc_provider_is_reported() {
        let r = LoggingRegistrar::new();
        let first = r.register_oidc(&req(false)).unwrap().unwrap();
        assert_eq!(first.handle, "openid-connect.corp");
        assert!(r.register_oidc(&req(false)).unwrap().is_none());
        assert!(r.register_oidc(&req(true)).unwrap().is_some());
        assert_eq!(r.providers().len(), 1);
    }

    #[test]
    fn secrets_are_not_serialized() {
        let p = ExternalAuthProvider {
            handle: "github".into(),
            key: "k".into(),
            secret: "s".into(),
            enabled: true,
            ..Default::default()
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"handle\":\"github\""));
        assert!(!json.contains("secret"));
        assert!(!json.contains("issuer_url"));
    }
}
