//! Provision command implementation.

use graphsync_provision::{
    provision_auth, EnvSource, ExternalAuthProvider, LoggingRegistrar, ProcessEnv,
    ProvisionResult,
};
use serde::Serialize;

/// Provisioning summary; secrets are never printed.
#[derive(Debug, Serialize)]
pub struct ProvisionSummary {
    /// OpenID Connect providers registered by discovery.
    pub discovered: usize,
    /// Discovered providers that already existed.
    pub existing: usize,
    /// Federated providers added.
    pub federated: usize,
    /// Providers known to the registrar.
    pub providers: Vec<ExternalAuthProvider>,
}

/// Runs the provision command against the process environment.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let summary = provision(&ProcessEnv)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Provisions authentication providers from `env`.
pub fn provision<E: EnvSource + ?Sized>(env: &E) -> ProvisionResult<ProvisionSummary> {
    let registrar = LoggingRegistrar::new();
    let report = provision_auth(env, &registrar)?;
    Ok(ProvisionSummary {
        discovered: report.discovered,
        existing: report.existing,
        federated: report.federated,
        providers: registrar.providers(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_provision::MapEnv;

    #[test]
    fn summary_lists_providers_without_secrets() {
        let env = MapEnv::new()
            .with("PROVISION_OIDC_PROVIDER", "corp https://sso.example.com")
            .with("PROVISION_SETTINGS_AUTH_FEDERATED_GITHUB", "key-1 s3cret");

        let summary = provision(&env).unwrap();
        assert_eq!(summary.discovered, 1);
        assert_eq!(summary.federated, 1);
        assert_eq!(summary.providers.len(), 2);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("openid-connect.corp"));
        assert!(!json.contains("s3cret"));
    }

    #[test]
    fn empty_environment_provisions_nothing() {
        let summary = provision(&MapEnv::new()).unwrap();
        assert_eq!(summary.discovered + summary.federated, 0);
        assert!(summary.providers.is_empty());
    }

    #[test]
    fn odd_provider_list_fails() {
        let env = MapEnv::new().with("PROVISION_OIDC_PROVIDER", "corp");
        assert!(provision(&env).is_err());
    }
}
