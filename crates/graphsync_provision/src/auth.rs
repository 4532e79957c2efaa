//! Auth provider provisioning from configuration variables.

use crate::env::EnvSource;
use crate::error::{ProvisionError, ProvisionResult};
use crate::provider::{
    ExternalAuthProvider, OidcRegistration, ProviderRegistrar, OIDC_PROVIDER_PREFIX,
};
use tracing::{debug, error, info};

/// Variable listing OpenID Connect providers to discover.
pub const OIDC_PROVIDER_VAR: &str = "PROVISION_OIDC_PROVIDER";

/// Prefix of the federated provider variables.
pub const FEDERATED_VAR_PREFIX: &str = "PROVISION_SETTINGS_AUTH_FEDERATED_";

/// Federated provider kinds, in provisioning order.
pub const FEDERATED_KINDS: [&str; 5] = ["github", "facebook", "google", "linkedin", "oidc"];

/// What a provisioning pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// OpenID Connect providers registered by discovery.
    pub discovered: usize,
    /// Discovered providers that already existed.
    pub existing: usize,
    /// Federated providers handed to the registrar.
    pub federated: usize,
}

/// Registers the providers listed in [`OIDC_PROVIDER_VAR`].
///
/// The variable holds whitespace separated `<name> <url>` pairs. Providers
/// are registered without overwriting existing ones and without
/// validation, since the issuer may not be reachable yet, but enabled.
pub fn oidc_auto_discovery<E, R>(env: &E, registrar: &R) -> ProvisionResult<ProvisionReport>
where
    E: EnvSource + ?Sized,
    R: ProviderRegistrar + ?Sized,
{
    let mut report = ProvisionReport::default();
    let Some(list) = env.trimmed(OIDC_PROVIDER_VAR) else {
        debug!(var = OIDC_PROVIDER_VAR, "no oidc providers to discover");
        return Ok(report);
    };

    let values: Vec<&str> = list.split_whitespace().collect();
    if values.len() % 2 == 1 {
        return Err(ProvisionError::OddProviderList {
            var: OIDC_PROVIDER_VAR.into(),
            count: values.len(),
        });
    }

    for pair in values.chunks(2) {
        let req = OidcRegistration {
            name: pair[0].to_string(),
            url: pair[1].to_string(),
            force: false,
            validate: false,
            enable: true,
        };
        match registrar.register_oidc(&req) {
            Ok(Some(p)) => {
                info!(name = %req.name, url = %req.url, key = %p.key, "provider registered");
                report.discovered += 1;
            }
            Ok(None) => {
                info!(name = %req.name, "provider already exists");
                report.existing += 1;
            }
            Err(e) => {
                error!(
                    name = %req.name,
                    url = %req.url,
                    error = %e,
                    "could not register oidc provider"
                );
                return Err(e);
            }
        }
    }
    Ok(report)
}

/// Adds the providers configured in the `PROVISION_SETTINGS_AUTH_FEDERATED_*`
/// variables.
///
/// `oidc` takes `<name> <issuer> <key> <secret>` and is handled as
/// `openid-connect.<name>`; every other kind takes `<key> <secret>`. The
/// last part keeps any inner whitespace. Registrar failures are logged and
/// do not stop the remaining kinds.
pub fn add_external_providers<E, R>(env: &E, registrar: &R) -> ProvisionResult<usize>
where
    E: EnvSource + ?Sized,
    R: ProviderRegistrar + ?Sized,
{
    let mut added = 0;
    for kind in FEDERATED_KINDS {
        let var = format!("{FEDERATED_VAR_PREFIX}{}", kind.to_uppercase());
        let Some(spec) = env.trimmed(&var) else {
            continue;
        };

        let provider = parse_federated(kind, &var, &spec)?;
        match registrar.add_provider(&provider, false) {
            Ok(()) => added += 1,
            Err(e) => error!(handle = %provider.handle, error = %e, "could not add provider"),
        }
    }
    Ok(added)
}

/// Runs OpenID Connect discovery, then adds the federated providers.
pub fn provision_auth<E, R>(env: &E, registrar: &R) -> ProvisionResult<ProvisionReport>
where
    E: EnvSource + ?Sized,
    R: ProviderRegistrar + ?Sized,
{
    let mut report = oidc_auto_discovery(env, registrar)?;
    report.federated = add_external_providers(env, registrar)?;
    Ok(report)
}

fn parse_federated(kind: &str, var: &str, spec: &str) -> ProvisionResult<ExternalAuthProvider> {
    let malformed = |expected| ProvisionError::MalformedProviderSpec {
        var: var.to_string(),
        expected,
    };

    if kind == "oidc" {
        let layout = "<name> <issuer> <key> <secret>";
        let [name, issuer, key, secret] = split_spec::<4>(spec).ok_or_else(|| malformed(layout))?;
        return Ok(ExternalAuthProvider {
            handle: format!("{OIDC_PROVIDER_PREFIX}{name}"),
            key: key.to_string(),
            secret: secret.to_string(),
            issuer_url: issuer.to_string(),
            enabled: true,
        });
    }

    let [key, secret] = split_spec::<2>(spec).ok_or_else(|| malformed("<key> <secret>"))?;
    Ok(ExternalAuthProvider {
        handle: kind.to_string(),
        key: key.to_string(),
        secret: secret.to_string(),
        issuer_url: String::new(),
        enabled: true,
    })
}

/// Splits `spec` into `N` whitespace separated parts; the last part takes
/// the remainder.
fn split_spec<const N: usize>(spec: &str) -> Option<[&str; N]> {
    let mut parts = [""; N];
    let mut rest = spec.trim();
    for part in parts.iter_mut().take(N - 1) {
        let (head, tail) = rest.split_once(char::is_whitespace)?;
        *part = head;
        rest = tail.trim_start();
    }
    if rest.is_empty() {
        return None;
    }
    parts[N - 1] = rest;
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::provider::LoggingRegistrar;

    struct Refusing;

    impl ProviderRegistrar for Refusing {
        fn register_oidc(
            &self,
            req: &OidcRegistration,
        ) -> ProvisionResult<Option<ExternalAuthProvider>> {
            Err(ProvisionError::registration(&req.name, "unreachable"))
        }

        fn add_provider(&self, p: &ExternalAuthProvider, _force: bool) -> ProvisionResult<()> {
            Err(ProvisionError::registration(&p.handle, "read only"))
        }
    }

    #[test]
    fn discovery_registers_pairs() {
        let env = MapEnv::new().with(
            OIDC_PROVIDER_VAR,
            " corp https://id.corp.example  partner https://sso.partner.example ",
        );
        let r = LoggingRegistrar::new();

        let report = oidc_auto_discovery(&env, &r).unwrap();
        assert_eq!(report.discovered, 2);

        let pp = r.providers();
        assert_eq!(pp[0].handle, "openid-connect.corp");
        assert_eq!(pp[0].issuer_url, "https://id.corp.example");
        assert!(pp.iter().all(|p| p.enabled));

        // A second pass finds both and changes nothing
        let again = oidc_auto_discovery(&env, &r).unwrap();
        assert_eq!(again.discovered, 0);
        assert_eq!(again.existing, 2);
    }

    #[test]
    fn odd_provider_list_fails() {
        let env = MapEnv::new().with(OIDC_PROVIDER_VAR, "corp https://id.corp.example partner");
        let err = oidc_auto_discovery(&env, &LoggingRegistrar::new()).unwrap_err();
        assert_eq!(
            err,
            ProvisionError::OddProviderList {
                var: OIDC_PROVIDER_VAR.into(),
                count: 3
            }
        );
    }

    #[test]
    fn empty_configuration_does_nothing() {
        let env = MapEnv::new().with(OIDC_PROVIDER_VAR, "   ");
        let r = LoggingRegistrar::new();
        assert_eq!(provision_auth(&env, &r).unwrap(), ProvisionReport::default());
        assert!(r.providers().is_empty());
    }

    #[test]
    fn registration_failure_stops_discovery() {
        let env = MapEnv::new().with(OIDC_PROVIDER_VAR, "corp https://id.corp.example");
        let err = oidc_auto_discovery(&env, &Refusing).unwrap_err();
        assert!(matches!(err, ProvisionError::Registration { .. }));
    }

    #[test]
    fn federated_providers_are_parsed() {
        let env: MapEnv = [
            ("PROVISION_SETTINGS_AUTH_FEDERATED_GITHUB", "gh-key gh secret"),
            (
                "PROVISION_SETTINGS_AUTH_FEDERATED_OIDC",
                "corp https://id.corp.example corp-key corp-secret",
            ),
        ]
        .into_iter()
        .collect();
        let r = LoggingRegistrar::new();

        assert_eq!(add_external_providers(&env, &r).unwrap(), 2);
        let pp = r.providers();
        assert_eq!(pp[0].handle, "github");
        assert_eq!(pp[0].key, "gh-key");
        assert_eq!(pp[0].secret, "gh secret");
        assert_eq!(pp[1].handle, "openid-connect.corp");
        assert_eq!(pp[1].issuer_url, "https://id.corp.example");
        assert_eq!(pp[1].key, "corp-key");
        assert_eq!(pp[1].secret, "corp-secret");
    }

    #[test]
    fn short_federated_spec_fails() {
        let env = MapEnv::new().with("PROVISION_SETTINGS_AUTH_FEDERATED_GOOGLE", "only-key");
        let err = add_external_providers(&env, &LoggingRegistrar::new()).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("<key> <secret>"));

        let env = MapEnv::new().with("PROVISION_SETTINGS_AUTH_FEDERATED_OIDC", "corp url key");
        assert!(add_external_providers(&env, &LoggingRegistrar::new()).is_err());
    }

    #[test]
    fn registrar_failures_do_not_stop_other_kinds() {
        let env = MapEnv::new()
            .with("PROVISION_SETTINGS_AUTH_FEDERATED_GITHUB", "k s")
            .with("PROVISION_SETTINGS_AUTH_FEDERATED_GOOGLE", "k s");
        assert_eq!(add_external_providers(&env, &Refusing).unwrap(), 0);
    }

    #[test]
    fn spec_splitting() {
        assert_eq!(split_spec::<2>("a  b c"), Some(["a", "b c"]));
        assert_eq!(split_spec::<2>("a "), None);
        assert_eq!(split_spec::<3>("a b"), None);
    }
}
