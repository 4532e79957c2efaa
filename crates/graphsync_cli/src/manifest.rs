//! JSON manifests declaring the resources an `apply` encodes.
//!
//! Rows use the store's field names. References to other resources are
//! given as a single identifier (handle, name or ID) and resolved by the
//! encoder, so a manifest may refer to resources it declares itself.

use graphsync_resource::{
    ComposeChart, ComposeModule, ComposeNamespace, ComposePage, ComposeRecord, ComposeRecordRaw,
    EnvoyConfig, Identifiers, ResourceError, ResourceSet, Userstamp, Userstamps, VecRecordSource,
};
use graphsync_store::{Chart, Module, Namespace, Page};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The file could not be read.
    #[error("cannot read manifest: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid manifest.
    #[error("invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),

    /// A declared resource is malformed.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// A set of declared resources.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Namespaces.
    pub namespaces: Vec<NamespaceEntry>,
    /// Modules.
    pub modules: Vec<ModuleEntry>,
    /// Charts.
    pub charts: Vec<ChartEntry>,
    /// Pages.
    pub pages: Vec<PageEntry>,
    /// Records, grouped by module.
    pub records: Vec<RecordEntry>,
}

/// A declared namespace.
#[derive(Debug, Deserialize)]
pub struct NamespaceEntry {
    #[serde(flatten)]
    pub namespace: Namespace,
    #[serde(default)]
    pub envoy: EnvoyConfig,
}

/// A declared module.
#[derive(Debug, Deserialize)]
pub struct ModuleEntry {
    /// Owning namespace.
    pub namespace: String,
    #[serde(flatten)]
    pub module: Module,
    #[serde(default)]
    pub envoy: EnvoyConfig,
}

/// A declared chart.
#[derive(Debug, Deserialize)]
pub struct ChartEntry {
    /// Owning namespace.
    pub namespace: String,
    /// Module of each report, by position; blank for none.
    #[serde(default)]
    pub report_modules: Vec<String>,
    #[serde(flatten)]
    pub chart: Chart,
    #[serde(default)]
    pub envoy: EnvoyConfig,
}

/// A declared page.
#[derive(Debug, Deserialize)]
pub struct PageEntry {
    /// Owning namespace.
    pub namespace: String,
    /// Module of a record page.
    #[serde(default)]
    pub module: Option<String>,
    /// Parent page.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(flatten)]
    pub page: Page,
    #[serde(default)]
    pub envoy: EnvoyConfig,
}

/// Declared records of one module.
#[derive(Debug, Deserialize)]
pub struct RecordEntry {
    /// Owning namespace.
    pub namespace: String,
    /// Module the records belong to.
    pub module: String,
    /// The records.
    #[serde(default)]
    pub rows: Vec<RecordRow>,
    #[serde(default)]
    pub envoy: EnvoyConfig,
}

/// One declared record. Users are given by handle, email or ID.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecordRow {
    pub id: String,
    pub values: BTreeMap<String, FieldValues>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub owned_by: Option<String>,
}

/// Values of one field: a single string, or a list for multi-value fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldValues {
    One(String),
    Many(Vec<String>),
}

impl FieldValues {
    fn into_vec(self) -> Vec<String> {
        match self {
            FieldValues::One(v) => vec![v],
            FieldValues::Many(vv) => vv,
        }
    }
}

impl RecordRow {
    fn into_raw(self) -> ComposeRecordRaw {
        let stamp = |v: Option<String>| v.as_deref().and_then(Userstamp::from_identifier);
        let us = Userstamps {
            created_by: stamp(self.created_by),
            updated_by: stamp(self.updated_by),
            owned_by: stamp(self.owned_by),
            ..Default::default()
        };
        ComposeRecordRaw {
            id: self.id,
            values: self
                .values
                .into_iter()
                .map(|(name, vv)| (name, vv.into_vec()))
                .collect(),
            ts: None,
            us: (!us.is_empty()).then_some(us),
        }
    }
}

fn ident(value: &str) -> Identifiers {
    Identifiers::from_values([value])
}

impl Manifest {
    /// Reads a manifest file.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parses manifest JSON.
    pub fn parse(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the resource graph of the manifest.
    pub fn into_resources(self) -> Result<ResourceSet, ManifestError> {
        let mut rr = ResourceSet::new();

        for e in self.namespaces {
            rr.push(ComposeNamespace::new(e.namespace).with_config(e.envoy));
        }
        for e in self.modules {
            rr.push(ComposeModule::new(e.module, ident(&e.namespace)).with_config(e.envoy));
        }
        for e in self.charts {
            // Reports past the end of the list keep no module.
            let mut report_modules: Vec<Identifiers> =
                e.report_modules.iter().map(|m| ident(m)).collect();
            report_modules.resize(e.chart.config.reports.len(), Identifiers::new());
            let node = ComposeChart::new(e.chart, ident(&e.namespace), report_modules);
            rr.push(node.with_config(e.envoy));
        }
        for e in self.pages {
            let node = ComposePage::new(
                e.page,
                ident(&e.namespace),
                e.module.as_deref().map(ident),
                e.parent.as_deref().map(ident),
            )?;
            rr.push(node.with_config(e.envoy));
        }
        for e in self.records {
            let rows = e.rows.into_iter().map(RecordRow::into_raw).collect();
            let node = ComposeRecord::new(
                ident(&e.namespace),
                ident(&e.module),
                Box::new(VecRecordSource::new(rows)),
            );
            rr.push(node.with_config(e.envoy));
        }

        Ok(rr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_resource::{MergeStrategy, Resource, ResourceType};

    #[test]
    fn empty_manifest_is_valid() {
        let rr = Manifest::parse("{}").unwrap().into_resources().unwrap();
        assert!(rr.is_empty());
    }

    #[test]
    fn entries_become_nodes() {
        let m = Manifest::parse(
            r#"{
                "namespaces": [{"slug": "crm", "name": "CRM", "envoy": {"on_existing": "skip"}}],
                "modules": [{"namespace": "crm", "handle": "contacts", "fields": [{"name": "email"}]}],
                "charts": [{"namespace": "crm", "handle": "growth", "report_modules": ["contacts"],
                            "config": {"reports": [{}, {}]}}],
                "pages": [{"namespace": "crm", "handle": "people", "module": "contacts", "parent": "home"}],
                "records": [{"namespace": "crm", "module": "contacts",
                             "rows": [{"values": {"email": "a@example.com", "tags": ["a", "b"]},
                                       "owned_by": "alice"}]}]
            }"#,
        )
        .unwrap();
        let mut rr = m.into_resources().unwrap();
        assert_eq!(rr.len(), 5);

        let ns = rr.find_first(ResourceType::ComposeNamespace, &ident("crm")).unwrap();
        assert_eq!(ns.base().config().on_existing, Some(MergeStrategy::Skip));

        let Some(Resource::Chart(chart)) = rr.find_first(ResourceType::ComposeChart, &ident("growth"))
        else {
            panic!("chart missing");
        };
        assert_eq!(chart.ref_mods.len(), 2);
        assert!(chart.ref_mods[1].identifiers.is_empty());

        let Some(Resource::Page(page)) = rr.find_first(ResourceType::ComposePage, &ident("people"))
        else {
            panic!("page missing");
        };
        assert!(page.ref_mod.as_ref().unwrap().identifiers.contains("contacts"));
        assert!(page.ref_parent.as_ref().unwrap().identifiers.contains("home"));

        let mut rows = Vec::new();
        for rec in rr.records_mut() {
            rec.walk(|raw| {
                rows.push(raw);
                Ok::<_, ResourceError>(())
            })
            .unwrap();
        }
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values["email"], vec!["a@example.com"]);
        assert_eq!(rows[0].values["tags"], vec!["a", "b"]);
        let owner = rows[0].us.as_ref().unwrap().owned_by.as_ref().unwrap();
        assert_eq!(owner.identifier, "alice");
        assert!(rows[0].us.as_ref().unwrap().created_by.is_none());
    }

    #[test]
    fn entry_without_namespace_is_rejected() {
        let err = Manifest::parse(r#"{"modules": [{"handle": "x"}]}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid manifest"));
    }
}
