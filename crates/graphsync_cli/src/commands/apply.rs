//! Apply command implementation.

use crate::manifest::Manifest;
use graphsync_engine::{EncoderConfig, MergeStrategy, SyncRun};
use graphsync_store::InMemoryStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Options of an apply.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Policy for resources that already exist.
    pub on_existing: MergeStrategy,
    /// Skip predicate evaluated before every write.
    pub skip_if: Option<String>,
    /// Encode without saving the snapshot.
    pub dry_run: bool,
}

/// Apply result.
#[derive(Debug, Serialize)]
pub struct ApplyResult {
    /// Snapshot path.
    pub snapshot: String,
    /// Nodes in the manifest.
    pub resources: usize,
    /// Rows created.
    pub created: usize,
    /// Rows updated.
    pub updated: usize,
    /// Rows left untouched.
    pub skipped: usize,
    /// Whether the snapshot was written.
    pub saved: bool,
}

/// Runs the apply command.
pub fn run(
    path: &Path,
    manifest: &Path,
    opts: &ApplyOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = apply(path, manifest, opts)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Encodes a manifest into the snapshot at `path`, creating it if missing.
///
/// Nothing is saved when encoding fails, so the snapshot on disk never
/// holds a partially applied manifest.
pub fn apply(
    path: &Path,
    manifest: &Path,
    opts: &ApplyOptions,
) -> Result<ApplyResult, Box<dyn std::error::Error>> {
    let mut resources = Manifest::from_path(manifest)?.into_resources()?;
    let store = Arc::new(InMemoryStore::load(path)?);

    let mut config = EncoderConfig::default().with_on_existing(opts.on_existing);
    if let Some(expr) = &opts.skip_if {
        config = config.with_skip_if(expr.clone());
    }

    let run = SyncRun::new(Arc::clone(&store)).with_encoder_config(config);
    let report = run.encode(&mut resources)?;

    if !opts.dry_run {
        store.save(path)?;
    }

    Ok(ApplyResult {
        snapshot: path.display().to_string(),
        resources: resources.len(),
        created: report.created,
        updated: report.updated,
        skipped: report.skipped,
        saved: !opts.dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_store::{ModuleStore, NamespaceStore, PageStore};
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "namespaces": [{"slug": "crm", "name": "CRM", "enabled": true}],
        "modules": [{"namespace": "crm", "handle": "contacts", "name": "Contacts",
                     "fields": [{"name": "email", "kind": "Email"}]}],
        "pages": [
            {"namespace": "crm", "handle": "home", "title": "Home",
             "blocks": [{"kind": "RecordList", "options": {"moduleID": "contacts"}}]},
            {"namespace": "crm", "handle": "contact", "title": "Contact",
             "module": "contacts", "parent": "home"}
        ],
        "records": [{"namespace": "crm", "module": "contacts",
                     "rows": [{"values": {"email": "a@example.com"}}]}]
    }"#;

    fn setup() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("manifest.json");
        fs::write(&manifest, MANIFEST).unwrap();
        let snapshot = dir.path().join("store.cbor");
        (dir, snapshot, manifest)
    }

    #[test]
    fn apply_creates_and_saves() {
        let (_dir, snapshot, manifest) = setup();

        let result = apply(&snapshot, &manifest, &ApplyOptions::default()).unwrap();
        assert_eq!(result.resources, 5);
        assert_eq!(result.created, 5);
        assert!(result.saved);

        let store = InMemoryStore::load(&snapshot).unwrap();
        let ns = store.lookup_namespace_by_slug("crm").unwrap().unwrap();
        let module = store
            .lookup_module_by_namespace_handle(ns.id, "contacts")
            .unwrap()
            .unwrap();
        let home = store
            .lookup_page_by_namespace_handle(ns.id, "home")
            .unwrap()
            .unwrap();
        assert_eq!(
            home.blocks[0].options["moduleID"],
            serde_json::json!(module.id.to_string())
        );
        let contact = store
            .lookup_page_by_namespace_handle(ns.id, "contact")
            .unwrap()
            .unwrap();
        assert_eq!(contact.self_id, home.id);
        assert_eq!(contact.module_id, module.id);
    }

    #[test]
    fn second_apply_honors_policy() {
        let (_dir, snapshot, manifest) = setup();
        apply(&snapshot, &manifest, &ApplyOptions::default()).unwrap();

        let opts = ApplyOptions {
            on_existing: MergeStrategy::Skip,
            ..Default::default()
        };
        let result = apply(&snapshot, &manifest, &opts).unwrap();
        assert_eq!(result.created, 1, "records carry no ID and are new again");
        assert_eq!(result.skipped, 4);
    }

    #[test]
    fn dry_run_leaves_no_snapshot() {
        let (_dir, snapshot, manifest) = setup();
        let opts = ApplyOptions {
            dry_run: true,
            ..Default::default()
        };
        let result = apply(&snapshot, &manifest, &opts).unwrap();
        assert_eq!(result.created, 5);
        assert!(!result.saved);
        assert!(!snapshot.exists());
    }

    #[test]
    fn failed_encode_is_not_saved() {
        let (dir, snapshot, _) = setup();
        let manifest = dir.path().join("broken.json");
        fs::write(
            &manifest,
            r#"{"modules": [{"namespace": "ghost", "handle": "contacts"}]}"#,
        )
        .unwrap();

        let err = apply(&snapshot, &manifest, &ApplyOptions::default()).unwrap_err();
        assert!(err.to_string().contains("unresolved reference"));
        assert!(!snapshot.exists());
    }
}
