//! Decode command implementation.

use graphsync_engine::{DecodeFilter, DecodeOutput, Decoder, DecoderConfig};
use graphsync_resource::{Resource, ResourceError};
use graphsync_store::{
    Chart, ChartFilter, InMemoryStore, Module, ModuleFilter, Namespace, NamespaceFilter,
    NamespaceStore, Page, PageFilter, RecordFilter,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Decoded resources, grouped by kind.
#[derive(Debug, Default, Serialize)]
pub struct DecodeResult {
    /// Namespaces.
    pub namespaces: Vec<Namespace>,
    /// Modules, with fields.
    pub modules: Vec<Module>,
    /// Charts.
    pub charts: Vec<Chart>,
    /// Pages, parents first.
    pub pages: Vec<Page>,
    /// Records, per module (empty unless requested).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<RecordSet>,
}

/// The records of one module.
#[derive(Debug, Serialize)]
pub struct RecordSet {
    /// Module handle.
    pub module: String,
    /// Records.
    pub rows: Vec<RecordRow>,
}

/// One record.
#[derive(Debug, Serialize)]
pub struct RecordRow {
    /// Record ID.
    pub id: String,
    /// Field values, in place order.
    pub values: BTreeMap<String, Vec<String>>,
}

/// Runs the decode command.
pub fn run(
    path: &Path,
    namespace: Option<&str>,
    records: bool,
    page_size: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = decode(path, namespace, records, page_size)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Decodes a snapshot.
///
/// Namespaces are decoded first; their IDs scope the module, chart and
/// page filters, and the decoded modules scope the record filters.
pub fn decode(
    path: &Path,
    namespace: Option<&str>,
    records: bool,
    page_size: u32,
) -> Result<DecodeResult, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No snapshot found at {:?}", path).into());
    }
    let store = Arc::new(InMemoryStore::load(path)?);

    if let Some(slug) = namespace {
        if store.lookup_namespace_by_slug(slug)?.is_none() {
            return Err(format!("No namespace {slug:?} in snapshot").into());
        }
    }

    let decoder = Decoder::new(
        Arc::clone(&store),
        DecoderConfig::default().with_default_page_size(page_size),
    );
    let mut result = DecodeResult::default();

    let mut filter = DecodeFilter::new();
    filter.namespace(NamespaceFilter {
        slug: namespace.map(str::to_string),
        ..Default::default()
    });
    let namespaces = decoder.decode(&filter)?;

    let mut filter = DecodeFilter::new();
    for &namespace_id in &namespaces.resource_ids {
        filter
            .module(ModuleFilter {
                namespace_id,
                ..Default::default()
            })
            .chart(ChartFilter {
                namespace_id,
                ..Default::default()
            })
            .page(PageFilter {
                namespace_id,
                ..Default::default()
            });
    }
    let nested = if filter.is_empty() {
        DecodeOutput::default()
    } else {
        decoder.decode(&filter)?
    };

    let mut filter = DecodeFilter::new();
    if records {
        for r in nested.resources.iter() {
            if let Resource::Module(m) = r {
                filter.record(RecordFilter {
                    namespace_id: m.res.namespace_id,
                    module_id: m.res.id,
                    ..Default::default()
                });
            }
        }
    }
    let record_sets = if filter.is_empty() {
        DecodeOutput::default()
    } else {
        decoder.decode(&filter)?
    };

    for out in [namespaces, nested, record_sets] {
        for r in out.resources.into_inner() {
            collect(r, &mut result)?;
        }
    }

    info!(
        namespaces = result.namespaces.len(),
        modules = result.modules.len(),
        charts = result.charts.len(),
        pages = result.pages.len(),
        record_sets = result.records.len(),
        "snapshot decoded"
    );
    Ok(result)
}

fn collect(r: Resource, result: &mut DecodeResult) -> Result<(), ResourceError> {
    match r {
        Resource::Namespace(n) => result.namespaces.push(n.res),
        Resource::Module(m) => result.modules.push(m.res),
        Resource::Chart(c) => result.charts.push(c.res),
        Resource::Page(p) => result.pages.push(p.res),
        Resource::Record(mut rec) => {
            let module = rec.identifiers().first().unwrap_or_default().to_string();
            let mut rows = Vec::new();
            rec.walk(|raw| {
                rows.push(RecordRow {
                    id: raw.id,
                    values: raw.values,
                });
                Ok::<_, ResourceError>(())
            })?;
            result.records.push(RecordSet { module, rows });
        }
    }
    Ok(())
}
