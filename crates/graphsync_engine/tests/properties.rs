//! Property tests for pagination and resolution order.

use graphsync_engine::{DecodeFilter, Decoder, DecoderConfig, Encoder, EncoderConfig};
use graphsync_resource::{
    ComposeChart, ComposeModule, ComposeNamespace, ComposePage, Identifiers, Resource,
    ResourceSet,
};
use graphsync_store::{
    Chart, ChartConfig, ChartReport, InMemoryStore, Module, ModuleStore, Namespace,
    NamespaceFilter, NamespaceStore, Page, PageBlock, StoreOp,
};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

fn ids(v: &str) -> Identifiers {
    Identifiers::from_values([v])
}

fn namespace(id: u64, slug: &str) -> Namespace {
    Namespace {
        id,
        slug: slug.into(),
        ..Default::default()
    }
}

fn contacts(id: u64, namespace_id: u64) -> Module {
    Module {
        id,
        namespace_id,
        handle: "contacts".into(),
        ..Default::default()
    }
}

/// Builds the `i`-th node of a graph whose `hr` references have exactly
/// one match in scope, surrounded by unrelated siblings that reuse the
/// same handles elsewhere.
fn node(i: usize) -> Resource {
    match i {
        0 => ComposeNamespace::new(namespace(0, "sales")).into(),
        1 => ComposeModule::new(
            Module {
                handle: "leads".into(),
                ..Default::default()
            },
            ids("sales"),
        )
        .into(),
        2 => ComposeModule::new(contacts(0, 0), ids("sales")).into(),
        3 => ComposePage::new(
            Page {
                handle: "people".into(),
                blocks: vec![PageBlock {
                    kind: "RecordList".into(),
                    options: json!({"module": "contacts"})
                        .as_object()
                        .cloned()
                        .unwrap_or_default(),
                    ..Default::default()
                }],
                ..Default::default()
            },
            ids("hr"),
            Some(ids("contacts")),
            None,
        )
        .unwrap()
        .into(),
        4 => ComposePage::new(
            Page {
                handle: "people".into(),
                ..Default::default()
            },
            ids("sales"),
            Some(ids("contacts")),
            None,
        )
        .unwrap()
        .into(),
        _ => ComposeChart::new(
            Chart {
                handle: "headcount".into(),
                config: ChartConfig {
                    reports: vec![ChartReport::default()],
                },
                ..Default::default()
            },
            ids("hr"),
            vec![ids("contacts")],
        )
        .into(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decode_yields_every_row_once(n in 0u64..40, page_size in 1u32..10) {
        let store = InMemoryStore::new();
        for id in 1..=n {
            store.create_namespace(&namespace(id, &format!("ns{id}"))).unwrap();
        }
        let store = Arc::new(store);

        let decoder = Decoder::new(
            Arc::clone(&store),
            DecoderConfig::default().with_default_page_size(page_size),
        );
        let mut df = DecodeFilter::new();
        df.namespace(NamespaceFilter::default());
        let out = decoder.decode(&df).unwrap();

        let unique: BTreeSet<u64> = out.resource_ids.iter().copied().collect();
        prop_assert_eq!(out.resources.len() as u64, n);
        prop_assert_eq!(unique.len() as u64, n);
        prop_assert_eq!(unique, (1..=n).collect::<BTreeSet<u64>>());

        let pages = n.div_ceil(u64::from(page_size)).max(1);
        prop_assert_eq!(store.op_count(StoreOp::SearchNamespaces) as u64, pages);
    }

    #[test]
    fn resolution_ignores_sibling_order(
        order in Just((0..6).collect::<Vec<usize>>()).prop_shuffle(),
    ) {
        let store = InMemoryStore::new();
        store.create_namespace(&namespace(1, "crm")).unwrap();
        store.create_namespace(&namespace(2, "hr")).unwrap();
        store.create_module(&contacts(10, 1)).unwrap();
        store.create_module(&contacts(20, 2)).unwrap();

        let mut rr: ResourceSet = order.iter().map(|&i| node(i)).collect();
        Encoder::new(&store, EncoderConfig::default()).encode(&mut rr).unwrap();

        let tables = store.tables();
        let sales = tables.namespaces.values().find(|n| n.slug == "sales").unwrap();
        let sales_contacts = tables
            .modules
            .values()
            .find(|m| m.namespace_id == sales.id && m.handle == "contacts")
            .unwrap();

        for page in tables.pages.values() {
            if page.namespace_id == 2 {
                prop_assert_eq!(page.module_id, 20);
                prop_assert_eq!(&page.blocks[0].options["moduleID"], "20");
            } else {
                prop_assert_eq!(page.namespace_id, sales.id);
                prop_assert_eq!(page.module_id, sales_contacts.id);
            }
        }
        let chart = tables.charts.values().next().unwrap();
        prop_assert_eq!(chart.config.reports[0].module_id, 20);
        prop_assert_eq!(tables.pages.len(), 2);
    }
}
