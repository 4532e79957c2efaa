//! Conflict merging.
//!
//! Every `merge_*` function takes two rows of the same kind and returns a
//! third: fields set on `a` win, fields unset on `a` are filled from `b`.
//! Unset means an empty string, a zero ID, a null value, an empty
//! collection or an absent time. Booleans and numeric settings always come
//! from `a`.

use graphsync_resource::MergeStrategy;
use graphsync_store::{
    Chart, ChartConfig, Module, ModuleField, Namespace, Options, Page, Record, RecordValue,
    RowTimestamps,
};
use serde_json::Value;

/// Outcome of applying a conflict policy to an existing row.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// Leave the existing row untouched.
    Keep,
    /// Write this row.
    Write(T),
}

/// Applies a conflict policy to an existing and an incoming row.
pub fn resolve<T>(
    strategy: MergeStrategy,
    existing: &T,
    incoming: T,
    merge: fn(&T, &T) -> T,
) -> Resolution<T> {
    match strategy {
        MergeStrategy::Replace => Resolution::Write(incoming),
        MergeStrategy::Skip => Resolution::Keep,
        MergeStrategy::MergeLeft => Resolution::Write(merge(existing, &incoming)),
        MergeStrategy::MergeRight => Resolution::Write(merge(&incoming, existing)),
    }
}

fn text(a: &str, b: &str) -> String {
    let v = if a.is_empty() { b } else { a };
    v.to_string()
}

fn id(a: u64, b: u64) -> u64 {
    if a == 0 {
        b
    } else {
        a
    }
}

fn value(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => Value::Object(options(a, b)),
        (Value::Null, b) => b.clone(),
        (a, _) => a.clone(),
    }
}

fn options(a: &Options, b: &Options) -> Options {
    let mut out = a.clone();
    for (k, v) in b {
        out.entry(k.clone()).or_insert_with(|| v.clone());
    }
    out
}

fn list<T: Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let v = if a.is_empty() { b } else { a };
    v.to_vec()
}

fn timestamps(a: &RowTimestamps, b: &RowTimestamps) -> RowTimestamps {
    RowTimestamps {
        created_at: a.created_at.or(b.created_at),
        updated_at: a.updated_at.or(b.updated_at),
        deleted_at: a.deleted_at.or(b.deleted_at),
    }
}

/// Merges two namespaces.
pub fn merge_namespace(a: &Namespace, b: &Namespace) -> Namespace {
    Namespace {
        id: id(a.id, b.id),
        slug: text(&a.slug, &b.slug),
        name: text(&a.name, &b.name),
        enabled: a.enabled,
        meta: value(&a.meta, &b.meta),
        timestamps: timestamps(&a.timestamps, &b.timestamps),
    }
}

/// Merges two modules; fields are matched by name.
pub fn merge_module(a: &Module, b: &Module) -> Module {
    let mut fields: Vec<ModuleField> = a
        .fields
        .iter()
        .map(|fa| match b.field(&fa.name) {
            Some(fb) => merge_module_field(fa, fb),
            None => fa.clone(),
        })
        .collect();
    fields.extend(
        b.fields
            .iter()
            .filter(|fb| a.field(&fb.name).is_none())
            .cloned(),
    );

    Module {
        id: id(a.id, b.id),
        namespace_id: id(a.namespace_id, b.namespace_id),
        handle: text(&a.handle, &b.handle),
        name: text(&a.name, &b.name),
        meta: value(&a.meta, &b.meta),
        fields,
        timestamps: timestamps(&a.timestamps, &b.timestamps),
    }
}

/// Merges two module fields.
pub fn merge_module_field(a: &ModuleField, b: &ModuleField) -> ModuleField {
    ModuleField {
        id: id(a.id, b.id),
        module_id: id(a.module_id, b.module_id),
        kind: text(&a.kind, &b.kind),
        name: text(&a.name, &b.name),
        label: text(&a.label, &b.label),
        options: options(&a.options, &b.options),
        required: a.required,
        multi: a.multi,
        place: a.place,
    }
}

/// Merges two records; values are matched by name and place.
pub fn merge_record(a: &Record, b: &Record) -> Record {
    let mut values: Vec<RecordValue> = a.values.clone();
    values.extend(
        b.values
            .iter()
            .filter(|vb| {
                !a.values
                    .iter()
                    .any(|va| va.name == vb.name && va.place == vb.place)
            })
            .cloned(),
    );

    Record {
        id: id(a.id, b.id),
        module_id: id(a.module_id, b.module_id),
        namespace_id: id(a.namespace_id, b.namespace_id),
        values,
        timestamps: timestamps(&a.timestamps, &b.timestamps),
        created_by: id(a.created_by, b.created_by),
        updated_by: id(a.updated_by, b.updated_by),
        deleted_by: id(a.deleted_by, b.deleted_by),
        owned_by: id(a.owned_by, b.owned_by),
    }
}

/// Merges two pages; blocks are taken as a whole.
pub fn merge_page(a: &Page, b: &Page) -> Page {
    Page {
        id: id(a.id, b.id),
        namespace_id: id(a.namespace_id, b.namespace_id),
        module_id: id(a.module_id, b.module_id),
        self_id: id(a.self_id, b.self_id),
        handle: text(&a.handle, &b.handle),
        title: text(&a.title, &b.title),
        description: text(&a.description, &b.description),
        visible: a.visible,
        weight: a.weight,
        blocks: list(&a.blocks, &b.blocks),
        timestamps: timestamps(&a.timestamps, &b.timestamps),
    }
}

/// Merges two charts; reports are taken as a whole.
pub fn merge_chart(a: &Chart, b: &Chart) -> Chart {
    Chart {
        id: id(a.id, b.id),
        namespace_id: id(a.namespace_id, b.namespace_id),
        handle: text(&a.handle, &b.handle),
        name: text(&a.name, &b.name),
        config: ChartConfig {
            reports: list(&a.config.reports, &b.config.reports),
        },
        timestamps: timestamps(&a.timestamps, &b.timestamps),
    }
}
