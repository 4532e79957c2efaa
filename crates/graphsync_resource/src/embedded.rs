//! Symbolic references embedded in page block options.
//!
//! Blocks refer to modules and charts from inside their free-form options
//! map. The registry below lists, per block kind, where such references
//! live, which keys may carry them and which key receives the resolved ID.

use crate::error::{ResourceError, ResourceResult};
use crate::types::ResourceType;
use graphsync_store::{Options, PageBlock};
use serde_json::Value;

/// Where embedded references live inside block options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Directly in the options map.
    Flat,
    /// In every map of the list under the key.
    List(&'static str),
    /// In the map under `inner` of every item of the list under `list`.
    Nested {
        /// List key.
        list: &'static str,
        /// Key of the options map inside each list item.
        inner: &'static str,
    },
}

/// One known embedded reference location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedShape {
    /// Block kind this entry applies to.
    pub block_kind: &'static str,
    /// Location of the reference.
    pub shape: Shape,
    /// Accepted keys, in priority order.
    pub aliases: &'static [&'static str],
    /// Key receiving the resolved ID.
    pub resolved_key: &'static str,
    /// Kind of the referenced resource.
    pub resource_type: ResourceType,
}

const MODULE_ALIASES: &[&str] = &["module", "moduleID"];
const CHART_ALIASES: &[&str] = &["chart", "chartID"];

static REGISTRY: &[EmbeddedShape] = &[
    EmbeddedShape {
        block_kind: "RecordList",
        shape: Shape::Flat,
        aliases: MODULE_ALIASES,
        resolved_key: "moduleID",
        resource_type: ResourceType::ComposeModule,
    },
    EmbeddedShape {
        block_kind: "RecordOrganizer",
        shape: Shape::Flat,
        aliases: MODULE_ALIASES,
        resolved_key: "moduleID",
        resource_type: ResourceType::ComposeModule,
    },
    EmbeddedShape {
        block_kind: "Calendar",
        shape: Shape::Nested {
            list: "feeds",
            inner: "options",
        },
        aliases: MODULE_ALIASES,
        resolved_key: "moduleID",
        resource_type: ResourceType::ComposeModule,
    },
    EmbeddedShape {
        block_kind: "Metric",
        shape: Shape::List("metrics"),
        aliases: MODULE_ALIASES,
        resolved_key: "moduleID",
        resource_type: ResourceType::ComposeModule,
    },
    EmbeddedShape {
        block_kind: "Chart",
        shape: Shape::Flat,
        aliases: CHART_ALIASES,
        resolved_key: "chartID",
        resource_type: ResourceType::ComposeChart,
    },
];

/// Returns the registry entries for a block kind.
pub fn shapes_for(block_kind: &str) -> impl Iterator<Item = &'static EmbeddedShape> + '_ {
    REGISTRY.iter().filter(move |s| s.block_kind == block_kind)
}

/// A symbolic reference found in block options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedRef {
    /// Kind of the referenced resource.
    pub resource_type: ResourceType,
    /// The symbolic identifier.
    pub identifier: String,
}

/// Collects the embedded references of a block.
pub fn collect(block: &PageBlock) -> ResourceResult<Vec<EmbeddedRef>> {
    let mut out = Vec::new();
    for shape in shapes_for(&block.kind) {
        for map in slots(shape, &block.options)? {
            if let Some(identifier) = extract(shape, map)? {
                out.push(EmbeddedRef {
                    resource_type: shape.resource_type,
                    identifier,
                });
            }
        }
    }
    Ok(out)
}

/// Replaces every embedded reference of a block with its resolved ID.
///
/// `resolve` maps a symbolic identifier to the numeric ID of the target.
/// The resolved ID is stored as a decimal string under the resolved key and
/// the other alias keys are removed. Returns the number of rewrites.
pub fn rewrite<F, E>(block: &mut PageBlock, mut resolve: F) -> Result<usize, E>
where
    F: FnMut(ResourceType, &str) -> Result<u64, E>,
    E: From<ResourceError>,
{
    let mut rewrites = 0;
    let kind = block.kind.clone();
    for shape in shapes_for(&kind) {
        for map in slots_mut(shape, &mut block.options)? {
            let Some(identifier) = extract(shape, map)? else {
                continue;
            };
            let id = resolve(shape.resource_type, &identifier)?;
            for alias in shape.aliases {
                map.remove(*alias);
            }
            map.insert(shape.resolved_key.to_string(), Value::String(id.to_string()));
            rewrites += 1;
        }
    }
    Ok(rewrites)
}

fn malformed(shape: &EmbeddedShape, reason: String) -> ResourceError {
    ResourceError::malformed(shape.block_kind, reason)
}

/// Reads the reference under the first alias present in the map.
fn extract(shape: &EmbeddedShape, map: &Options) -> ResourceResult<Option<String>> {
    let Some((alias, value)) = shape
        .aliases
        .iter()
        .find_map(|a| map.get(*a).map(|v| (*a, v)))
    else {
        return Ok(None);
    };

    let identifier = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => {
            return Err(malformed(
                shape,
                format!("{alias} is neither a string nor a number"),
            ))
        }
    };

    if identifier.is_empty() || identifier == "0" {
        return Ok(None);
    }
    Ok(Some(identifier))
}

fn slots<'a>(shape: &EmbeddedShape, options: &'a Options) -> ResourceResult<Vec<&'a Options>> {
    match shape.shape {
        Shape::Flat => Ok(vec![options]),
        Shape::List(key) => list_items(shape, options, key),
        Shape::Nested { list, inner } => {
            let mut out = Vec::new();
            for item in list_items(shape, options, list)? {
                match item.get(inner) {
                    None | Some(Value::Null) => {}
                    Some(Value::Object(map)) => out.push(map),
                    Some(_) => {
                        return Err(malformed(shape, format!("{list}[*].{inner} is not a map")))
                    }
                }
            }
            Ok(out)
        }
    }
}

fn list_items<'a>(
    shape: &EmbeddedShape,
    options: &'a Options,
    key: &str,
) -> ResourceResult<Vec<&'a Options>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or_else(|| malformed(shape, format!("{key}[*] is not a map")))
            })
            .collect(),
        Some(_) => Err(malformed(shape, format!("{key} is not a list"))),
    }
}

fn slots_mut<'a>(
    shape: &EmbeddedShape,
    options: &'a mut Options,
) -> ResourceResult<Vec<&'a mut Options>> {
    match shape.shape {
        Shape::Flat => Ok(vec![options]),
        Shape::List(key) => list_items_mut(shape, options, key),
        Shape::Nested { list, inner } => {
            let mut out = Vec::new();
            for item in list_items_mut(shape, options, list)? {
                match item.get_mut(inner) {
                    None | Some(Value::Null) => {}
                    Some(Value::Object(map)) => out.push(map),
                    Some(_) => {
                        return Err(malformed(shape, format!("{list}[*].{inner} is not a map")))
                    }
                }
            }
            Ok(out)
        }
    }
}

fn list_items_mut<'a>(
    shape: &EmbeddedShape,
    options: &'a mut Options,
    key: &str,
) -> ResourceResult<Vec<&'a mut Options>> {
    match options.get_mut(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter_mut()
            .map(|item| {
                item.as_object_mut()
                    .ok_or_else(|| malformed(shape, format!("{key}[*] is not a map")))
            })
            .collect(),
        Some(_) => Err(malformed(shape, format!("{key} is not a list"))),
    }
}
