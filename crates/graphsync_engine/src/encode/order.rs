//! Dependency ordering of resource nodes.
//!
//! Kinds are ordered by rank so every node follows the kinds it can
//! reference. Pages may also reference each other through their parent;
//! those are ordered parent first. Nodes keep their relative input order
//! otherwise, which keeps encoding deterministic.

use crate::error::{EngineError, EngineResult};
use graphsync_resource::{Ref, Resource, ResourceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Visiting,
    Done,
}

/// Returns the encode order of `nodes` as indexes into it.
///
/// Fails when page parents form a cycle.
pub(crate) fn dependency_order(nodes: &[Resource]) -> EngineResult<Vec<usize>> {
    let mut by_rank: Vec<usize> = (0..nodes.len()).collect();
    by_rank.sort_by_key(|&i| nodes[i].resource_type().rank());

    let mut marks = vec![Mark::New; nodes.len()];
    let mut out = Vec::with_capacity(nodes.len());
    for i in by_rank {
        match nodes[i] {
            Resource::Page(_) => visit(nodes, i, &mut marks, &mut out)?,
            _ => out.push(i),
        }
    }
    Ok(out)
}

fn visit(
    nodes: &[Resource],
    i: usize,
    marks: &mut [Mark],
    out: &mut Vec<usize>,
) -> EngineResult<()> {
    match marks[i] {
        Mark::Done => return Ok(()),
        Mark::Visiting => {
            return Err(EngineError::CyclicReference {
                resource_type: ResourceType::ComposePage,
                identifiers: nodes[i].identifiers().clone(),
            })
        }
        Mark::New => {}
    }

    marks[i] = Mark::Visiting;
    if let Resource::Page(page) = &nodes[i] {
        if let Some(parent) = page.ref_parent.as_ref().and_then(|r| parent_of(nodes, r)) {
            visit(nodes, parent, marks, out)?;
        }
    }
    marks[i] = Mark::Done;
    out.push(i);
    Ok(())
}

/// Finds the page node a parent reference points at, honouring its
/// namespace constraint.
fn parent_of(nodes: &[Resource], parent: &Ref) -> Option<usize> {
    let ns = parent.constraint_of(ResourceType::ComposeNamespace);
    nodes.iter().position(|n| match n {
        Resource::Page(p) => {
            n.identifiers().has_any(&parent.identifiers)
                && ns.is_none_or(|ns| p.ref_ns.identifiers.has_any(&ns.identifiers))
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_resource::{ComposeModule, ComposeNamespace, ComposePage, Identifiers};
    use graphsync_store::{Module, Namespace, Page};

    fn ns() -> Resource {
        ComposeNamespace::new(Namespace {
            slug: "crm".into(),
            ..Default::default()
        })
        .into()
    }

    fn module(handle: &str) -> Resource {
        ComposeModule::new(
            Module {
                handle: handle.into(),
                ..Default::default()
            },
            Identifiers::from_values(["crm"]),
        )
        .into()
    }

    fn page(handle: &str, parent: Option<&str>) -> Resource {
        ComposePage::new(
            Page {
                handle: handle.into(),
                ..Default::default()
            },
            Identifiers::from_values(["crm"]),
            None,
            parent.map(|p| Identifiers::from_values([p])),
        )
        .unwrap()
        .into()
    }

    fn handles(nodes: &[Resource], order: &[usize]) -> Vec<String> {
        order
            .iter()
            .map(|&i| nodes[i].identifiers().first().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn kinds_follow_rank_and_keep_input_order() {
        let nodes = vec![module("b"), page("p", None), ns(), module("a")];
        let order = dependency_order(&nodes).unwrap();
        assert_eq!(handles(&nodes, &order), vec!["crm", "b", "a", "p"]);
    }

    #[test]
    fn parents_come_first() {
        let nodes = vec![
            page("leaf", Some("mid")),
            page("mid", Some("root")),
            page("root", None),
        ];
        let order = dependency_order(&nodes).unwrap();
        assert_eq!(handles(&nodes, &order), vec!["root", "mid", "leaf"]);
    }

    #[test]
    fn parent_outside_the_set_is_left_to_the_store() {
        let nodes = vec![page("child", Some("elsewhere"))];
        assert_eq!(dependency_order(&nodes).unwrap(), vec![0]);
    }

    #[test]
    fn cycles_are_rejected() {
        let nodes = vec![page("a", Some("b")), page("b", Some("a"))];
        let err = dependency_order(&nodes).unwrap_err();
        assert!(matches!(err, EngineError::CyclicReference { .. }));

        let own = vec![page("self", Some("self"))];
        assert!(dependency_order(&own).is_err());
    }
}
