use crate::identifier::Identifiers;
use crate::reference::Ref;
use crate::resource::{node_base, ResourceBase};
use crate::stamps::Timestamps;
use crate::types::ResourceType;
use graphsync_store::Chart;

/// A chart node.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeChart {
    pub(crate) base: ResourceBase,
    /// The chart row.
    pub res: Chart,
    /// Owning namespace.
    pub ref_ns: Ref,
    /// Module of each report, by report position; scoped by the namespace.
    pub ref_mods: Vec<Ref>,
}

impl ComposeChart {
    /// Wraps a chart row; `report_modules[i]` names the module of report `i`.
    pub fn new(res: Chart, namespace: Identifiers, report_modules: Vec<Identifiers>) -> Self {
        let mut base = ResourceBase::new(Identifiers::for_row(&res.handle, &res.name, res.id));
        base.timestamps = Timestamps::from_row(&res.timestamps);
        let ref_ns = Ref::new(ResourceType::ComposeNamespace, namespace);
        let ref_mods = report_modules
            .into_iter()
            .map(|ii| Ref::new(ResourceType::ComposeModule, ii).constraint(&ref_ns))
            .collect();
        Self {
            base,
            res,
            ref_ns,
            ref_mods,
        }
    }

    /// Wraps a stored chart row, referencing namespace and modules by ID.
    pub fn from_store(res: Chart) -> Self {
        let ns = Identifiers::for_row("", "", res.namespace_id);
        let mods = res
            .config
            .reports
            .iter()
            .map(|r| Identifiers::for_row("", "", r.module_id))
            .collect();
        Self::new(res, ns, mods)
    }
}

node_base!(ComposeChart);

#[cfg(test)]
mod tests {
    use super::*;
    use graphsync_store::{ChartConfig, ChartReport};

    #[test]
    fn report_modules_are_scoped_by_namespace() {
        let chart = ComposeChart::from_store(Chart {
            id: 20,
            namespace_id: 3,
            handle: "pipeline".into(),
            config: ChartConfig {
                reports: vec![
                    ChartReport {
                        module_id: 9,
                        ..Default::default()
                    },
                    ChartReport {
                        module_id: 10,
                        ..Default::default()
                    },
                ],
            },
            ..Default::default()
        });

        assert_eq!(chart.ref_mods.len(), 2);
        assert_eq!(chart.ref_mods[1].identifiers.to_string(), "{10}");
        let c = chart.ref_mods[0]
            .constraint_of(ResourceType::ComposeNamespace)
            .unwrap();
        assert_eq!(c.identifiers.to_string(), "{3}");
    }
}
