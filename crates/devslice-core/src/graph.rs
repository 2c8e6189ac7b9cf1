//! Device-to-device `consumesCapacityFrom` reference graph.
//!
//! Only device edges are kept: counter-set references terminate at counter
//! sets, which never point back, so they cannot take part in a cycle.

use devslice_schema::{Device, ResolvedDevice};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// A device that may draw capacity from other devices by name.
pub trait CapacityConsumer {
    fn consumer_name(&self) -> &str;

    /// Referenced device names, in document order.
    fn capacity_sources(&self) -> Vec<&str>;
}

impl CapacityConsumer for Device {
    fn consumer_name(&self) -> &str {
        &self.name
    }

    fn capacity_sources(&self) -> Vec<&str> {
        self.body()
            .map(|body| {
                body.consumes_capacity_from
                    .iter()
                    .map(|r| r.name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl CapacityConsumer for ResolvedDevice {
    fn consumer_name(&self) -> &str {
        &self.name
    }

    fn capacity_sources(&self) -> Vec<&str> {
        self.content
            .as_ref()
            .map(|c| c.consumes_capacity_from.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Adjacency over declared devices, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceGraph {
    nodes: Vec<String>,
    edges: Vec<Vec<usize>>,
}

impl ReferenceGraph {
    /// The first device with a given name defines its node; later duplicates
    /// are ignored. References to undeclared names produce no edge.
    pub fn build<D: CapacityConsumer>(devices: &[D]) -> Self {
        let mut index: BTreeMap<&str, usize> = BTreeMap::new();
        let mut owners = Vec::new();
        for device in devices {
            if let Entry::Vacant(slot) = index.entry(device.consumer_name()) {
                slot.insert(owners.len());
                owners.push(device);
            }
        }

        let edges = owners
            .iter()
            .map(|device| {
                device
                    .capacity_sources()
                    .into_iter()
                    .filter_map(|target| index.get(target).copied())
                    .collect()
            })
            .collect();

        Self {
            nodes: owners
                .iter()
                .map(|d| d.consumer_name().to_owned())
                .collect(),
            edges,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node names in declaration order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn name(&self, node: usize) -> &str {
        &self.nodes[node]
    }

    /// Outgoing edges of a node, in reference order.
    pub fn successors(&self, node: usize) -> &[usize] {
        &self.edges[node]
    }

    /// Outgoing edges by name.
    pub fn targets(&self, name: &str) -> Option<Vec<&str>> {
        let node = self.nodes.iter().position(|n| n == name)?;
        Some(
            self.edges[node]
                .iter()
                .map(|&target| self.nodes[target].as_str())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devslice_schema::{BasicDevice, CompositeDevice, DeviceRef, ResolvedDeviceContent};

    fn consumer(name: &str, sources: &[&str]) -> Device {
        Device::composite(
            name,
            CompositeDevice {
                consumes_capacity_from: sources.iter().map(|s| DeviceRef::new(*s)).collect(),
                ..CompositeDevice::default()
            },
        )
    }

    #[test]
    fn edges_follow_reference_order() {
        let devices = vec![
            consumer("a", &["c", "b"]),
            consumer("b", &[]),
            consumer("c", &[]),
        ];
        let graph = ReferenceGraph::build(&devices);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.nodes(), &["a", "b", "c"]);
        assert_eq!(graph.targets("a").unwrap(), vec!["c", "b"]);
        assert_eq!(graph.successors(0), &[2, 1]);
    }

    #[test]
    fn unknown_targets_are_skipped() {
        let devices = vec![consumer("a", &["ghost", "b"]), consumer("b", &[])];
        let graph = ReferenceGraph::build(&devices);
        assert_eq!(graph.targets("a").unwrap(), vec!["b"]);
        assert!(graph.targets("ghost").is_none());
    }

    #[test]
    fn first_duplicate_wins() {
        let devices = vec![
            consumer("a", &["b"]),
            consumer("b", &[]),
            consumer("a", &["a"]),
        ];
        let graph = ReferenceGraph::build(&devices);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.targets("a").unwrap(), vec!["b"]);
    }

    #[test]
    fn basic_devices_have_no_edges() {
        let devices = vec![Device::basic("a", BasicDevice::default())];
        let graph = ReferenceGraph::build(&devices);
        assert_eq!(graph.targets("a").unwrap(), Vec::<&str>::new());
    }

    #[test]
    fn builds_from_resolved_devices() {
        let devices = vec![
            ResolvedDevice {
                name: "a".to_owned(),
                content: Some(ResolvedDeviceContent {
                    consumes_capacity_from: vec!["b".to_owned()],
                    ..ResolvedDeviceContent::default()
                }),
            },
            ResolvedDevice {
                name: "b".to_owned(),
                content: None,
            },
        ];
        let graph = ReferenceGraph::build(&devices);
        assert_eq!(graph.targets("a").unwrap(), vec!["b"]);
        assert_eq!(graph.targets("b").unwrap(), Vec::<&str>::new());
    }
}
