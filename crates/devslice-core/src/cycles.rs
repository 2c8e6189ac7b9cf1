//! Cycle detection over the capacity reference graph.

use crate::graph::ReferenceGraph;
use devslice_schema::{ErrorList, FieldError, FieldPath};
use std::fmt;

/// A cycle in reference direction, with the first device repeated at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath(Vec<String>);

impl CyclePath {
    /// Distinct devices on the cycle, starting at the device where it was found.
    pub fn nodes(&self) -> &[String] {
        &self.0[..self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes().iter().any(|n| n == name)
    }

    /// The field error reported for this cycle, attributed to `path`.
    pub fn to_field_error(&self, path: &FieldPath) -> FieldError {
        FieldError::invalid(
            path,
            "",
            format!("`consumesCapacityFrom` references can not form cycle. Found cycle: {self}"),
        )
    }
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" -> "))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// One entry per device on the current search path, with the index of the
/// next outgoing edge to follow.
struct Frame {
    node: usize,
    edge: usize,
}

/// Depth-first search from every unvisited device in declaration order.
///
/// A back edge to a device still on the search path closes a cycle. Finished
/// devices are never revisited, so each cycle is reported once. The search
/// path lives on the heap, so chain length does not bound stack depth.
pub fn find_cycles(graph: &ReferenceGraph) -> Vec<CyclePath> {
    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut path: Vec<Frame> = Vec::new();
    let mut cycles = Vec::new();

    for root in 0..graph.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::InProgress;
        path.push(Frame { node: root, edge: 0 });

        while let Some(frame) = path.last_mut() {
            let node = frame.node;
            let Some(&next) = graph.successors(node).get(frame.edge) else {
                marks[node] = Mark::Done;
                path.pop();
                continue;
            };
            frame.edge += 1;

            match marks[next] {
                Mark::Unvisited => {
                    marks[next] = Mark::InProgress;
                    path.push(Frame { node: next, edge: 0 });
                }
                Mark::InProgress => {
                    if let Some(start) = path.iter().position(|f| f.node == next) {
                        let names = path[start..]
                            .iter()
                            .map(|f| f.node)
                            .chain(std::iter::once(next))
                            .map(|n| graph.name(n).to_owned())
                            .collect();
                        cycles.push(CyclePath(names));
                    }
                }
                Mark::Done => {}
            }
        }
    }
    cycles
}

/// One error per cycle, all attributed to `path`.
pub fn cycle_errors(cycles: &[CyclePath], path: &FieldPath) -> ErrorList {
    cycles.iter().map(|c| c.to_field_error(path)).collect()
}
