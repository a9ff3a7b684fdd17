//! Forward/reverse adjacency over a flat feature set plus a topological
//! ordering that tolerates cycles, grounded on the teacher's WBS-to-graph
//! split but with no WBS step: features here arrive already flat.

use crate::{Dependency, FeatureId};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("cycle detected involving features: {0:?}")]
    CycleDetected(Vec<FeatureId>),
}

/// Adjacency maps plus a topological order over a fixed feature-id set.
/// Dependencies naming a feature id outside that set are silently
/// dropped rather than rejected, since the engine's contract is total.
#[derive(Debug, Default)]
pub struct Graph<'a> {
    pub forward: HashMap<FeatureId, Vec<&'a Dependency>>,
    pub reverse: HashMap<FeatureId, Vec<&'a Dependency>>,
    pub topo_order: Vec<FeatureId>,
}

impl<'a> Graph<'a> {
    /// Builds adjacency and a best-effort topological order: start from
    /// features with no incoming edges (roots) and walk forward through
    /// the graph depth-first; any feature left unvisited afterward — a
    /// cyclic or otherwise unreachable one — is appended at the end in
    /// input order, so every feature still appears exactly once.
    #[must_use]
    pub fn build(feature_ids: &[FeatureId], dependencies: &'a [Dependency]) -> Self {
        let (forward, reverse) = adjacency(feature_ids, dependencies);
        let topo_order = best_effort_topo_order(feature_ids, &forward);
        Self {
            forward,
            reverse,
            topo_order,
        }
    }

    /// Like [`Graph::build`], but rejects a cyclic dependency set
    /// outright instead of tolerating it. Offered alongside the tolerant
    /// constructor for callers that want to validate input before
    /// committing to a schedule recalculation.
    pub fn build_strict(
        feature_ids: &[FeatureId],
        dependencies: &'a [Dependency],
    ) -> Result<Self, GraphError> {
        let (forward, reverse) = adjacency(feature_ids, dependencies);
        if let Some(cyclic) = kahn_cycle_check(feature_ids, &forward) {
            return Err(GraphError::CycleDetected(cyclic));
        }
        let topo_order = best_effort_topo_order(feature_ids, &forward);
        Ok(Self {
            forward,
            reverse,
            topo_order,
        })
    }
}

fn adjacency<'a>(
    feature_ids: &[FeatureId],
    dependencies: &'a [Dependency],
) -> (
    HashMap<FeatureId, Vec<&'a Dependency>>,
    HashMap<FeatureId, Vec<&'a Dependency>>,
) {
    let known: HashSet<&FeatureId> = feature_ids.iter().collect();
    let mut forward: HashMap<FeatureId, Vec<&Dependency>> = HashMap::new();
    let mut reverse: HashMap<FeatureId, Vec<&Dependency>> = HashMap::new();
    for id in feature_ids {
        forward.entry(id.clone()).or_default();
        reverse.entry(id.clone()).or_default();
    }
    for dep in dependencies {
        if !known.contains(&dep.source_id) || !known.contains(&dep.target_id) {
            continue;
        }
        forward.entry(dep.source_id.clone()).or_default().push(dep);
        reverse.entry(dep.target_id.clone()).or_default().push(dep);
    }
    (forward, reverse)
}

fn best_effort_topo_order(
    feature_ids: &[FeatureId],
    forward: &HashMap<FeatureId, Vec<&Dependency>>,
) -> Vec<FeatureId> {
    let in_degree = in_degrees(feature_ids, forward);
    let mut visited: HashSet<FeatureId> = HashSet::new();
    let mut order = Vec::with_capacity(feature_ids.len());

    for id in feature_ids {
        if in_degree[id] == 0 {
            visit_depth_first(id, forward, &mut visited, &mut order);
        }
    }
    for id in feature_ids {
        if !visited.contains(id) {
            visit_depth_first(id, forward, &mut visited, &mut order);
        }
    }
    order
}

fn visit_depth_first(
    start: &FeatureId,
    forward: &HashMap<FeatureId, Vec<&Dependency>>,
    visited: &mut HashSet<FeatureId>,
    order: &mut Vec<FeatureId>,
) {
    let mut stack = vec![start.clone()];
    while let Some(id) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        order.push(id.clone());
        if let Some(edges) = forward.get(&id) {
            for dep in edges.iter().rev() {
                if !visited.contains(&dep.target_id) {
                    stack.push(dep.target_id.clone());
                }
            }
        }
    }
}

fn in_degrees(
    feature_ids: &[FeatureId],
    forward: &HashMap<FeatureId, Vec<&Dependency>>,
) -> HashMap<FeatureId, usize> {
    let mut in_degree: HashMap<FeatureId, usize> =
        feature_ids.iter().map(|id| (id.clone(), 0)).collect();
    for edges in forward.values() {
        for dep in edges {
            *in_degree.get_mut(&dep.target_id).unwrap() += 1;
        }
    }
    in_degree
}

/// Kahn's algorithm: returns the features left over once no more
/// zero-in-degree nodes remain to process, i.e. the cyclic remainder, or
/// `None` if every feature was processed.
fn kahn_cycle_check(
    feature_ids: &[FeatureId],
    forward: &HashMap<FeatureId, Vec<&Dependency>>,
) -> Option<Vec<FeatureId>> {
    let mut in_degree = in_degrees(feature_ids, forward);
    let mut queue: VecDeque<FeatureId> = feature_ids
        .iter()
        .filter(|id| in_degree[*id] == 0)
        .cloned()
        .collect();
    let mut processed: HashSet<FeatureId> = HashSet::new();

    while let Some(id) = queue.pop_front() {
        processed.insert(id.clone());
        if let Some(edges) = forward.get(&id) {
            for dep in edges {
                let degree = in_degree.get_mut(&dep.target_id).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dep.target_id.clone());
                }
            }
        }
    }

    if processed.len() == feature_ids.len() {
        None
    } else {
        Some(
            feature_ids
                .iter()
                .filter(|id| !processed.contains(*id))
                .cloned()
                .collect(),
        )
    }
}
