use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use thiserror::Error;

/// Static declaration of one stage: what it reads and what it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec<S, A> {
    pub stage: S,
    pub inputs: Vec<A>,
    pub outputs: Vec<A>,
}

impl<S, A> StageSpec<S, A> {
    pub fn new(stage: S, inputs: Vec<A>, outputs: Vec<A>) -> Self {
        Self {
            stage,
            inputs,
            outputs,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("stage '{0}' declared twice")]
    DuplicateStage(String),
    #[error("artifact '{artifact}' produced by both '{first}' and '{second}'")]
    DuplicateProducer {
        artifact: String,
        first: String,
        second: String,
    },
    #[error("stage '{stage}' reads artifact '{artifact}' that nothing produces")]
    MissingProducer { stage: String, artifact: String },
    #[error("stage graph has a cycle through: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

/// Validated, topologically ordered stage graph.
///
/// Ordering is deterministic: among ready stages the smallest (by `Ord`)
/// runs first.
#[derive(Debug, Clone)]
pub struct StageGraph<S, A> {
    specs: BTreeMap<S, StageSpec<S, A>>,
    order: Vec<S>,
}

impl<S, A> StageGraph<S, A>
where
    S: Ord + Clone + Display,
    A: Ord + Clone + Display,
{
    /// Validate `specs` against the externally supplied `sources` and order them.
    pub fn build(sources: &[A], specs: Vec<StageSpec<S, A>>) -> Result<Self, GraphError> {
        let mut producers: BTreeMap<A, Option<S>> = BTreeMap::new();
        for source in sources {
            producers.insert(source.clone(), None);
        }

        let mut by_stage: BTreeMap<S, StageSpec<S, A>> = BTreeMap::new();
        for spec in specs {
            if by_stage.contains_key(&spec.stage) {
                return Err(GraphError::DuplicateStage(spec.stage.to_string()));
            }
            for output in &spec.outputs {
                if let Some(existing) = producers.get(output) {
                    let first = existing
                        .as_ref()
                        .map(|stage| stage.to_string())
                        .unwrap_or_else(|| "<source>".to_string());
                    return Err(GraphError::DuplicateProducer {
                        artifact: output.to_string(),
                        first,
                        second: spec.stage.to_string(),
                    });
                }
                producers.insert(output.clone(), Some(spec.stage.clone()));
            }
            by_stage.insert(spec.stage.clone(), spec);
        }

        let mut edges: BTreeMap<S, BTreeSet<S>> = BTreeMap::new();
        for spec in by_stage.values() {
            edges.entry(spec.stage.clone()).or_default();
            for input in &spec.inputs {
                match producers.get(input) {
                    None => {
                        return Err(GraphError::MissingProducer {
                            stage: spec.stage.to_string(),
                            artifact: input.to_string(),
                        });
                    }
                    Some(None) => {}
                    Some(Some(producer)) => {
                        edges
                            .entry(producer.clone())
                            .or_default()
                            .insert(spec.stage.clone());
                    }
                }
            }
        }

        let order = toposort(&edges).map_err(|nodes| {
            GraphError::Cycle(nodes.iter().map(|node| node.to_string()).collect())
        })?;

        Ok(Self {
            specs: by_stage,
            order,
        })
    }

    pub fn order(&self) -> &[S] {
        &self.order
    }

    pub fn spec(&self, stage: &S) -> Option<&StageSpec<S, A>> {
        self.specs.get(stage)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn toposort<N: Ord + Clone>(graph: &BTreeMap<N, BTreeSet<N>>) -> Result<Vec<N>, Vec<N>> {
    let mut indegree: BTreeMap<N, usize> = BTreeMap::new();

    for (node, targets) in graph {
        indegree.entry(node.clone()).or_insert(0);
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<N> = indegree
        .iter()
        .filter_map(|(node, count)| (*count == 0).then(|| node.clone()))
        .collect();

    let mut order = Vec::with_capacity(indegree.len());

    while let Some(node) = ready.pop_first() {
        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
        order.push(node);
    }

    if order.len() == indegree.len() {
        Ok(order)
    } else {
        Err(indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then_some(node))
            .collect())
    }
}
