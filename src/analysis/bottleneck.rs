// src/analysis/bottleneck.rs

use crate::analysis::statistics::analyze_by_node;
use crate::error::{Result, SimError};
use crate::model::network::{EdgeIndex, NetworkGraph, NodeIndex};
use crate::simulation::engine::SimulationResults;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Lead-time step used to measure an edge's effect on upstream lead times.
const EDGE_STEP_DAYS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BottleneckElement {
    Node { id: String },
    Edge { from: String, to: String },
}

/// How strongly safety stock reacts to lead time at one network element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bottleneck {
    pub element: BottleneckElement,
    /// Units of extra safety stock per extra day of lead time.
    pub sensitivity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BottleneckReport {
    /// Nodes and edges, most sensitive first.
    pub rankings: Vec<Bottleneck>,
    /// The node with the steepest sensitivity.
    pub primary: Option<String>,
}

struct NodeScore {
    id: String,
    idx: NodeIndex,
    sensitivity: f64,
    upstream_lead_time: f64,
}

/// Ranks nodes and edges by marginal sensitivity
/// d(mean safety stock) / d(lead time) between consecutive scenarios.
///
/// A node scores its steepest marginal ratio. An edge is lengthened by one
/// day and scores each demand node's sensitivity times the change in that
/// node's upstream lead time, summed. Edges off every critical path score 0.
pub fn identify_bottlenecks(network: &NetworkGraph, results: &SimulationResults) -> Result<BottleneckReport> {
    if results.scenarios.len() < 2 {
        return Err(SimError::InsufficientSamples {
            required: 2,
            actual: results.scenarios.len(),
        });
    }

    let mut by_node: HashMap<String, Vec<(f64, f64)>> = HashMap::new();
    for node in analyze_by_node(results)? {
        network.node_index(&node.node_id)?;
        by_node
            .entry(node.node_id)
            .or_default()
            .push((node.summary.lead_time, node.summary.mean));
    }

    // Nodes in result order so equal sensitivities rank deterministically.
    let mut node_scores: Vec<NodeScore> = Vec::new();
    for node_id in results.node_ids() {
        let idx = network.node_index(&node_id)?;
        let mut points = by_node.remove(&node_id).unwrap_or_default();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        let steepest = points
            .windows(2)
            .map(|pair| (pair[1].1 - pair[0].1) / (pair[1].0 - pair[0].0))
            .fold(f64::NEG_INFINITY, f64::max);
        node_scores.push(NodeScore {
            upstream_lead_time: network.upstream_lead_time_at(idx),
            id: node_id,
            idx,
            sensitivity: steepest,
        });
    }

    let mut rankings: Vec<Bottleneck> = node_scores
        .iter()
        .map(|node| Bottleneck {
            element: BottleneckElement::Node { id: node.id.clone() },
            sensitivity: node.sensitivity,
        })
        .collect();

    for edge in network.edge_indices() {
        let (from, to) = network.endpoint_ids(edge);
        let stretched = |e: EdgeIndex| {
            let lead_time = network.edge_at(e).lead_time;
            if e == edge {
                lead_time + EDGE_STEP_DAYS
            } else {
                lead_time
            }
        };

        let sensitivity: f64 = node_scores
            .iter()
            .map(|node| {
                let delta = network.upstream_lead_time_with(node.idx, &stretched) - node.upstream_lead_time;
                node.sensitivity * delta / EDGE_STEP_DAYS
            })
            .sum();
        rankings.push(Bottleneck {
            element: BottleneckElement::Edge {
                from: from.to_string(),
                to: to.to_string(),
            },
            sensitivity,
        });
    }

    // Stable sort keeps nodes ahead of edges on ties.
    rankings.sort_by(|a, b| b.sensitivity.total_cmp(&a.sensitivity));

    let primary = node_scores
        .iter()
        .fold(None::<&NodeScore>, |best, candidate| match best {
            Some(b) if b.sensitivity >= candidate.sensitivity => Some(b),
            _ => Some(candidate),
        })
        .map(|node| node.id.clone());

    debug!(?primary, elements = rankings.len(), "Ranked bottlenecks");
    Ok(BottleneckReport { rankings, primary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::Node;
    use crate::simulation::engine::{ScenarioSamples, TrialResult};

    fn network() -> NetworkGraph {
        let mut network = NetworkGraph::new();
        for id in ["S1", "DC1", "R1", "R2"] {
            network.add_node(Node::new(id, "site")).unwrap();
        }
        network.add_edge("S1", "DC1", 3.0, None).unwrap();
        network.add_edge("DC1", "R1", 1.0, None).unwrap();
        network.add_edge("DC1", "R2", 2.0, None).unwrap();
        network
    }

    /// `points` holds (lead time, [(node, safety stock)]).
    fn results(points: &[(f64, &[(&str, f64)])]) -> SimulationResults {
        let scenarios = points
            .iter()
            .map(|&(lead_time, rows)| ScenarioSamples {
                lead_time,
                trials: rows
                    .iter()
                    .map(|&(node_id, safety_stock)| TrialResult {
                        node_id: node_id.to_string(),
                        lead_time,
                        trial: 0,
                        effective_lead_time: lead_time,
                        disrupted: false,
                        safety_stock,
                    })
                    .collect(),
            })
            .collect();
        SimulationResults {
            seed: 0,
            iterations: 1,
            coverage_days: 7.0,
            simulation_days: 30,
            scenarios,
        }
    }

    #[test]
    fn test_rankings() {
        // Given out of lead-time order on purpose.
        let r = results(&[
            (3.0, &[("R1", 300.0), ("R2", 600.0)]),
            (1.0, &[("R1", 100.0), ("R2", 100.0)]),
            (2.0, &[("R1", 200.0), ("R2", 150.0)]),
        ]);
        let report = identify_bottlenecks(&network(), &r).unwrap();

        // R2 peaks at 450 per day between lead times 2 and 3.
        assert_eq!(report.primary.as_deref(), Some("R2"));
        assert_eq!(
            report.rankings[0].element,
            BottleneckElement::Edge {
                from: "S1".into(),
                to: "DC1".into()
            }
        );
        assert_eq!(report.rankings[0].sensitivity, 550.0);

        let r1_edge = report
            .rankings
            .iter()
            .find(|b| b.element == BottleneckElement::Edge { from: "DC1".into(), to: "R1".into() })
            .unwrap();
        assert_eq!(r1_edge.sensitivity, 100.0);
    }

    #[test]
    fn test_only_the_slowest_supplier_edge_matters() {
        let mut network = NetworkGraph::new();
        for id in ["S1", "S2", "R1"] {
            network.add_node(Node::new(id, "site")).unwrap();
        }
        network.add_edge("S1", "R1", 10.0, None).unwrap();
        network.add_edge("S2", "R1", 1.0, None).unwrap();

        let r = results(&[(1.0, &[("R1", 100.0)]), (2.0, &[("R1", 300.0)])]);
        let report = identify_bottlenecks(&network, &r).unwrap();

        let position = |from: &str| {
            report
                .rankings
                .iter()
                .position(|b| b.element == BottleneckElement::Edge { from: from.into(), to: "R1".into() })
                .unwrap()
        };
        let slow = position("S1");
        let fast = position("S2");
        assert!(slow < fast);
        assert_eq!(report.rankings[slow].sensitivity, 200.0);
        assert_eq!(report.rankings[fast].sensitivity, 0.0);
    }

    #[test]
    fn test_needs_two_scenarios_and_known_nodes() {
        let single = results(&[(1.0, &[("R1", 100.0)])]);
        assert!(matches!(
            identify_bottlenecks(&network(), &single),
            Err(SimError::InsufficientSamples { required: 2, actual: 1 })
        ));

        let stranger = results(&[(1.0, &[("X", 1.0)]), (2.0, &[("X", 2.0)])]);
        assert!(matches!(
            identify_bottlenecks(&network(), &stranger),
            Err(SimError::UnknownNode(_))
        ));
    }
}
