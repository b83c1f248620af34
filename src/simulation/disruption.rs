// src/simulation/disruption.rs

use crate::error::{Result, SimError};
use crate::model::network::{Direction, NetworkGraph, NodeIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What a disruption slows down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisruptionTarget {
    /// The node and everything it supplies.
    Node { id: String },
    /// The edge's destination and everything it supplies.
    Edge { from: String, to: String },
}

/// When a disruption is in effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisruptionTrigger {
    /// Every trial.
    Always,
    /// Only the listed trial indices (deterministic schedule).
    Trials(Vec<usize>),
    /// Each trial independently, with this probability.
    Probability(f64),
}

/// Multiplies the effective lead time of the target and of every node
/// downstream of it by `factor` whenever the trigger fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disruption {
    pub target: DisruptionTarget,
    pub factor: f64,
    pub trigger: DisruptionTrigger,
}

impl Disruption {
    pub fn node(id: impl Into<String>, factor: f64, trigger: DisruptionTrigger) -> Self {
        Self {
            target: DisruptionTarget::Node { id: id.into() },
            factor,
            trigger,
        }
    }

    pub fn edge(from: impl Into<String>, to: impl Into<String>, factor: f64, trigger: DisruptionTrigger) -> Self {
        Self {
            target: DisruptionTarget::Edge {
                from: from.into(),
                to: to.into(),
            },
            factor,
            trigger,
        }
    }

    /// Checks the numeric parameters that do not depend on a network.
    pub fn validate(&self) -> Result<()> {
        if !(self.factor.is_finite() && self.factor > 1.0) {
            return Err(SimError::invalid(format!(
                "disruption factor must be greater than 1, got {}",
                self.factor
            )));
        }
        if let DisruptionTrigger::Probability(p) = self.trigger {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::invalid(format!(
                    "disruption probability must be between 0 and 1, got {p}"
                )));
            }
        }
        Ok(())
    }

    /// Binds the target to `network`: the disruption reaches the target node
    /// (the edge's destination for an edge target) and everything downstream.
    pub(crate) fn resolve(&self, network: &NetworkGraph) -> Result<ResolvedDisruption> {
        self.validate()?;

        let origin = match &self.target {
            DisruptionTarget::Node { id } => network.node_index(id)?,
            DisruptionTarget::Edge { from, to } => {
                let from_idx = network.node_index(from)?;
                let to_idx = network.node_index(to)?;
                if network.edge_between(from_idx, to_idx).is_none() {
                    return Err(SimError::invalid(format!(
                        "cannot disrupt missing edge {from} -> {to}"
                    )));
                }
                to_idx
            }
        };

        let mut reach = network.reachable(origin, Direction::Downstream);
        reach.push(origin);

        Ok(ResolvedDisruption {
            reach,
            factor: self.factor,
            trigger: self.trigger.clone(),
        })
    }
}

/// A disruption bound to a specific network.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedDisruption {
    /// Nodes whose lead time the disruption stretches.
    reach: Vec<NodeIndex>,
    factor: f64,
    trigger: DisruptionTrigger,
}

impl ResolvedDisruption {
    /// Decides whether the disruption hits `trial`. Only probabilistic
    /// triggers consume randomness.
    pub(crate) fn is_active<R: Rng + ?Sized>(&self, trial: usize, rng: &mut R) -> bool {
        match &self.trigger {
            DisruptionTrigger::Always => true,
            DisruptionTrigger::Trials(trials) => trials.contains(&trial),
            DisruptionTrigger::Probability(p) => rng.gen_bool(*p),
        }
    }

    pub(crate) fn reaches(&self, node: NodeIndex) -> bool {
        self.reach.contains(&node)
    }
}

/// Lead-time multiplier for `node` under the active disruptions.
/// Overlapping disruptions multiply; 1.0 when none reaches the node.
pub(crate) fn lead_time_factor(node: NodeIndex, disruptions: &[ResolvedDisruption], active: &[bool]) -> f64 {
    disruptions
        .iter()
        .zip(active)
        .filter(|(d, on)| **on && d.reaches(node))
        .map(|(d, _)| d.factor)
        .product()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::Node;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn network() -> NetworkGraph {
        let mut network = NetworkGraph::new();
        for id in ["S1", "S2", "DC1", "R1"] {
            network.add_node(Node::new(id, "hub")).unwrap();
        }
        network.add_edge("S1", "DC1", 3.0, None).unwrap();
        network.add_edge("S2", "DC1", 1.0, None).unwrap();
        network.add_edge("DC1", "R1", 1.0, None).unwrap();
        network
    }

    fn idx(network: &NetworkGraph, id: &str) -> NodeIndex {
        network.node_index(id).unwrap()
    }

    #[test]
    fn test_validation() {
        assert!(Disruption::node("S1", 1.0, DisruptionTrigger::Always).validate().is_err());
        assert!(Disruption::node("S1", 2.0, DisruptionTrigger::Probability(1.5))
            .validate()
            .is_err());
        assert!(Disruption::node("S1", 2.0, DisruptionTrigger::Probability(0.3))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_reach_covers_target_and_downstream() {
        let network = network();
        let supplier = Disruption::node("S2", 2.0, DisruptionTrigger::Always)
            .resolve(&network)
            .unwrap();
        for id in ["S2", "DC1", "R1"] {
            assert!(supplier.reaches(idx(&network, id)), "{id}");
        }
        assert!(!supplier.reaches(idx(&network, "S1")));

        let edge = Disruption::edge("DC1", "R1", 2.0, DisruptionTrigger::Always)
            .resolve(&network)
            .unwrap();
        assert!(edge.reaches(idx(&network, "R1")));
        assert!(!edge.reaches(idx(&network, "DC1")));

        assert!(matches!(
            Disruption::node("NOPE", 2.0, DisruptionTrigger::Always).resolve(&network),
            Err(SimError::UnknownNode(_))
        ));
        assert!(matches!(
            Disruption::edge("R1", "S1", 2.0, DisruptionTrigger::Always).resolve(&network),
            Err(SimError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_triggers_and_factors() {
        let network = network();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let scheduled = Disruption::edge("S1", "DC1", 2.0, DisruptionTrigger::Trials(vec![3]))
            .resolve(&network)
            .unwrap();
        assert!(!scheduled.is_active(0, &mut rng));
        assert!(scheduled.is_active(3, &mut rng));

        let never = Disruption::edge("S1", "DC1", 2.0, DisruptionTrigger::Probability(0.0))
            .resolve(&network)
            .unwrap();
        assert!(!never.is_active(0, &mut rng));

        let retail = Disruption::node("R1", 1.5, DisruptionTrigger::Always)
            .resolve(&network)
            .unwrap();
        let both = [scheduled, retail];
        assert_eq!(lead_time_factor(idx(&network, "R1"), &both, &[true, true]), 3.0);
        assert_eq!(lead_time_factor(idx(&network, "R1"), &both, &[false, true]), 1.5);
        assert_eq!(lead_time_factor(idx(&network, "DC1"), &both, &[false, true]), 1.0);
        assert_eq!(lead_time_factor(idx(&network, "S1"), &both, &[true, true]), 1.0);
    }
}
