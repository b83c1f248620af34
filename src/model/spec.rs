// src/model/spec.rs

use crate::error::Result;
use crate::model::demand::{DemandDistribution, DemandGenerator};
use crate::model::network::NetworkGraph;
use crate::model::node::{InventoryPolicy, Node, NodeRole};
use serde::{Deserialize, Serialize};

/// Plain-data definition of a network, e.g. loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub role: NodeRole,
    #[serde(default)]
    pub demand: Option<DemandSpec>,
    #[serde(default)]
    pub inventory_policy: Option<InventoryPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSpec {
    pub mean: f64,
    pub std_dev: f64,
    #[serde(default)]
    pub distribution: DemandDistribution,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    pub lead_time: f64,
    #[serde(default)]
    pub capacity: Option<f64>,
}

impl DemandSpec {
    pub fn build(&self) -> Result<DemandGenerator> {
        let mut generator =
            DemandGenerator::new(self.mean, self.std_dev)?.with_distribution(self.distribution);
        if let Some(seed) = self.seed {
            generator = generator.with_seed(seed);
        }
        Ok(generator)
    }
}

impl NetworkSpec {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the graph, running every definition through the same
    /// validation as the programmatic API.
    pub fn build(&self) -> Result<NetworkGraph> {
        let mut network = NetworkGraph::new();

        for spec in &self.nodes {
            let mut node = Node::new(spec.id.clone(), spec.role.clone());
            if let Some(demand) = &spec.demand {
                node = node.with_demand(demand.build()?);
            }
            if let Some(policy) = spec.inventory_policy {
                let policy = InventoryPolicy::new(
                    policy.coverage_days,
                    policy.reorder_point,
                    policy.order_quantity,
                )?;
                node = node.with_inventory_policy(policy);
            }
            network.add_node(node)?;
        }

        for edge in &self.edges {
            network.add_edge(&edge.from, &edge.to, edge.lead_time, edge.capacity)?;
        }

        Ok(network)
    }
}

impl NetworkGraph {
    /// Parses and builds a network from its JSON definition.
    pub fn from_json_str(json: &str) -> Result<Self> {
        NetworkSpec::from_json_str(json)?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    const NETWORK: &str = r#"{
        "nodes": [
            { "id": "S1", "role": "supplier" },
            { "id": "DC1", "role": "distribution_center",
              "inventory_policy": { "coverage_days": 7, "reorder_point": 100, "order_quantity": 500 } },
            { "id": "R1", "role": "retailer",
              "demand": { "mean": 100, "std_dev": 20, "seed": 42 } }
        ],
        "edges": [
            { "from": "S1", "to": "DC1", "lead_time": 3, "capacity": 1000 },
            { "from": "DC1", "to": "R1", "lead_time": 1 }
        ]
    }"#;

    #[test]
    fn test_build_from_json() {
        let network = NetworkGraph::from_json_str(NETWORK).unwrap();
        assert_eq!(network.node_count(), 3);
        assert_eq!(network.path_lead_time("S1", "R1").unwrap(), 4.0);

        let retailer = network.node("R1").unwrap();
        assert_eq!(retailer.role, NodeRole::Retailer);
        let demand = retailer.demand.as_ref().unwrap();
        assert_eq!(demand.mean(), 100.0);
        assert_eq!(demand.seed(), Some(42));
        assert!(network.node("DC1").unwrap().inventory_policy.is_some());
    }

    #[test]
    fn test_invalid_definitions_are_rejected() {
        assert!(matches!(
            NetworkGraph::from_json_str("{ not json"),
            Err(SimError::Config(_))
        ));

        let dangling = r#"{ "nodes": [ { "id": "A", "role": "supplier" } ],
                            "edges": [ { "from": "A", "to": "B", "lead_time": 1 } ] }"#;
        assert!(matches!(
            NetworkGraph::from_json_str(dangling),
            Err(SimError::UnknownNode(id)) if id == "B"
        ));

        let bad_policy = r#"{ "nodes": [ { "id": "A", "role": "dc",
            "inventory_policy": { "coverage_days": 0, "reorder_point": 1, "order_quantity": 1 } } ] }"#;
        assert!(matches!(
            NetworkGraph::from_json_str(bad_policy),
            Err(SimError::InvalidParameter(_))
        ));
    }
}
