// src/model/node.rs

use crate::error::{Result, SimError};
use crate::model::demand::DemandGenerator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a node in the supply chain. The set is open: any other
/// label is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeRole {
    Supplier,
    DistributionCenter,
    Retailer,
    Other(String),
}

impl NodeRole {
    pub fn as_str(&self) -> &str {
        match self {
            NodeRole::Supplier => "supplier",
            NodeRole::DistributionCenter => "distribution_center",
            NodeRole::Retailer => "retailer",
            NodeRole::Other(label) => label,
        }
    }
}

impl From<&str> for NodeRole {
    fn from(label: &str) -> Self {
        match label {
            "supplier" => NodeRole::Supplier,
            "distribution_center" | "dc" => NodeRole::DistributionCenter,
            "retailer" => NodeRole::Retailer,
            other => NodeRole::Other(other.to_string()),
        }
    }
}

impl From<String> for NodeRole {
    fn from(label: String) -> Self {
        NodeRole::from(label.as_str())
    }
}

impl From<NodeRole> for String {
    fn from(role: NodeRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stocking rule attached to a node. Validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryPolicy {
    pub coverage_days: f64,
    pub reorder_point: f64,
    pub order_quantity: f64,
}

impl InventoryPolicy {
    pub fn new(coverage_days: f64, reorder_point: f64, order_quantity: f64) -> Result<Self> {
        if !(coverage_days.is_finite() && coverage_days > 0.0) {
            return Err(SimError::invalid("coverage days must be positive"));
        }
        if !(reorder_point.is_finite() && reorder_point >= 0.0) {
            return Err(SimError::invalid("reorder point cannot be negative"));
        }
        if !(order_quantity.is_finite() && order_quantity > 0.0) {
            return Err(SimError::invalid("order quantity must be positive"));
        }
        Ok(Self {
            coverage_days,
            reorder_point,
            order_quantity,
        })
    }
}

/// A single location in the supply chain.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    // Identity
    id: String,
    pub role: NodeRole,

    // Demand and stocking
    pub demand: Option<DemandGenerator>,
    pub inventory_policy: Option<InventoryPolicy>,
}

impl Node {
    pub fn new(id: impl Into<String>, role: impl Into<NodeRole>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            demand: None,
            inventory_policy: None,
        }
    }

    pub fn with_demand(mut self, demand: DemandGenerator) -> Self {
        self.demand = Some(demand);
        self
    }

    pub fn with_inventory_policy(mut self, policy: InventoryPolicy) -> Self {
        self.inventory_policy = Some(policy);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}
