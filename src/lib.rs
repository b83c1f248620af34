//! Monte Carlo safety-stock simulation over supply-chain networks.
//!
//! Demand nodes draw stochastic daily demand, lead times come from a
//! directed network of transport links, and repeated independent trials
//! turn both into a distribution of required safety stock per lead-time
//! scenario.
//!
//! ```no_run
//! use safety_stock_sim::{analyze_results, DemandGenerator, MonteCarloEngine, SimulationConfig};
//!
//! let demand = DemandGenerator::new(100.0, 20.0)?;
//! let config = SimulationConfig::default().with_seed(42);
//! let engine = MonteCarloEngine::single_node("store", demand, config)?;
//! let results = engine.simulate_safety_stock(7.0, 90, &[3.0, 5.0])?;
//! for summary in analyze_results(&results)? {
//!     println!("{}: {:.0}", summary.lead_time, summary.mean);
//! }
//! # Ok::<(), safety_stock_sim::SimError>(())
//! ```

pub mod analysis;
pub mod error;
pub mod model;
pub mod simulation;

pub use analysis::bottleneck::{identify_bottlenecks, Bottleneck, BottleneckElement, BottleneckReport};
pub use analysis::impact::{analyze_lead_time_impact, ImpactAssessment, ImpactParams, ImpactReport};
pub use analysis::statistics::{
    analyze_by_node, analyze_results, calculate_confidence_intervals, ConfidenceInterval, ScenarioSummary,
};
pub use error::{Result, SimError};
pub use model::demand::{DemandDistribution, DemandGenerator};
pub use model::network::{NetworkGraph, NetworkPath};
pub use model::node::{InventoryPolicy, Node, NodeRole};
pub use model::spec::NetworkSpec;
pub use simulation::config::SimulationConfig;
pub use simulation::disruption::{Disruption, DisruptionTarget, DisruptionTrigger};
pub use simulation::engine::{MonteCarloEngine, ScenarioSamples, SimulationResults, TrialResult};
pub use simulation::policy::{CoverageDuration, LeadTimeAdditive, SafetyStockModel, StatisticalBuffer};
