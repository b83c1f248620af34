// src/simulation/engine.rs

use crate::error::{Result, SimError};
use crate::model::demand::{mean_demand, DemandGenerator};
use crate::model::network::{NetworkGraph, NodeIndex};
use crate::simulation::config::SimulationConfig;
use crate::simulation::disruption::{lead_time_factor, ResolvedDisruption};
use crate::simulation::policy::{CoverageContext, CoverageDuration, SafetyStockModel};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One Monte Carlo sample: the safety stock one node needed in one trial
/// under one lead-time scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialResult {
    pub node_id: String,
    pub lead_time: f64,
    pub trial: usize,
    /// Lead time the node actually faced: scenario plus network lead time,
    /// stretched by any disruption that reached the node.
    pub effective_lead_time: f64,
    /// Whether an active disruption reached this node in this trial.
    pub disrupted: bool,
    pub safety_stock: f64,
}

/// All samples for one lead-time scenario, in trial order then node order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSamples {
    pub lead_time: f64,
    pub trials: Vec<TrialResult>,
}

impl ScenarioSamples {
    pub fn values(&self) -> Vec<f64> {
        self.trials.iter().map(|t| t.safety_stock).collect()
    }

    pub fn values_for(&self, node_id: &str) -> Vec<f64> {
        self.trials
            .iter()
            .filter(|t| t.node_id == node_id)
            .map(|t| t.safety_stock)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

/// Output of [`MonteCarloEngine::simulate_safety_stock`], keyed by
/// lead-time scenario in the order the caller supplied them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResults {
    /// Seed the run actually used; rerunning with it reproduces the results.
    pub seed: u64,
    pub iterations: usize,
    pub coverage_days: f64,
    pub simulation_days: usize,
    pub scenarios: Vec<ScenarioSamples>,
}

impl SimulationResults {
    pub fn scenario(&self, lead_time: f64) -> Option<&ScenarioSamples> {
        self.scenarios.iter().find(|s| s.lead_time == lead_time)
    }

    pub fn lead_times(&self) -> Vec<f64> {
        self.scenarios.iter().map(|s| s.lead_time).collect()
    }

    /// Node identifiers in order of first appearance.
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for trial in self.scenarios.iter().flat_map(|s| &s.trials) {
            if !ids.iter().any(|id| *id == trial.node_id) {
                ids.push(trial.node_id.clone());
            }
        }
        ids
    }

    pub fn total_samples(&self) -> usize {
        self.scenarios.iter().map(ScenarioSamples::len).sum()
    }
}

/// A node whose demand is simulated.
#[derive(Debug, Clone)]
struct DemandSource {
    node_id: String,
    node: Option<NodeIndex>,
    generator: DemandGenerator,
}

/// Runs repeated independent trials of demand generation and lead-time
/// propagation to estimate safety-stock distributions.
///
/// The network, when attached, is borrowed read-only for the engine's lifetime.
#[derive(Debug)]
pub struct MonteCarloEngine<'n> {
    config: SimulationConfig,
    sources: Vec<DemandSource>,
    network: Option<&'n NetworkGraph>,
    disruptions: Vec<ResolvedDisruption>,
    model: Box<dyn SafetyStockModel>,
}

impl MonteCarloEngine<'static> {
    /// Simulates a single demand stream without a network.
    pub fn single_node(
        node_id: impl Into<String>,
        generator: DemandGenerator,
        config: SimulationConfig,
    ) -> Result<Self> {
        config.validate()?;
        if !config.disruptions.is_empty() {
            return Err(SimError::invalid("disruptions require an attached network"));
        }

        Ok(Self {
            config,
            sources: vec![DemandSource {
                node_id: node_id.into(),
                node: None,
                generator,
            }],
            network: None,
            disruptions: Vec::new(),
            model: Box::new(CoverageDuration),
        })
    }
}

impl<'n> MonteCarloEngine<'n> {
    /// Simulates every node of `network` that carries a demand generator.
    pub fn with_network(network: &'n NetworkGraph, config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let sources: Vec<DemandSource> = network
            .demand_nodes()
            .into_iter()
            .filter_map(|idx| {
                let node = network.node_at(idx);
                node.demand.as_ref().map(|generator| DemandSource {
                    node_id: node.id().to_string(),
                    node: Some(idx),
                    generator: generator.clone(),
                })
            })
            .collect();
        if sources.is_empty() {
            return Err(SimError::invalid("network has no nodes with a demand generator"));
        }

        let disruptions = config
            .disruptions
            .iter()
            .map(|d| d.resolve(network))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            sources,
            network: Some(network),
            disruptions,
            model: Box::new(CoverageDuration),
        })
    }

    /// Replaces the safety-stock formula (default: [`CoverageDuration`]).
    pub fn with_model(mut self, model: impl SafetyStockModel + 'static) -> Self {
        self.model = Box::new(model);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn iterations(&self) -> usize {
        self.config.iterations
    }

    /// Runs `iterations` trials and collects the safety stock required per
    /// node for every lead-time scenario.
    ///
    /// # Arguments
    /// * `coverage_days` - Days of average demand the stock must cover.
    /// * `simulation_days` - Length of each trial's demand history.
    /// * `lead_times` - Scenarios to evaluate, kept in the given order.
    pub fn simulate_safety_stock(
        &self,
        coverage_days: f64,
        simulation_days: usize,
        lead_times: &[f64],
    ) -> Result<SimulationResults> {
        validate_run(coverage_days, simulation_days, lead_times)?;

        let seed = match self.config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                warn!(seed, "No seed configured; drew one from entropy");
                seed
            }
        };

        info!(
            iterations = self.config.iterations,
            scenarios = lead_times.len(),
            nodes = self.sources.len(),
            model = self.model.name(),
            seed,
            parallel = self.config.parallel,
            "Starting safety stock simulation"
        );
        let start = Instant::now();

        let network_lead_times = self.network_lead_times();
        let run = |trial: usize| {
            self.run_trial(trial, seed, coverage_days, simulation_days, lead_times, &network_lead_times)
        };

        let per_trial: Vec<Vec<Vec<TrialResult>>> = if self.config.parallel {
            (0..self.config.iterations)
                .into_par_iter()
                .map(run)
                .collect::<Result<_>>()?
        } else {
            (0..self.config.iterations).map(run).collect::<Result<_>>()?
        };

        // Merge per-trial buffers into the scenario containers.
        let mut scenarios: Vec<ScenarioSamples> = lead_times
            .iter()
            .map(|&lead_time| ScenarioSamples {
                lead_time,
                trials: Vec::with_capacity(self.config.iterations * self.sources.len()),
            })
            .collect();
        for trial in per_trial {
            for (scenario, rows) in scenarios.iter_mut().zip(trial) {
                scenario.trials.extend(rows);
            }
        }

        let results = SimulationResults {
            seed,
            iterations: self.config.iterations,
            coverage_days,
            simulation_days,
            scenarios,
        };
        info!(
            samples = results.total_samples(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Simulation complete"
        );
        Ok(results)
    }

    /// One trial. Demand and disruption draws come from two separate
    /// streams derived from `(seed, trial)`, so changing the disruption
    /// setup never changes the demand a trial sees.
    fn run_trial(
        &self,
        trial: usize,
        seed: u64,
        coverage_days: f64,
        simulation_days: usize,
        lead_times: &[f64],
        network_lead_times: &[f64],
    ) -> Result<Vec<Vec<TrialResult>>> {
        let mut demand_rng = ChaCha8Rng::seed_from_u64(seed);
        demand_rng.set_stream(2 * trial as u64);
        let mut event_rng = ChaCha8Rng::seed_from_u64(seed);
        event_rng.set_stream(2 * trial as u64 + 1);

        let active: Vec<bool> = self
            .disruptions
            .iter()
            .map(|d| d.is_active(trial, &mut event_rng))
            .collect();

        let mut rows: Vec<Vec<TrialResult>> = lead_times
            .iter()
            .map(|_| Vec::with_capacity(self.sources.len()))
            .collect();

        for (source, &network_lead_time) in self.sources.iter().zip(network_lead_times) {
            let demand = source.generator.sample_daily_demand(simulation_days, &mut demand_rng)?;
            let mean_daily_demand = mean_demand(&demand)?;
            let factor = match source.node {
                Some(idx) => lead_time_factor(idx, &self.disruptions, &active),
                None => 1.0,
            };
            let disrupted = factor > 1.0;

            for (scenario, &lead_time) in rows.iter_mut().zip(lead_times) {
                let effective_lead_time = (network_lead_time + lead_time) * factor;
                let lead_time_ratio = match self.network {
                    Some(_) => effective_lead_time / self.config.baseline_lead_time,
                    None => 1.0,
                };
                let ctx = CoverageContext {
                    coverage_days,
                    scenario_lead_time: lead_time,
                    effective_lead_time,
                    lead_time_ratio,
                    demand: &demand,
                    mean_daily_demand,
                };

                scenario.push(TrialResult {
                    node_id: source.node_id.clone(),
                    lead_time,
                    trial,
                    effective_lead_time,
                    disrupted,
                    safety_stock: self.model.safety_stock(&ctx),
                });
            }
        }

        Ok(rows)
    }

    /// Undisrupted network lead time into each demand source. Zero for every
    /// source without a network.
    fn network_lead_times(&self) -> Vec<f64> {
        let Some(network) = self.network else {
            return vec![0.0; self.sources.len()];
        };

        let lead_times: Vec<f64> = self
            .sources
            .iter()
            .map(|source| match source.node {
                Some(idx) => network.upstream_lead_time_at(idx),
                None => 0.0,
            })
            .collect();
        debug!(?lead_times, "Computed network lead times");
        lead_times
    }
}

fn validate_run(coverage_days: f64, simulation_days: usize, lead_times: &[f64]) -> Result<()> {
    if !(coverage_days.is_finite() && coverage_days > 0.0) {
        return Err(SimError::invalid(format!(
            "coverage days must be positive, got {coverage_days}"
        )));
    }
    if simulation_days == 0 {
        return Err(SimError::invalid("simulation days must be positive"));
    }
    if lead_times.is_empty() {
        return Err(SimError::invalid("at least one lead-time scenario is required"));
    }
    for (i, &lead_time) in lead_times.iter().enumerate() {
        if !(lead_time.is_finite() && lead_time >= 0.0) {
            return Err(SimError::invalid(format!(
                "lead time must be non-negative, got {lead_time}"
            )));
        }
        if lead_times[..i].contains(&lead_time) {
            return Err(SimError::invalid(format!("duplicate lead-time scenario {lead_time}")));
        }
    }
    Ok(())
}
