use safety_stock_sim::{
    analyze_by_node, analyze_lead_time_impact, analyze_results, calculate_confidence_intervals,
    identify_bottlenecks, Disruption, DisruptionTrigger, ImpactAssessment, ImpactParams,
    MonteCarloEngine, NetworkGraph, NetworkSpec, SimError, SimulationConfig,
};
use std::process;
use tracing_subscriber::EnvFilter;

const DEMO_NETWORK: &str = r#"{
    "nodes": [
        { "id": "S1", "role": "supplier" },
        { "id": "DC1", "role": "distribution_center" },
        { "id": "R1", "role": "retailer", "demand": { "mean": 100.0, "std_dev": 20.0 } },
        { "id": "R2", "role": "retailer", "demand": { "mean": 60.0, "std_dev": 15.0 } }
    ],
    "edges": [
        { "from": "S1", "to": "DC1", "lead_time": 3.0 },
        { "from": "DC1", "to": "R1", "lead_time": 1.0 },
        { "from": "DC1", "to": "R2", "lead_time": 2.0 }
    ]
}"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), SimError> {
    println!("=== Safety Stock Monte Carlo Simulation ===");

    // 1. LOAD NETWORK
    let network = NetworkSpec::from_json_str(DEMO_NETWORK)?.build()?;
    println!(
        "Network loaded: {} nodes, {} edges",
        network.node_count(),
        network.edge_count()
    );
    print_lead_times(&network)?;

    // 2. SETUP CONFIGURATION
    // Stock is sized for 7 days of coverage at the network's typical lead time.
    let config = SimulationConfig::default()
        .with_iterations(1000)
        .with_seed(42)
        .with_parallel(true)
        .with_baseline_lead_time(4.0);
    let lead_times = [0.0, 1.0, 2.0, 4.0];

    // 3. RUN SIMULATION
    let engine = MonteCarloEngine::with_network(&network, config.clone())?;
    println!("Running {} trials...", engine.iterations());
    let results = engine.simulate_safety_stock(7.0, 90, &lead_times)?;

    // 4. SUMMARIZE
    println!("\n=== Safety Stock by Lead Time ===");
    let intervals = calculate_confidence_intervals(&results, 0.95)?;
    for (summary, ci) in analyze_results(&results)?.iter().zip(&intervals) {
        println!(
            "+{:>4.1} days: mean {:>8.1}  sd {:>6.1}  p5 {:>8.1}  p95 {:>8.1}  95% CI [{:.1}, {:.1}]",
            summary.lead_time, summary.mean, summary.std_dev, summary.p5, summary.p95, ci.lower, ci.upper
        );
    }

    println!("\n=== Per Node ===");
    for node in analyze_by_node(&results)? {
        println!(
            "{:<4} +{:>4.1} days: mean {:>8.1}",
            node.node_id, node.summary.lead_time, node.summary.mean
        );
    }

    // 5. BOTTLENECKS
    println!("\n=== Bottlenecks ===");
    let report = identify_bottlenecks(&network, &results)?;
    for entry in report.rankings.iter().take(5) {
        println!("{:?}: {:.1} units/day", entry.element, entry.sensitivity);
    }
    if let Some(primary) = &report.primary {
        println!("Primary bottleneck: {}", primary);
    }

    // 6. DISRUPTION
    // The supplier link runs at double lead time in roughly one trial out of five.
    let disrupted_config = config.with_disruption(Disruption::edge(
        "S1",
        "DC1",
        2.0,
        DisruptionTrigger::Probability(0.2),
    ));
    let disrupted = MonteCarloEngine::with_network(&network, disrupted_config)?
        .simulate_safety_stock(7.0, 90, &[0.0])?;
    let base_mean = analyze_results(&results)?[0].mean;
    let disrupted_mean = analyze_results(&disrupted)?[0].mean;
    println!("\n=== Disruption (S1 -> DC1 x2, p = 0.2) ===");
    println!(
        "Mean safety stock: {:.1} -> {:.1} ({:+.1}%)",
        base_mean,
        disrupted_mean,
        (disrupted_mean - base_mean) / base_mean * 100.0
    );

    // 7. PRINT COST ANALYSIS
    println!("\n=== Lead Time Cost Impact ===");
    let impact = analyze_lead_time_impact(&ImpactParams::default())?;
    println!(
        "Baseline: {:.0} units, ${:.2} annual holding cost",
        impact.baseline_safety_stock, impact.baseline_holding_cost
    );
    for row in &impact.rows {
        println!(
            "+{:>4.1} days ({:?}): {:>6.0} units ({:+.1}%), +${:.2}/year",
            row.variation_days, row.band, row.safety_stock, row.percent_change, row.additional_annual_cost
        );
    }
    match impact.assessment {
        ImpactAssessment::LowImpact => println!(
            "LOW IMPACT: max increase {:.1}% stays under the 25% threshold",
            impact.max_cost_increase_percent
        ),
        ImpactAssessment::SignificantImpact => println!(
            "TRACK: max increase {:.1}% exceeds the 25% threshold (${:.2})",
            impact.max_cost_increase_percent, impact.significance_threshold
        ),
    }

    println!("\nSimulation Complete.");
    Ok(())
}

fn print_lead_times(network: &NetworkGraph) -> Result<(), SimError> {
    for node in network.nodes().filter(|n| n.demand.is_some()) {
        println!(
            "  {} ({}): upstream lead time {:.1} days",
            node.id(),
            node.role,
            network.upstream_lead_time(node.id())?
        );
    }
    Ok(())
}
