use safety_stock_sim::{
    analyze_results, calculate_confidence_intervals, DemandGenerator, Disruption, DisruptionTrigger,
    MonteCarloEngine, NetworkGraph, Node, NodeRole, SimError, SimulationConfig,
};

fn seeded(iterations: usize) -> SimulationConfig {
    SimulationConfig::default().with_iterations(iterations).with_seed(42)
}

fn retail_chain() -> NetworkGraph {
    let mut network = NetworkGraph::new();
    network.add_node(Node::new("S1", NodeRole::Supplier)).unwrap();
    network.add_node(Node::new("DC1", NodeRole::DistributionCenter)).unwrap();
    network
        .add_node(Node::new("R1", NodeRole::Retailer).with_demand(DemandGenerator::new(100.0, 20.0).unwrap()))
        .unwrap();
    network
        .add_node(Node::new("R2", NodeRole::Retailer).with_demand(DemandGenerator::new(50.0, 10.0).unwrap()))
        .unwrap();
    network.add_edge("S1", "DC1", 3.0, None).unwrap();
    network.add_edge("DC1", "R1", 1.0, None).unwrap();
    network.add_edge("DC1", "R2", 2.0, None).unwrap();
    network
}

#[test]
fn generated_demand_is_never_negative() {
    // Mean close to zero relative to the spread forces many negative draws.
    let generator = DemandGenerator::new(5.0, 50.0).unwrap().with_seed(3);
    let demand = generator.generate_daily_demand(5000).unwrap();
    assert_eq!(demand.len(), 5000);
    assert!(demand.iter().all(|&d| d >= 0.0));
    assert!(demand.iter().any(|&d| d == 0.0));
}

#[test]
fn same_seed_reproduces_demand() {
    let a = DemandGenerator::new(100.0, 20.0).unwrap().with_seed(42);
    let b = DemandGenerator::new(100.0, 20.0).unwrap().with_seed(42);
    let c = DemandGenerator::new(100.0, 20.0).unwrap().with_seed(43);

    assert_eq!(a.generate_daily_demand(90).unwrap(), b.generate_daily_demand(90).unwrap());
    assert_eq!(a.generate_daily_demand(90).unwrap(), a.generate_daily_demand(90).unwrap());
    assert_ne!(a.generate_daily_demand(90).unwrap(), c.generate_daily_demand(90).unwrap());
}

#[test]
fn path_lead_time_sums_edges() {
    let mut network = NetworkGraph::new();
    for id in ["A", "B", "C"] {
        network.add_node(Node::new(id, "site")).unwrap();
    }
    network.add_edge("A", "B", 3.0, None).unwrap();
    network.add_edge("B", "C", 1.0, None).unwrap();

    assert_eq!(network.path_lead_time("A", "C").unwrap(), 4.0);
    assert!(matches!(
        network.path_lead_time("C", "A"),
        Err(SimError::NoPath { .. })
    ));
    assert!(matches!(
        network.path_lead_time("A", "Z"),
        Err(SimError::UnknownNode(_))
    ));
}

#[test]
fn doubling_coverage_doubles_safety_stock() {
    let engine =
        MonteCarloEngine::single_node("R1", DemandGenerator::new(100.0, 20.0).unwrap(), seeded(200)).unwrap();
    let week = engine.simulate_safety_stock(7.0, 30, &[3.0]).unwrap();
    let fortnight = engine.simulate_safety_stock(14.0, 30, &[3.0]).unwrap();

    for (one, two) in week.scenarios[0].trials.iter().zip(&fortnight.scenarios[0].trials) {
        assert!((two.safety_stock - 2.0 * one.safety_stock).abs() < 1e-9);
    }
}

#[test]
fn mean_safety_stock_matches_coverage() {
    let engine =
        MonteCarloEngine::single_node("R1", DemandGenerator::new(100.0, 20.0).unwrap(), seeded(1000)).unwrap();
    let results = engine.simulate_safety_stock(7.0, 90, &[3.0, 5.0]).unwrap();

    for summary in analyze_results(&results).unwrap() {
        assert_eq!(summary.samples, 1000);
        assert!((summary.mean - 700.0).abs() < 700.0 * 0.02, "mean was {}", summary.mean);
        assert!(summary.p5 <= summary.median && summary.median <= summary.p95);
    }

    let intervals = calculate_confidence_intervals(&results, 0.95).unwrap();
    assert!(intervals.iter().all(|ci| ci.lower < ci.upper));
}

#[test]
fn confidence_intervals_need_two_samples() {
    let engine =
        MonteCarloEngine::single_node("R1", DemandGenerator::new(100.0, 20.0).unwrap(), seeded(1)).unwrap();
    let results = engine.simulate_safety_stock(7.0, 30, &[3.0]).unwrap();

    assert!(matches!(
        calculate_confidence_intervals(&results, 0.95),
        Err(SimError::InsufficientSamples { .. })
    ));
}

#[test]
fn disruption_raises_safety_stock_for_same_demand() {
    let network = retail_chain();
    let config = seeded(100).with_baseline_lead_time(4.0);
    let calm = MonteCarloEngine::with_network(&network, config.clone()).unwrap();
    let stormy = MonteCarloEngine::with_network(
        &network,
        config.with_disruption(Disruption::node("DC1", 1.5, DisruptionTrigger::Always)),
    )
    .unwrap();

    let before = calm.simulate_safety_stock(7.0, 30, &[0.0, 2.0]).unwrap();
    let after = stormy.simulate_safety_stock(7.0, 30, &[0.0, 2.0]).unwrap();

    for (b, a) in before.scenarios.iter().zip(&after.scenarios) {
        for (plain, hit) in b.trials.iter().zip(&a.trials) {
            assert_eq!(plain.node_id, hit.node_id);
            assert!(hit.effective_lead_time > plain.effective_lead_time);
            assert!(hit.safety_stock > plain.safety_stock);
        }
    }
}

#[test]
fn disrupting_a_standalone_demand_node_raises_its_safety_stock() {
    let mut network = NetworkGraph::new();
    network
        .add_node(Node::new("R1", NodeRole::Retailer).with_demand(DemandGenerator::new(100.0, 20.0).unwrap()))
        .unwrap();
    let calm = MonteCarloEngine::with_network(&network, seeded(50)).unwrap();
    let stormy = MonteCarloEngine::with_network(
        &network,
        seeded(50).with_disruption(Disruption::node("R1", 3.0, DisruptionTrigger::Always)),
    )
    .unwrap();

    let before = calm.simulate_safety_stock(7.0, 30, &[1.0]).unwrap();
    let after = stormy.simulate_safety_stock(7.0, 30, &[1.0]).unwrap();
    for (plain, hit) in before.scenarios[0].trials.iter().zip(&after.scenarios[0].trials) {
        assert!(hit.disrupted);
        assert!(hit.safety_stock > plain.safety_stock);
    }
}

#[test]
fn disrupting_a_supplier_off_the_slowest_route_raises_safety_stock() {
    let mut network = NetworkGraph::new();
    network.add_node(Node::new("S1", NodeRole::Supplier)).unwrap();
    network.add_node(Node::new("S2", NodeRole::Supplier)).unwrap();
    network
        .add_node(Node::new("R1", NodeRole::Retailer).with_demand(DemandGenerator::new(100.0, 20.0).unwrap()))
        .unwrap();
    network.add_edge("S1", "R1", 10.0, None).unwrap();
    network.add_edge("S2", "R1", 1.0, None).unwrap();

    let calm = MonteCarloEngine::with_network(&network, seeded(50)).unwrap();
    let stormy = MonteCarloEngine::with_network(
        &network,
        seeded(50).with_disruption(Disruption::node("S2", 2.0, DisruptionTrigger::Always)),
    )
    .unwrap();

    let before = calm.simulate_safety_stock(7.0, 30, &[0.0]).unwrap();
    let after = stormy.simulate_safety_stock(7.0, 30, &[0.0]).unwrap();
    for (plain, hit) in before.scenarios[0].trials.iter().zip(&after.scenarios[0].trials) {
        assert!(hit.disrupted);
        assert!(hit.effective_lead_time > plain.effective_lead_time);
        assert!(hit.safety_stock > plain.safety_stock);
    }
}

#[test]
fn parallel_run_matches_sequential_run() {
    let network = retail_chain();
    let config = seeded(300).with_disruption(Disruption::edge(
        "DC1",
        "R2",
        3.0,
        DisruptionTrigger::Probability(0.3),
    ));
    let sequential = MonteCarloEngine::with_network(&network, config.clone())
        .unwrap()
        .simulate_safety_stock(7.0, 60, &[1.0, 3.0])
        .unwrap();
    let parallel = MonteCarloEngine::with_network(&network, config.with_parallel(true))
        .unwrap()
        .simulate_safety_stock(7.0, 60, &[1.0, 3.0])
        .unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn unseeded_run_reports_a_reproducible_seed() {
    let generator = DemandGenerator::new(100.0, 20.0).unwrap();
    let config = SimulationConfig::default().with_iterations(20);
    let first = MonteCarloEngine::single_node("R1", generator.clone(), config.clone())
        .unwrap()
        .simulate_safety_stock(7.0, 30, &[2.0])
        .unwrap();

    let replay = MonteCarloEngine::single_node("R1", generator, config.with_seed(first.seed))
        .unwrap()
        .simulate_safety_stock(7.0, 30, &[2.0])
        .unwrap();
    assert_eq!(first, replay);
}

#[test]
fn network_loaded_from_json_drives_simulation() {
    let network = NetworkGraph::from_json_str(
        r#"{
            "nodes": [
                { "id": "S1", "role": "supplier" },
                { "id": "R1", "role": "retailer", "demand": { "mean": 40, "std_dev": 0, "distribution": "constant" } }
            ],
            "edges": [ { "from": "S1", "to": "R1", "lead_time": 2 } ]
        }"#,
    )
    .unwrap();
    let config = SimulationConfig::from_json_str(r#"{ "iterations": 10, "seed": 1, "baseline_lead_time": 2 }"#).unwrap();

    let results = MonteCarloEngine::with_network(&network, config)
        .unwrap()
        .simulate_safety_stock(7.0, 30, &[0.0, 2.0])
        .unwrap();
    let summaries = analyze_results(&results).unwrap();
    assert_eq!(summaries[0].mean, 280.0);
    assert_eq!(summaries[1].mean, 560.0);
}
