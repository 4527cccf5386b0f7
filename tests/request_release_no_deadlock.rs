use deadlock_sim::{PacingConfig, Simulation, SimulationConfig};
mod common;
use common::{NO_DEADLOCK_TIMEOUT, assert_no_deadlock, start_simulation};

#[test]
fn test_demo_scenario_never_deadlocks() {
    let config = SimulationConfig {
        pacing: PacingConfig {
            stagger_ms: 10,
            min_hold_ms: 10,
            max_hold_ms: 40,
            settle_ms: 5,
            seed: Some(42),
        },
        ..SimulationConfig::demo()
    };

    let harness = start_simulation(Simulation::from_config(config));
    assert_no_deadlock(&harness, NO_DEADLOCK_TIMEOUT);

    let summary = harness.finish();
    assert!(!summary.deadlock_detected());
    assert_eq!(summary.mutations, 12);
    assert!(summary.final_graph.is_empty());
}

#[test]
fn test_no_processes() {
    let summary = Simulation::new()
        .pacing(PacingConfig::immediate())
        .run()
        .unwrap();
    assert_eq!(summary.mutations, 0);
    assert!(!summary.deadlock_detected());
}
