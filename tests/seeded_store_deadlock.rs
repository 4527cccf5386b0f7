use deadlock_sim::{GraphStore, PacingConfig, ResourceAllocationGraph, Simulation};
mod common;
use common::{DEADLOCK_TIMEOUT, expect_deadlock, start_simulation};

#[test]
fn test_request_into_existing_wait_chain() {
    // An outside process P7 holds R1 and waits for R0, which P0 already holds
    let seeded = ResourceAllocationGraph::from_edges([("R1", "P7"), ("P7", "R0"), ("R0", "P0")]);
    let store = GraphStore::from_graph(seeded);

    let simulation = Simulation::new()
        .process(["R1"])
        .pacing(PacingConfig::immediate())
        .store(store.clone());

    let harness = start_simulation(simulation);

    let info = expect_deadlock(&harness, DEADLOCK_TIMEOUT);
    assert_eq!(info.process, "P0");
    assert_eq!(info.resource, "R1");
    assert_eq!(info.cycle.len(), 5);
    // Only simulated processes are listed
    assert_eq!(info.processes, ["P0"]);

    let summary = harness.finish();
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.final_edge_count(), 3);
    assert_eq!(store.edge_count(), 3);
}
