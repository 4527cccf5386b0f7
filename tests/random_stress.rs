use deadlock_sim::{EdgePolicy, PacingConfig, Simulation, SimulatedProcess};
use rand::Rng;

fn random_processes(rng: &mut impl Rng, count: usize, resources: usize) -> Vec<SimulatedProcess> {
    (0..count)
        .map(|id| {
            let len = rng.random_range(0..=6);
            let demands: Vec<String> = (0..len)
                .map(|_| format!("R{}", rng.random_range(0..resources)))
                .collect();
            SimulatedProcess::new(id, demands)
        })
        .collect()
}

fn run(policy: EdgePolicy, processes: Vec<SimulatedProcess>) -> (usize, usize) {
    let demanded: usize = processes.iter().map(|p| p.demands.len()).sum();
    let mut simulation = Simulation::new()
        .edge_policy(policy)
        .pacing(PacingConfig::immediate())
        .callback(|_| {});
    for process in processes {
        simulation = simulation.with_process(process);
    }

    let summary = simulation.run().expect("Simulation failed");
    assert_eq!(summary.final_edge_count(), 0, "edges leaked: {}", summary.final_graph);
    (summary.mutations, demanded)
}

#[test]
fn test_request_release_stress_balances() {
    let mut rng = rand::rng();
    let n = rng.random_range(4..=16);
    println!("→ stressing {n} processes");

    let (mutations, demanded) = run(EdgePolicy::RequestRelease, random_processes(&mut rng, n, 5));
    assert_eq!(mutations, 2 * demanded);
}

#[test]
fn test_hold_and_wait_stress_balances() {
    let mut rng = rand::rng();
    let n = rng.random_range(4..=16);
    println!("→ stressing {n} processes");

    let (mutations, demanded) = run(EdgePolicy::HoldAndWait, random_processes(&mut rng, n, 3));
    assert_eq!(mutations, 3 * demanded);
}
