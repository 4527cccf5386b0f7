use deadlock_sim::{DeadlockInfo, PacingConfig, Simulation, SimulationSummary};
use std::sync::{Arc, Mutex as StdMutex, mpsc};
use std::thread;
use std::time::Duration;

#[allow(dead_code)]
pub const DEADLOCK_TIMEOUT: Duration = Duration::from_secs(3);
#[allow(dead_code)]
pub const NO_DEADLOCK_TIMEOUT: Duration = Duration::from_millis(500);

pub struct SimulationHarness {
    pub rx: mpsc::Receiver<DeadlockInfo>,
    pub detected: Arc<StdMutex<bool>>,
    handle: thread::JoinHandle<anyhow::Result<SimulationSummary>>,
}

impl SimulationHarness {
    /// Wait for the simulation to end and return its summary
    #[allow(dead_code)]
    pub fn finish(self) -> SimulationSummary {
        self.handle
            .join()
            .expect("Simulation thread panicked")
            .expect("Simulation failed")
    }
}

/// Run `simulation` on a background thread, forwarding every report
pub fn start_simulation(simulation: Simulation) -> SimulationHarness {
    let (tx, rx) = mpsc::channel::<DeadlockInfo>();
    let detected = Arc::new(StdMutex::new(false));
    let flag = Arc::clone(&detected);

    let simulation = simulation.callback(move |info| {
        *flag.lock().unwrap() = true;
        let _ = tx.send(info);
    });

    let handle = thread::spawn(move || simulation.run());

    SimulationHarness {
        rx,
        detected,
        handle,
    }
}

/// Every process holds its first resource while all of them request their second
#[allow(dead_code)]
pub fn lockstep_pacing(hold_ms: u64) -> PacingConfig {
    PacingConfig {
        stagger_ms: 0,
        min_hold_ms: hold_ms,
        max_hold_ms: hold_ms,
        settle_ms: 0,
        seed: Some(7),
    }
}

#[allow(dead_code)]
pub fn expect_deadlock(h: &SimulationHarness, timeout: Duration) -> DeadlockInfo {
    match h.rx.recv_timeout(timeout) {
        Ok(info) => {
            assert!(*h.detected.lock().unwrap(), "Deadlock flag should be set");
            info
        }
        Err(_) => panic!("No deadlock detected within {timeout:?}"),
    }
}

#[allow(dead_code)]
pub fn assert_no_deadlock(h: &SimulationHarness, timeout: Duration) {
    assert!(
        h.rx.recv_timeout(timeout).is_err(),
        "Unexpected deadlock detected"
    );
    assert!(
        !*h.detected.lock().unwrap(),
        "Deadlock flag should not be set"
    );
}
