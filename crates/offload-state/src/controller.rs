//! Predictive offloading controller
//!
//! Owns one history and one predictor per venue and is their only mutator.
//! The phase is derived from history fullness on every request:
//!
//! - **Warm-up**: at least one history is below capacity. The payload runs on
//!   both venues (local first), each success is recorded, and the local result
//!   is canonical.
//! - **Steady state**: both histories are full. Both predictors are refit, the
//!   venue with the strictly lower predicted latency wins (ties go remote), and
//!   only that venue runs.
//!
//! Because full histories stay full under FIFO eviction, steady state is never
//! left for the lifetime of the controller.

use crate::history::SampleHistory;
use crate::predictor::LatencyPredictor;
use offload_core::{
    ControllerConfig, Error, Execution, ExecutionAdapter, Mode, OffloadObserver, Result, Sample,
    Venue,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pick a venue from two predicted latencies.
///
/// Local wins only when strictly faster; ties and remote advantages go remote.
pub fn choose_venue(predicted_local: f64, predicted_remote: f64) -> Venue {
    if predicted_local < predicted_remote {
        Venue::Local
    } else {
        Venue::Remote
    }
}

/// A steady-state routing decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    /// Chosen venue
    pub venue: Venue,

    /// Payload size the predictions were made for
    pub size: u64,

    /// Predicted local latency in seconds
    pub predicted_local: f64,

    /// Predicted remote latency in seconds
    pub predicted_remote: f64,
}

/// Result of handling one request
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Phase the request was handled in
    pub mode: Mode,

    /// Venue whose result is canonical
    pub venue: Venue,

    /// Canonical textual result
    pub output: String,

    /// Measured latency of the canonical execution
    pub latency: Duration,

    /// Routing decision, steady state only
    pub decision: Option<Decision>,

    /// Remote execution run alongside the canonical one during warm-up
    pub shadow: Option<Execution>,
}

/// Serializable view of one venue's state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueSnapshot {
    pub venue: Venue,
    pub history_len: usize,
    pub slope: Option<f64>,
    pub intercept: Option<f64>,
}

/// Serializable view of the controller, for status logging
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerSnapshot {
    pub mode: Mode,
    pub capacity: usize,
    pub requests: u64,
    pub local: VenueSnapshot,
    pub remote: VenueSnapshot,
}

#[derive(Debug, Clone)]
struct VenueState {
    history: SampleHistory,
    predictor: LatencyPredictor,
}

impl VenueState {
    fn new(venue: Venue, capacity: usize) -> Self {
        Self {
            history: SampleHistory::new(capacity),
            predictor: LatencyPredictor::new(venue),
        }
    }

    fn refit(&mut self) {
        let snapshot = self.history.snapshot();
        self.predictor.fit(&snapshot);
    }

    fn snapshot(&self) -> VenueSnapshot {
        VenueSnapshot {
            venue: self.predictor.venue(),
            history_len: self.history.len(),
            slope: self.predictor.slope(),
            intercept: self.predictor.intercept(),
        }
    }
}

/// Chooses between local and remote execution from learned latency models
pub struct OffloadingController {
    local_adapter: Arc<dyn ExecutionAdapter>,
    remote_adapter: Arc<dyn ExecutionAdapter>,
    local: VenueState,
    remote: VenueState,
    observer: Arc<dyn OffloadObserver>,
    capacity: usize,
    requests: u64,
}

impl std::fmt::Debug for OffloadingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffloadingController")
            .field("capacity", &self.capacity)
            .field("requests", &self.requests)
            .field("local", &self.local)
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}

impl OffloadingController {
    /// Create a controller with empty histories and untrained predictors
    pub fn new(
        config: &ControllerConfig,
        local_adapter: Arc<dyn ExecutionAdapter>,
        remote_adapter: Arc<dyn ExecutionAdapter>,
        observer: Arc<dyn OffloadObserver>,
    ) -> Result<Self> {
        config.validate()?;

        for (expected, adapter) in [(Venue::Local, &local_adapter), (Venue::Remote, &remote_adapter)]
        {
            if adapter.venue() != expected {
                return Err(Error::config(format!(
                    "Adapter for {} venue reports venue {}",
                    expected,
                    adapter.venue()
                )));
            }
        }

        let capacity = config.history_capacity;
        info!("Creating offloading controller with history capacity {}", capacity);

        Ok(Self {
            local_adapter,
            remote_adapter,
            local: VenueState::new(Venue::Local, capacity),
            remote: VenueState::new(Venue::Remote, capacity),
            observer,
            capacity,
            requests: 0,
        })
    }

    /// Current phase, derived from history fullness
    pub fn mode(&self) -> Mode {
        if self.local.history.is_full() && self.remote.history.is_full() {
            Mode::Steady
        } else {
            Mode::WarmUp
        }
    }

    pub fn history(&self, venue: Venue) -> &SampleHistory {
        &self.state(venue).history
    }

    pub fn predictor(&self, venue: Venue) -> &LatencyPredictor {
        &self.state(venue).predictor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of requests handled, successful or not
    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            mode: self.mode(),
            capacity: self.capacity,
            requests: self.requests,
            local: self.local.snapshot(),
            remote: self.remote.snapshot(),
        }
    }

    /// Refit both predictors from the current histories
    pub fn refit(&mut self) {
        self.local.refit();
        self.remote.refit();
    }

    /// Predict both venues for `size` and choose one.
    ///
    /// Fails with `UntrainedPredictor` if either predictor has not been fit
    /// from at least two samples.
    pub fn decide(&self, size: u64) -> Result<Decision> {
        let predicted_local = self.local.predictor.predict(size)?;
        let predicted_remote = self.remote.predictor.predict(size)?;

        Ok(Decision {
            venue: choose_venue(predicted_local, predicted_remote),
            size,
            predicted_local,
            predicted_remote,
        })
    }

    /// Handle one unit of work end to end
    pub async fn handle(&mut self, payload: &[u8]) -> Result<Outcome> {
        let size = payload.len() as u64;
        self.requests += 1;
        self.refit();

        match self.mode() {
            Mode::WarmUp => self.warm_up(payload, size).await,
            Mode::Steady => self.steady(payload, size).await,
        }
    }

    async fn warm_up(&mut self, payload: &[u8], size: u64) -> Result<Outcome> {
        debug!(
            size,
            local = self.local.history.len(),
            remote = self.remote.history.len(),
            capacity = self.capacity,
            "Warm-up: executing on both venues"
        );

        let local = self.execute_and_record(Venue::Local, payload, size).await;
        let remote = self.execute_and_record(Venue::Remote, payload, size).await;

        match (&local, &remote) {
            (Ok(l), Ok(r)) => info!(
                size,
                local_secs = l.elapsed.as_secs_f64(),
                remote_secs = r.elapsed.as_secs_f64(),
                "Warm-up executed on both venues"
            ),
            (Ok(_), Err(e)) => warn!("Warm-up remote execution failed, keeping local result: {}", e),
            (Err(_), _) => {}
        }

        let local = local?;
        Ok(Outcome {
            mode: Mode::WarmUp,
            venue: Venue::Local,
            output: local.output,
            latency: local.elapsed,
            decision: None,
            shadow: remote.ok(),
        })
    }

    async fn steady(&mut self, payload: &[u8], size: u64) -> Result<Outcome> {
        let decision = self.decide(size)?;
        info!(
            size,
            venue = %decision.venue,
            predicted_local = decision.predicted_local,
            predicted_remote = decision.predicted_remote,
            "Offloading decision"
        );

        let execution = self.execute_and_record(decision.venue, payload, size).await?;

        Ok(Outcome {
            mode: Mode::Steady,
            venue: decision.venue,
            output: execution.output,
            latency: execution.elapsed,
            decision: Some(decision),
            shadow: None,
        })
    }

    async fn execute_and_record(
        &mut self,
        venue: Venue,
        payload: &[u8],
        size: u64,
    ) -> Result<Execution> {
        let adapter = Arc::clone(self.adapter(venue));

        let execution = match adapter.run(payload).await {
            Ok(execution) => execution,
            Err(e) => {
                let e = if e.venue() == Some(venue) && e.is_execution_failure() {
                    e
                } else {
                    Error::execution(venue, e.to_string())
                };
                warn!(venue = %venue, size, "Execution failed, no sample recorded: {}", e);
                return Err(e);
            }
        };

        let state = self.state_mut(venue);
        let evicted = state
            .history
            .record(Sample::from_duration(execution.elapsed, size));
        let history_len = state.history.len();

        if let Some(evicted) = evicted {
            debug!(
                venue = %venue,
                latency = evicted.latency(),
                size = evicted.size(),
                "Evicted oldest sample"
            );
        }

        self.observer
            .observe_record(venue, execution.elapsed, history_len);

        debug!(
            venue = %venue,
            size,
            latency_secs = execution.elapsed.as_secs_f64(),
            history_len,
            "Recorded sample"
        );

        Ok(execution)
    }

    fn adapter(&self, venue: Venue) -> &Arc<dyn ExecutionAdapter> {
        match venue {
            Venue::Local => &self.local_adapter,
            Venue::Remote => &self.remote_adapter,
        }
    }

    fn state(&self, venue: Venue) -> &VenueState {
        match venue {
            Venue::Local => &self.local,
            Venue::Remote => &self.remote,
        }
    }

    fn state_mut(&mut self, venue: Venue) -> &mut VenueState {
        match venue {
            Venue::Local => &mut self.local,
            Venue::Remote => &mut self.remote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_adapter::mock::{MockAdapter, MockAdapterConfig, ScriptStep, ScriptedAdapter};
    use offload_core::NoopObserver;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingObserver {
        records: Mutex<Vec<(Venue, usize)>>,
    }

    impl RecordingObserver {
        fn records(&self) -> Vec<(Venue, usize)> {
            self.records.lock().unwrap().clone()
        }
    }

    impl OffloadObserver for RecordingObserver {
        fn observe_record(&self, venue: Venue, _latency: Duration, history_len: usize) {
            self.records.lock().unwrap().push((venue, history_len));
        }
    }

    fn config(capacity: usize) -> ControllerConfig {
        ControllerConfig {
            history_capacity: capacity,
        }
    }

    fn controller_with(
        capacity: usize,
        local: Arc<ScriptedAdapter>,
        remote: Arc<ScriptedAdapter>,
        observer: Arc<dyn OffloadObserver>,
    ) -> OffloadingController {
        OffloadingController::new(&config(capacity), local, remote, observer).unwrap()
    }

    fn seed(controller: &mut OffloadingController, venue: Venue, points: &[(f64, u64)]) {
        for &(latency, size) in points {
            controller
                .state_mut(venue)
                .history
                .record(Sample::new(latency, size));
        }
    }

    #[test]
    fn test_choose_venue() {
        assert_eq!(choose_venue(1.0, 2.0), Venue::Local);
        assert_eq!(choose_venue(2.0, 1.0), Venue::Remote);
        assert_eq!(choose_venue(1.5, 1.5), Venue::Remote);
        assert_eq!(choose_venue(-3.0, -2.0), Venue::Local);
    }

    #[test]
    fn test_rejects_mismatched_adapters() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Remote));
        let remote = Arc::new(ScriptedAdapter::new(Venue::Remote));
        let err =
            OffloadingController::new(&config(2), local, remote, Arc::new(NoopObserver)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_rejects_untrainable_capacity() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Local));
        let remote = Arc::new(ScriptedAdapter::new(Venue::Remote));
        let err =
            OffloadingController::new(&config(1), local, remote, Arc::new(NoopObserver)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_decide_requires_trained_predictors() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Local));
        let remote = Arc::new(ScriptedAdapter::new(Venue::Remote));
        let mut controller = controller_with(2, local, remote, Arc::new(NoopObserver));

        assert!(matches!(
            controller.decide(100),
            Err(Error::UntrainedPredictor(Venue::Local))
        ));

        seed(&mut controller, Venue::Local, &[(1.0, 100), (2.0, 200)]);
        controller.refit();
        assert!(matches!(
            controller.decide(100),
            Err(Error::UntrainedPredictor(Venue::Remote))
        ));
    }

    #[tokio::test]
    async fn test_warm_up_executes_both_venues() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Local).with_default_output("local text"));
        let remote = Arc::new(ScriptedAdapter::new(Venue::Remote).with_default_output("remote text"));
        let observer = Arc::new(RecordingObserver::default());
        let mut controller =
            controller_with(3, local.clone(), remote.clone(), observer.clone());

        let outcome = controller.handle(&[0u8; 64]).await.unwrap();

        assert_eq!(outcome.mode, Mode::WarmUp);
        assert_eq!(outcome.venue, Venue::Local);
        assert_eq!(outcome.output, "local text");
        assert!(outcome.decision.is_none());
        assert_eq!(outcome.shadow.as_ref().unwrap().output, "remote text");

        assert_eq!(local.calls(), 1);
        assert_eq!(remote.calls(), 1);
        assert_eq!(controller.history(Venue::Local).len(), 1);
        assert_eq!(controller.history(Venue::Remote).len(), 1);
        assert_eq!(controller.history(Venue::Local).newest().unwrap().size(), 64);
        assert_eq!(
            observer.records(),
            vec![(Venue::Local, 1), (Venue::Remote, 1)]
        );
        assert_eq!(controller.mode(), Mode::WarmUp);
    }

    #[tokio::test]
    async fn test_steady_state_scenario_chooses_remote() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Local));
        let remote = Arc::new(ScriptedAdapter::new(Venue::Remote).with_default_output("from cloud"));
        let observer = Arc::new(RecordingObserver::default());
        let mut controller =
            controller_with(2, local.clone(), remote.clone(), observer.clone());

        seed(&mut controller, Venue::Local, &[(1.0, 100), (2.0, 200)]);
        seed(&mut controller, Venue::Remote, &[(0.5, 100), (0.6, 200)]);
        assert_eq!(controller.mode(), Mode::Steady);

        let outcome = controller.handle(&[7u8; 300]).await.unwrap();

        let decision = outcome.decision.unwrap();
        assert!((decision.predicted_local - 3.0).abs() < 1e-9);
        assert!((decision.predicted_remote - 0.7).abs() < 1e-9);
        assert_eq!(decision.venue, Venue::Remote);
        assert_eq!(outcome.venue, Venue::Remote);
        assert_eq!(outcome.output, "from cloud");

        assert_eq!(local.calls(), 0);
        assert_eq!(remote.calls(), 1);

        let remote_history = controller.history(Venue::Remote).snapshot();
        assert_eq!(remote_history.len(), 2);
        assert_eq!(remote_history[0], Sample::new(0.6, 200));
        assert_eq!(remote_history[1].size(), 300);
        assert_eq!(
            controller.history(Venue::Local).snapshot(),
            vec![Sample::new(1.0, 100), Sample::new(2.0, 200)]
        );
        assert_eq!(observer.records(), vec![(Venue::Remote, 2)]);
    }

    #[tokio::test]
    async fn test_steady_state_chooses_strictly_faster_local() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Local));
        let remote = Arc::new(ScriptedAdapter::new(Venue::Remote));
        let mut controller =
            controller_with(2, local.clone(), remote.clone(), Arc::new(NoopObserver));

        seed(&mut controller, Venue::Local, &[(0.1, 100), (0.2, 200)]);
        seed(&mut controller, Venue::Remote, &[(1.0, 100), (1.0, 200)]);

        let outcome = controller.handle(&[0u8; 150]).await.unwrap();
        assert_eq!(outcome.venue, Venue::Local);
        assert_eq!(local.calls(), 1);
        assert_eq!(remote.calls(), 0);
        assert_eq!(controller.history(Venue::Local).oldest(), Some(&Sample::new(0.2, 200)));
    }

    #[tokio::test]
    async fn test_steady_state_tie_goes_remote() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Local));
        let remote = Arc::new(ScriptedAdapter::new(Venue::Remote));
        let mut controller =
            controller_with(2, local.clone(), remote.clone(), Arc::new(NoopObserver));

        seed(&mut controller, Venue::Local, &[(0.5, 10), (0.5, 20)]);
        seed(&mut controller, Venue::Remote, &[(0.5, 30), (0.5, 40)]);

        let outcome = controller.handle(&[0u8; 25]).await.unwrap();
        assert_eq!(outcome.venue, Venue::Remote);
        assert_eq!(local.calls(), 0);
    }

    #[tokio::test]
    async fn test_steady_state_remote_failure_records_nothing() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Local));
        let remote = Arc::new(
            ScriptedAdapter::new(Venue::Remote)
                .with_steps([ScriptStep::Fail("status 503 Service Unavailable".to_string())]),
        );
        let observer = Arc::new(RecordingObserver::default());
        let mut controller =
            controller_with(2, local.clone(), remote.clone(), observer.clone());

        seed(&mut controller, Venue::Local, &[(1.0, 100), (2.0, 200)]);
        seed(&mut controller, Venue::Remote, &[(0.5, 100), (0.6, 200)]);
        let local_before = controller.history(Venue::Local).snapshot();
        let remote_before = controller.history(Venue::Remote).snapshot();

        let err = controller.handle(&[0u8; 300]).await.unwrap_err();

        assert!(matches!(err, Error::RemoteExecution(_)));
        assert_eq!(local.calls(), 0, "no fallback to the other venue");
        assert_eq!(controller.history(Venue::Local).snapshot(), local_before);
        assert_eq!(controller.history(Venue::Remote).snapshot(), remote_before);
        assert!(observer.records().is_empty());
        assert_eq!(controller.mode(), Mode::Steady);
    }

    #[tokio::test]
    async fn test_warm_up_local_failure_still_records_remote() {
        let local = Arc::new(
            ScriptedAdapter::new(Venue::Local)
                .with_steps([ScriptStep::Fail("engine crashed".to_string())]),
        );
        let remote = Arc::new(ScriptedAdapter::new(Venue::Remote));
        let observer = Arc::new(RecordingObserver::default());
        let mut controller =
            controller_with(2, local.clone(), remote.clone(), observer.clone());

        let err = controller.handle(&[0u8; 10]).await.unwrap_err();

        assert!(matches!(err, Error::LocalExecution(_)));
        assert_eq!(remote.calls(), 1);
        assert_eq!(controller.history(Venue::Local).len(), 0);
        assert_eq!(controller.history(Venue::Remote).len(), 1);
        assert_eq!(observer.records(), vec![(Venue::Remote, 1)]);
        assert_eq!(controller.mode(), Mode::WarmUp);
    }

    #[tokio::test]
    async fn test_warm_up_remote_failure_returns_local_result() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Local).with_default_output("ok"));
        let remote = Arc::new(
            ScriptedAdapter::new(Venue::Remote)
                .with_steps([ScriptStep::Fail("connection refused".to_string())]),
        );
        let mut controller =
            controller_with(2, local.clone(), remote.clone(), Arc::new(NoopObserver));

        let outcome = controller.handle(&[0u8; 10]).await.unwrap();
        assert_eq!(outcome.output, "ok");
        assert!(outcome.shadow.is_none());
        assert_eq!(controller.history(Venue::Local).len(), 1);
        assert_eq!(controller.history(Venue::Remote).len(), 0);
    }

    #[tokio::test]
    async fn test_foreign_adapter_errors_are_venue_tagged() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Local));
        let remote = Arc::new(
            ScriptedAdapter::new(Venue::Remote)
                .with_steps([ScriptStep::Error(Error::transport("socket closed"))]),
        );
        let mut controller = controller_with(2, local, remote, Arc::new(NoopObserver));

        seed(&mut controller, Venue::Local, &[(1.0, 100), (2.0, 200)]);
        seed(&mut controller, Venue::Remote, &[(0.5, 100), (0.6, 200)]);

        let err = controller.handle(&[0u8; 300]).await.unwrap_err();
        assert!(matches!(err, Error::RemoteExecution(_)));
        assert!(err.to_string().contains("socket closed"));
    }

    #[tokio::test]
    async fn test_transition_to_steady_state_is_permanent() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Local));
        let remote = Arc::new(ScriptedAdapter::new(Venue::Remote));
        let mut controller =
            controller_with(3, local.clone(), remote.clone(), Arc::new(NoopObserver));

        for i in 0..3 {
            assert_eq!(controller.mode(), Mode::WarmUp);
            let outcome = controller.handle(&vec![0u8; 100 * (i + 1)]).await.unwrap();
            assert_eq!(outcome.mode, Mode::WarmUp);
        }
        assert_eq!(controller.mode(), Mode::Steady);
        assert_eq!(local.calls(), 3);
        assert_eq!(remote.calls(), 3);

        for i in 0..10 {
            let outcome = controller.handle(&vec![0u8; 50 * (i + 1)]).await.unwrap();
            assert_eq!(outcome.mode, Mode::Steady);
            assert!(outcome.decision.is_some());
            assert_eq!(controller.history(Venue::Local).len(), 3);
            assert_eq!(controller.history(Venue::Remote).len(), 3);
        }
        assert_eq!(local.calls() + remote.calls(), 16);
        assert_eq!(controller.requests(), 13);
    }

    #[tokio::test]
    async fn test_learns_to_prefer_faster_venue() {
        let local = Arc::new(MockAdapter::new(
            Venue::Local,
            MockAdapterConfig {
                base_latency: Duration::from_millis(40),
                ..Default::default()
            },
        ));
        let remote = Arc::new(MockAdapter::new(
            Venue::Remote,
            MockAdapterConfig {
                base_latency: Duration::from_millis(1),
                ..Default::default()
            },
        ));
        let mut controller = OffloadingController::new(
            &config(2),
            local.clone(),
            remote.clone(),
            Arc::new(NoopObserver),
        )
        .unwrap();

        controller.handle(&[0u8; 1000]).await.unwrap();
        controller.handle(&[0u8; 2000]).await.unwrap();
        assert_eq!(controller.mode(), Mode::Steady);

        let outcome = controller.handle(&[0u8; 1500]).await.unwrap();
        assert_eq!(outcome.venue, Venue::Remote);
        assert_eq!(local.calls(), 2);
    }

    #[tokio::test]
    async fn test_warm_up_exit_under_random_failures() {
        for seed_value in 0..16u64 {
            let mut rng = StdRng::seed_from_u64(seed_value);
            let capacity = rng.gen_range(2..6);
            let steps = |rng: &mut StdRng| -> Vec<ScriptStep> {
                (0..200)
                    .map(|i| {
                        if rng.gen_bool(0.3) {
                            ScriptStep::Fail(format!("injected failure {}", i))
                        } else {
                            ScriptStep::Succeed(format!("result {}", i))
                        }
                    })
                    .collect()
            };
            let local = Arc::new(ScriptedAdapter::new(Venue::Local).with_steps(steps(&mut rng)));
            let remote =
                Arc::new(ScriptedAdapter::new(Venue::Remote).with_steps(steps(&mut rng)));
            let mut controller =
                controller_with(capacity, local, remote, Arc::new(NoopObserver));

            let mut was_steady = false;
            let mut full = [false, false];
            for _ in 0..60 {
                let size = rng.gen_range(1..4096);
                let before = controller.mode();
                let result = controller.handle(&vec![0u8; size]).await;

                if let Ok(outcome) = &result {
                    assert_eq!(outcome.mode, before);
                }

                let local_len = controller.history(Venue::Local).len();
                let remote_len = controller.history(Venue::Remote).len();
                assert!(local_len <= capacity && remote_len <= capacity);

                let expected = if local_len == capacity && remote_len == capacity {
                    Mode::Steady
                } else {
                    Mode::WarmUp
                };
                assert_eq!(controller.mode(), expected);

                if was_steady {
                    assert_eq!(controller.mode(), Mode::Steady);
                }
                was_steady = controller.mode() == Mode::Steady;

                for (i, venue) in Venue::ALL.iter().enumerate() {
                    if full[i] {
                        assert!(controller.history(*venue).is_full());
                    }
                    full[i] = controller.history(*venue).is_full();
                }
            }
        }
    }

    #[test]
    fn test_snapshot() {
        let local = Arc::new(ScriptedAdapter::new(Venue::Local));
        let remote = Arc::new(ScriptedAdapter::new(Venue::Remote));
        let mut controller = controller_with(2, local, remote, Arc::new(NoopObserver));

        seed(&mut controller, Venue::Local, &[(1.0, 100), (2.0, 200)]);
        controller.refit();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.mode, Mode::WarmUp);
        assert_eq!(snapshot.capacity, 2);
        assert_eq!(snapshot.local.history_len, 2);
        assert!(snapshot.local.slope.is_some());
        assert_eq!(snapshot.remote.slope, None);
    }
}
