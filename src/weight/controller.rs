//! Continuous weight transition of a single destination.
//!
//! # Responsibilities
//! - Move one destination's weight linearly from its current value to a target
//!   value over a time window
//! - React to one command per receive: advance, finish or exit
//!
//! # Data Flow
//! ```text
//! ticker ──Advance──► mpsc(1) ──► WeightRamp::run ──► one-item change set ──► ApplyEngine
//!        ──Finish───►                   │
//!        ──Exit─────►                   └──► RampState::{Finished, Cancelled}
//! ```
//!
//! # Design Decisions
//! - The only suspension point is the channel receive; each step is synchronous
//! - No internal timeout: the command source decides when the ramp ends
//! - A closed channel ends the ramp as if `Exit` had been sent

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::apply::ApplyEngine;
use crate::error::Result;
use crate::model::types::IpvsConfig;
use crate::weight::set::WeightTarget;

/// Commands accepted by a running ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Recompute the weight for the time elapsed so far and apply it.
    Advance,
    /// Apply the target weight and stop.
    Finish,
    /// Stop without a final update.
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampState {
    Idle,
    Running,
    Finished,
    Cancelled,
}

/// Create the single-slot control channel.
pub fn control_channel() -> (mpsc::Sender<ControlCommand>, mpsc::Receiver<ControlCommand>) {
    mpsc::channel(1)
}

/// Linear interpolation between `from` and `to`, truncated toward zero.
pub fn interpolate_weight(from: i32, to: i32, fraction: f64) -> i32 {
    let fraction = fraction.clamp(0.0, 1.0);
    (f64::from(from) + f64::from(to - from) * fraction) as i32
}

/// Drain/ramp state machine for one destination.
pub struct WeightRamp {
    engine: ApplyEngine,
    current: IpvsConfig,
    target: WeightTarget,
    from_weight: i32,
    to_weight: i32,
    duration: Duration,
    state: RampState,
}

impl WeightRamp {
    /// Locate the destination in `current`. Fails with `Error::Set` if it is missing.
    pub fn new(
        engine: ApplyEngine,
        current: IpvsConfig,
        service: &str,
        destination: &str,
        to_weight: i32,
        duration: Duration,
    ) -> Result<Self> {
        let target = WeightTarget::locate(&current, service, destination)?;
        let from_weight = target.current_weight(&current);
        Ok(Self {
            engine,
            current,
            target,
            from_weight,
            to_weight,
            duration,
            state: RampState::Idle,
        })
    }

    pub fn state(&self) -> RampState {
        self.state
    }

    pub fn from_weight(&self) -> i32 {
        self.from_weight
    }

    pub fn to_weight(&self) -> i32 {
        self.to_weight
    }

    /// True if the window is too short to ramp and one direct set is made instead.
    pub fn is_immediate(&self) -> bool {
        self.duration <= Duration::from_secs(1)
    }

    fn set(&self, weight: i32) -> Result<()> {
        self.target.apply(&self.engine, &self.current, weight)
    }

    /// Consume commands until a terminal state is reached.
    pub async fn run(&mut self, rx: &mut mpsc::Receiver<ControlCommand>) -> Result<RampState> {
        if self.is_immediate() {
            self.set(self.to_weight)?;
            tracing::info!(weight = self.to_weight, "Updated weight");
            self.state = RampState::Finished;
            return Ok(self.state);
        }

        self.state = RampState::Running;
        let start = Instant::now();
        tracing::debug!(
            from = self.from_weight,
            to = self.to_weight,
            secs = self.duration.as_secs(),
            "Weight ramp started"
        );

        loop {
            let command = match rx.recv().await {
                Some(command) => command,
                None => {
                    tracing::debug!("Control channel closed");
                    ControlCommand::Exit
                }
            };

            match command {
                ControlCommand::Exit => {
                    self.state = RampState::Cancelled;
                    return Ok(self.state);
                }
                ControlCommand::Finish => {
                    self.set(self.to_weight)?;
                    tracing::info!(
                        "Updated weight to {} for {}/{}",
                        self.to_weight,
                        self.target.service.address,
                        self.target.destination.address
                    );
                    self.state = RampState::Finished;
                    return Ok(self.state);
                }
                ControlCommand::Advance => {
                    let elapsed = start.elapsed();
                    if elapsed.is_zero() {
                        continue;
                    }
                    let fraction = (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0);
                    let weight = interpolate_weight(self.from_weight, self.to_weight, fraction);
                    tracing::trace!(elapsed = ?elapsed, fraction, weight, "Calculated weight");

                    self.set(weight)?;
                    tracing::info!(weight, elapsed_pct = (fraction * 100.0) as u32, "Updated weight");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::ApplyOpts;
    use crate::error::Error;
    use crate::gateway::{fetch_current, MemoryGateway, Operation};
    use std::sync::Arc;

    const SERVICE: &str = "tcp://10.0.0.1:80";
    const DESTINATION: &str = "10.0.0.2:8080";

    fn setup(weight: i32) -> (MemoryGateway, ApplyEngine, IpvsConfig) {
        let gateway = MemoryGateway::new();
        let engine = ApplyEngine::new(Arc::new(gateway.clone()));
        let model = IpvsConfig::from_yaml(&format!(
            "services:\n- address: {}\n  destinations:\n  - address: {}\n    weight: {}\n",
            SERVICE, DESTINATION, weight
        ))
        .unwrap();
        engine
            .apply(&IpvsConfig::default(), &model, &ApplyOpts::default())
            .unwrap();
        let current = fetch_current(&gateway).unwrap();
        (gateway, engine, current)
    }

    fn live_weight(gateway: &MemoryGateway) -> u32 {
        gateway.table().entries[0].destinations[0].weight
    }

    #[test]
    fn test_interpolate_weight() {
        assert_eq!(interpolate_weight(0, 1000, 0.5), 500);
        assert_eq!(interpolate_weight(1000, 0, 0.25), 750);
        assert_eq!(interpolate_weight(10, 20, 2.0), 20);
        assert_eq!(interpolate_weight(0, 3, 0.5), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ramp_up_and_finish() {
        let (gateway, engine, current) = setup(0);
        let mut ramp =
            WeightRamp::new(engine, current, SERVICE, DESTINATION, 1000, Duration::from_secs(10))
                .unwrap();
        assert_eq!(ramp.state(), RampState::Idle);
        assert_eq!(ramp.from_weight(), 0);

        let (tx, mut rx) = control_channel();
        let task = tokio::spawn(async move {
            let state = ramp.run(&mut rx).await;
            (ramp, state)
        });

        tokio::time::advance(Duration::from_secs(5)).await;
        tx.send(ControlCommand::Advance).await.unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;

        tx.send(ControlCommand::Finish).await.unwrap();
        let (ramp, state) = task.await.unwrap();
        assert_eq!(state.unwrap(), RampState::Finished);
        assert_eq!(ramp.state(), RampState::Finished);
        assert_eq!(live_weight(&gateway), 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_midpoint_weight() {
        let (gateway, engine, current) = setup(0);
        let mut ramp =
            WeightRamp::new(engine, current, SERVICE, DESTINATION, 1000, Duration::from_secs(10))
                .unwrap();

        let (tx, mut rx) = control_channel();
        let task = tokio::spawn(async move { ramp.run(&mut rx).await });
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(5)).await;
        tx.send(ControlCommand::Advance).await.unwrap();
        // capacity 1: this send completes only once Advance was taken off the channel
        tx.send(ControlCommand::Exit).await.unwrap();

        assert_eq!(task.await.unwrap().unwrap(), RampState::Cancelled);
        assert_eq!(live_weight(&gateway), 500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_cancels_without_update() {
        let (gateway, engine, current) = setup(40);
        let mut ramp =
            WeightRamp::new(engine, current, SERVICE, DESTINATION, 0, Duration::from_secs(30))
                .unwrap();
        let mutations = gateway.stats().mutations();

        let (tx, mut rx) = control_channel();
        tx.send(ControlCommand::Exit).await.unwrap();
        assert_eq!(ramp.run(&mut rx).await.unwrap(), RampState::Cancelled);
        assert_eq!(gateway.stats().mutations(), mutations);
        assert_eq!(live_weight(&gateway), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_duration_sets_immediately() {
        let (gateway, engine, current) = setup(40);
        let mut ramp =
            WeightRamp::new(engine, current, SERVICE, DESTINATION, 7, Duration::from_secs(1))
                .unwrap();
        assert!(ramp.is_immediate());

        let (_tx, mut rx) = control_channel();
        assert_eq!(ramp.run(&mut rx).await.unwrap(), RampState::Finished);
        assert_eq!(live_weight(&gateway), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_step_halts() {
        let (gateway, engine, current) = setup(0);
        let mut ramp =
            WeightRamp::new(engine, current, SERVICE, DESTINATION, 100, Duration::from_secs(10))
                .unwrap();
        gateway.fail_on(Some(Operation::UpdateDestination));

        let (tx, mut rx) = control_channel();
        let task = tokio::spawn(async move {
            let result = ramp.run(&mut rx).await;
            (ramp.state(), result)
        });
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        tx.send(ControlCommand::Advance).await.unwrap();

        let (state, result) = task.await.unwrap();
        assert!(matches!(result, Err(Error::Apply { .. })));
        assert_eq!(state, RampState::Running);
    }

    #[test]
    fn test_missing_destination() {
        let (_, engine, current) = setup(0);
        assert!(matches!(
            WeightRamp::new(engine, current, SERVICE, "10.0.0.9:8080", 5, Duration::from_secs(5)),
            Err(Error::Set(_))
        ));
    }
}
