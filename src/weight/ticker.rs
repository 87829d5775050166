//! Tick source feeding a weight ramp.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::lifecycle::ShutdownListener;
use crate::weight::controller::ControlCommand;

/// Send one `Advance` per second for `duration`, then `Finish`.
///
/// A stop request sends `Exit` instead. Returns early if the ramp has gone away.
pub async fn drive(
    tx: mpsc::Sender<ControlCommand>,
    duration: Duration,
    mut shutdown: ShutdownListener,
) {
    let ticks = duration.as_secs();
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    interval.tick().await;

    let mut sent = 0;
    while sent < ticks {
        tokio::select! {
            _ = interval.tick() => {
                sent += 1;
                tracing::trace!(tick = sent, of = ticks, "Advancing weight ramp");
                if tx.send(ControlCommand::Advance).await.is_err() {
                    tracing::debug!(tick = sent, "Weight ramp already ended, stopping ticks");
                    return;
                }
            }
            _ = shutdown.wait() => {
                tracing::debug!("Stop requested, cancelling weight ramp");
                if tx.send(ControlCommand::Exit).await.is_err() {
                    tracing::debug!("Weight ramp already ended, Exit dropped");
                }
                return;
            }
        }
    }

    if tx.send(ControlCommand::Finish).await.is_err() {
        tracing::debug!(ticks, "Weight ramp already ended, Finish dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::weight::controller::control_channel;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_then_finish() {
        let shutdown = Shutdown::new();
        let (tx, mut rx) = control_channel();
        let task = tokio::spawn(drive(tx, Duration::from_secs(3), shutdown.listener()));

        let mut received = Vec::new();
        while let Some(command) = rx.recv().await {
            received.push(command);
        }
        task.await.unwrap();

        assert_eq!(
            received,
            vec![
                ControlCommand::Advance,
                ControlCommand::Advance,
                ControlCommand::Advance,
                ControlCommand::Finish
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_sends_exit() {
        let shutdown = Shutdown::new();
        let (tx, mut rx) = control_channel();
        let task = tokio::spawn(drive(tx, Duration::from_secs(60), shutdown.listener()));

        assert_eq!(rx.recv().await, Some(ControlCommand::Advance));
        shutdown.trigger();

        let mut last = None;
        while let Some(command) = rx.recv().await {
            last = Some(command);
        }
        task.await.unwrap();
        assert_eq!(last, Some(ControlCommand::Exit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start_sends_exit() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let (tx, mut rx) = control_channel();
        drive(tx, Duration::from_secs(60), shutdown.listener()).await;

        assert_eq!(rx.recv().await, Some(ControlCommand::Exit));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_when_ramp_is_gone() {
        let shutdown = Shutdown::new();
        let (tx, rx) = control_channel();
        drop(rx);
        tokio::time::timeout(
            Duration::from_secs(5),
            drive(tx, Duration::from_secs(2), shutdown.listener()),
        )
        .await
        .unwrap();
    }
}
