//! Weight ramps driven by the ticker under paused time.

use std::time::Duration;

use ipvsctl::gateway::Operation;
use ipvsctl::weight::{control_channel, ticker, RampState, WeightRamp};
use ipvsctl::Shutdown;

mod common;

const MODEL: &str = "services:\n- address: tcp://10.2.0.1:443\n  destinations:\n  - address: 10.2.0.2:443\n    weight: 0\n";

fn updates(gateway: &ipvsctl::gateway::MemoryGateway) -> usize {
    gateway
        .stats()
        .calls
        .iter()
        .filter(|op| **op == Operation::UpdateDestination)
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_ticker_drives_ramp_to_target() {
    let (gateway, engine) = common::engine();
    engine
        .apply(
            &common::current(&gateway),
            &common::model(MODEL),
            &Default::default(),
        )
        .unwrap();

    let duration = Duration::from_secs(3);
    let mut ramp = WeightRamp::new(
        engine,
        common::current(&gateway),
        "tcp://10.2.0.1:443",
        "10.2.0.2:443",
        300,
        duration,
    )
    .unwrap();

    let shutdown = Shutdown::new();
    let (tx, mut rx) = control_channel();
    let driver = tokio::spawn(ticker::drive(tx, duration, shutdown.listener()));

    let state = ramp.run(&mut rx).await.unwrap();
    driver.await.unwrap();

    assert_eq!(state, RampState::Finished);
    assert_eq!(gateway.table().entries[0].destinations[0].weight, 300);
    // one step per second plus the final one
    assert_eq!(updates(&gateway), 4);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_ramp() {
    let (gateway, engine) = common::engine();
    engine
        .apply(
            &common::current(&gateway),
            &common::model(MODEL),
            &Default::default(),
        )
        .unwrap();

    let duration = Duration::from_secs(60);
    let mut ramp = WeightRamp::new(
        engine,
        common::current(&gateway),
        "tcp://10.2.0.1:443",
        "10.2.0.2:443",
        600,
        duration,
    )
    .unwrap();

    let shutdown = Shutdown::new();
    let (tx, mut rx) = control_channel();
    let driver = tokio::spawn(ticker::drive(tx, duration, shutdown.listener()));

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        trigger.trigger();
    });

    let state = ramp.run(&mut rx).await.unwrap();
    driver.await.unwrap();

    assert_eq!(state, RampState::Cancelled);
    assert_eq!(updates(&gateway), 2);
    assert_eq!(gateway.table().entries[0].destinations[0].weight, 20);
}
