//! Reconciliation tests against in-memory and state-file tables.

use std::sync::Arc;

use ipvsctl::apply::{AllowedActions, ApplyAction};
use ipvsctl::changeset::ChangeKind;
use ipvsctl::gateway::{fetch_current, Operation, StateFileGateway};
use ipvsctl::{ApplyEngine, ApplyOpts, Error, IpvsConfig};

mod common;

#[test]
fn test_apply_converges_and_is_idempotent() {
    let (gateway, engine) = common::engine();
    let target = common::model(common::WEB);

    let cs = engine
        .apply(&common::current(&gateway), &target, &ApplyOpts::default())
        .unwrap();
    assert_eq!(cs.count(ChangeKind::AddService), 2);
    assert_eq!(cs.count(ChangeKind::AddDestination), 0);

    let table = gateway.table();
    assert_eq!(table.entries.len(), 2);
    assert_eq!(table.entries[0].service.sched_name, "wrr");
    assert_eq!(table.entries[1].service.sched_name, "rr");
    assert_eq!(table.entries[0].destinations[1].weight, 20);

    let current = common::current(&gateway);
    let again = current.changeset(&target, false).unwrap();
    assert!(again.is_empty(), "unexpected items: {:?}", again);

    let before = gateway.stats().mutations();
    engine.apply(&current, &target, &ApplyOpts::default()).unwrap();
    assert_eq!(gateway.stats().mutations(), before);
}

#[test]
fn test_apply_reshapes_table() {
    let (gateway, engine) = common::engine();
    engine
        .apply(
            &IpvsConfig::default(),
            &common::model(common::WEB),
            &ApplyOpts::default(),
        )
        .unwrap();

    let next = common::model(
        r#"
services:
- address: tcp://10.1.0.1:80
  sched: wlc
  destinations:
  - address: 10.1.1.1:8080
    weight: 5
  - address: 10.1.1.3:8080
"#,
    );
    let cs = engine
        .apply(&common::current(&gateway), &next, &ApplyOpts::default())
        .unwrap();
    assert_eq!(cs.count(ChangeKind::DeleteService), 1);
    assert_eq!(cs.count(ChangeKind::UpdateService), 1);
    assert_eq!(cs.count(ChangeKind::DeleteDestination), 1);
    assert_eq!(cs.count(ChangeKind::AddDestination), 1);
    assert_eq!(cs.count(ChangeKind::UpdateDestination), 1);

    let table = gateway.table();
    assert_eq!(table.entries.len(), 1);
    assert_eq!(table.entries[0].service.sched_name, "wlc");
    let weights: Vec<u32> = table.entries[0].destinations.iter().map(|d| d.weight).collect();
    assert_eq!(weights, vec![5, 1]);

    assert!(common::current(&gateway)
        .changeset(&next, false)
        .unwrap()
        .is_empty());
}

#[test]
fn test_restricted_actions_leave_table_untouched() {
    let (gateway, engine) = common::engine();
    let opts = ApplyOpts {
        keep_weights: false,
        allowed_actions: AllowedActions::only([ApplyAction::UpdateDestination]),
    };

    let err = engine
        .apply(&IpvsConfig::default(), &common::model(common::WEB), &opts)
        .unwrap_err();
    assert!(matches!(err, Error::Apply { .. }));
    assert!(gateway.table().entries.is_empty());
    assert_eq!(gateway.stats().mutations(), 0);
}

#[test]
fn test_partial_failure_keeps_earlier_changes() {
    let (gateway, engine) = common::engine();
    gateway.fail_on(Some(Operation::CreateDestination));

    let err = engine
        .apply(
            &IpvsConfig::default(),
            &common::model(common::WEB),
            &ApplyOpts::default(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("unable to add new destination"));

    let table = gateway.table();
    assert_eq!(table.entries.len(), 1);
    assert!(table.entries[0].destinations.is_empty());
    let stats = gateway.stats();
    assert_eq!(stats.opens, stats.closes);
}

#[test]
fn test_state_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.json");
    let gateway = Arc::new(StateFileGateway::new(&path));
    let engine = ApplyEngine::new(gateway.clone());

    let target = common::model(common::WEB);
    let current = fetch_current(gateway.as_ref()).unwrap();
    assert!(current.services.is_empty());

    engine
        .apply(&current, &target, &ApplyOpts::default())
        .unwrap();
    assert!(path.exists());

    let reopened = StateFileGateway::new(&path);
    let current = fetch_current(&reopened).unwrap();
    assert_eq!(current.services.len(), 2);
    assert!(current.changeset(&target, false).unwrap().is_empty());
}

#[test]
fn test_corrupt_state_file_is_unavailable() {
    let file = common::temp_file("not json");
    let gateway = StateFileGateway::new(file.path());
    let err = fetch_current(&gateway).unwrap_err();
    assert!(matches!(err, Error::GatewayUnavailable(_)));
}

fn applied_web() -> (ipvsctl::gateway::MemoryGateway, ApplyEngine) {
    let (gateway, engine) = common::engine();
    engine
        .apply(
            &IpvsConfig::default(),
            &common::model(common::WEB),
            &ApplyOpts::default(),
        )
        .unwrap();
    (gateway, engine)
}

#[test]
fn test_keep_weights_preserves_live_weight() {
    let (gateway, engine) = applied_web();
    let opts = ApplyOpts {
        keep_weights: true,
        allowed_actions: AllowedActions::all(),
    };

    let reweighted = common::WEB.replace("weight: 10", "weight: 99");
    let before = gateway.stats().mutations();
    let cs = engine
        .apply(&common::current(&gateway), &common::model(&reweighted), &opts)
        .unwrap();
    assert!(cs.is_empty());
    assert_eq!(gateway.stats().mutations(), before);
    assert_eq!(gateway.table().entries[0].destinations[0].weight, 10);

    let retunneled = reweighted.replace(
        "  - address: 10.1.1.1:8080\n    weight: 99\n",
        "  - address: 10.1.1.1:8080\n    weight: 99\n    forward: tunnel\n",
    );
    let cs = engine
        .apply(&common::current(&gateway), &common::model(&retunneled), &opts)
        .unwrap();
    assert_eq!(cs.len(), 1);
    assert_eq!(cs.count(ChangeKind::UpdateDestination), 1);

    let live = &gateway.table().entries[0].destinations[0];
    assert_eq!(live.weight, 10);
    assert_eq!(live.connection_flags, 0x02);
}

#[test]
fn test_each_kind_is_denied_on_its_own() {
    let cases = [
        (
            ApplyAction::UpdateService,
            ChangeKind::UpdateService,
            common::WEB.replace(
                "- address: tcp://10.1.0.1:80\n",
                "- address: tcp://10.1.0.1:80\n  sched: wlc\n",
            ),
        ),
        (
            ApplyAction::DeleteService,
            ChangeKind::DeleteService,
            common::WEB
                .split("- address: udp://")
                .next()
                .unwrap_or_default()
                .to_string(),
        ),
        (
            ApplyAction::UpdateDestination,
            ChangeKind::UpdateDestination,
            common::WEB.replace("weight: 20", "weight: 21"),
        ),
        (
            ApplyAction::DeleteDestination,
            ChangeKind::DeleteDestination,
            common::WEB.replace("  - address: 10.1.1.2:8080\n    weight: 20\n", ""),
        ),
    ];

    for (denied, kind, yaml) in cases {
        let (gateway, engine) = applied_web();
        let target = common::model(&yaml);
        let current = common::current(&gateway);

        let cs = current.changeset(&target, false).unwrap();
        assert_eq!(cs.len(), 1, "{}", denied);
        assert_eq!(cs.count(kind), 1, "{}", denied);

        let opts = ApplyOpts {
            keep_weights: false,
            allowed_actions: AllowedActions::only(
                ApplyAction::ALL.into_iter().filter(|a| *a != denied),
            ),
        };
        let before = gateway.stats();
        let err = engine.apply(&current, &target, &opts).unwrap_err();
        assert!(matches!(err, Error::Apply { source: None, .. }), "{}", denied);

        let after = gateway.stats();
        assert_eq!(after.mutations(), before.mutations(), "{}", denied);
        assert_eq!(after.opens, after.closes);

        engine
            .apply(&current, &target, &ApplyOpts::default())
            .unwrap();
        assert!(common::current(&gateway)
            .changeset(&target, false)
            .unwrap()
            .is_empty());
    }
}
