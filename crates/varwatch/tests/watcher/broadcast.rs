//! Broadcast channel tests.

use super::common::{dial, eventually, next_frame, start, ScriptedKernel, WAIT};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use varwatch::client::{subscribe, CommandClient, WatchEvent};
use varwatch::{frame, Command, Snapshot};

async fn next_snapshot(rx: &mut mpsc::Receiver<WatchEvent>) -> Snapshot {
    match timeout(WAIT, rx.recv()).await.expect("event in time") {
        Some(WatchEvent::Snapshot(snapshot)) => snapshot,
        other => panic!("expected snapshot, got {:?}", other),
    }
}

#[tokio::test]
async fn test_subscriber_receives_current_then_changed_namespace() {
    let kernel = ScriptedKernel::new();
    kernel.define("x", "int", "1");
    let daemon = start(kernel.clone(), Duration::from_millis(10)).await;

    let (tx, mut rx) = mpsc::channel(16);
    tokio::spawn(subscribe(daemon.broadcast, tx));

    let first = next_snapshot(&mut rx).await;
    assert_eq!(first.get("x").unwrap().value_preview, "1");

    kernel.define("y", "str", "hello");
    let second = next_snapshot(&mut rx).await;
    assert_eq!(second.len(), 2);
    assert_eq!(second.get("y").unwrap().type_tag, "str");

    daemon.gate.stop();
}

#[tokio::test]
async fn test_unchanged_namespace_is_not_pushed_again() {
    let kernel = ScriptedKernel::new();
    kernel.define("x", "int", "1");
    let daemon = start(kernel.clone(), Duration::from_millis(5)).await;

    let mut stream = dial(daemon.broadcast).await;
    let listing = next_frame(&mut stream).await;
    assert!(listing.contains("x   int   1"));

    let calls_before = kernel.snapshot_calls();
    let quiet = timeout(Duration::from_millis(200), frame::read_frame(&mut stream)).await;
    assert!(quiet.is_err(), "no push expected, got {:?}", quiet);
    assert!(kernel.snapshot_calls() > calls_before, "polling continued");

    daemon.gate.stop();
}

#[tokio::test]
async fn test_switch_forces_a_push_of_identical_listing() {
    let kernel = ScriptedKernel::new();
    kernel.define("x", "int", "1");
    let daemon = start(kernel, Duration::from_millis(5)).await;

    let mut stream = dial(daemon.broadcast).await;
    let before = next_frame(&mut stream).await;

    let mut client = CommandClient::connect(daemon.command).await.unwrap();
    client
        .send(&Command::SwitchKernel("kernel-other.json".to_string()))
        .await
        .unwrap();

    let after = next_frame(&mut stream).await;
    assert_eq!(before, after);

    daemon.gate.stop();
}

#[tokio::test]
async fn test_all_subscribers_get_each_push() {
    let kernel = ScriptedKernel::new();
    kernel.define("a", "int", "1");
    let daemon = start(kernel.clone(), Duration::from_millis(5)).await;

    let mut first = dial(daemon.broadcast).await;
    let mut second = dial(daemon.broadcast).await;
    next_frame(&mut first).await;
    next_frame(&mut second).await;

    kernel.define("a", "int", "2");
    assert!(next_frame(&mut first).await.contains("a   int   2"));
    assert!(next_frame(&mut second).await.contains("a   int   2"));

    daemon.gate.stop();
}

#[tokio::test]
async fn test_dropped_subscriber_is_removed() {
    let kernel = ScriptedKernel::new();
    kernel.define("x", "int", "1");
    let daemon = start(kernel.clone(), Duration::from_millis(5)).await;

    let mut stream = dial(daemon.broadcast).await;
    next_frame(&mut stream).await;
    let feed = daemon.feed.clone();
    assert_eq!(feed.subscriber_count(), 1);

    drop(stream);
    assert!(
        eventually(|| feed.subscriber_count() == 0).await,
        "subscriber should be removed after hangup"
    );

    // the daemon keeps serving new subscribers
    kernel.define("x", "int", "2");
    let mut again = dial(daemon.broadcast).await;
    assert!(next_frame(&mut again).await.contains("x   int   2"));

    daemon.gate.stop();
}
