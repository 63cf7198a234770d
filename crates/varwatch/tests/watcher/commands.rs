//! Command channel tests.

use super::common::{dial, next_frame, start, ScriptedKernel};
use std::time::Duration;
use varwatch::client::CommandClient;
use varwatch::frame;
use varwatch::{Command, Reply};

#[tokio::test]
async fn test_execute_replies_with_kernel_output() {
    let daemon = start(ScriptedKernel::new(), Duration::from_millis(20)).await;
    let mut stream = dial(daemon.command).await;

    frame::write_frame(&mut stream, "<code>x = 1").await.unwrap();
    assert_eq!(next_frame(&mut stream).await, "<ok>out: x = 1");

    daemon.gate.stop();
}

#[tokio::test]
async fn test_execute_failure_replies_with_error() {
    let kernel = ScriptedKernel::new();
    kernel.fail_runs();
    let daemon = start(kernel, Duration::from_millis(20)).await;

    let mut client = CommandClient::connect(daemon.command).await.unwrap();
    let reply = client
        .send(&Command::ExecuteCode("y".to_string()))
        .await
        .unwrap();
    match reply {
        Some(Reply::Error(message)) => assert!(message.contains("NameError"), "{message}"),
        other => panic!("expected error reply, got {:?}", other),
    }

    daemon.gate.stop();
}

#[tokio::test]
async fn test_unknown_tag_is_ignored_and_connection_stays_open() {
    let daemon = start(ScriptedKernel::new(), Duration::from_millis(20)).await;
    let mut stream = dial(daemon.command).await;

    frame::write_frame(&mut stream, "<bogus>whatever").await.unwrap();
    frame::write_frame(&mut stream, "no tag at all").await.unwrap();
    frame::write_frame(&mut stream, "<code>after").await.unwrap();

    // the first reply on the wire belongs to the valid command
    assert_eq!(next_frame(&mut stream).await, "<ok>out: after");

    daemon.gate.stop();
}

#[tokio::test]
async fn test_ping_gets_no_reply() {
    let daemon = start(ScriptedKernel::new(), Duration::from_millis(20)).await;
    let mut stream = dial(daemon.command).await;

    frame::write_frame(&mut stream, "<TEST>").await.unwrap();
    frame::write_frame(&mut stream, "<code>1").await.unwrap();
    assert_eq!(next_frame(&mut stream).await, "<ok>out: 1");

    daemon.gate.stop();
}

#[tokio::test]
async fn test_several_commands_on_one_connection() {
    let daemon = start(ScriptedKernel::new(), Duration::from_millis(20)).await;
    let mut client = CommandClient::connect(daemon.command).await.unwrap();

    for i in 0..3 {
        let reply = client
            .send(&Command::ExecuteCode(format!("n = {i}")))
            .await
            .unwrap();
        assert_eq!(reply, Some(Reply::Ok(format!("out: n = {i}"))));
    }

    daemon.gate.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_kernel_never_sees_concurrent_calls() {
    let kernel = ScriptedKernel::new().slow(Duration::from_millis(15));
    let observer = kernel.clone();
    let daemon = start(kernel, Duration::from_millis(1)).await;

    let mut clients = Vec::new();
    for i in 0..6 {
        let addr = daemon.command;
        clients.push(tokio::spawn(async move {
            let mut client = CommandClient::connect(addr).await.unwrap();
            let command = if i % 3 == 0 {
                Command::SwitchKernel(format!("kernel-{i}.json"))
            } else {
                Command::ExecuteCode(format!("step {i}"))
            };
            client.send(&command).await.unwrap()
        }));
    }
    for client in clients {
        assert!(matches!(client.await.unwrap(), Some(Reply::Ok(_))));
    }

    assert!(observer.snapshot_calls() > 0, "poll loop should have run");
    assert_eq!(observer.peak_concurrency(), 1);

    daemon.gate.stop();
}
