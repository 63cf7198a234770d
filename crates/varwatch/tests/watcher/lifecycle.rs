//! Startup and shutdown tests.

use super::common::{dial, next_frame, start, ScriptedKernel, WAIT};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use varwatch::client::CommandClient;
use varwatch::daemon::WatcherServer;
use varwatch::frame;
use varwatch::{Command, DaemonConfig, Reply};

#[tokio::test]
async fn test_stop_command_shuts_daemon_down() {
    let daemon = start(ScriptedKernel::new(), Duration::from_millis(10)).await;
    let command_addr = daemon.command;
    let broadcast_addr = daemon.broadcast;

    let mut client = CommandClient::connect(command_addr).await.unwrap();
    let reply = client.send(&Command::Stop).await.unwrap();
    assert_eq!(reply, Some(Reply::Ok("stopping".to_string())));

    timeout(WAIT, daemon.task)
        .await
        .expect("daemon should stop in time")
        .expect("daemon task should not panic");

    assert!(TcpStream::connect(command_addr).await.is_err());
    assert!(TcpStream::connect(broadcast_addr).await.is_err());
}

#[tokio::test]
async fn test_stop_closes_open_subscribers() {
    let kernel = ScriptedKernel::new();
    kernel.define("x", "int", "1");
    let daemon = start(kernel, Duration::from_millis(10)).await;

    let mut subscriber = dial(daemon.broadcast).await;
    next_frame(&mut subscriber).await;

    daemon.gate.stop();
    let end = timeout(WAIT, frame::read_frame(&mut subscriber))
        .await
        .expect("subscriber should see the daemon go away");
    assert!(!matches!(end, Ok(Some(_))), "unexpected frame: {:?}", end);
}

#[tokio::test]
async fn test_bind_fails_when_port_is_taken() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let config = DaemonConfig {
        broadcast_port: 0,
        command_port: port,
        ..DaemonConfig::default()
    };
    let err = match WatcherServer::bind(&config, Box::new(ScriptedKernel::new())).await {
        Ok(_) => panic!("bind should fail on a taken port"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("command"), "{err}");
}
