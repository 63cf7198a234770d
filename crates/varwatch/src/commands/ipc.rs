//! Command channel request implementations.
//!
//! Handles one-shot client commands that talk to a running daemon:
//! - `exec` - Run a snippet in the watched kernel
//! - `switch` - Rebind the daemon to another kernel
//! - `stop` - Stop the daemon
//! - `ping` - Check the daemon accepts commands
//!
//! Also lists kernels on disk for `vw kernels`, which needs no daemon.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use varwatch::client::{ClientResult, CommandClient};
use varwatch::config::loader::parse_duration;
use varwatch::config::schema::Config;
use varwatch::kernel::{discovery, KernelInfo};
use varwatch::{Command, Reply, BIND_HOST};

/// Extra time allowed on top of the kernel timeout before giving up on a reply.
const REPLY_MARGIN: Duration = Duration::from_secs(5);

/// Sends `command` to the daemon's Command channel and prints the outcome.
pub(crate) fn run_ipc_command(config: &Config, command: Command) -> ExitCode {
    let addr = SocketAddr::from((BIND_HOST, config.daemon.command_port));
    let reply_timeout = parse_duration("kernel.timeout", &config.kernel.timeout)
        .map(|t| t + REPLY_MARGIN)
        .unwrap_or(varwatch::client::connection::DEFAULT_REPLY_TIMEOUT);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(send_command(addr, &command, reply_timeout));
    report(addr, result)
}

async fn send_command(
    addr: SocketAddr,
    command: &Command,
    reply_timeout: Duration,
) -> ClientResult<Option<Reply>> {
    let mut client = CommandClient::connect(addr)
        .await?
        .with_reply_timeout(reply_timeout);
    client.send(command).await
}

/// Prints a reply: `<ok>` text to stdout, `<error>` text to stderr.
fn report(addr: SocketAddr, result: ClientResult<Option<Reply>>) -> ExitCode {
    match result {
        Ok(Some(Reply::Ok(text))) => {
            let text = text.trim_end();
            if !text.is_empty() {
                println!("{}", text);
            }
            ExitCode::SUCCESS
        }
        Ok(Some(Reply::Error(message))) => {
            eprintln!("{}", message.trim_end());
            ExitCode::FAILURE
        }
        Ok(None) => {
            println!("daemon is reachable at {}", addr);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Lists kernels in the Jupyter runtime directory, newest first.
pub(crate) fn run_kernels_command() -> ExitCode {
    let Some(dir) = discovery::runtime_dir() else {
        eprintln!("Error: cannot determine the Jupyter runtime directory");
        return ExitCode::FAILURE;
    };
    match discovery::discover_kernels(&dir) {
        Ok(kernels) if kernels.is_empty() => {
            println!("No kernels found in {}", dir.display());
            ExitCode::SUCCESS
        }
        Ok(kernels) => {
            for kernel in &kernels {
                println!("{}", format_kernel_line(kernel));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", dir.display(), e);
            ExitCode::FAILURE
        }
    }
}

/// One line of `vw kernels` output: reference, kernel name, start time.
fn format_kernel_line(kernel: &KernelInfo) -> String {
    let started = kernel
        .modified
        .map(format_time)
        .unwrap_or_else(|| "-".to_string());
    format!("{:<40} {:<12} {}", kernel.reference, kernel.kernel_name, started)
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
