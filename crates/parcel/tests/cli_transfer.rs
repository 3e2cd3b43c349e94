#![cfg(feature = "cli")]

use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;

use parcel_transport::TcpEndpoint;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "parcel-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn free_local_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("ephemeral port should bind");
    let addr = listener.local_addr().expect("bound listener has an address");
    addr.to_string()
}

/// Start `parcel receive` on an ephemeral port and return it with the bound
/// address, read from the receiver's own startup log line.
fn spawn_receiver(root: &Path) -> (Child, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_parcel"))
        .args(["--log-level", "info", "--format", "json", "receive", "127.0.0.1:0"])
        .arg("--root")
        .arg(root)
        .args(["--count", "1", "--timeout", "10s"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("receive command should start");

    let stderr = child.stderr.take().expect("stderr should be piped");
    let mut lines = BufReader::new(stderr).lines();
    let addr = loop {
        let line = lines
            .next()
            .expect("receiver exited before listening")
            .expect("stderr should be readable");
        if line.contains("waiting for transfers") {
            if let Some(addr) = line.split_whitespace().find_map(|t| t.strip_prefix("addr=")) {
                break addr.to_string();
            }
        }
    };

    // Keep the pipe drained so logging never blocks the receiver.
    thread::spawn(move || lines.for_each(drop));
    (child, addr)
}

fn run_parcel(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_parcel"))
        .args(args)
        .output()
        .expect("parcel should run")
}

#[test]
fn send_and_receive_file_between_processes() {
    let dir = unique_temp_dir("e2e");
    let inbox = dir.join("inbox");
    let source = dir.join("a.bin");
    let content: Vec<u8> = (0..3000u32).map(|i| (i % 241) as u8).collect();
    std::fs::write(&source, &content).expect("source should be writable");

    let (receiver, addr) = spawn_receiver(&inbox);

    let sent = run_parcel(&[
        "--log-level",
        "error",
        "--format",
        "json",
        "send",
        &addr,
        source.to_str().expect("utf-8 temp path"),
        "--remote",
        "b.bin",
    ]);
    assert!(sent.status.success(), "send failed: {sent:?}");
    let sent_json: serde_json::Value =
        serde_json::from_slice(&sent.stdout).expect("send receipt should be json");
    assert_eq!(sent_json["event"], "sent");
    assert_eq!(sent_json["bytes"], 3000);

    let received = receiver
        .wait_with_output()
        .expect("receiver should exit after one transfer");
    assert!(received.status.success(), "receive failed: {received:?}");
    let received_json: serde_json::Value =
        serde_json::from_slice(&received.stdout).expect("receive receipt should be json");
    assert_eq!(received_json["event"], "received");
    assert_eq!(received_json["chunks"], 3);

    assert_eq!(
        std::fs::read(inbox.join("b.bin")).expect("copy should exist"),
        content
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn receiver_rejects_non_directive_with_data_invalid() {
    let dir = unique_temp_dir("hello");
    let inbox = dir.join("inbox");

    let (receiver, addr) = spawn_receiver(&inbox);

    let mut stream = TcpEndpoint::connect(addr.as_str()).expect("receiver should accept");
    parcel_frame::send_payload(&mut stream, b"HELLO").expect("payload should send");
    drop(stream);

    let output = receiver
        .wait_with_output()
        .expect("receiver should exit after one transfer");
    assert_eq!(output.status.code(), Some(60));
    assert!(output.stdout.is_empty());
    assert!(!inbox.exists() || std::fs::read_dir(&inbox).unwrap().count() == 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_to_closed_port_fails_with_transport_error() {
    let dir = unique_temp_dir("refused");
    let source = dir.join("a.bin");
    std::fs::write(&source, b"data").expect("source should be writable");

    let addr = free_local_addr();
    let output = run_parcel(&[
        "--log-level",
        "error",
        "send",
        &addr,
        source.to_str().expect("utf-8 temp path"),
        "--timeout",
        "2s",
    ]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("send failed"), "stderr: {stderr}");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_wire_constants() {
    let output = run_parcel(&["version", "--extended"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wire: header=16 packet=1040 packet_data=1024"));
}
