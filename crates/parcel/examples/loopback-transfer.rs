//! Send a file to a receiver on a loopback TCP port within one process.
//!
//! Run with:
//!   cargo run --example loopback-transfer -- path/to/file
//!
//! The copy lands in a temp directory whose path is printed on exit.

use std::path::Path;
use std::thread;

use parcel::transfer::{send_file_to, ReceiveOptions, TransferListener};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let source = std::env::args()
        .nth(1)
        .ok_or("usage: loopback-transfer <FILE>")?;

    let inbox = std::env::temp_dir().join(format!("parcel-loopback-{}", std::process::id()));
    let listener = TransferListener::bind("127.0.0.1:0")?
        .with_options(ReceiveOptions::default().with_root(&inbox));
    let addr = listener.local_addr();
    eprintln!("Listening on {addr}");

    let receiver =
        thread::spawn(move || listener.accept().and_then(|incoming| incoming.receive()));

    let sent = send_file_to(addr, Path::new(&source), "copy.bin", None)?;
    eprintln!("Sent {} bytes in {} chunks", sent.bytes, sent.chunks);

    let received = receiver.join().map_err(|_| "receiver thread panicked")??;
    eprintln!(
        "Saved {} bytes to {}",
        received.bytes,
        received.path.display()
    );
    Ok(())
}
