use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parcel_frame::DEFAULT_MAX_PAYLOAD;
use parcel_transfer::{ReceiveOptions, ReceiveSummary, TransferError, TransferListener};
use tracing::{error, info, warn};

use crate::cmd::{parse_duration, ReceiveArgs};
use crate::exit::{transfer_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_receipt, OutputFormat, Receipt};

type Outcome = (u64, Option<SocketAddr>, Result<ReceiveSummary, TransferError>);

/// How often the final drain rechecks for Ctrl-C.
const DRAIN_POLL: Duration = Duration::from_millis(200);

/// Accept transfers until `--count` have finished or Ctrl-C.
///
/// Each connection is received on its own thread; receipts are printed as
/// transfers finish, in completion order. Peers are untrusted, so payloads
/// above [`DEFAULT_MAX_PAYLOAD`] are refused.
pub fn run(args: ReceiveArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = args.timeout.as_deref().map(parse_duration).transpose()?;
    let options = ReceiveOptions::default().with_max_payload_size(DEFAULT_MAX_PAYLOAD);
    let options = match &args.root {
        Some(root) => options.with_root(root),
        None => options,
    };

    let listener = TransferListener::bind(args.addr.as_str())
        .map_err(|err| transfer_error("bind failed", err))?
        .with_options(options)
        .with_read_timeout(timeout);
    info!(addr = %listener.local_addr(), "waiting for transfers");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), listener.local_addr())?;

    let (tx, rx) = mpsc::channel::<Outcome>();
    let mut tally = Tally::default();
    let mut accepted = 0usize;

    while running.load(Ordering::SeqCst) && args.count.is_none_or(|count| accepted < count) {
        let incoming = listener
            .accept()
            .map_err(|err| transfer_error("accept failed", err))?;
        if !running.load(Ordering::SeqCst) {
            break;
        }
        accepted += 1;

        let tx = tx.clone();
        thread::spawn(move || {
            let id = incoming.id();
            let peer = incoming.peer_addr();
            let _ = tx.send((id, peer, incoming.receive()));
        });

        while let Ok(outcome) = rx.try_recv() {
            tally.record(outcome, format);
        }
    }

    drop(tx);
    drain(&rx, accepted - tally.recorded, &running, &mut tally, format);

    Ok(tally.exit_code())
}

/// Wait for transfers still in flight. After Ctrl-C, stop waiting and
/// count whatever has not finished as failed.
fn drain(
    rx: &mpsc::Receiver<Outcome>,
    mut in_flight: usize,
    running: &AtomicBool,
    tally: &mut Tally,
    format: OutputFormat,
) {
    while in_flight > 0 {
        match rx.recv_timeout(DRAIN_POLL) {
            Ok(outcome) => {
                in_flight -= 1;
                tally.record(outcome, format);
            }
            Err(RecvTimeoutError::Timeout) if running.load(Ordering::SeqCst) => {}
            Err(RecvTimeoutError::Timeout) => {
                warn!(in_flight, "interrupted, abandoning unfinished transfers");
                tally.first_failure.get_or_insert(FAILURE);
                return;
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[derive(Default)]
struct Tally {
    recorded: usize,
    first_failure: Option<i32>,
}

impl Tally {
    fn record(&mut self, (id, peer, result): Outcome, format: OutputFormat) {
        self.recorded += 1;
        match result {
            Ok(summary) => print_receipt(&Receipt::received(&summary, peer), format),
            Err(err) => {
                let err = transfer_error("transfer failed", err);
                error!(id, peer = ?peer, "{err}");
                self.first_failure.get_or_insert(err.code);
            }
        }
    }

    fn exit_code(&self) -> i32 {
        self.first_failure.unwrap_or(SUCCESS)
    }
}

/// On Ctrl-C, stop accepting and unblock the pending `accept` with a
/// throwaway loopback connection.
fn install_ctrlc_handler(running: Arc<AtomicBool>, listen_addr: SocketAddr) -> CliResult<()> {
    let wake = wake_addr(listen_addr);
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        let _ = TcpStream::connect(wake);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn wake_addr(listen_addr: SocketAddr) -> SocketAddr {
    let ip = match listen_addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, listen_addr.port())
}
