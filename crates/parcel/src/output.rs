use std::io::IsTerminal;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use parcel_transfer::{ReceiveSummary, SendSummary};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One line of output per finished transfer.
#[derive(Debug, Serialize)]
pub struct Receipt {
    pub event: &'static str,
    pub path: String,
    pub bytes: u64,
    pub chunks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,
    pub timestamp: String,
}

impl Receipt {
    pub fn sent(summary: &SendSummary, peer: &str) -> Self {
        Self {
            event: "sent",
            path: summary.remote_path.clone(),
            bytes: summary.bytes,
            chunks: summary.chunks,
            peer: Some(peer.to_string()),
            timestamp: now_unix_seconds(),
        }
    }

    pub fn received(summary: &ReceiveSummary, peer: Option<SocketAddr>) -> Self {
        Self {
            event: "received",
            path: summary.path.display().to_string(),
            bytes: summary.bytes,
            chunks: summary.chunks,
            peer: peer.map(|addr| addr.to_string()),
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_receipt(receipt: &Receipt, format: OutputFormat) {
    println!("{}", render_receipt(receipt, format));
}

fn render_receipt(receipt: &Receipt, format: OutputFormat) -> String {
    let peer = receipt.peer.as_deref().unwrap_or("-");
    match format {
        OutputFormat::Json => {
            serde_json::to_string(receipt).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "PATH", "BYTES", "CHUNKS", "PEER"])
                .add_row(vec![
                    receipt.event.to_string(),
                    receipt.path.clone(),
                    receipt.bytes.to_string(),
                    receipt.chunks.to_string(),
                    peer.to_string(),
                ]);
            table.to_string()
        }
        OutputFormat::Pretty => format!(
            "{} path={} bytes={} chunks={} peer={}",
            receipt.event, receipt.path, receipt.bytes, receipt.chunks, peer
        ),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
