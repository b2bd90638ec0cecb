use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use relaymq_wire::{Message, Stat};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
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

#[derive(Serialize)]
struct MessageOutput<'a> {
    destination: &'a str,
    payload_size: usize,
    payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    timestamp: String,
}

pub fn print_message(msg: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                destination: &msg.destination,
                payload_size: msg.payload.len(),
                payload: payload_preview(msg.payload.as_ref()),
                id: msg.id,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DESTINATION", "SIZE", "ID", "PAYLOAD"])
                .add_row(vec![
                    msg.destination.clone(),
                    msg.payload.len().to_string(),
                    msg.id.map(|id| id.to_string()).unwrap_or_default(),
                    payload_preview(msg.payload.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "destination={} size={} id={} payload={}",
                msg.destination,
                msg.payload.len(),
                msg.id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                payload_preview(msg.payload.as_ref())
            );
        }
        OutputFormat::Raw => {
            print_raw(msg.payload.as_ref());
        }
    }
}

#[derive(Serialize)]
struct StatOutput<'a> {
    name: &'a str,
    exists: bool,
    transient_size: u32,
    durable_size: u32,
    size: u64,
}

pub fn print_stat(stat: &Stat, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = StatOutput {
                name: &stat.name,
                exists: stat.exists,
                transient_size: stat.transient_size.unwrap_or(0),
                durable_size: stat.durable_size.unwrap_or(0),
                size: stat.size(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "EXISTS", "TRANSIENT", "DURABLE", "SIZE"])
                .add_row(vec![
                    stat.name.clone(),
                    stat.exists.to_string(),
                    stat.transient_size.unwrap_or(0).to_string(),
                    stat.durable_size.unwrap_or(0).to_string(),
                    stat.size().to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!(
                "name={} exists={} transient={} durable={} size={}",
                stat.name,
                stat.exists,
                stat.transient_size.unwrap_or(0),
                stat.durable_size.unwrap_or(0),
                stat.size()
            );
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
