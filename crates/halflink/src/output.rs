use std::io::{IsTerminal, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use halflink_engine::Message;
use halflink_frame::{type_name, PacketType};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
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
    packet_type: u8,
    name: &'a str,
    context: u8,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

pub fn print_message(message: &Message, format: OutputFormat) {
    let payload = message.payload.as_ref();
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                packet_type: message.packet_type.code(),
                name: type_name(message.packet_type),
                context: message.context,
                payload_size: payload.len(),
                payload: payload_preview(payload),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "CONTEXT", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    message.packet_type.to_string(),
                    message.context.to_string(),
                    payload.len().to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "type={} context={} size={} payload={}",
                message.packet_type,
                message.context,
                payload.len(),
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

#[derive(Serialize)]
struct PongOutput {
    seq: usize,
    context: u8,
    rtt_ms: u128,
}

pub fn print_pong(seq: usize, context: u8, rtt: Duration, format: OutputFormat) {
    let rtt_ms = rtt.as_millis();
    match format {
        OutputFormat::Json => print_json(&PongOutput {
            seq,
            context,
            rtt_ms,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["SEQ", "CONTEXT", "RTT"])
                .add_row(vec![
                    seq.to_string(),
                    context.to_string(),
                    format!("{rtt_ms}ms"),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!("pong seq={seq} context={context} time={rtt_ms}ms");
        }
    }
}

#[derive(Serialize)]
struct SentOutput<'a> {
    packet_type: u8,
    name: &'a str,
    context: u8,
    payload_size: usize,
    elapsed_ms: u128,
}

pub fn print_sent(
    packet_type: PacketType,
    context: u8,
    size: usize,
    elapsed: Duration,
    format: OutputFormat,
) {
    let elapsed_ms = elapsed.as_millis();
    match format {
        OutputFormat::Json => print_json(&SentOutput {
            packet_type: packet_type.code(),
            name: type_name(packet_type),
            context,
            payload_size: size,
            elapsed_ms,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["TYPE", "CONTEXT", "SIZE", "ELAPSED"])
                .add_row(vec![
                    packet_type.to_string(),
                    context.to_string(),
                    size.to_string(),
                    format!("{elapsed_ms}ms"),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("sent type={packet_type} context={context} size={size} time={elapsed_ms}ms");
        }
        // Raw output is reserved for payload bytes.
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
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
