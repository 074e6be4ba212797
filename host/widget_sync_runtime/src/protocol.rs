use crate::elements::ElementDescription;
use crate::store::PendingUpdate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, Read, Write};
use std::sync::mpsc::Receiver;

pub const CLIENT_TO_HOST_CAP: usize = 65_536;
pub const HOST_TO_CLIENT_CAP: usize = 1_048_576;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "t")]
pub enum ClientEnvelope {
    #[serde(rename = "hello")]
    Hello { sid: String },

    #[serde(rename = "widget_updates")]
    WidgetUpdates {
        sid: String,
        updates: Vec<PendingUpdate>,
    },

    #[serde(rename = "rerun")]
    Rerun { sid: String },
}

impl ClientEnvelope {
    pub fn sid(&self) -> &str {
        match self {
            ClientEnvelope::Hello { sid }
            | ClientEnvelope::WidgetUpdates { sid, .. }
            | ClientEnvelope::Rerun { sid } => sid,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "t")]
pub enum HostEnvelope {
    #[serde(rename = "ready")]
    Ready { sid: String, capabilities: Value },

    #[serde(rename = "delta")]
    Delta {
        sid: String,
        rerun: u64,
        complete: bool,
        elements: Vec<ElementDescription>,
    },

    #[serde(rename = "rerun_finished")]
    RerunFinished { sid: String, rerun: u64, pruned: usize },

    #[serde(rename = "error")]
    Error {
        sid: String,
        rerun: Option<u64>,
        code: String,
        message: String,
    },
}

pub fn ready_envelope(sid: String) -> HostEnvelope {
    HostEnvelope::Ready {
        sid,
        capabilities: serde_json::json!({
            "widgets": ["button", "keypress", "download_button", "checkbox",
                        "text_input", "number_input", "selectbox", "form_submit_button"],
            "transport": "stdio-packet-4"
        }),
    }
}

pub fn error_envelope(
    sid: String,
    rerun: Option<u64>,
    code: impl Into<String>,
    message: impl Into<String>,
) -> HostEnvelope {
    HostEnvelope::Error {
        sid,
        rerun,
        code: code.into(),
        message: message.into(),
    }
}

pub fn writer_loop(rx: Receiver<HostEnvelope>) -> io::Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    for envelope in rx {
        let payload = serde_json::to_vec(&envelope).map_err(json_error)?;
        write_frame(&mut writer, &payload, HOST_TO_CLIENT_CAP)?;
        writer.flush()?;
    }

    Ok(())
}

/// Reads client envelopes from stdin until EOF. Undecodable frames are handed
/// to `on_envelope` as errors and reading continues.
pub fn reader_loop<F>(mut on_envelope: F) -> io::Result<()>
where
    F: FnMut(Result<ClientEnvelope, serde_json::Error>),
{
    let stdin = io::stdin();
    let mut reader = stdin.lock();

    loop {
        match read_frame(&mut reader, CLIENT_TO_HOST_CAP) {
            Ok(payload) => on_envelope(serde_json::from_slice(&payload)),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}

pub fn read_frame(reader: &mut impl Read, max_payload: usize) -> io::Result<Vec<u8>> {
    let mut header = [0_u8; 4];
    reader.read_exact(&mut header)?;

    let len = u32::from_be_bytes(header) as usize;
    if len > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} > {max_payload}"),
        ));
    }

    let mut payload = vec![0_u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

pub fn write_frame(writer: &mut impl Write, payload: &[u8], max_payload: usize) -> io::Result<()> {
    if payload.len() > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {} > {}", payload.len(), max_payload),
        ));
    }

    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "payload exceeds u32"))?;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    Ok(())
}

fn json_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}
