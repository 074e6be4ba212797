//! Serves one session over framed stdio.
//!
//! A reader thread decodes client envelopes and forwards them to the main
//! thread, which owns the [`Session`] and runs the script. Envelopes for the
//! client go through a bounded queue drained by a writer thread. Widget updates
//! that arrive while a rerun is in flight cancel it; they are picked up by the
//! next rerun.

use crate::context::ScriptContext;
use crate::error::RerunError;
use crate::protocol::{
    ClientEnvelope, HostEnvelope, error_envelope, reader_loop, ready_envelope, writer_loop,
};
use crate::session::{CancelToken, RerunAborted, RerunOutcome, Session, SessionConfig};
use std::io;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

const DEFAULT_OUTBOUND_QUEUE_CAP: usize = 256;

pub trait App {
    fn script(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), RerunError>;
}

impl<F> App for F
where
    F: FnMut(&mut ScriptContext<'_>) -> Result<(), RerunError>,
{
    fn script(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), RerunError> {
        self(ctx)
    }
}

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub sid: String,
    pub outbound_queue_cap: usize,
    pub session: SessionConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sid: "S1".to_string(),
            outbound_queue_cap: DEFAULT_OUTBOUND_QUEUE_CAP,
            session: SessionConfig::default(),
        }
    }
}

impl HostConfig {
    /// Reads `WIDGET_HOST_SID` and `WIDGET_HOST_OUTBOUND_QUEUE_CAP`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let sid = lookup("WIDGET_HOST_SID")
            .filter(|sid| !sid.is_empty())
            .unwrap_or(defaults.sid);
        let outbound_queue_cap = lookup("WIDGET_HOST_OUTBOUND_QUEUE_CAP")
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.outbound_queue_cap);
        Self {
            sid,
            outbound_queue_cap,
            session: defaults.session,
        }
    }
}

pub fn run<A: App>(mut app: A, config: HostConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(config.session);
    let cancel = session.cancel_token();
    let queue_cap = config.outbound_queue_cap;
    let sid = config.sid;

    let (tx, rx) = mpsc::sync_channel(queue_cap);
    let (inbound_tx, inbound_rx) = mpsc::channel();

    let writer_handle = thread::spawn(move || writer_loop(rx));

    tx.send(ready_envelope(sid.clone()))
        .map_err(|_| "failed to queue ready envelope")?;

    let reader_tx = tx.clone();
    let reader_sid = sid.clone();
    let reader_cancel = cancel.clone();
    let reader_handle = thread::spawn(move || {
        let read_result = reader_loop(|decoded| match decoded {
            Ok(envelope) if envelope.sid() != reader_sid => {
                tracing::warn!(expected = %reader_sid, got = envelope.sid(), "sid mismatch; dropping envelope");
                enqueue_control_envelope(
                    reader_tx.clone(),
                    error_envelope(reader_sid.clone(), None, "sid_mismatch", "unknown session id"),
                    queue_cap,
                );
            }
            Ok(envelope) => {
                if matches!(envelope, ClientEnvelope::WidgetUpdates { .. }) {
                    reader_cancel.cancel();
                }
                if inbound_tx.send(envelope).is_err() {
                    tracing::warn!("session loop is gone; dropping client envelope");
                }
            }
            Err(err) => {
                tracing::warn!(%err, "undecodable client envelope");
                enqueue_control_envelope(
                    reader_tx.clone(),
                    error_envelope(reader_sid.clone(), None, "decode_error", err.to_string()),
                    queue_cap,
                );
            }
        });

        if let Err(err) = &read_result {
            tracing::error!(%err, "reader loop terminated with error");
        }
        read_result
    });

    serve(&mut session, &mut app, &cancel, &inbound_rx, &tx, &sid);
    tracing::info!(reruns = session.reruns(), "session loop stopped");

    drop(tx);

    // Avoid hanging process exit on a blocked stdio read or write during teardown.
    join_finished("reader", reader_handle);
    join_finished("writer", writer_handle);

    Ok(())
}

fn serve<A: App>(
    session: &mut Session,
    app: &mut A,
    cancel: &CancelToken,
    inbound: &Receiver<ClientEnvelope>,
    tx: &SyncSender<HostEnvelope>,
    sid: &str,
) {
    while let Ok(first) = inbound.recv() {
        let mut wants_rerun = false;
        for envelope in std::iter::once(first).chain(inbound.try_iter()) {
            match envelope {
                ClientEnvelope::WidgetUpdates { updates, .. } => {
                    for update in updates {
                        session.enqueue(update);
                    }
                    wants_rerun = true;
                }
                ClientEnvelope::Hello { .. } | ClientEnvelope::Rerun { .. } => wants_rerun = true,
            }
        }
        if !wants_rerun {
            continue;
        }

        // Cancels raised for envelopes drained above are already folded in.
        cancel.reset();
        let result = session.rerun(|ctx| app.script(ctx));
        for envelope in rerun_envelopes(sid, result) {
            if tx.send(envelope).is_err() {
                tracing::error!("writer is gone; stopping session loop");
                return;
            }
        }
    }
}

fn rerun_envelopes(sid: &str, result: Result<RerunOutcome, RerunAborted>) -> Vec<HostEnvelope> {
    match result {
        Ok(outcome) => vec![
            HostEnvelope::Delta {
                sid: sid.to_string(),
                rerun: outcome.rerun,
                complete: true,
                elements: outcome.elements,
            },
            HostEnvelope::RerunFinished {
                sid: sid.to_string(),
                rerun: outcome.rerun,
                pruned: outcome.pruned.len(),
            },
        ],
        Err(RerunAborted {
            rerun,
            error: RerunError::Cancelled,
            ..
        }) => {
            tracing::debug!(rerun, "rerun superseded; output dropped");
            Vec::new()
        }
        Err(aborted) => vec![
            HostEnvelope::Delta {
                sid: sid.to_string(),
                rerun: aborted.rerun,
                complete: false,
                elements: aborted.elements,
            },
            error_envelope(
                sid.to_string(),
                Some(aborted.rerun),
                aborted.error.code(),
                aborted.error.to_string(),
            ),
        ],
    }
}

fn join_finished(name: &str, handle: JoinHandle<io::Result<()>>) -> bool {
    if !handle.is_finished() {
        tracing::warn!(thread = name, "thread still active during shutdown; skipping join");
        return false;
    }
    match handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!(thread = name, %err, "thread returned error"),
        Err(err) => tracing::error!(thread = name, ?err, "thread join failed"),
    }
    true
}

fn enqueue_control_envelope(tx: SyncSender<HostEnvelope>, envelope: HostEnvelope, queue_capacity: usize) {
    match tx.try_send(envelope) {
        Ok(()) => {}
        Err(TrySendError::Full(envelope)) => {
            tracing::warn!(
                cap = queue_capacity,
                "outbound queue full; waiting to enqueue control envelope"
            );
            thread::spawn(move || {
                if tx.send(envelope).is_err() {
                    tracing::warn!("failed to enqueue control envelope");
                }
            });
        }
        Err(TrySendError::Disconnected(_envelope)) => {
            tracing::warn!("failed to enqueue control envelope");
        }
    }
}
