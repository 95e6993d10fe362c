//! Debounced draft writer.
//!
//! A single worker thread owns the [`DraftStore`] and performs every write,
//! so saves and clears are applied in the order they were requested.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::DraftStore;

/// Quiet period before a scheduled draft is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

enum Command {
    Schedule(String),
    Cancel,
    Clear(Sender<()>),
    Flush(Sender<()>),
    Shutdown,
}

/// Handle to the background writer.
///
/// Dropping the handle writes any pending draft and stops the worker.
pub struct DraftWriter {
    tx: Sender<Command>,
    worker: Option<JoinHandle<()>>,
    window: Duration,
}

impl DraftWriter {
    /// Start a writer that owns `store`.
    pub fn spawn(store: Box<dyn DraftStore>, window: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("draft-writer".into())
            .spawn(move || run(store, window, rx))
            .map_err(|e| tracing::error!(error = %e, "failed to start draft writer"))
            .ok();

        Self { tx, worker, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replace the pending draft and restart the quiet period.
    pub fn schedule(&self, payload: String) {
        self.send(Command::Schedule(payload));
    }

    /// Drop the pending draft without writing it.
    pub fn cancel(&self) {
        self.send(Command::Cancel);
    }

    /// Drop the pending draft and remove the stored one. Returns once the
    /// store no longer holds a draft.
    pub fn clear(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(Command::Clear(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        } else {
            tracing::warn!("draft writer stopped, draft not cleared");
        }
    }

    /// Write the pending draft now and wait until the store has it.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            tracing::warn!("draft writer stopped, change not persisted");
        }
    }
}

impl Drop for DraftWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run(mut store: Box<dyn DraftStore>, window: Duration, rx: Receiver<Command>) {
    let mut pending: Option<String> = None;
    let mut deadline = Instant::now();

    loop {
        let command = if pending.is_some() {
            let now = Instant::now();
            if now >= deadline {
                write(store.as_mut(), pending.take());
                continue;
            }
            match rx.recv_timeout(deadline - now) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => {
                    write(store.as_mut(), pending.take());
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => Command::Shutdown,
            }
        } else {
            match rx.recv() {
                Ok(command) => command,
                Err(_) => return,
            }
        };

        match command {
            Command::Schedule(payload) => {
                pending = Some(payload);
                deadline = Instant::now() + window;
            }
            Command::Cancel => {
                pending = None;
            }
            Command::Clear(ack) => {
                pending = None;
                match store.clear() {
                    Ok(()) => tracing::debug!("draft cleared"),
                    Err(e) => tracing::warn!(error = %e, "failed to clear draft"),
                }
                let _ = ack.send(());
            }
            Command::Flush(ack) => {
                write(store.as_mut(), pending.take());
                let _ = ack.send(());
            }
            Command::Shutdown => {
                write(store.as_mut(), pending.take());
                return;
            }
        }
    }
}

/// Failed writes are dropped; the session keeps running in memory.
fn write(store: &mut dyn DraftStore, payload: Option<String>) {
    let Some(payload) = payload else {
        return;
    };
    match store.save(&payload) {
        Ok(()) => tracing::debug!(bytes = payload.len(), "draft saved"),
        Err(e) => tracing::warn!(error = %e, "draft save failed, keeping session in memory"),
    }
}
