//! The dedicated send-queue worker: a background task owns an `mpsc` receiver and
//! processes submitted work in order, replacing a self-pipe pinger with a direct
//! channel wakeup.
//!
//! The "work" here is per-connection byte backlogs that couldn't be written directly
//! because the socket wasn't writable or another backlog was already draining; the
//! worker multiplexes waiting for more commands against waiting for any queued
//! connection's write half to become writable.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use crate::connection::{ConnectionId, ConnectionShared};

enum Command {
    Enqueue { id: ConnectionId, shared: Arc<ConnectionShared>, bytes: Vec<u8> },
    Kill { id: ConnectionId },
}

/// Handle used by connections to hand off backlog bytes; the actual draining happens
/// on a separate spawned task.
pub struct DeferredSender {
    sender: tokio::sync::mpsc::UnboundedSender<Command>,
    sending: Arc<AtomicBool>,
}

impl DeferredSender {
    pub fn spawn() -> Arc<DeferredSender> {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        let sending = Arc::new(AtomicBool::new(false));
        tokio::spawn(run(receiver, sending.clone()));
        Arc::new(DeferredSender { sender, sending })
    }

    /// Whether the worker currently owns any connection's backlog. While true, direct
    /// sends on any connection defer to the queue instead of writing straight to the
    /// socket, preserving ordering.
    pub fn sending(&self) -> bool {
        self.sending.load(Ordering::Relaxed)
    }

    pub fn enqueue(&self, id: ConnectionId, shared: Arc<ConnectionShared>, bytes: Vec<u8>) {
        self.sending.store(true, Ordering::Relaxed);
        let _ = self.sender.send(Command::Enqueue { id, shared, bytes });
    }

    pub fn kill(&self, id: ConnectionId) {
        let _ = self.sender.send(Command::Kill { id });
    }
}

struct Backlog {
    shared: Arc<ConnectionShared>,
    chunks: VecDeque<Vec<u8>>,
}

async fn run(mut receiver: tokio::sync::mpsc::UnboundedReceiver<Command>, sending: Arc<AtomicBool>) {
    let mut queues: HashMap<ConnectionId, Backlog> = HashMap::new();

    loop {
        if queues.is_empty() {
            match receiver.recv().await {
                Some(cmd) => apply(&mut queues, cmd),
                None => return,
            }
            continue;
        }

        let mut ready = FuturesUnordered::new();
        for (id, backlog) in queues.iter() {
            let id = *id;
            let shared = backlog.shared.clone();
            ready.push(async move {
                let _ = shared.writable().await;
                id
            });
        }

        tokio::select! {
            cmd = receiver.recv() => {
                match cmd {
                    Some(cmd) => apply(&mut queues, cmd),
                    None => return,
                }
            }
            Some(id) = ready.next() => {
                drain_one(&mut queues, id).await;
            }
            _ = tokio::time::sleep(Duration::from_secs(5)) => {}
        }

        if queues.is_empty() {
            sending.store(false, Ordering::Relaxed);
        }
    }
}

fn apply(queues: &mut HashMap<ConnectionId, Backlog>, cmd: Command) {
    match cmd {
        Command::Enqueue { id, shared, bytes } => {
            queues
                .entry(id)
                .or_insert_with(|| Backlog { shared, chunks: VecDeque::new() })
                .chunks
                .push_back(bytes);
        }
        Command::Kill { id } => {
            queues.remove(&id);
        }
    }
}

async fn drain_one(queues: &mut HashMap<ConnectionId, Backlog>, id: ConnectionId) {
    let Some(backlog) = queues.get_mut(&id) else { return };
    loop {
        let Some(front) = backlog.chunks.front_mut() else { break };
        match backlog.shared.try_write_chunk(front).await {
            Ok(n) if n == front.len() => {
                backlog.chunks.pop_front();
            }
            Ok(n) => {
                front.drain(..n);
                break;
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
            Err(e) => {
                tracing::warn!(connection = %id, error = %e, "deferred send failed, disconnecting");
                let shared = backlog.shared.clone();
                queues.remove(&id);
                shared.disconnect(false).await;
                return;
            }
        }
    }
    if queues.get(&id).map(|b| b.chunks.is_empty()).unwrap_or(false) {
        queues.remove(&id);
    }
}
