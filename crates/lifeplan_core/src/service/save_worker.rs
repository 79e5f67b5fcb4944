//! Background save worker for fire-and-forget persistence.
//!
//! # Responsibility
//! - Own the persistence gateway on a dedicated thread.
//! - Save tree snapshots in the order they were committed.
//!
//! # Invariants
//! - Queued snapshots are coalesced; only the newest pending one is saved.
//! - A flush is acknowledged only after every snapshot queued before it.
//! - Save failures are logged by the gateway and never reach the caller.

use crate::model::tree::Tree;
use crate::repo::gateway::PersistenceGateway;
use crossbeam::channel::{Receiver, Sender};
use log::{debug, warn};
use std::thread::{self, JoinHandle};

enum SaveCommand {
    Snapshot(Tree),
    Flush(Sender<()>),
    Shutdown,
}

/// Handle to the running save thread; dropping it drains and stops the thread.
pub struct SaveWorkerHandle {
    tx: Sender<SaveCommand>,
    join: Option<JoinHandle<()>>,
}

impl SaveWorkerHandle {
    /// Spawns the worker thread that owns `gateway`.
    pub fn start(gateway: Box<dyn PersistenceGateway>) -> std::io::Result<Self> {
        let (tx, rx) = crossbeam::channel::unbounded();
        let join = thread::Builder::new()
            .name("lifeplan-save".to_string())
            .spawn(move || run_save_loop(gateway, rx))?;
        Ok(Self {
            tx,
            join: Some(join),
        })
    }

    /// Queues a snapshot; returns `false` when the worker is gone.
    pub fn enqueue(&self, tree: Tree) -> bool {
        self.tx.send(SaveCommand::Snapshot(tree)).is_ok()
    }

    /// Blocks until every snapshot queued so far has been handled.
    pub fn flush(&self) -> bool {
        let (ack_tx, ack_rx) = crossbeam::channel::bounded(1);
        if self.tx.send(SaveCommand::Flush(ack_tx)).is_err() {
            return false;
        }
        ack_rx.recv().is_ok()
    }
}

impl Drop for SaveWorkerHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(SaveCommand::Shutdown);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!("event=save_worker_stop module=service status=error reason=thread_panicked");
            }
        }
    }
}

fn run_save_loop(gateway: Box<dyn PersistenceGateway>, rx: Receiver<SaveCommand>) {
    let mut next = rx.recv().ok();
    while let Some(command) = next.take() {
        match command {
            SaveCommand::Snapshot(tree) => {
                // Why: every snapshot is a full tree, so only the newest pending
                // one matters. A flush or shutdown met while draining is kept
                // as the next command so it still runs after this save.
                let mut latest = tree;
                let mut coalesced = 0usize;
                loop {
                    match rx.try_recv() {
                        Ok(SaveCommand::Snapshot(newer)) => {
                            latest = newer;
                            coalesced += 1;
                        }
                        Ok(other) => {
                            next = Some(other);
                            break;
                        }
                        Err(_) => break,
                    }
                }
                if coalesced > 0 {
                    debug!(
                        "event=save_coalesce module=service status=ok skipped={}",
                        coalesced
                    );
                }
                gateway.save(&latest);
            }
            SaveCommand::Flush(ack) => {
                let _ = ack.send(());
            }
            SaveCommand::Shutdown => break,
        }

        if next.is_none() {
            next = rx.recv().ok();
        }
    }
    debug!("event=save_worker_stop module=service status=ok");
}
