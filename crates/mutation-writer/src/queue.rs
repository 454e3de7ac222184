//! Bounded FIFO of compiled commands between producers and the batcher.

use tokio::sync::mpsc;

use crate::error::{Result, WriterError};
use crate::Command;

pub(crate) fn mutation_queue<R>(capacity: usize) -> (QueueSender<R>, QueueReceiver<R>) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueSender { tx }, QueueReceiver { rx })
}

pub(crate) struct QueueSender<R> {
    tx: mpsc::Sender<Command<R>>,
}

impl<R> Clone for QueueSender<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<R> QueueSender<R> {
    /// Enqueue a command, waiting while the queue is full.
    pub(crate) async fn enqueue(&self, command: Command<R>) -> Result<()> {
        self.tx.send(command).await.map_err(|_| WriterError::Closed)
    }
}

pub(crate) struct QueueReceiver<R> {
    rx: mpsc::Receiver<Command<R>>,
}

impl<R> QueueReceiver<R> {
    /// Next command in arrival order; `None` once every sender is gone and
    /// the queue is drained.
    pub(crate) async fn dequeue(&mut self) -> Option<Command<R>> {
        self.rx.recv().await
    }
}
