//! Groups queued commands into chunks by count and deadline.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::queue::QueueReceiver;
use crate::Command;

/// Result of filling one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fill {
    /// The chunk hit the count or time trigger.
    Ready,
    /// Every producer is gone; the chunk holds whatever was left.
    Closed,
    /// Shutdown was requested.
    Cancelled,
}

pub(crate) struct Batcher<R> {
    queue: QueueReceiver<R>,
    max_batch_size: usize,
    batch_timeout: Duration,
}

impl<R> Batcher<R> {
    pub(crate) fn new(queue: QueueReceiver<R>, max_batch_size: usize, batch_timeout: Duration) -> Self {
        Self {
            queue,
            max_batch_size,
            batch_timeout,
        }
    }

    /// Append the next chunk of commands to `chunk` (expected empty).
    ///
    /// Waits indefinitely for the first command. After that the chunk is
    /// ready once it holds `max_batch_size` commands or `batch_timeout` has
    /// elapsed since the first one was accepted, whichever comes first.
    pub(crate) async fn fill(&mut self, chunk: &mut Vec<Command<R>>, cancel: &CancellationToken) -> Fill {
        let first = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Fill::Cancelled,
            command = self.queue.dequeue() => command,
        };
        match first {
            Some(command) => chunk.push(command),
            None => return Fill::Closed,
        }

        let deadline = Instant::now() + self.batch_timeout;
        while chunk.len() < self.max_batch_size {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Fill::Cancelled,
                next = tokio::time::timeout_at(deadline, self.queue.dequeue()) => match next {
                    Ok(Some(command)) => chunk.push(command),
                    Ok(None) => return Fill::Closed,
                    Err(_) => break,
                },
            }
        }

        Fill::Ready
    }
}
