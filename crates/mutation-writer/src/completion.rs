//! Acknowledgment of applied commands.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::Command;

/// Receives every command once its chunk has committed.
///
/// Called from the single applier task, in commit order. The next chunk does
/// not start until `on_completed` returns for every command of the current
/// one, so a slow implementation slows the whole pipeline.
#[async_trait::async_trait]
pub trait CompletionSink<R>: Send + Sync {
    async fn on_completed(&self, command: Command<R>);
}

/// Forwards completed commands into a channel.
#[async_trait::async_trait]
impl<R: Send + 'static> CompletionSink<R> for mpsc::UnboundedSender<Command<R>> {
    async fn on_completed(&self, command: Command<R>) {
        if self.send(command).is_err() {
            tracing::warn!("Completion receiver dropped; acknowledgment discarded");
        }
    }
}

#[async_trait::async_trait]
impl<R: Send + 'static, C: CompletionSink<R> + ?Sized> CompletionSink<R> for Arc<C> {
    async fn on_completed(&self, command: Command<R>) {
        (**self).on_completed(command).await
    }
}
