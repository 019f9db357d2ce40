//! Bounded, fire-and-forget event channels.
//!
//! Each [`EventHandler`] owns one bounded channel and runs one hook. Producers are cheap clones handed to the APIs.
//! Publishing never waits: if a hook falls behind and its channel fills up, further events are logged and dropped,
//! so order placement and settlement are never held up by a slow side-effect.
//!
//! Every event is handled on its own task, so hooks may be async and long-running. The handler stops once every
//! producer has been dropped, after the in-flight hook tasks have finished.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        Self { receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer { sender: self.sender.clone() }
    }

    pub async fn start_handler(self) {
        let Self { mut receiver, sender, handler } = self;
        // Only producers may keep the channel open from here on
        drop(sender);
        debug!("📬️ Event handler started");
        let mut jobs = JoinSet::new();
        while let Some(event) = receiver.recv().await {
            let handler = Arc::clone(&handler);
            jobs.spawn(async move { (handler)(event).await });
            // Reap finished hooks as we go so the set does not grow without bound
            while let Some(done) = jobs.try_join_next() {
                log_hook_result(done);
            }
        }
        debug!("📬️ All producers have gone. Waiting for {} hook(s) to finish", jobs.len());
        while let Some(done) = jobs.join_next().await {
            log_hook_result(done);
        }
        debug!("📬️ Event handler has shut down");
    }
}

fn log_hook_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        error!("📬️ An event hook failed. {e}");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    /// Hands the event to the hook without waiting. The event is dropped, with a warning, if the hook's channel is
    /// full or the hook has shut down.
    pub fn try_publish_event(&self, event: E) {
        match self.sender.try_send(event) {
            Ok(()) => trace!("📬️ Event published"),
            Err(mpsc::error::TrySendError::Full(_)) => warn!("📬️ Event channel is full. Event dropped."),
            Err(mpsc::error::TrySendError::Closed(_)) => warn!("📬️ Event handler has shut down. Event dropped."),
        }
    }
}
