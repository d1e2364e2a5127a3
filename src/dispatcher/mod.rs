mod work_items;

pub use work_items::WorkItem;

use std::sync::Arc;

use futures::FutureExt;
use log::{error, trace, warn};
use tokio::{
    sync::{mpsc, watch, Mutex},
    task::JoinHandle,
    time::sleep,
};

use crate::{
    constants::{BACK_OFF_TIME, DURATION_BETWEEN_ERROR_RETRY, MAX_BACK_OFF_TIME},
    errors::{is_back_off, IndexerError},
    process::elastic::ElasticProcessorHandler,
};

/// Single-consumer FIFO between the observer callbacks and the elastic
/// processor. Failed items are retried in place: exponential backoff for
/// server-overload errors, a fixed pause otherwise; a panicking item is
/// dropped and the consumer keeps running.
pub struct DataDispatcher {
    sender: mpsc::Sender<WorkItem>,
    receiver: Mutex<Option<mpsc::Receiver<WorkItem>>>,
    shutdown_tx: watch::Sender<bool>,
    consumer: Mutex<Option<JoinHandle<()>>>,
    processor: Arc<dyn ElasticProcessorHandler>,
}

impl DataDispatcher {
    pub fn new(
        cache_size: usize,
        processor: Arc<dyn ElasticProcessorHandler>,
    ) -> anyhow::Result<Self> {
        if cache_size == 0 {
            return Err(IndexerError::InvalidCacheSize.into());
        }

        let (sender, receiver) = mpsc::channel(cache_size);
        let (shutdown_tx, _) = watch::channel(false);
        Ok(DataDispatcher {
            sender,
            receiver: Mutex::new(Some(receiver)),
            shutdown_tx,
            consumer: Mutex::new(None),
            processor,
        })
    }

    /// Launches the single consumer task.
    pub async fn start_index_data(&self) {
        let Some(receiver) = self.receiver.lock().await.take() else {
            warn!("dispatcher already started");
            return;
        };

        let processor = self.processor.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(consume_loop(receiver, shutdown_rx, processor));
        *self.consumer.lock().await = Some(handle);
    }

    /// Enqueues an item; blocks only when the queue is at capacity.
    pub async fn add(&self, item: WorkItem) {
        if self.sender.send(item).await.is_err() {
            warn!("dispatcher queue is closed, dropping item");
        }
    }

    /// Signals shutdown and waits for the in-flight item; pending queued
    /// items are discarded.
    pub async fn close(&self) -> anyhow::Result<()> {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.consumer.lock().await.take() {
            handle.await?;
        }
        Ok(())
    }
}

async fn consume_loop(
    mut receiver: mpsc::Receiver<WorkItem>,
    mut shutdown_rx: watch::Receiver<bool>,
    processor: Arc<dyn ElasticProcessorHandler>,
) {
    let mut back_off_time = BACK_OFF_TIME;
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                trace!("dispatcher received shutdown signal");
                return;
            }
            item = receiver.recv() => {
                let Some(item) = item else {
                    return;
                };
                let keep_running =
                    dispatch_item(item, &*processor, &mut shutdown_rx, &mut back_off_time).await;
                if !keep_running {
                    return;
                }
            }
        }
    }
}

/// Drives one item to completion. Returns false when shutdown interrupted
/// the retry loop.
async fn dispatch_item(
    item: WorkItem,
    processor: &dyn ElasticProcessorHandler,
    shutdown_rx: &mut watch::Receiver<bool>,
    back_off_time: &mut std::time::Duration,
) -> bool {
    loop {
        let outcome = std::panic::AssertUnwindSafe(item.save(processor))
            .catch_unwind()
            .await;

        match outcome {
            Err(panic) => {
                error!(
                    "recovered panic while saving {} item, dropping it: {:?}",
                    item.kind(),
                    panic_message(&panic)
                );
                return true;
            }
            Ok(Ok(())) => {
                *back_off_time = BACK_OFF_TIME;
                return true;
            }
            Ok(Err(err)) if is_back_off(&err) => {
                warn!(
                    "server overload while saving {} item, backing off {:?}: {err:#}",
                    item.kind(),
                    back_off_time
                );
                let pause = *back_off_time;
                *back_off_time = (*back_off_time * 2).min(MAX_BACK_OFF_TIME);
                if !cancellable_sleep(pause, shutdown_rx).await {
                    return false;
                }
            }
            Ok(Err(err)) => {
                warn!(
                    "could not save {} item, retrying in {:?}: {err:#}",
                    item.kind(),
                    DURATION_BETWEEN_ERROR_RETRY
                );
                if !cancellable_sleep(DURATION_BETWEEN_ERROR_RETRY, shutdown_rx).await {
                    return false;
                }
            }
        }
    }
}

/// Sleeps unless shutdown fires first; returns false on shutdown.
async fn cancellable_sleep(
    duration: std::time::Duration,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> bool {
    tokio::select! {
        _ = sleep(duration) => true,
        _ = shutdown_rx.changed() => false,
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
