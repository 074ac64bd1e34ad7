//! @ai:module:intent Bounded background writer between a run and its record store
//! @ai:module:layer infrastructure
//! @ai:module:public_api RecordSink, PersistenceReport, spawn_writer
//! @ai:module:stateless false

use crate::error::{Error, Result};
use crate::store::record::{BenchmarkRecord, StoredRecord};
use crate::store::RecordStore;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Number of failure messages kept in a report.
const MAX_REPORTED_ERRORS: usize = 10;

/// @ai:intent Outcome of the writer task once the run drops its sink
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistenceReport {
    pub written: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl PersistenceReport {
    /// @ai:intent Whether every record reached the store
    /// @ai:effects pure
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// @ai:intent Sending half of the write queue
#[derive(Clone)]
pub struct RecordSink {
    sender: mpsc::Sender<BenchmarkRecord>,
}

impl RecordSink {
    /// @ai:intent Queue a record, waiting while the queue is full
    /// @ai:post returns false once the writer task is gone
    /// @ai:effects async
    pub async fn send(&self, record: BenchmarkRecord) -> bool {
        match self.sender.send(record).await {
            Ok(()) => true,
            Err(mpsc::error::SendError(record)) => {
                tracing::error!(
                    "Record writer stopped; dropping record for item {} ({})",
                    record.item_id,
                    record.model
                );
                false
            }
        }
    }
}

/// @ai:intent Run one blocking append off the async workers
/// @ai:effects spawn, store:write
async fn append_blocking(store: &Arc<dyn RecordStore>, document: StoredRecord) -> Result<()> {
    let store = Arc::clone(store);

    tokio::task::spawn_blocking(move || store.append(&document))
        .await
        .map_err(|e| Error::StoreUnavailable(format!("append task failed: {}", e)))?
}

/// @ai:intent Start the writer task draining a bounded queue into the store
/// @ai:pre capacity > 0
/// @ai:effects spawn
pub fn spawn_writer(
    store: Arc<dyn RecordStore>,
    capacity: usize,
) -> (RecordSink, JoinHandle<PersistenceReport>) {
    let (sender, mut receiver) = mpsc::channel::<BenchmarkRecord>(capacity.max(1));

    let handle = tokio::spawn(async move {
        let mut report = PersistenceReport::default();

        while let Some(record) = receiver.recv().await {
            let document = StoredRecord::from(&record);

            match append_blocking(&store, document).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    tracing::error!("Failed to persist record for item {}: {}", record.item_id, e);
                    report.failed += 1;

                    if report.errors.len() < MAX_REPORTED_ERRORS {
                        report.errors.push(format!("{}: {}", record.item_id, e));
                    }
                }
            }
        }

        report
    });

    (RecordSink { sender }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryRecordStore, StoredRecord};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FailingStore;

    impl RecordStore for FailingStore {
        fn append(&self, _record: &StoredRecord) -> Result<()> {
            Err(Error::StoreUnavailable("disk full".to_string()))
        }

        fn load_all(&self) -> Result<Vec<StoredRecord>> {
            Ok(Vec::new())
        }
    }

    /// Blocks each append until released or a timeout passes.
    struct GatedStore {
        entered: AtomicBool,
        released: AtomicBool,
        gate: Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl RecordStore for GatedStore {
        fn append(&self, _record: &StoredRecord) -> Result<()> {
            self.entered.store(true, Ordering::SeqCst);
            let gate = self.gate.lock().unwrap();

            if gate.recv_timeout(Duration::from_secs(2)).is_ok() {
                self.released.store(true, Ordering::SeqCst);
            }
            Ok(())
        }

        fn load_all(&self) -> Result<Vec<StoredRecord>> {
            Ok(Vec::new())
        }
    }

    fn record(id: &str) -> BenchmarkRecord {
        StoredRecord {
            data_id: Some(id.to_string()),
            ..Default::default()
        }
        .normalize()
    }

    #[tokio::test]
    async fn test_writer_persists_all_records() {
        let store = Arc::new(MemoryRecordStore::new());
        let (sink, handle) = spawn_writer(store.clone(), 2);

        for id in ["1", "2", "3", "4"] {
            assert!(sink.send(record(id)).await);
        }
        drop(sink);

        let report = handle.await.unwrap();
        assert_eq!(report.written, 4);
        assert!(report.is_complete());
        assert_eq!(store.load_all().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_writer_surfaces_failures() {
        let (sink, handle) = spawn_writer(Arc::new(FailingStore), 4);

        sink.send(record("1")).await;
        sink.send(record("2")).await;
        drop(sink);

        let report = handle.await.unwrap();
        assert_eq!(report.failed, 2);
        assert_eq!(report.written, 0);
        assert!(report.errors[0].contains("disk full"));
    }

    #[tokio::test]
    async fn test_slow_append_does_not_block_runtime() {
        let (release, gate) = std::sync::mpsc::channel();
        let store = Arc::new(GatedStore {
            entered: AtomicBool::new(false),
            released: AtomicBool::new(false),
            gate: Mutex::new(gate),
        });
        let (sink, handle) = spawn_writer(store.clone(), 1);

        assert!(sink.send(record("1")).await);
        tokio::time::timeout(Duration::from_secs(1), async {
            while !store.entered.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        // Only reachable while the append waits on another thread.
        release.send(()).unwrap();
        drop(sink);

        let report = handle.await.unwrap();
        assert_eq!(report.written, 1);
        assert!(store.released.load(Ordering::SeqCst));
    }
}
