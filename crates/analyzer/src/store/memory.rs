//! In-memory record store.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::RwLock;

use super::{RecordStore, StoreError};
use crate::parser::model::LogRecord;

/// Vec-backed store. Scans clone the collection under the read lock, so a
/// returned snapshot never changes under a concurrent insert; batches go in
/// under a single write lock, which gives read-committed visibility.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<LogRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn insert(
        &self,
        record: LogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async move {
            self.records.write().await.push(record);
            Ok(())
        })
    }

    fn insert_many(
        &self,
        records: Vec<LogRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<usize, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let count = records.len();
            self.records.write().await.extend(records);
            Ok(count)
        })
    }

    fn scan(&self) -> Pin<Box<dyn Future<Output = Result<Vec<LogRecord>, StoreError>> + Send + '_>> {
        Box::pin(async move { Ok(self.records.read().await.clone()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ip: &str) -> LogRecord {
        LogRecord {
            ip_address: ip.to_string(),
            forwarded_for: ip.to_string(),
            timestamp: "10/Oct/2023:13:55:36 +0000".to_string(),
            request: "GET /x HTTP/1.1".to_string(),
            status_code: 200,
            response_size: 1,
            time_taken: 1,
            referer: String::new(),
            user_agent: "ua".to_string(),
            balancer_worker_name: Some("w1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_scan_preserve_order() {
        let store = MemoryStore::new();
        store.insert(sample("1.1.1.1")).await.unwrap();
        store.insert(sample("2.2.2.2")).await.unwrap();
        let records = store.scan().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ip_address, "1.1.1.1");
        assert_eq!(records[1].ip_address, "2.2.2.2");
    }

    #[tokio::test]
    async fn test_insert_many_returns_count() {
        let store = MemoryStore::new();
        let count = store
            .insert_many(vec![sample("a"), sample("b"), sample("c")])
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.scan().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_scan_snapshot_is_stable() {
        let store = MemoryStore::new();
        store.insert(sample("1.1.1.1")).await.unwrap();
        let snapshot = store.scan().await.unwrap();
        store.insert(sample("2.2.2.2")).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.scan().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_scan() {
        let store = MemoryStore::new();
        assert!(store.scan().await.unwrap().is_empty());
    }
}
