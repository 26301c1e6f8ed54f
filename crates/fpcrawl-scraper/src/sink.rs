//! Downstream consumers of emitted product records.

use std::future::Future;
use std::sync::Mutex;

use fpcrawl_core::ProductRecord;
use tokio::sync::mpsc;

use crate::error::ScraperError;

/// Accepts records as the crawler emits them.
///
/// Records from one branch arrive in page order. With more than one page in
/// flight, records from different branches may interleave.
pub trait RecordSink: Send + Sync {
    fn accept(&self, record: ProductRecord)
        -> impl Future<Output = Result<(), ScraperError>> + Send;
}

impl RecordSink for mpsc::Sender<ProductRecord> {
    async fn accept(&self, record: ProductRecord) -> Result<(), ScraperError> {
        self.send(record).await.map_err(|_| ScraperError::Sink {
            reason: "record receiver dropped".to_owned(),
        })
    }
}

/// Collects records in memory.
impl RecordSink for Mutex<Vec<ProductRecord>> {
    async fn accept(&self, record: ProductRecord) -> Result<(), ScraperError> {
        self.lock()
            .map_err(|_| ScraperError::Sink {
                reason: "record collector lock poisoned".to_owned(),
            })?
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fpcrawl_core::{Assets, Availability, PriceData};
    use std::collections::BTreeMap;

    fn record(title: &str) -> ProductRecord {
        ProductRecord {
            captured_at: Utc::now(),
            source_url: format!("https://fix-price.com/catalog/{title}"),
            title: title.to_owned(),
            brand: String::new(),
            marketing_tags: vec![],
            price: PriceData {
                current: 1.0,
                original: 1.0,
                discount_label: String::new(),
            },
            availability: Availability {
                in_stock: true,
                count: 0,
            },
            assets: Assets::from_images(vec![]),
            attributes: BTreeMap::new(),
            variant_count: 0,
        }
    }

    #[tokio::test]
    async fn channel_sink_forwards_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.accept(record("a")).await.unwrap();
        tx.accept(record("b")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().title, "a");
        assert_eq!(rx.recv().await.unwrap().title, "b");
    }

    #[tokio::test]
    async fn channel_sink_errors_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let err = tx.accept(record("a")).await.unwrap_err();
        assert!(matches!(err, ScraperError::Sink { .. }));
    }

    #[tokio::test]
    async fn collecting_sink_keeps_records() {
        let sink = Mutex::new(Vec::new());
        sink.accept(record("a")).await.unwrap();
        sink.accept(record("b")).await.unwrap();
        let titles: Vec<_> = sink
            .into_inner()
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, ["a", "b"]);
    }
}
