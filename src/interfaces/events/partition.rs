use crate::domain::ports::{PartitionMessage, PartitionSource, PartitionSubscription};
use crate::error::ConsumerError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, watch};
use tracing::debug;

#[derive(Debug, Default)]
struct PartitionLog {
    messages: Vec<Bytes>,
    closed: bool,
}

/// An in-process, append-only partition with a committed offset.
///
/// Offsets are message indexes starting at zero. Nothing is ever evicted, so
/// the oldest retained offset is always zero. Clones share the same log.
///
/// At most one subscription is active at a time; it is released when closed
/// or dropped.
#[derive(Clone)]
pub struct MemoryPartition {
    partition: i32,
    log: Arc<watch::Sender<PartitionLog>>,
    committed: Arc<Mutex<Option<u64>>>,
    subscribed: Arc<AtomicBool>,
}

impl MemoryPartition {
    pub fn new(partition: i32) -> Self {
        let (log, _) = watch::channel(PartitionLog::default());
        Self {
            partition,
            log: Arc::new(log),
            committed: Arc::new(Mutex::new(None)),
            subscribed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Appends a message and returns its offset.
    pub fn publish(&self, payload: impl Into<Bytes>) -> u64 {
        let payload = payload.into();
        let mut offset = 0;
        self.log.send_modify(|log| {
            offset = log.messages.len() as u64;
            log.messages.push(payload);
        });
        offset
    }

    /// Closes the partition; subscribers drain what is left and then see the end.
    pub fn close(&self) {
        self.log.send_modify(|log| log.closed = true);
    }

    pub async fn committed_offset(&self) -> Option<u64> {
        *self.committed.lock().await
    }

    pub fn len(&self) -> usize {
        self.log.borrow().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PartitionSource for MemoryPartition {
    async fn subscribe(&self) -> Result<Box<dyn PartitionSubscription>, ConsumerError> {
        let position = self.committed.lock().await.map_or(0, |offset| offset + 1);
        if self.subscribed.swap(true, Ordering::AcqRel) {
            return Err(ConsumerError::Subscribe {
                partition: self.partition,
                reason: "partition already has an active subscription".to_string(),
            });
        }
        debug!(partition = self.partition, position, "subscribed to memory partition");
        Ok(Box::new(MemorySubscription {
            receiver: self.log.subscribe(),
            committed: self.committed.clone(),
            subscribed: self.subscribed.clone(),
            position,
            closed: false,
        }))
    }
}

struct MemorySubscription {
    receiver: watch::Receiver<PartitionLog>,
    committed: Arc<Mutex<Option<u64>>>,
    subscribed: Arc<AtomicBool>,
    position: u64,
    closed: bool,
}

impl MemorySubscription {
    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.subscribed.store(false, Ordering::Release);
        }
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl PartitionSubscription for MemorySubscription {
    async fn next_message(&mut self) -> Result<Option<PartitionMessage>, ConsumerError> {
        if self.closed {
            return Err(ConsumerError::Receive("subscription is closed".to_string()));
        }
        loop {
            {
                let log = self.receiver.borrow_and_update();
                if let Some(payload) = log.messages.get(self.position as usize) {
                    let message = PartitionMessage {
                        offset: self.position,
                        payload: payload.clone(),
                    };
                    self.position += 1;
                    return Ok(Some(message));
                }
                if log.closed {
                    return Ok(None);
                }
            }
            if self.receiver.changed().await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn commit(&mut self, offset: u64) -> Result<(), ConsumerError> {
        let reason = if self.closed {
            Some("subscription is closed")
        } else if offset >= self.position {
            Some("offset has not been delivered")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(ConsumerError::Commit {
                offset,
                reason: reason.to_string(),
            });
        }

        let mut committed = self.committed.lock().await;
        if committed.is_none_or(|current| offset > current) {
            *committed = Some(offset);
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.release();
        debug!(position = self.position, "memory subscription closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_reads_in_order() {
        let partition = MemoryPartition::new(0);
        partition.publish("a");
        partition.publish("b");

        let mut sub = partition.subscribe().await.unwrap();
        let first = sub.next_message().await.unwrap().unwrap();
        let second = sub.next_message().await.unwrap().unwrap();

        assert_eq!((first.offset, first.payload), (0, Bytes::from("a")));
        assert_eq!((second.offset, second.payload), (1, Bytes::from("b")));
    }

    #[tokio::test]
    async fn test_resubscribe_resumes_after_committed_offset() {
        let partition = MemoryPartition::new(0);
        for payload in ["a", "b", "c"] {
            partition.publish(payload);
        }

        let mut sub = partition.subscribe().await.unwrap();
        let first = sub.next_message().await.unwrap().unwrap();
        sub.commit(first.offset).await.unwrap();
        // Read but not committed: replayed on the next subscription.
        sub.next_message().await.unwrap().unwrap();
        sub.close().await;

        let mut sub = partition.subscribe().await.unwrap();
        let replayed = sub.next_message().await.unwrap().unwrap();
        assert_eq!(replayed.offset, 1);
        assert_eq!(partition.committed_offset().await, Some(0));
    }

    #[tokio::test]
    async fn test_next_message_waits_for_publish() {
        let partition = MemoryPartition::new(0);
        let mut sub = partition.subscribe().await.unwrap();

        let publisher = partition.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            publisher.publish("late");
        });

        let message = sub.next_message().await.unwrap().unwrap();
        assert_eq!(message.payload, Bytes::from("late"));
    }

    #[tokio::test]
    async fn test_closed_partition_ends_after_drain() {
        let partition = MemoryPartition::new(0);
        partition.publish("a");
        partition.close();

        let mut sub = partition.subscribe().await.unwrap();
        assert!(sub.next_message().await.unwrap().is_some());
        assert!(sub.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_single_active_subscription() {
        let partition = MemoryPartition::new(7);

        let mut first = partition.subscribe().await.unwrap();
        let Err(err) = partition.subscribe().await else {
            panic!("second subscription should be refused");
        };
        assert!(matches!(err, ConsumerError::Subscribe { partition: 7, .. }));

        first.close().await;
        let second = partition.subscribe().await.unwrap();
        drop(second);
        partition.subscribe().await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_subscription_refuses_reads_and_commits() {
        let partition = MemoryPartition::new(0);
        partition.publish("a");

        let mut sub = partition.subscribe().await.unwrap();
        let message = sub.next_message().await.unwrap().unwrap();
        sub.close().await;

        assert!(matches!(
            sub.next_message().await,
            Err(ConsumerError::Receive(_))
        ));
        assert!(matches!(
            sub.commit(message.offset).await,
            Err(ConsumerError::Commit { offset: 0, .. })
        ));
        assert_eq!(partition.committed_offset().await, None);
    }

    #[tokio::test]
    async fn test_commit_of_undelivered_offset_is_refused() {
        let partition = MemoryPartition::new(0);
        partition.publish("a");

        let mut sub = partition.subscribe().await.unwrap();
        assert!(matches!(
            sub.commit(0).await,
            Err(ConsumerError::Commit { offset: 0, .. })
        ));
        sub.next_message().await.unwrap().unwrap();
        sub.commit(0).await.unwrap();
        assert_eq!(partition.committed_offset().await, Some(0));
    }
}
