//! The matchmaking queue: FIFO pairing of waiting players.
//!
//! Arrival order is pairing order. There is no priority and no timeout —
//! a player may wait indefinitely for an opponent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

/// Receipt for a queued entry, used to withdraw it if the connection
/// dies before a pair forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// A FIFO of entries awaiting pairing.
///
/// Generic over the entry type; the server queues its per-connection
/// waiting state here. All operations take one pass under the queue's own
/// lock, so [`try_pair`](Self::try_pair) is atomic under concurrent calls
/// from any number of connection tasks: each waiting pair is handed out
/// exactly once, oldest two first.
pub struct MatchQueue<T> {
    entries: Mutex<VecDeque<(Ticket, T)>>,
    next_ticket: AtomicU64,
}

impl<T> MatchQueue<T> {
    /// Creates a new, empty queue.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Appends an entry and returns its withdrawal ticket.
    pub async fn enqueue(&self, entry: T) -> Ticket {
        let ticket =
            Ticket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().await.push_back((ticket, entry));
        ticket
    }

    /// Atomically removes and returns the two oldest entries, or `None`
    /// if fewer than two are waiting. The first element of the pair is
    /// the earlier-enqueued one (slot A).
    pub async fn try_pair(&self) -> Option<(T, T)> {
        let mut entries = self.entries.lock().await;
        if entries.len() < 2 {
            return None;
        }
        let (_, first) = entries.pop_front()?;
        let (_, second) = entries.pop_front()?;
        Some((first, second))
    }

    /// Withdraws a still-waiting entry. Returns `None` if the ticket was
    /// already consumed by pairing.
    pub async fn remove(&self, ticket: Ticket) -> Option<T> {
        let mut entries = self.entries.lock().await;
        let pos = entries.iter().position(|(t, _)| *t == ticket)?;
        entries.remove(pos).map(|(_, entry)| entry)
    }

    /// Number of entries currently waiting.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns `true` if nobody is waiting.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<T> Default for MatchQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pairs_come_out_in_arrival_order() {
        let queue = MatchQueue::new();
        queue.enqueue("first").await;
        queue.enqueue("second").await;
        queue.enqueue("third").await;

        let (a, b) = queue.try_pair().await.expect("two were waiting");
        assert_eq!(a, "first");
        assert_eq!(b, "second");
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn fewer_than_two_yields_no_pair() {
        let queue: MatchQueue<u32> = MatchQueue::new();
        assert!(queue.try_pair().await.is_none());
        queue.enqueue(1).await;
        assert!(queue.try_pair().await.is_none());
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn n_entries_form_floor_n_halves_pairs() {
        for n in 0..9usize {
            let queue = MatchQueue::new();
            for i in 0..n {
                queue.enqueue(i).await;
            }
            let mut pairs = Vec::new();
            while let Some(pair) = queue.try_pair().await {
                pairs.push(pair);
            }
            assert_eq!(pairs.len(), n / 2, "n = {n}");
            assert_eq!(queue.len().await, n % 2, "n = {n}");
            // Arrival order within and across pairs.
            for (k, (a, b)) in pairs.iter().enumerate() {
                assert_eq!((*a, *b), (2 * k, 2 * k + 1));
            }
        }
    }

    #[tokio::test]
    async fn remove_withdraws_only_waiting_entries() {
        let queue = MatchQueue::new();
        let t1 = queue.enqueue("leaver").await;
        queue.enqueue("stayer").await;

        assert_eq!(queue.remove(t1).await, Some("leaver"));
        // Ticket already gone — second withdrawal is a no-op.
        assert_eq!(queue.remove(t1).await, None);
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn remove_after_pairing_is_a_no_op() {
        let queue = MatchQueue::new();
        let t1 = queue.enqueue("a").await;
        queue.enqueue("b").await;

        assert!(queue.try_pair().await.is_some());
        assert_eq!(queue.remove(t1).await, None);
    }

    #[tokio::test]
    async fn concurrent_enqueue_then_drain_pairs_everyone_once() {
        use std::sync::Arc;

        let queue = Arc::new(MatchQueue::new());
        let mut joins = Vec::new();
        for i in 0..16u32 {
            let queue = Arc::clone(&queue);
            joins.push(tokio::spawn(async move {
                queue.enqueue(i).await;
                queue.try_pair().await
            }));
        }

        let mut seen = std::collections::HashSet::new();
        let mut pairs = 0;
        for join in joins {
            if let Some((a, b)) = join.await.unwrap() {
                pairs += 1;
                assert!(seen.insert(a), "{a} paired twice");
                assert!(seen.insert(b), "{b} paired twice");
            }
        }
        assert_eq!(pairs, 8);
        assert!(queue.is_empty().await);
    }
}
