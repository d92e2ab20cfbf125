use std::collections::{HashSet, VecDeque};

/// FIFO of specimen page URLs shared by discovery and harvest.
///
/// `seen` always mirrors the current contents of `items`, so a URL that has
/// been popped may be queued again later. `revision` is bumped on every
/// mutation and travels with each snapshot.
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    items: VecDeque<String>,
    seen: HashSet<String>,
    revision: u64,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a queue from snapshot contents. Duplicates are dropped,
    /// keeping the first occurrence.
    pub fn from_snapshot(urls: Vec<String>, revision: u64) -> Self {
        let mut queue = Self {
            revision,
            ..Self::default()
        };
        for url in urls {
            if queue.seen.insert(url.clone()) {
                queue.items.push_back(url);
            }
        }
        queue
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Append `url` at the tail unless it is already queued.
    pub fn push_back(&mut self, url: String) -> bool {
        if !self.seen.insert(url.clone()) {
            return false;
        }
        self.items.push_back(url);
        self.revision += 1;
        true
    }

    /// Put `url` back at the head, e.g. after a fatal failure mid-harvest.
    pub fn push_front(&mut self, url: String) -> bool {
        if !self.seen.insert(url.clone()) {
            return false;
        }
        self.items.push_front(url);
        self.revision += 1;
        true
    }

    pub fn pop_front(&mut self) -> Option<String> {
        let url = self.items.pop_front()?;
        self.seen.remove(&url);
        self.revision += 1;
        Some(url)
    }

    /// Append URLs from one listing page in document order, stopping at the
    /// first one that is already queued. Returns how many were appended.
    pub fn enqueue_new<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for url in urls {
            if !self.push_back(url.into()) {
                break;
            }
            added += 1;
        }
        added
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn front(&self) -> Option<&str> {
        self.items.front().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_stops_at_known_url() {
        let mut queue = WorkQueue::new();
        queue.push_back("B".to_string());

        let added = queue.enqueue_new(["A", "B", "C"]);

        assert_eq!(added, 1);
        assert_eq!(queue.to_vec(), vec!["B", "A"]);
        assert!(!queue.contains("C"));
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let mut queue = WorkQueue::new();
        queue.enqueue_new(["A", "B", "C"]);
        let before = queue.to_vec();
        let revision = queue.revision();

        assert_eq!(queue.enqueue_new(["A"]), 0);
        assert_eq!(queue.enqueue_new(["C", "D"]), 0);

        assert_eq!(queue.to_vec(), before);
        assert_eq!(queue.revision(), revision);
    }

    #[test]
    fn test_pop_releases_membership() {
        let mut queue = WorkQueue::new();
        queue.enqueue_new(["A", "B"]);

        assert_eq!(queue.pop_front().as_deref(), Some("A"));
        assert!(!queue.contains("A"));
        assert!(queue.push_back("A".to_string()));
        assert_eq!(queue.to_vec(), vec!["B", "A"]);
    }

    #[test]
    fn test_push_front_restores_head() {
        let mut queue = WorkQueue::new();
        queue.enqueue_new(["A", "B"]);
        let head = queue.pop_front().unwrap();
        queue.push_front(head);
        assert_eq!(queue.front(), Some("A"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_from_snapshot_dedups() {
        let queue = WorkQueue::from_snapshot(
            vec!["A".into(), "B".into(), "A".into()],
            9,
        );
        assert_eq!(queue.to_vec(), vec!["A", "B"]);
        assert_eq!(queue.revision(), 9);
    }

    #[test]
    fn test_pop_empty() {
        let mut queue = WorkQueue::new();
        assert!(queue.pop_front().is_none());
        assert_eq!(queue.revision(), 0);
    }
}
