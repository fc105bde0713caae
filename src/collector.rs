use std::sync::{Mutex, MutexGuard};

/// Ordered, append-only list of extracted call expressions for one build.
///
/// Appends take `&self` so the collector can be shared with hosts that parse
/// modules on several threads. Entries are never deduplicated.
#[derive(Debug, Default)]
pub struct CallCollector {
    calls: Mutex<Vec<String>>,
}

impl CallCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, text: impl Into<String>) {
        self.lock().push(text.into());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the entries in insertion order.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn into_calls(self) -> Vec<String> {
        self.calls
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // A panic while holding the lock cannot leave a Vec<String> half-pushed.
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_append_preserves_order() {
        let collector = CallCollector::new();
        collector.append("Drupal.t('a')");
        collector.append("Drupal.t('b')");
        collector.append("Drupal.formatPlural(n, '1', '@count')");

        assert_eq!(
            collector.into_calls(),
            vec![
                "Drupal.t('a')".to_string(),
                "Drupal.t('b')".to_string(),
                "Drupal.formatPlural(n, '1', '@count')".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_deduplication() {
        let collector = CallCollector::new();
        collector.append("Drupal.t('same')");
        collector.append("Drupal.t('same')");
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_snapshot_leaves_entries_in_place() {
        let collector = CallCollector::new();
        assert!(collector.is_empty());
        collector.append("Drupal.t('x')");
        assert_eq!(collector.snapshot(), vec!["Drupal.t('x')".to_string()]);
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let collector = Arc::new(CallCollector::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let collector = Arc::clone(&collector);
                thread::spawn(move || {
                    for i in 0..250 {
                        collector.append(format!("Drupal.t('{}-{}')", worker, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut calls = Arc::try_unwrap(collector).unwrap().into_calls();
        assert_eq!(calls.len(), 2000);
        calls.sort();
        calls.dedup();
        assert_eq!(calls.len(), 2000);
    }
}
