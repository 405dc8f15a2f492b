use crate::live::Snapshot;

/// Client-held state for one live topic.
///
/// The canonical value is always the last snapshot pushed by the store. An optimistic value set while a write is
/// in flight is shown instead, but never promoted: the next snapshot replaces it, whether or not the write it
/// anticipated succeeded.
#[derive(Debug, Clone)]
pub struct LiveView<T> {
    canonical: Option<Snapshot<T>>,
    pending: Option<T>,
}

impl<T> Default for LiveView<T> {
    fn default() -> Self {
        Self { canonical: None, pending: None }
    }
}

impl<T> LiveView<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// What to render: the pending overlay if there is one, else the canonical snapshot.
    pub fn current(&self) -> Option<&T> {
        self.pending.as_ref().or_else(|| self.canonical.as_ref().map(|s| &s.data))
    }

    pub fn canonical(&self) -> Option<&T> {
        self.canonical.as_ref().map(|s| &s.data)
    }

    pub fn revision(&self) -> Option<u64> {
        self.canonical.as_ref().map(|s| s.revision)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn set_pending(&mut self, optimistic: T) {
        self.pending = Some(optimistic);
    }

    /// Drops the overlay after the store rejected the write.
    pub fn fail_pending(&mut self) {
        self.pending = None;
    }

    /// Replaces the canonical state with `snapshot` and drops any overlay.
    ///
    /// Snapshots older than the one held are ignored. Returns whether the snapshot was applied.
    pub fn reconcile(&mut self, snapshot: Snapshot<T>) -> bool {
        if matches!(self.revision(), Some(held) if snapshot.revision < held) {
            return false;
        }
        self.canonical = Some(snapshot);
        self.pending = None;
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        db_types::{OrderId, OrderStatusType},
        live::Topic,
    };

    fn snapshot(revision: u64, status: OrderStatusType) -> Snapshot<OrderStatusType> {
        Snapshot { topic: Topic::Order(OrderId::from("o".to_string())), revision, data: status }
    }

    #[test]
    fn overlay_is_shown_but_never_trusted() {
        let mut view = LiveView::new();
        assert!(view.current().is_none());
        assert!(view.reconcile(snapshot(3, OrderStatusType::Shipped)));
        view.set_pending(OrderStatusType::Completed);
        assert_eq!(view.current(), Some(&OrderStatusType::Completed));
        assert_eq!(view.canonical(), Some(&OrderStatusType::Shipped));
        // The store says otherwise: a complaint won the race
        assert!(view.reconcile(snapshot(4, OrderStatusType::Complaint)));
        assert!(!view.is_pending());
        assert_eq!(view.current(), Some(&OrderStatusType::Complaint));
    }

    #[test]
    fn stale_snapshots_are_ignored() {
        let mut view = LiveView::new();
        view.reconcile(snapshot(7, OrderStatusType::Design));
        assert!(!view.reconcile(snapshot(6, OrderStatusType::Consultation)));
        assert_eq!(view.current(), Some(&OrderStatusType::Design));
        assert!(view.reconcile(snapshot(7, OrderStatusType::Design)));
        assert_eq!(view.revision(), Some(7));
    }

    #[test]
    fn failed_writes_fall_back_to_canonical() {
        let mut view = LiveView::new();
        view.reconcile(snapshot(1, OrderStatusType::Consultation));
        view.set_pending(OrderStatusType::Cancelled);
        view.fail_pending();
        assert_eq!(view.current(), Some(&OrderStatusType::Consultation));
    }
}
