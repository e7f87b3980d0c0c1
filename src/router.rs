//! Per-row event routing.
//!
//! A single router serves every row: one handler per event kind, invoked with
//! the row index and the row item looked up at dispatch time. Handlers return a
//! message the owner applies afterwards, so they never hold on to the list.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowEventKind {
    Click,
    MouseDown,
    DoubleClick,
    ContextMenu,
    DragEnter,
    DragLeave,
    DragOver,
    Drop,
}

impl RowEventKind {
    pub const ALL: [RowEventKind; 8] = [
        RowEventKind::Click,
        RowEventKind::MouseDown,
        RowEventKind::DoubleClick,
        RowEventKind::ContextMenu,
        RowEventKind::DragEnter,
        RowEventKind::DragLeave,
        RowEventKind::DragOver,
        RowEventKind::Drop,
    ];
}

type RowHandler<E, I, R> = Box<dyn FnMut(&E, usize, &I) -> R>;

/// Handlers keyed by event kind, shared by all rows.
pub struct RowEventRouter<E, I, R = ()> {
    handlers: HashMap<RowEventKind, RowHandler<E, I, R>>,
}

impl<E, I, R> Default for RowEventRouter<E, I, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, I, R> RowEventRouter<E, I, R> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn on(
        mut self,
        kind: RowEventKind,
        handler: impl FnMut(&E, usize, &I) -> R + 'static,
    ) -> Self {
        self.set_handler(kind, handler);
        self
    }

    /// Replaces the handler for `kind`; rows pick it up on their next event.
    pub fn set_handler(
        &mut self,
        kind: RowEventKind,
        handler: impl FnMut(&E, usize, &I) -> R + 'static,
    ) {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn remove_handler(&mut self, kind: RowEventKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    pub fn has_handler(&self, kind: RowEventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Runs the handler for `kind` against the row currently at `index`.
    ///
    /// Returns `None` without calling anything when no handler is registered or
    /// the index no longer names a row.
    pub fn dispatch(
        &mut self,
        kind: RowEventKind,
        event: &E,
        index: usize,
        items: &[I],
    ) -> Option<R> {
        let handler = self.handlers.get_mut(&kind)?;
        let Some(item) = items.get(index) else {
            log::trace!("dropping {kind:?} for stale row {index}");
            return None;
        };
        Some(handler(event, index, item))
    }
}

/// Clicks within this interval on the same row count as a double click.
pub const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(400);

/// Derives double clicks from a stream of single presses.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last: Option<(usize, Instant)>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a press on `row`; true when it completes a double click.
    pub fn register(&mut self, row: usize, at: Instant) -> bool {
        if let Some((last_row, last_at)) = self.last
            && last_row == row
            && at.saturating_duration_since(last_at) <= DOUBLE_CLICK_INTERVAL
        {
            self.last = None;
            return true;
        }
        self.last = Some((row, at));
        false
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn dispatch_passes_index_and_live_item() {
        let mut router = RowEventRouter::<&str, String, String>::new()
            .on(RowEventKind::Click, |event, index, item| format!("{event}:{index}:{item}"));
        let items = vec!["a".to_string(), "b".to_string()];

        assert_eq!(
            router.dispatch(RowEventKind::Click, &"left", 1, &items),
            Some("left:1:b".to_string())
        );
    }

    #[test]
    fn unregistered_kinds_are_ignored() {
        let mut router = RowEventRouter::<(), u8>::new();
        assert!(!router.has_handler(RowEventKind::Drop));
        assert_eq!(router.dispatch(RowEventKind::Drop, &(), 0, &[1]), None);
    }

    #[test]
    fn stale_index_does_not_invoke_the_handler() {
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let mut router = RowEventRouter::<(), u8>::new().on(RowEventKind::Click, move |_, _, _| {
            *counter.borrow_mut() += 1;
        });

        assert_eq!(router.dispatch(RowEventKind::Click, &(), 3, &[1, 2]), None);
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(router.dispatch(RowEventKind::Click, &(), 1, &[1, 2]), Some(()));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn items_are_read_at_dispatch_time() {
        let mut router = RowEventRouter::<(), &str, &str>::new()
            .on(RowEventKind::DoubleClick, |_, _, item| *item);
        assert_eq!(router.dispatch(RowEventKind::DoubleClick, &(), 0, &["old"]), Some("old"));
        assert_eq!(router.dispatch(RowEventKind::DoubleClick, &(), 0, &["new"]), Some("new"));
    }

    #[test]
    fn replacing_and_removing_handlers() {
        let mut router =
            RowEventRouter::<(), u8, u8>::new().on(RowEventKind::DragOver, |_, _, _| 1);
        router.set_handler(RowEventKind::DragOver, |_, _, _| 2);
        assert_eq!(router.dispatch(RowEventKind::DragOver, &(), 0, &[0]), Some(2));

        assert!(router.remove_handler(RowEventKind::DragOver));
        assert!(!router.remove_handler(RowEventKind::DragOver));
        assert_eq!(router.dispatch(RowEventKind::DragOver, &(), 0, &[0]), None);
    }

    #[test]
    fn each_kind_routes_to_its_own_handler() {
        let mut router = RowEventRouter::<(), u8, RowEventKind>::new();
        for kind in RowEventKind::ALL {
            router.set_handler(kind, move |_, _, _| kind);
        }
        for kind in RowEventKind::ALL {
            assert_eq!(router.dispatch(kind, &(), 0, &[0]), Some(kind));
        }
    }

    #[test]
    fn second_press_on_the_same_row_is_a_double_click() {
        let start = Instant::now();
        let mut tracker = ClickTracker::new();
        assert!(!tracker.register(2, start));
        assert!(tracker.register(2, start + Duration::from_millis(150)));
        // a third press starts over
        assert!(!tracker.register(2, start + Duration::from_millis(200)));
    }

    #[test]
    fn slow_or_moved_presses_stay_single() {
        let start = Instant::now();
        let mut tracker = ClickTracker::new();
        assert!(!tracker.register(1, start));
        assert!(!tracker.register(2, start + Duration::from_millis(100)));
        assert!(!tracker.register(2, start + Duration::from_millis(600)));
    }
}
