//! A virtualized tree view: the reducer state plus row geometry and a scroll
//! window, kept consistent with each other.

use crate::flatten::VisibleItem;
use crate::navigator::{NavKey, nav_action};
use crate::store::{ItemSpec, TreeAction, TreeState};
use crate::tree::{KeyFn, Node};
use crate::window::{Align, RowMetrics, Window};
use std::ops::Range;
use std::sync::Arc;

pub enum RowSize<T> {
    Fixed(u32),
    PerItem(Arc<dyn Fn(&T) -> u32 + Send + Sync>),
}

impl<T> Clone for RowSize<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(size) => Self::Fixed(*size),
            Self::PerItem(size_of) => Self::PerItem(Arc::clone(size_of)),
        }
    }
}

impl<T> Default for RowSize<T> {
    fn default() -> Self {
        Self::Fixed(1)
    }
}

impl<T> RowSize<T> {
    fn metrics(&self, rows: &[VisibleItem<T>]) -> RowMetrics {
        match self {
            Self::Fixed(size) => RowMetrics::fixed(*size, rows.len()),
            Self::PerItem(size_of) => {
                RowMetrics::variable(rows.len(), |index| size_of(&rows[index].item.data))
            }
        }
    }
}

pub struct VirtualTree<T> {
    state: TreeState<T>,
    row_size: RowSize<T>,
    metrics: RowMetrics,
    window: Window,
}

impl<T> VirtualTree<T> {
    pub fn new(key: KeyFn<T>, row_size: RowSize<T>, overscan: usize) -> Self {
        let state = TreeState::new(key);
        let metrics = row_size.metrics(state.visible_items());
        Self {
            state,
            row_size,
            metrics,
            window: Window::new(overscan),
        }
    }

    pub fn state(&self) -> &TreeState<T> {
        &self.state
    }

    pub fn metrics(&self) -> &RowMetrics {
        &self.metrics
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state.selected_index()
    }

    pub fn selected_item(&self) -> Option<&VisibleItem<T>> {
        self.state.selected_item()
    }

    /// Runs `action` and returns whether the selection changed.
    ///
    /// A changed selection is scrolled into view.
    pub fn dispatch(&mut self, action: TreeAction<T>) -> bool {
        let next = self.state.reduce(action);
        let changed = selection_changed(&self.state, &next);
        let rows_changed = !next.shares_rows_with(&self.state);
        self.state = next;

        if rows_changed {
            self.metrics = self.row_size.metrics(self.state.visible_items());
            self.window.clamp(&self.metrics);
        }
        if changed && let Some(index) = self.state.selected_index() {
            self.window.scroll_to_item(index, Align::Auto, &self.metrics);
        }
        changed
    }

    pub fn reset(&mut self, items: Vec<Node<T>>, key: KeyFn<T>) -> bool {
        self.dispatch(TreeAction::Reset { items, key })
    }

    pub fn expand(&mut self, spec: ItemSpec<T>) -> bool {
        self.dispatch(TreeAction::Expand(spec))
    }

    pub fn collapse(&mut self, spec: ItemSpec<T>) -> bool {
        self.dispatch(TreeAction::Collapse(spec))
    }

    pub fn toggle(&mut self, spec: ItemSpec<T>) -> bool {
        self.dispatch(TreeAction::Toggle(spec))
    }

    pub fn expand_all(&mut self) -> bool {
        self.dispatch(TreeAction::ExpandAll)
    }

    pub fn collapse_all(&mut self) -> bool {
        self.dispatch(TreeAction::CollapseAll)
    }

    pub fn handle_nav_key(&mut self, key: NavKey) -> bool {
        let page_rows = self.window.visible_range(&self.metrics).len().max(1);
        match nav_action(self.state.len(), key, page_rows) {
            Some(action) => self.dispatch(action),
            None => false,
        }
    }

    pub fn scroll_to_item(&mut self, index: usize, align: Align) -> bool {
        self.window.scroll_to_item(index, align, &self.metrics)
    }

    pub fn scroll_by(&mut self, delta: i64) -> bool {
        self.window.scroll_by(delta, &self.metrics)
    }

    /// Resizes the viewport, keeping the selection in view.
    pub fn set_viewport_extent(&mut self, extent: u64) {
        if extent == self.window.extent() {
            return;
        }
        self.window.set_extent(extent, &self.metrics);
        if let Some(index) = self.state.selected_index() {
            self.window.scroll_to_item(index, Align::Auto, &self.metrics);
        }
    }

    pub fn set_row_size(&mut self, row_size: RowSize<T>) {
        self.row_size = row_size;
        self.metrics = self.row_size.metrics(self.state.visible_items());
        self.window.clamp(&self.metrics);
    }

    /// Row at `index`; `None` stands in for a placeholder row.
    pub fn row(&self, index: usize) -> Option<&VisibleItem<T>> {
        self.state.get(index)
    }

    pub fn render_range(&self) -> Range<usize> {
        self.window.render_range(&self.metrics)
    }

    /// Rows to materialize with their indexes.
    pub fn rendered_rows(&self) -> impl Iterator<Item = (usize, &VisibleItem<T>)> + '_ {
        let range = self.render_range();
        let start = range.start;
        self.state.visible_items()[range]
            .iter()
            .enumerate()
            .map(move |(offset, row)| (start + offset, row))
    }

    /// Row under a viewport-relative position.
    pub fn row_at(&self, position: u64) -> Option<usize> {
        self.window.row_at(position, &self.metrics)
    }
}

fn selection_changed<T>(before: &TreeState<T>, after: &TreeState<T>) -> bool {
    match (before.selected_item(), after.selected_item()) {
        (None, None) => false,
        (Some(old), Some(new)) => {
            before.selected_index() != after.selected_index() || !Arc::ptr_eq(&old.item, &new.item)
        }
        _ => true,
    }
}
