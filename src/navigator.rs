//! Keyboard navigation over the visible rows.
//!
//! Up/Down/Home/End/PageUp/PageDown move the selected index; Left and Right
//! walk the hierarchy (collapse or go to the parent, expand or go to the first
//! child).

use crate::store::{IndexUpdate, ItemSpec, TreeAction, TreeState};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Left,
    Right,
}

/// Action for `key`, or `None` when there is nothing to move over.
///
/// `page_rows` is how many rows a page key skips; it is treated as at least one.
pub fn nav_action<T>(item_count: usize, key: NavKey, page_rows: usize) -> Option<TreeAction<T>> {
    let last = item_count.saturating_sub(1);
    let page = page_rows.max(1);
    let update = match key {
        NavKey::Left => return Some(TreeAction::CollapseOrSelectParent),
        NavKey::Right => return Some(TreeAction::ExpandOrSelectChild),
        _ if item_count == 0 => return None,
        NavKey::Down => IndexUpdate::With(Box::new(move |current| {
            Some(current.map_or(0, |index| (index + 1).min(last)))
        })),
        NavKey::Up => IndexUpdate::With(Box::new(move |current| {
            Some(current.map_or(0, |index| index.saturating_sub(1).min(last)))
        })),
        NavKey::PageDown => IndexUpdate::With(Box::new(move |current| {
            Some(current.map_or(0, |index| index.saturating_add(page).min(last)))
        })),
        NavKey::PageUp => IndexUpdate::With(Box::new(move |current| {
            Some(current.map_or(0, |index| index.saturating_sub(page).min(last)))
        })),
        NavKey::Home => IndexUpdate::To(Some(0)),
        NavKey::End => IndexUpdate::To(Some(last)),
    };
    Some(TreeAction::SetSelectedIndex(update))
}

impl<T> TreeState<T> {
    pub(crate) fn expand_or_select_child(&self) -> Self {
        let Some((index, row)) = self.selected_index().zip(self.selected_item()) else {
            return self.clone();
        };
        let Some(children) = &row.item.children else {
            return self.clone();
        };
        if !row.expanded {
            return self.expand(ItemSpec::Item(Arc::clone(&row.item)));
        }
        if children.is_empty() {
            return self.clone();
        }
        // children follow their parent directly
        self.set_selected_index(IndexUpdate::To(Some(index + 1)))
    }

    pub(crate) fn collapse_or_select_parent(&self) -> Self {
        let Some(row) = self.selected_item() else {
            return self.clone();
        };
        if row.item.is_expandable() && row.expanded {
            return self.collapse(ItemSpec::Item(Arc::clone(&row.item)));
        }
        match row.parent {
            Some(parent) => self.set_selected_index(IndexUpdate::To(Some(parent))),
            None => self.clone(),
        }
    }
}
