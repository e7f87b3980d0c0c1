//! Reducer owning the expansion set, the flattened rows and the selection.
//!
//! Every action returns a new [`TreeState`]; the previous one stays valid, which
//! lets callers compare old and new states after a dispatch.

use crate::flatten::{VisibleItem, flatten};
use crate::reconcile::{reconcile_selection, same_node};
use crate::tree::{KeyFn, Node, walk_tree};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Addresses a node either directly or through its current row index.
pub enum ItemSpec<T> {
    Item(Node<T>),
    Index(usize),
}

pub enum IndexUpdate {
    To(Option<usize>),
    With(Box<dyn FnOnce(Option<usize>) -> Option<usize>>),
}

pub enum TreeAction<T> {
    Reset { items: Vec<Node<T>>, key: KeyFn<T> },
    Expand(ItemSpec<T>),
    Collapse(ItemSpec<T>),
    Toggle(ItemSpec<T>),
    ExpandAll,
    CollapseAll,
    SetSelectedIndex(IndexUpdate),
    SetSelectedItem(Option<Node<T>>),
    SelectByPredicate(Box<dyn Fn(&VisibleItem<T>) -> bool>),
    ExpandOrSelectChild,
    CollapseOrSelectParent,
}

impl<T> TreeAction<T> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reset { .. } => "reset",
            Self::Expand(_) => "expand",
            Self::Collapse(_) => "collapse",
            Self::Toggle(_) => "toggle",
            Self::ExpandAll => "expand_all",
            Self::CollapseAll => "collapse_all",
            Self::SetSelectedIndex(_) => "set_selected_index",
            Self::SetSelectedItem(_) => "set_selected_item",
            Self::SelectByPredicate(_) => "select_by_predicate",
            Self::ExpandOrSelectChild => "expand_or_select_child",
            Self::CollapseOrSelectParent => "collapse_or_select_parent",
        }
    }
}

impl<T> fmt::Debug for TreeAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct TreeState<T> {
    key: KeyFn<T>,
    items: Arc<[Node<T>]>,
    visible_items: Arc<[VisibleItem<T>]>,
    expanded_keys: Arc<BTreeSet<String>>,
    selected_index: Option<usize>,
}

impl<T> Clone for TreeState<T> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            items: Arc::clone(&self.items),
            visible_items: Arc::clone(&self.visible_items),
            expanded_keys: Arc::clone(&self.expanded_keys),
            selected_index: self.selected_index,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for TreeState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeState")
            .field("roots", &self.items.len())
            .field("visible_items", &self.visible_items)
            .field("expanded_keys", &self.expanded_keys)
            .field("selected_index", &self.selected_index)
            .finish()
    }
}

impl<T> TreeState<T> {
    pub fn new(key: KeyFn<T>) -> Self {
        Self {
            key,
            items: Arc::from(Vec::new()),
            visible_items: Arc::from(Vec::new()),
            expanded_keys: Arc::new(BTreeSet::new()),
            selected_index: None,
        }
    }

    pub fn items(&self) -> &[Node<T>] {
        &self.items
    }

    pub fn visible_items(&self) -> &[VisibleItem<T>] {
        &self.visible_items
    }

    pub fn expanded_keys(&self) -> &BTreeSet<String> {
        &self.expanded_keys
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn selected_item(&self) -> Option<&VisibleItem<T>> {
        self.selected_index
            .and_then(|index| self.visible_items.get(index))
    }

    pub fn get(&self, index: usize) -> Option<&VisibleItem<T>> {
        self.visible_items.get(index)
    }

    pub fn len(&self) -> usize {
        self.visible_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible_items.is_empty()
    }

    pub fn key(&self) -> &KeyFn<T> {
        &self.key
    }

    pub fn key_of(&self, data: &T) -> String {
        (self.key)(data)
    }

    pub fn is_expanded(&self, node: &Node<T>) -> bool {
        node.is_expandable() && self.expanded_keys.contains(&self.key_of(&node.data))
    }

    /// True when both states hold the very same row sequence.
    pub fn shares_rows_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.visible_items, &other.visible_items)
    }

    pub fn reduce(&self, action: TreeAction<T>) -> Self {
        log::trace!("tree action {}", action.name());
        match action {
            TreeAction::Reset { items, key } => self.reset(items, key),
            TreeAction::Expand(spec) => self.expand(spec),
            TreeAction::Collapse(spec) => self.collapse(spec),
            TreeAction::Toggle(spec) => self.toggle(spec),
            TreeAction::ExpandAll => self.expand_all(),
            TreeAction::CollapseAll => self.collapse_all(),
            TreeAction::SetSelectedIndex(update) => self.set_selected_index(update),
            TreeAction::SetSelectedItem(node) => self.set_selected_item(node.as_ref()),
            TreeAction::SelectByPredicate(predicate) => self.select_by_predicate(&*predicate),
            TreeAction::ExpandOrSelectChild => self.expand_or_select_child(),
            TreeAction::CollapseOrSelectParent => self.collapse_or_select_parent(),
        }
    }

    fn reset(&self, items: Vec<Node<T>>, key: KeyFn<T>) -> Self {
        let visible_items = flatten(&items, &self.expanded_keys, &*key);
        let selected_index = reconcile_selection(
            &self.visible_items,
            self.selected_index,
            &visible_items,
            &*key,
        );
        log::debug!(
            "tree reset: {} roots, {} visible rows",
            items.len(),
            visible_items.len()
        );
        Self {
            key,
            items: Arc::from(items),
            visible_items: Arc::from(visible_items),
            expanded_keys: Arc::clone(&self.expanded_keys),
            selected_index,
        }
    }

    fn resolve(&self, spec: ItemSpec<T>) -> Option<Node<T>> {
        match spec {
            ItemSpec::Item(node) => Some(node),
            ItemSpec::Index(index) => self
                .visible_items
                .get(index)
                .map(|row| Arc::clone(&row.item)),
        }
    }

    pub(crate) fn expand(&self, spec: ItemSpec<T>) -> Self {
        let Some(node) = self.resolve(spec) else {
            return self.clone();
        };
        if !node.is_expandable() {
            return self.clone();
        }
        let key = self.key_of(&node.data);
        if self.expanded_keys.contains(&key) {
            return self.clone();
        }
        let mut expanded_keys = (*self.expanded_keys).clone();
        expanded_keys.insert(key);
        self.with_expanded_keys(expanded_keys)
    }

    pub(crate) fn collapse(&self, spec: ItemSpec<T>) -> Self {
        let Some(node) = self.resolve(spec) else {
            return self.clone();
        };
        if !node.is_expandable() {
            return self.clone();
        }
        let key = self.key_of(&node.data);
        if !self.expanded_keys.contains(&key) {
            return self.clone();
        }
        let mut expanded_keys = (*self.expanded_keys).clone();
        expanded_keys.remove(&key);
        self.with_expanded_keys(expanded_keys)
    }

    fn toggle(&self, spec: ItemSpec<T>) -> Self {
        let Some(node) = self.resolve(spec) else {
            return self.clone();
        };
        if self.is_expanded(&node) {
            self.collapse(ItemSpec::Item(node))
        } else {
            self.expand(ItemSpec::Item(node))
        }
    }

    fn expand_all(&self) -> Self {
        // every expandable node, including those under collapsed ancestors
        let expanded_keys: BTreeSet<String> = walk_tree(&self.items)
            .filter(|node| node.is_expandable())
            .map(|node| self.key_of(&node.data))
            .collect();
        self.with_expanded_keys(expanded_keys)
    }

    fn collapse_all(&self) -> Self {
        self.with_expanded_keys(BTreeSet::new())
    }

    pub(crate) fn set_selected_index(&self, update: IndexUpdate) -> Self {
        let index = match update {
            IndexUpdate::To(index) => index,
            IndexUpdate::With(update) => update(self.selected_index),
        };
        Self {
            selected_index: index.filter(|index| *index < self.visible_items.len()),
            ..self.clone()
        }
    }

    fn set_selected_item(&self, node: Option<&Node<T>>) -> Self {
        let selected_index = node.and_then(|node| {
            self.visible_items
                .iter()
                .position(|row| same_node(&row.item, node, &*self.key))
        });
        Self {
            selected_index,
            ..self.clone()
        }
    }

    fn select_by_predicate(&self, predicate: &dyn Fn(&VisibleItem<T>) -> bool) -> Self {
        Self {
            selected_index: self.visible_items.iter().position(predicate),
            ..self.clone()
        }
    }

    fn with_expanded_keys(&self, expanded_keys: BTreeSet<String>) -> Self {
        let visible_items = flatten(&self.items, &expanded_keys, &*self.key);
        let selected_index = reconcile_selection(
            &self.visible_items,
            self.selected_index,
            &visible_items,
            &*self.key,
        );
        log::debug!(
            "tree reflattened: {} expanded, {} visible rows",
            expanded_keys.len(),
            visible_items.len()
        );
        Self {
            key: Arc::clone(&self.key),
            items: Arc::clone(&self.items),
            visible_items: Arc::from(visible_items),
            expanded_keys: Arc::new(expanded_keys),
            selected_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{TreeItem, key_fn};
    use pretty_assertions::assert_eq;

    type Rows = Vec<(&'static str, usize, bool)>;

    fn rows(state: &TreeState<&'static str>) -> Rows {
        state
            .visible_items()
            .iter()
            .map(|row| (row.item.data, row.level, row.expanded))
            .collect()
    }

    fn selected(state: &TreeState<&'static str>) -> Option<&'static str> {
        state.selected_item().map(|row| row.item.data)
    }

    fn sample() -> Vec<Node<&'static str>> {
        vec![
            TreeItem::branch("A", vec![TreeItem::leaf("A1"), TreeItem::leaf("A2")]),
            TreeItem::leaf("B"),
        ]
    }

    fn loaded(items: Vec<Node<&'static str>>) -> TreeState<&'static str> {
        let key = key_fn(|data: &&'static str| data.to_string());
        TreeState::new(Arc::clone(&key)).reduce(TreeAction::Reset { items, key })
    }

    fn node(state: &TreeState<&'static str>, index: usize) -> Node<&'static str> {
        Arc::clone(&state.visible_items()[index].item)
    }

    #[test]
    fn reset_flattens_collapsed_roots() {
        let state = loaded(sample());
        assert_eq!(rows(&state), vec![("A", 0, false), ("B", 0, false)]);
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn expand_inserts_children_after_parent() {
        let state = loaded(sample());
        let a = node(&state, 0);
        let state = state.reduce(TreeAction::Expand(ItemSpec::Item(a)));
        assert_eq!(
            rows(&state),
            vec![("A", 0, true), ("A1", 1, false), ("A2", 1, false), ("B", 0, false)]
        );
    }

    #[test]
    fn collapse_of_ancestor_moves_selection_up() {
        let state = loaded(sample());
        let a = node(&state, 0);
        let state = state
            .reduce(TreeAction::Expand(ItemSpec::Item(Arc::clone(&a))))
            .reduce(TreeAction::SetSelectedIndex(IndexUpdate::To(Some(2))));
        assert_eq!(selected(&state), Some("A2"));

        let state = state.reduce(TreeAction::Collapse(ItemSpec::Item(Arc::clone(&a))));
        assert_eq!(rows(&state), vec![("A", 0, false), ("B", 0, false)]);
        assert_eq!(state.selected_index(), Some(0));
        assert!(Arc::ptr_eq(&state.selected_item().unwrap().item, &a));
    }

    #[test]
    fn clearing_the_index_clears_the_item() {
        let state = loaded(sample()).reduce(TreeAction::SetSelectedIndex(IndexUpdate::To(Some(1))));
        assert_eq!(selected(&state), Some("B"));
        let state = state.reduce(TreeAction::SetSelectedIndex(IndexUpdate::To(None)));
        assert_eq!(state.selected_item().map(|row| row.level), None);
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn out_of_range_index_is_stored_as_no_selection() {
        let state = loaded(sample()).reduce(TreeAction::SetSelectedIndex(IndexUpdate::To(Some(7))));
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn index_updater_sees_the_current_index() {
        let state = loaded(sample())
            .reduce(TreeAction::SetSelectedIndex(IndexUpdate::To(Some(0))))
            .reduce(TreeAction::SetSelectedIndex(IndexUpdate::With(Box::new(
                |current| current.map(|index| index + 1),
            ))));
        assert_eq!(selected(&state), Some("B"));
    }

    #[test]
    fn expand_and_collapse_are_idempotent() {
        let state = loaded(sample());
        let a = node(&state, 0);
        let once = state.reduce(TreeAction::Expand(ItemSpec::Item(Arc::clone(&a))));
        let twice = once.reduce(TreeAction::Expand(ItemSpec::Item(Arc::clone(&a))));
        assert!(twice.shares_rows_with(&once));

        let closed = twice.reduce(TreeAction::Collapse(ItemSpec::Item(Arc::clone(&a))));
        let again = closed.reduce(TreeAction::Collapse(ItemSpec::Item(a)));
        assert!(again.shares_rows_with(&closed));
    }

    #[test]
    fn leaves_are_never_expanded() {
        let state = loaded(sample());
        let b = node(&state, 1);
        let after = state.reduce(TreeAction::Expand(ItemSpec::Item(b)));
        assert!(after.expanded_keys().is_empty());
        assert!(after.shares_rows_with(&state));
    }

    #[test]
    fn toggle_twice_restores_expanded_keys() {
        let state = loaded(sample());
        let before = state.expanded_keys().clone();
        let after = state
            .reduce(TreeAction::Toggle(ItemSpec::Index(0)))
            .reduce(TreeAction::Toggle(ItemSpec::Index(0)));
        assert_eq!(after.expanded_keys(), &before);
    }

    #[test]
    fn index_spec_out_of_range_is_a_no_op() {
        let state = loaded(sample());
        let after = state.reduce(TreeAction::Expand(ItemSpec::Index(10)));
        assert!(after.shares_rows_with(&state));
    }

    #[test]
    fn unknown_node_only_touches_the_key_set() {
        let state = loaded(sample());
        let stranger = TreeItem::branch("Z", vec![TreeItem::leaf("Z1")]);
        let after = state.reduce(TreeAction::Expand(ItemSpec::Item(stranger)));
        assert!(after.expanded_keys().contains("Z"));
        assert_eq!(rows(&after), rows(&state));
    }

    #[test]
    fn expand_all_reaches_nodes_under_collapsed_ancestors() {
        let state = loaded(vec![TreeItem::branch(
            "a",
            vec![TreeItem::branch("a/b", vec![TreeItem::leaf("a/b/c")])],
        )]);
        let state = state.reduce(TreeAction::ExpandAll);
        assert_eq!(
            rows(&state),
            vec![("a", 0, true), ("a/b", 1, true), ("a/b/c", 2, false)]
        );
        let state = state.reduce(TreeAction::CollapseAll);
        assert_eq!(rows(&state), vec![("a", 0, false)]);
        assert!(state.expanded_keys().is_empty());
    }

    #[test]
    fn expanded_keys_survive_reset() {
        let state = loaded(sample()).reduce(TreeAction::Expand(ItemSpec::Index(0)));
        let key = Arc::clone(state.key());
        let state = state.reduce(TreeAction::Reset {
            items: sample(),
            key,
        });
        assert_eq!(
            rows(&state),
            vec![("A", 0, true), ("A1", 1, false), ("A2", 1, false), ("B", 0, false)]
        );
    }

    #[test]
    fn reset_keeps_selection_by_key_path() {
        let state = loaded(sample())
            .reduce(TreeAction::Expand(ItemSpec::Index(0)))
            .reduce(TreeAction::SetSelectedIndex(IndexUpdate::To(Some(3))));
        assert_eq!(selected(&state), Some("B"));

        // B is now first; A lost A1
        let key = Arc::clone(state.key());
        let state = state.reduce(TreeAction::Reset {
            items: vec![
                TreeItem::leaf("B"),
                TreeItem::branch("A", vec![TreeItem::leaf("A2")]),
            ],
            key,
        });
        assert_eq!(state.selected_index(), Some(0));
        assert_eq!(selected(&state), Some("B"));
    }

    #[test]
    fn reset_falls_back_to_surviving_ancestor() {
        let state = loaded(sample())
            .reduce(TreeAction::Expand(ItemSpec::Index(0)))
            .reduce(TreeAction::SetSelectedIndex(IndexUpdate::To(Some(1))));
        assert_eq!(selected(&state), Some("A1"));

        let key = Arc::clone(state.key());
        let state = state.reduce(TreeAction::Reset {
            items: vec![TreeItem::branch("A", vec![TreeItem::leaf("A2")])],
            key,
        });
        assert_eq!(selected(&state), Some("A"));
    }

    #[test]
    fn old_state_stays_valid_after_dispatch() {
        let before = loaded(sample());
        let after = before.reduce(TreeAction::ExpandAll);
        assert_eq!(before.len(), 2);
        assert_eq!(after.len(), 4);
    }

    #[test]
    fn set_selected_item_finds_by_identity() {
        let state = loaded(sample()).reduce(TreeAction::ExpandAll);
        let a2 = node(&state, 2);
        let state = state.reduce(TreeAction::SetSelectedItem(Some(a2)));
        assert_eq!(state.selected_index(), Some(2));
        let state = state.reduce(TreeAction::SetSelectedItem(None));
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn select_by_predicate_takes_first_match() {
        let state = loaded(sample())
            .reduce(TreeAction::ExpandAll)
            .reduce(TreeAction::SelectByPredicate(Box::new(|row| row.level == 1)));
        assert_eq!(selected(&state), Some("A1"));

        let state = state.reduce(TreeAction::SelectByPredicate(Box::new(|row| row.level == 9)));
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn key_collisions_do_not_touch_unrelated_nodes() {
        // both branches answer to "dup"; "other" must stay collapsed
        let key = key_fn(|data: &&'static str| {
            if data.starts_with("dup") {
                "dup".to_string()
            } else {
                data.to_string()
            }
        });
        let items = vec![
            TreeItem::branch("dup-1", vec![TreeItem::leaf("x")]),
            TreeItem::branch("dup-2", vec![TreeItem::leaf("y")]),
            TreeItem::branch("other", vec![TreeItem::leaf("z")]),
        ];
        let state = TreeState::new(Arc::clone(&key))
            .reduce(TreeAction::Reset { items, key })
            .reduce(TreeAction::Expand(ItemSpec::Index(0)));
        assert!(!state.expanded_keys().contains("other"));
        assert_eq!(state.visible_items().last().map(|row| row.expanded), Some(false));
    }
}
