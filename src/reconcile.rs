//! Keeps "the selected item" stable when the visible sequence is rebuilt.

use crate::flatten::VisibleItem;
use crate::tree::Node;
use std::sync::Arc;

/// Pointer identity, falling back to key equality so a node survives being
/// replaced by an equal-keyed one after a reload or filter change.
pub fn same_node<T>(a: &Node<T>, b: &Node<T>, key: &dyn Fn(&T) -> String) -> bool {
    Arc::ptr_eq(a, b) || key(&a.data) == key(&b.data)
}

/// Nodes from the row at `index` up to its root, leaf first.
pub fn ancestor_path<T>(visible: &[VisibleItem<T>], index: usize) -> Vec<&Node<T>> {
    let mut path = Vec::new();
    let mut current = visible.get(index);
    while let Some(row) = current {
        path.push(&row.item);
        current = row.parent.and_then(|parent| visible.get(parent));
    }
    path
}

/// Where the previous selection lives in `next`.
///
/// Keeps the index when the same node is still there. Otherwise walks `next`
/// matching the old selection's ancestor chain root first and settles on the
/// deepest entry that is still visible, so collapsing an ancestor moves the
/// selection onto that ancestor.
pub fn reconcile_selection<T>(
    previous: &[VisibleItem<T>],
    selected: Option<usize>,
    next: &[VisibleItem<T>],
    key: &dyn Fn(&T) -> String,
) -> Option<usize> {
    let index = selected?;
    let old = previous.get(index)?;

    if let Some(row) = next.get(index)
        && same_node(&row.item, &old.item, key)
    {
        return Some(index);
    }

    let mut chain = ancestor_path(previous, index);
    let mut target = chain.pop();
    let mut last_match = None;
    for (position, row) in next.iter().enumerate() {
        let Some(wanted) = target else {
            break;
        };
        if same_node(&row.item, wanted, key) {
            last_match = Some(position);
            target = chain.pop();
        }
    }

    log::trace!("selection moved from {index} to {last_match:?}");
    last_match
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::tree::TreeItem;
    use std::collections::BTreeSet;

    fn key(data: &&'static str) -> String {
        data.to_string()
    }

    fn expanded(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn sample() -> Vec<Node<&'static str>> {
        vec![
            TreeItem::branch(
                "A",
                vec![
                    TreeItem::leaf("A1"),
                    TreeItem::branch("A2", vec![TreeItem::leaf("A2x")]),
                ],
            ),
            TreeItem::branch("B", vec![TreeItem::leaf("B1")]),
        ]
    }

    #[test]
    fn no_selection_stays_unselected() {
        let roots = sample();
        let before = flatten(&roots, &BTreeSet::new(), &key);
        let after = flatten(&roots, &expanded(&["A"]), &key);
        assert_eq!(reconcile_selection(&before, None, &after, &key), None);
    }

    #[test]
    fn unmoved_selection_keeps_its_index() {
        let roots = sample();
        let before = flatten(&roots, &expanded(&["A"]), &key);
        let after = flatten(&roots, &expanded(&["A", "B"]), &key);
        // A1 at index 1 in both
        assert_eq!(reconcile_selection(&before, Some(1), &after, &key), Some(1));
    }

    #[test]
    fn shifted_selection_is_found_again() {
        let roots = sample();
        let before = flatten(&roots, &BTreeSet::new(), &key);
        let after = flatten(&roots, &expanded(&["A"]), &key);
        // B moves from 1 to 3
        assert_eq!(reconcile_selection(&before, Some(1), &after, &key), Some(3));
    }

    #[test]
    fn collapsing_an_ancestor_selects_the_ancestor() {
        let roots = sample();
        let before = flatten(&roots, &expanded(&["A", "A2"]), &key);
        assert_eq!(before[3].item.data, "A2x");
        let after = flatten(&roots, &BTreeSet::new(), &key);
        assert_eq!(reconcile_selection(&before, Some(3), &after, &key), Some(0));
    }

    #[test]
    fn collapsing_the_middle_ancestor_selects_it() {
        let roots = sample();
        let before = flatten(&roots, &expanded(&["A", "A2"]), &key);
        let after = flatten(&roots, &expanded(&["A"]), &key);
        assert_eq!(reconcile_selection(&before, Some(3), &after, &key), Some(2));
    }

    #[test]
    fn vanished_chain_clears_selection() {
        let roots = sample();
        let before = flatten(&roots, &BTreeSet::new(), &key);
        let others = vec![TreeItem::leaf("Z")];
        let after = flatten(&others, &BTreeSet::new(), &key);
        assert_eq!(reconcile_selection(&before, Some(0), &after, &key), None);
    }

    #[test]
    fn ancestor_path_runs_leaf_to_root() {
        let roots = sample();
        let rows = flatten(&roots, &expanded(&["A", "A2"]), &key);
        let path: Vec<&str> = ancestor_path(&rows, 3).iter().map(|n| n.data).collect();
        assert_eq!(path, vec!["A2x", "A2", "A"]);
    }

    #[test]
    fn equal_keys_match_across_rebuilt_trees() {
        let roots = sample();
        let before = flatten(&roots, &expanded(&["A"]), &key);
        let rebuilt = sample();
        let after = flatten(&rebuilt, &expanded(&["A"]), &key);
        assert_eq!(reconcile_selection(&before, Some(2), &after, &key), Some(2));
        assert!(!Arc::ptr_eq(&before[2].item, &after[2].item));
    }
}
