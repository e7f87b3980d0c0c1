//! Immutable tree input shape plus the helpers callers use to prepare it
//! (walking, filtering and sorting) before handing it to a [`TreeState`].
//!
//! [`TreeState`]: crate::store::TreeState

use std::cmp::Ordering;
use std::slice;
use std::sync::Arc;

/// Shared handle to a tree node. Node identity is pointer identity.
pub type Node<T> = Arc<TreeItem<T>>;

/// Caller supplied key function. Must be injective over the nodes of the current tree.
pub type KeyFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// A node holding a payload and, when expandable, an ordered list of children.
///
/// `children: Some(vec![])` is still expandable; `None` marks a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem<T> {
    pub data: T,
    pub children: Option<Vec<Node<T>>>,
}

impl<T> TreeItem<T> {
    pub fn leaf(data: T) -> Node<T> {
        Arc::new(Self {
            data,
            children: None,
        })
    }

    pub fn branch(data: T, children: Vec<Node<T>>) -> Node<T> {
        Arc::new(Self {
            data,
            children: Some(children),
        })
    }

    pub fn is_expandable(&self) -> bool {
        self.children.is_some()
    }

    pub fn children(&self) -> &[Node<T>] {
        self.children.as_deref().unwrap_or(&[])
    }
}

pub fn key_fn<T, F>(f: F) -> KeyFn<T>
where
    F: Fn(&T) -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Pre-order iterator over every node of a forest, collapsed or not.
pub struct WalkTree<'a, T> {
    stack: Vec<slice::Iter<'a, Node<T>>>,
}

impl<'a, T> Iterator for WalkTree<'a, T> {
    type Item = &'a Node<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let siblings = self.stack.last_mut()?;
            match siblings.next() {
                Some(node) => {
                    if let Some(children) = &node.children {
                        self.stack.push(children.iter());
                    }
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

pub fn walk_tree<T>(roots: &[Node<T>]) -> WalkTree<'_, T> {
    WalkTree {
        stack: vec![roots.iter()],
    }
}

/// Keeps every node whose payload matches `predicate`, together with the
/// ancestors needed to reach it.
///
/// A matching node is shared as-is (its whole subtree survives). A non-matching
/// expandable node survives as a fresh copy holding only its filtered children,
/// and is dropped when none of them match.
pub fn filter_tree_items<T, P>(items: &[Node<T>], predicate: &P) -> Vec<Node<T>>
where
    T: Clone,
    P: Fn(&T) -> bool,
{
    items
        .iter()
        .filter_map(|item| filter_tree_item(item, predicate))
        .collect()
}

pub fn filter_tree_item<T, P>(item: &Node<T>, predicate: &P) -> Option<Node<T>>
where
    T: Clone,
    P: Fn(&T) -> bool,
{
    if predicate(&item.data) {
        return Some(Arc::clone(item));
    }
    let children = filter_tree_items(item.children.as_deref()?, predicate);
    if children.is_empty() {
        return None;
    }
    Some(TreeItem::branch(item.data.clone(), children))
}

/// Sorts every sibling list of the forest in place.
///
/// Nodes shared with another owner are copied before their children are sorted.
pub fn sort_tree<T, F>(nodes: &mut [Node<T>], compare: &F)
where
    T: Clone,
    F: Fn(&TreeItem<T>, &TreeItem<T>) -> Ordering,
{
    nodes.sort_by(|a, b| compare(&**a, &**b));
    for node in nodes.iter_mut() {
        if node.children.is_none() {
            continue;
        }
        if let Some(children) = Arc::make_mut(node).children.as_mut() {
            sort_tree(children, compare);
        }
    }
}
