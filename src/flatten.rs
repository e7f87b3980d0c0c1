//! Turns a forest plus a set of expanded keys into the ordered sequence of rows
//! a list actually shows.

use crate::tree::Node;
use std::collections::BTreeSet;
use std::fmt;
use std::slice;
use std::sync::Arc;

/// One row of the flattened tree.
///
/// `parent` indexes the enclosing row in the same sequence and is meaningless
/// once that sequence is replaced.
pub struct VisibleItem<T> {
    pub item: Node<T>,
    pub parent: Option<usize>,
    pub level: usize,
    pub expanded: bool,
}

impl<T> Clone for VisibleItem<T> {
    fn clone(&self) -> Self {
        Self {
            item: Arc::clone(&self.item),
            parent: self.parent,
            level: self.level,
            expanded: self.expanded,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for VisibleItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibleItem")
            .field("data", &self.item.data)
            .field("parent", &self.parent)
            .field("level", &self.level)
            .field("expanded", &self.expanded)
            .finish()
    }
}

struct Frame<'a, T> {
    siblings: slice::Iter<'a, Node<T>>,
    parent: Option<usize>,
    level: usize,
}

/// Lazy depth-first pre-order walk that never descends into collapsed nodes.
pub struct VisibleItems<'a, T> {
    stack: Vec<Frame<'a, T>>,
    expanded_keys: &'a BTreeSet<String>,
    key: &'a dyn Fn(&T) -> String,
    emitted: usize,
}

impl<T> Iterator for VisibleItems<'_, T> {
    type Item = VisibleItem<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(node) = frame.siblings.next() else {
                self.stack.pop();
                continue;
            };
            let parent = frame.parent;
            let level = frame.level;
            let index = self.emitted;
            self.emitted += 1;

            let expanded = match &node.children {
                Some(children) => {
                    let expanded = self.expanded_keys.contains(&(self.key)(&node.data));
                    if expanded {
                        self.stack.push(Frame {
                            siblings: children.iter(),
                            parent: Some(index),
                            level: level + 1,
                        });
                    }
                    expanded
                }
                None => false,
            };

            return Some(VisibleItem {
                item: Arc::clone(node),
                parent,
                level,
                expanded,
            });
        }
    }
}

pub fn visible_items<'a, T>(
    roots: &'a [Node<T>],
    expanded_keys: &'a BTreeSet<String>,
    key: &'a dyn Fn(&T) -> String,
) -> VisibleItems<'a, T> {
    VisibleItems {
        stack: vec![Frame {
            siblings: roots.iter(),
            parent: None,
            level: 0,
        }],
        expanded_keys,
        key,
        emitted: 0,
    }
}

pub fn flatten<T>(
    roots: &[Node<T>],
    expanded_keys: &BTreeSet<String>,
    key: &dyn Fn(&T) -> String,
) -> Vec<VisibleItem<T>> {
    visible_items(roots, expanded_keys, key).collect()
}
