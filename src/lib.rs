//! Virtualized hierarchical list engine.
//!
//! A caller hands in a forest of [`TreeItem`]s and a key function. The engine
//! keeps the set of expanded keys and flattens the forest into the rows that
//! are actually visible. It keeps the selection pointing at the same node
//! across structural changes and works out which slice of rows a viewport
//! needs to render.

pub mod flatten;
pub mod navigator;
pub mod reconcile;
pub mod router;
pub mod store;
pub mod tree;
pub mod virtual_tree;
pub mod window;

pub use flatten::{VisibleItem, flatten, visible_items};
pub use navigator::{NavKey, nav_action};
pub use reconcile::reconcile_selection;
pub use router::{ClickTracker, RowEventKind, RowEventRouter};
pub use store::{IndexUpdate, ItemSpec, TreeAction, TreeState};
pub use tree::{KeyFn, Node, TreeItem, filter_tree_items, key_fn, sort_tree, walk_tree};
pub use virtual_tree::{RowSize, VirtualTree};
pub use window::{Align, DEFAULT_OVERSCAN, RowMetrics, Window};
