use crate::config::AppConfig;
use crate::domain::{Keymap, LsTreeEntry, entry_key};
use lstree_tui::{
    ClickTracker, ItemSpec, KeyFn, NavKey, Node, RowEventKind, RowEventRouter, RowSize, TreeAction,
    VirtualTree, VisibleItem, filter_tree_items, key_fn,
};
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::Instant;

const MAX_LOG_LINES: usize = 500;
pub(crate) const HIGHLIGHT_WIDTH: u16 = 2;
const INDENT_WIDTH: usize = 2;
const MARKER_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneFocus {
    List,
    Detail,
    Log,
}

impl PaneFocus {
    pub fn next(self) -> Self {
        match self {
            Self::List => Self::Detail,
            Self::Detail => Self::Log,
            Self::Log => Self::List,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState {
    None,
    Help,
    Filter { value: String, original: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendTask {
    LoadTree { revision: String },
    LoadBlob { revision: String, path: String },
}

#[derive(Debug, Clone)]
pub enum BackendEvent {
    TreeLoaded {
        revision: String,
        roots: Vec<Node<LsTreeEntry>>,
    },
    BlobLoaded {
        path: String,
        content: String,
    },
    Error {
        context: String,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPointer {
    pub column: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowMessage {
    Select(usize),
    Toggle(usize),
    Open(usize),
    Inspect(String),
}

type Router = RowEventRouter<RowPointer, VisibleItem<LsTreeEntry>, RowMessage>;

pub struct App {
    pub config: AppConfig,
    pub keymap: Keymap,
    pub focus: PaneFocus,
    pub revision: String,
    pub repo_label: String,
    pub tree: VirtualTree<LsTreeEntry>,
    roots: Vec<Node<LsTreeEntry>>,
    filter: String,
    router: Router,
    clicks: ClickTracker,
    pub list_area: Rect,
    pub detail_title: String,
    pub detail_text: String,
    pub detail_target: Option<String>,
    pub detail_scroll: usize,
    pub logs: Vec<String>,
    pub log_tail_offset: usize,
    pub modal: ModalState,
    pub busy: bool,
    pub loaded_once: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig, revision: String, repo_label: String) -> Self {
        let keymap = Keymap::from_config(&config.keymap);
        let tree = VirtualTree::new(entry_key_fn(), RowSize::Fixed(1), config.overscan);
        Self {
            config,
            keymap,
            focus: PaneFocus::List,
            revision,
            repo_label,
            tree,
            roots: Vec::new(),
            filter: String::new(),
            router: row_router(),
            clicks: ClickTracker::new(),
            list_area: Rect::default(),
            detail_title: "Preview".to_string(),
            detail_text: String::new(),
            detail_target: None,
            detail_scroll: 0,
            logs: Vec::new(),
            log_tail_offset: 0,
            modal: ModalState::None,
            busy: false,
            loaded_once: false,
            should_quit: false,
        }
    }

    pub fn apply_tree(&mut self, revision: String, roots: Vec<Node<LsTreeEntry>>) {
        let total = lstree_tui::walk_tree(&roots).count();
        self.log(format!("loaded {total} entries at {revision}"));
        self.revision = revision;
        self.roots = roots;
        self.clear_detail();
        self.rebuild_rows();
        if !self.loaded_once && self.config.expand_all_on_load {
            self.tree.expand_all();
        }
        self.loaded_once = true;
    }

    pub fn rebuild_rows(&mut self) -> bool {
        let items = if self.filter.is_empty() {
            self.roots.clone()
        } else {
            let needle = self.filter.as_str();
            filter_tree_items(&self.roots, &|entry: &LsTreeEntry| entry.path.contains(needle))
        };
        self.tree.reset(items, entry_key_fn())
    }

    pub fn list_filter(&self) -> &str {
        &self.filter
    }

    pub fn open_list_filter(&mut self) {
        self.modal = ModalState::Filter {
            value: self.filter.clone(),
            original: self.filter.clone(),
        };
    }

    pub fn apply_list_filter_immediately(&mut self, filter: String) -> bool {
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        self.rebuild_rows()
    }

    pub fn open_help(&mut self) {
        self.modal = ModalState::Help;
    }

    pub fn close_modal(&mut self) {
        self.modal = ModalState::None;
    }

    pub fn selected_entry(&self) -> Option<&LsTreeEntry> {
        self.tree.selected_item().map(|row| &row.item.data)
    }

    pub fn navigate(&mut self, key: NavKey) -> bool {
        self.tree.handle_nav_key(key)
    }

    pub fn toggle_selected(&mut self) -> bool {
        match self.tree.selected_index() {
            Some(index) => self.toggle_row(index),
            None => false,
        }
    }

    pub fn toggle_row(&mut self, index: usize) -> bool {
        let Some(row) = self.tree.row(index) else {
            return false;
        };
        let node = Arc::clone(&row.item);
        let before = self.tree.state().clone();
        let selected = self.tree.dispatch(TreeAction::SetSelectedItem(Some(Arc::clone(&node))));
        self.tree.toggle(ItemSpec::Item(node));
        selected || !before.shares_rows_with(self.tree.state())
    }

    pub fn select_row(&mut self, index: usize) -> bool {
        let Some(row) = self.tree.row(index) else {
            return false;
        };
        let node = Arc::clone(&row.item);
        self.tree.dispatch(TreeAction::SetSelectedItem(Some(node)))
    }

    pub fn expand_all(&mut self) -> bool {
        self.tree.expand_all()
    }

    pub fn collapse_all(&mut self) -> bool {
        self.tree.collapse_all()
    }

    pub fn route_pointer(
        &mut self,
        kind: RowEventKind,
        column: u16,
        row: u16,
    ) -> Option<RowMessage> {
        let index = self.row_index_at(column, row)?;
        let text_start = self.list_area.x + 1 + HIGHLIGHT_WIDTH;
        let pointer = RowPointer {
            column: column.saturating_sub(text_start),
        };
        self.router
            .dispatch(kind, &pointer, index, self.tree.state().visible_items())
    }

    pub fn press_kind(&mut self, column: u16, row: u16, at: Instant) -> Option<RowEventKind> {
        let index = self.row_index_at(column, row)?;
        if self.clicks.register(index, at) {
            Some(RowEventKind::DoubleClick)
        } else {
            Some(RowEventKind::MouseDown)
        }
    }

    fn row_index_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.list_area;
        if area.width < 2 || area.height < 2 {
            return None;
        }
        let inside_x = column > area.x && column < area.x + area.width - 1;
        let inside_y = row > area.y && row < area.y + area.height - 1;
        if !inside_x || !inside_y {
            return None;
        }
        self.tree.row_at(u64::from(row - area.y - 1))
    }

    pub fn log(&mut self, line: String) {
        log::info!("{line}");
        self.logs.push(line);
        if self.log_tail_offset > 0 {
            self.log_tail_offset = self.log_tail_offset.saturating_add(1);
        }
        if self.logs.len() > MAX_LOG_LINES {
            let to_trim = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(0..to_trim);
        }
    }

    pub fn scroll_log_up(&mut self, lines: usize) -> bool {
        let before = self.log_tail_offset;
        self.log_tail_offset = self.log_tail_offset.saturating_add(lines);
        self.log_tail_offset != before
    }

    pub fn scroll_log_down(&mut self, lines: usize) -> bool {
        let before = self.log_tail_offset;
        self.log_tail_offset = self.log_tail_offset.saturating_sub(lines);
        self.log_tail_offset != before
    }

    pub fn scroll_detail_up(&mut self, lines: usize) -> bool {
        if self.detail_scroll == 0 {
            return false;
        }
        self.detail_scroll = self.detail_scroll.saturating_sub(lines);
        true
    }

    pub fn scroll_detail_down(&mut self, lines: usize) -> bool {
        let max = self.detail_max_scroll();
        if self.detail_scroll >= max {
            return false;
        }
        self.detail_scroll = (self.detail_scroll + lines).min(max);
        true
    }

    fn detail_max_scroll(&self) -> usize {
        self.detail_text.lines().count().saturating_sub(1)
    }

    pub fn set_detail_preview(&mut self, target: &str, content: String) {
        self.detail_title = format!("Preview: {target}");
        self.detail_text = content;
        self.detail_target = Some(target.to_string());
        self.detail_scroll = 0;
    }

    pub fn clear_detail(&mut self) {
        self.detail_title = "Preview".to_string();
        self.detail_text.clear();
        self.detail_target = None;
        self.detail_scroll = 0;
    }

    pub fn rendered_labels(&self) -> (usize, Vec<String>) {
        let start = self.tree.render_range().start;
        let labels = self
            .tree
            .rendered_rows()
            .map(|(_, row)| format_row(row))
            .collect();
        (start, labels)
    }
}

pub(crate) fn entry_key_fn() -> KeyFn<LsTreeEntry> {
    key_fn(entry_key)
}

pub(crate) fn format_row(row: &VisibleItem<LsTreeEntry>) -> String {
    let entry = &row.item.data;
    let mut label = " ".repeat(row.level * INDENT_WIDTH);
    let marker = if row.item.is_expandable() {
        if row.expanded { "[-]" } else { "[+]" }
    } else {
        "   "
    };
    label.push_str(marker);
    label.push(' ');
    label.push_str(entry.file_name());
    if entry.is_tree() {
        label.push('/');
    }
    label
}

fn on_marker(pointer: &RowPointer, row: &VisibleItem<LsTreeEntry>) -> bool {
    let start = row.level * INDENT_WIDTH;
    let column = usize::from(pointer.column);
    row.item.is_expandable() && column >= start && column < start + MARKER_WIDTH
}

fn row_router() -> Router {
    RowEventRouter::new()
        .on(RowEventKind::MouseDown, |pointer, index, row| {
            if on_marker(pointer, row) {
                RowMessage::Toggle(index)
            } else {
                RowMessage::Select(index)
            }
        })
        .on(RowEventKind::DoubleClick, |_, index, _| RowMessage::Open(index))
        .on(RowEventKind::ContextMenu, |_, _, row| {
            RowMessage::Inspect(row.item.data.to_string())
        })
        .on(RowEventKind::DragOver, |_, index, _| RowMessage::Select(index))
}
