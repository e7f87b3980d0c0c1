use crate::app::{App, BackendEvent, BackendTask, ModalState, PaneFocus, RowMessage};
use crate::backend::send_task;
use crate::preview::{enqueue_selected_preview, maybe_enqueue_auto_preview};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use lstree_tui::{NavKey, RowEventKind};
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

const PAGE_LINES: usize = 20;
const WHEEL_ROWS: i64 = 3;

pub(crate) fn handle_backend_event(
    app: &mut App,
    task_tx: &UnboundedSender<BackendTask>,
    event: BackendEvent,
) -> Result<()> {
    match event {
        BackendEvent::TreeLoaded { revision, roots } => {
            app.busy = false;
            app.apply_tree(revision, roots);
            maybe_enqueue_auto_preview(app, task_tx)?;
        }
        BackendEvent::BlobLoaded { path, content } => {
            app.busy = false;
            if app.selected_entry().map(|entry| entry.path.as_str()) == Some(path.as_str()) {
                app.set_detail_preview(&path, content);
            } else {
                log::debug!("dropping stale preview of {path}");
            }
        }
        BackendEvent::Error { context, message } => {
            app.busy = false;
            log::warn!("{context}: {message}");
            app.log(format!("error[{context}]: {message}"));
        }
    }

    Ok(())
}

pub(crate) fn handle_key_event(
    app: &mut App,
    key: KeyEvent,
    task_tx: &UnboundedSender<BackendTask>,
) -> Result<()> {
    if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return Ok(());
    }

    match app.modal {
        ModalState::None => handle_key_without_modal(app, key, task_tx),
        ModalState::Help => {
            app.close_modal();
            Ok(())
        }
        ModalState::Filter { .. } => handle_list_filter_key(app, key, task_tx),
    }
}

fn nav_key(app: &App, key: &KeyEvent) -> Option<NavKey> {
    let vim = app.keymap.vim_letters() && key.modifiers.is_empty();
    match key.code {
        KeyCode::Up => Some(NavKey::Up),
        KeyCode::Down => Some(NavKey::Down),
        KeyCode::Left => Some(NavKey::Left),
        KeyCode::Right => Some(NavKey::Right),
        KeyCode::Home => Some(NavKey::Home),
        KeyCode::End => Some(NavKey::End),
        KeyCode::PageUp => Some(NavKey::PageUp),
        KeyCode::PageDown => Some(NavKey::PageDown),
        KeyCode::Char('k') if vim => Some(NavKey::Up),
        KeyCode::Char('j') if vim => Some(NavKey::Down),
        KeyCode::Char('h') if vim => Some(NavKey::Left),
        KeyCode::Char('l') if vim => Some(NavKey::Right),
        KeyCode::Char('g') if vim => Some(NavKey::Home),
        KeyCode::Char('G') if app.keymap.vim_letters() => Some(NavKey::End),
        _ => None,
    }
}

fn scroll_pane(app: &mut App, nav: NavKey) {
    let (up, lines) = match nav {
        NavKey::Up => (true, 1),
        NavKey::Down => (false, 1),
        NavKey::PageUp => (true, PAGE_LINES),
        NavKey::PageDown => (false, PAGE_LINES),
        _ => return,
    };
    match (app.focus, up) {
        (PaneFocus::Detail, true) => {
            app.scroll_detail_up(lines);
        }
        (PaneFocus::Detail, false) => {
            app.scroll_detail_down(lines);
        }
        (PaneFocus::Log, true) => {
            app.scroll_log_up(lines);
        }
        (PaneFocus::Log, false) => {
            app.scroll_log_down(lines);
        }
        (PaneFocus::List, _) => {}
    }
}

fn handle_key_without_modal(
    app: &mut App,
    key: KeyEvent,
    task_tx: &UnboundedSender<BackendTask>,
) -> Result<()> {
    if let Some(nav) = nav_key(app, &key) {
        if app.focus == PaneFocus::List {
            if app.navigate(nav) {
                maybe_enqueue_auto_preview(app, task_tx)?;
            }
        } else {
            scroll_pane(app, nav);
        }
        return Ok(());
    }

    let mut selection_changed = false;

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.open_help(),
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::Char('/') if app.focus == PaneFocus::List => app.open_list_filter(),
        KeyCode::Esc if app.focus == PaneFocus::List && !app.list_filter().is_empty() => {
            selection_changed = app.apply_list_filter_immediately(String::new());
        }
        KeyCode::Char(' ') if app.focus == PaneFocus::List => {
            selection_changed = app.toggle_selected();
        }
        KeyCode::Enter if app.focus == PaneFocus::List => {
            match app.selected_entry().map(|entry| entry.is_tree()) {
                Some(true) => selection_changed = app.toggle_selected(),
                Some(false) => enqueue_selected_preview(app, task_tx)?,
                None => app.log("nothing selected".to_string()),
            }
        }
        KeyCode::Char('E') => {
            selection_changed = app.expand_all();
        }
        KeyCode::Char('C') => {
            selection_changed = app.collapse_all();
        }
        KeyCode::Char('r') => {
            let revision = app.revision.clone();
            send_task(app, task_tx, BackendTask::LoadTree { revision })?;
        }
        _ => {}
    }

    if selection_changed {
        maybe_enqueue_auto_preview(app, task_tx)?;
    }

    Ok(())
}

fn handle_list_filter_key(
    app: &mut App,
    key: KeyEvent,
    task_tx: &UnboundedSender<BackendTask>,
) -> Result<()> {
    let mut immediate_filter: Option<String> = None;
    let mut restore_filter: Option<String> = None;
    let mut finalize = false;

    {
        let ModalState::Filter { value, original } = &mut app.modal else {
            return Ok(());
        };

        match key.code {
            KeyCode::Esc => {
                restore_filter = Some(original.clone());
                finalize = true;
            }
            KeyCode::Enter => finalize = true,
            KeyCode::Backspace => {
                value.pop();
                immediate_filter = Some(value.clone());
            }
            KeyCode::Char(c)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                    && !key.modifiers.contains(KeyModifiers::SUPER) =>
            {
                value.push(c);
                immediate_filter = Some(value.clone());
            }
            _ => {}
        }
    }

    if let Some(filter) = immediate_filter {
        app.apply_list_filter_immediately(filter);
    }
    if let Some(filter) = restore_filter {
        app.apply_list_filter_immediately(filter);
    }
    if finalize {
        app.close_modal();
        maybe_enqueue_auto_preview(app, task_tx)?;
    }

    Ok(())
}

pub(crate) fn handle_mouse_event(
    app: &mut App,
    mouse: MouseEvent,
    task_tx: &UnboundedSender<BackendTask>,
) -> Result<()> {
    if app.modal != ModalState::None {
        return Ok(());
    }

    let (column, row) = (mouse.column, mouse.row);
    let message = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let Some(kind) = app.press_kind(column, row, Instant::now()) else {
                return Ok(());
            };
            app.focus = PaneFocus::List;
            app.route_pointer(kind, column, row)
        }
        MouseEventKind::Down(MouseButton::Right) => {
            app.route_pointer(RowEventKind::ContextMenu, column, row)
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.route_pointer(RowEventKind::DragOver, column, row)
        }
        MouseEventKind::ScrollDown if app.list_area.contains((column, row).into()) => {
            app.tree.scroll_by(WHEEL_ROWS);
            None
        }
        MouseEventKind::ScrollUp if app.list_area.contains((column, row).into()) => {
            app.tree.scroll_by(-WHEEL_ROWS);
            None
        }
        _ => None,
    };

    match message {
        Some(message) => apply_row_message(app, message, task_tx),
        None => Ok(()),
    }
}

fn apply_row_message(
    app: &mut App,
    message: RowMessage,
    task_tx: &UnboundedSender<BackendTask>,
) -> Result<()> {
    match message {
        RowMessage::Select(index) => {
            if app.select_row(index) {
                maybe_enqueue_auto_preview(app, task_tx)?;
            }
        }
        RowMessage::Toggle(index) => {
            if app.toggle_row(index) {
                maybe_enqueue_auto_preview(app, task_tx)?;
            }
        }
        RowMessage::Open(index) => {
            app.select_row(index);
            match app.selected_entry().map(|entry| entry.is_tree()) {
                Some(true) => {
                    app.toggle_row(index);
                }
                Some(false) => enqueue_selected_preview(app, task_tx)?,
                None => {}
            }
        }
        RowMessage::Inspect(description) => app.log(format!("row: {description}")),
    }
    Ok(())
}
