use crate::app::{App, BackendTask};
use crate::backend::send_task;
use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;

const PREVIEW_MAX_BYTES: usize = 64 * 1024;
const PREVIEW_BINARY_SAMPLE_BYTES: usize = 4096;

pub(crate) fn render_blob_preview(bytes: &[u8]) -> String {
    let sample_len = bytes.len().min(PREVIEW_BINARY_SAMPLE_BYTES);
    if bytes[..sample_len].contains(&0) {
        return "Cannot preview binary file.".to_string();
    }

    let limit = bytes.len().min(PREVIEW_MAX_BYTES);
    let mut text = String::from_utf8_lossy(&bytes[..limit]).to_string();
    if bytes.len() > PREVIEW_MAX_BYTES {
        text.push_str(&format!(
            "\n\n--- preview truncated at {} bytes (file size: {} bytes) ---",
            PREVIEW_MAX_BYTES,
            bytes.len()
        ));
    }
    text
}

pub(crate) fn enqueue_selected_preview(
    app: &mut App,
    task_tx: &UnboundedSender<BackendTask>,
) -> Result<()> {
    let Some(entry) = app.selected_entry().cloned() else {
        return Ok(());
    };
    if entry.is_tree() {
        app.clear_detail();
        return Ok(());
    }
    if app.detail_target.as_deref() == Some(entry.path.as_str()) {
        return Ok(());
    }

    let revision = app.revision.clone();
    send_task(
        app,
        task_tx,
        BackendTask::LoadBlob {
            revision,
            path: entry.path,
        },
    )
}

pub(crate) fn maybe_enqueue_auto_preview(
    app: &mut App,
    task_tx: &UnboundedSender<BackendTask>,
) -> Result<()> {
    if !app.config.auto_preview {
        return Ok(());
    }
    enqueue_selected_preview(app, task_tx)
}
