use crate::app::{App, BackendEvent, BackendTask};
use crate::infra::GitClient;
use crate::preview::render_blob_preview;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub(crate) async fn worker_loop(
    client: Arc<dyn GitClient>,
    mut task_rx: UnboundedReceiver<BackendTask>,
    event_tx: UnboundedSender<BackendEvent>,
) {
    while let Some(task) = task_rx.recv().await {
        log::debug!("backend task {task:?}");
        let event = match task {
            BackendTask::LoadTree { revision } => {
                let c = client.clone();
                let rev = revision.clone();
                let result = tokio::task::spawn_blocking(move || c.ls_tree(&rev)).await;
                match result {
                    Ok(Ok(roots)) => BackendEvent::TreeLoaded { revision, roots },
                    other => BackendEvent::Error {
                        context: "ls-tree".to_string(),
                        message: format!("loading {revision} failed: {}", flatten_error(other)),
                    },
                }
            }
            BackendTask::LoadBlob { revision, path } => {
                let c = client.clone();
                let (rev, target) = (revision.clone(), path.clone());
                let result = tokio::task::spawn_blocking(move || {
                    c.show_blob(&rev, &target).map(|bytes| render_blob_preview(&bytes))
                })
                .await;
                match result {
                    Ok(Ok(content)) => BackendEvent::BlobLoaded { path, content },
                    other => BackendEvent::Error {
                        context: "preview".to_string(),
                        message: format!("preview of {path} failed: {}", flatten_error(other)),
                    },
                }
            }
        };

        if event_tx.send(event).is_err() {
            break;
        }
    }
}

pub(crate) fn send_task(
    app: &mut App,
    task_tx: &UnboundedSender<BackendTask>,
    task: BackendTask,
) -> Result<()> {
    app.busy = true;
    task_tx
        .send(task)
        .map_err(|err| anyhow::anyhow!("failed to dispatch task: {err}"))
}

fn flatten_error<T>(res: std::result::Result<anyhow::Result<T>, tokio::task::JoinError>) -> String {
    match res {
        Ok(Ok(_)) => "ok".to_string(),
        Ok(Err(err)) => format!("{err:#}"),
        Err(err) => format!("join error: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LsTreeEntry;
    use anyhow::bail;
    use lstree_tui::{Node, TreeItem};
    use tokio::sync::mpsc;

    struct FakeGit;

    impl GitClient for FakeGit {
        fn ls_tree(&self, revision: &str) -> Result<Vec<Node<LsTreeEntry>>> {
            if revision == "missing" {
                bail!("unknown revision");
            }
            Ok(vec![TreeItem::leaf(LsTreeEntry::blob("README.md"))])
        }

        fn show_blob(&self, _revision: &str, path: &str) -> Result<Vec<u8>> {
            Ok(format!("contents of {path}").into_bytes())
        }
    }

    #[test]
    fn flatten_error_formats_all_cases() {
        let ok = flatten_error::<()>(Ok(Ok(())));
        assert_eq!(ok, "ok");

        let err = flatten_error::<()>(Ok(Err(anyhow::anyhow!("boom"))));
        assert!(err.contains("boom"));
    }

    #[tokio::test]
    async fn worker_answers_each_task() {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(worker_loop(Arc::new(FakeGit), task_rx, event_tx));

        task_tx
            .send(BackendTask::LoadTree {
                revision: "HEAD".to_string(),
            })
            .expect("send");
        task_tx
            .send(BackendTask::LoadBlob {
                revision: "HEAD".to_string(),
                path: "README.md".to_string(),
            })
            .expect("send");
        task_tx
            .send(BackendTask::LoadTree {
                revision: "missing".to_string(),
            })
            .expect("send");
        drop(task_tx);

        let first = event_rx.recv().await.expect("tree event");
        assert!(matches!(
            first,
            BackendEvent::TreeLoaded { ref revision, ref roots } if revision == "HEAD" && roots.len() == 1
        ));
        let second = event_rx.recv().await.expect("blob event");
        assert!(matches!(
            second,
            BackendEvent::BlobLoaded { ref content, .. } if content == "contents of README.md"
        ));
        let third = event_rx.recv().await.expect("error event");
        assert!(matches!(
            third,
            BackendEvent::Error { ref message, .. } if message.contains("unknown revision")
        ));

        worker.await.expect("worker exits");
    }
}
