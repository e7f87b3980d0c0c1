use crate::domain::{CommandResult, EntryKind, LsTreeEntry, compare_entries};
use anyhow::{Context, Result, bail};
use lstree_tui::{Node, TreeItem, sort_tree};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use thiserror::Error;

pub trait GitClient: Send + Sync {
    fn ls_tree(&self, revision: &str) -> Result<Vec<Node<LsTreeEntry>>>;
    fn show_blob(&self, revision: &str, path: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LsTreeError {
    #[error("line {line}: missing tab before path: {raw:?}")]
    MissingPath { line: usize, raw: String },
    #[error("line {line}: malformed object header: {raw:?}")]
    MalformedHeader { line: usize, raw: String },
    #[error("line {line}: object mode is not numeric: {mode:?}")]
    BadMode { line: usize, mode: String },
}

#[derive(Debug, Clone)]
pub struct ShellGitClient {
    binary: String,
    repo_dir: PathBuf,
}

impl ShellGitClient {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: "git".to_string(),
            repo_dir: repo_dir.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn run_raw<I, S>(&self, args: I) -> Result<CommandResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_os_string())
            .collect();
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-C").arg(self.repo_dir());
        cmd.args(["-c", "core.quotePath=false"]);
        cmd.args(&args);

        let started = Instant::now();
        let output = cmd
            .output()
            .with_context(|| format!("failed to execute {} {:?}", self.binary, args))?;
        let result = CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
        };
        log::debug!(
            "{} {:?} exit={} duration={}ms",
            self.binary,
            args,
            result.exit_code,
            result.duration_ms
        );
        Ok(result)
    }
}

impl GitClient for ShellGitClient {
    fn ls_tree(&self, revision: &str) -> Result<Vec<Node<LsTreeEntry>>> {
        let result = self.run_raw(["ls-tree", "-r", "-t", revision, "--"])?;
        if result.exit_code != 0 {
            bail!("git ls-tree failed: {}", result.stderr.trim());
        }
        let entries = parse_ls_tree_output(&result.stdout)?;
        Ok(build_tree(entries))
    }

    fn show_blob(&self, revision: &str, path: &str) -> Result<Vec<u8>> {
        let object = format!("{revision}:{path}");
        let output = Command::new(&self.binary)
            .arg("-C")
            .arg(self.repo_dir())
            .args(["show", &object])
            .output()
            .with_context(|| format!("failed to execute {} show {object}", self.binary))?;
        if !output.status.success() {
            bail!(
                "git show failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }
}

pub fn parse_ls_tree_output(output: &str) -> Result<Vec<LsTreeEntry>, LsTreeError> {
    let mut entries = Vec::new();

    for (idx, raw) in output.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let line = idx + 1;

        let Some((header, path)) = raw.split_once('\t') else {
            return Err(LsTreeError::MissingPath {
                line,
                raw: raw.to_string(),
            });
        };
        let mut fields = header.split(' ');
        let (Some(mode), Some(kind), Some(_object), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(LsTreeError::MalformedHeader {
                line,
                raw: raw.to_string(),
            });
        };
        if mode.is_empty() || !mode.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LsTreeError::BadMode {
                line,
                mode: mode.to_string(),
            });
        }

        match EntryKind::from_object_type(kind) {
            Some(EntryKind::Tree) => entries.push(LsTreeEntry::tree(path)),
            Some(EntryKind::Blob) => entries.push(LsTreeEntry::blob(path)),
            // submodule commits
            None => log::trace!("skipping {kind} entry {path}"),
        }
    }

    Ok(entries)
}

pub fn build_tree(entries: Vec<LsTreeEntry>) -> Vec<Node<LsTreeEntry>> {
    let mut by_parent: HashMap<String, Vec<LsTreeEntry>> = HashMap::new();
    for entry in entries {
        let parent = match entry.path.rsplit_once('/') {
            Some((parent, _)) => parent.to_string(),
            None => String::new(),
        };
        by_parent.entry(parent).or_default().push(entry);
    }

    let roots = by_parent.remove("").unwrap_or_default();
    let mut nodes = build_level(roots, &mut by_parent);
    sort_tree(&mut nodes, &|a: &TreeItem<LsTreeEntry>, b: &TreeItem<LsTreeEntry>| {
        compare_entries(&a.data, &b.data)
    });
    nodes
}

fn build_level(
    entries: Vec<LsTreeEntry>,
    by_parent: &mut HashMap<String, Vec<LsTreeEntry>>,
) -> Vec<Node<LsTreeEntry>> {
    entries
        .into_iter()
        .map(|entry| match entry.kind {
            EntryKind::Blob => TreeItem::leaf(entry),
            EntryKind::Tree => {
                let children = by_parent.remove(&entry.path).unwrap_or_default();
                let children = build_level(children, by_parent);
                TreeItem::branch(entry, children)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
100644 blob 8ab686eafeb1f44702738c8b0f24f2567c36da6d\tREADME.md
040000 tree 1f3a9c2d7e8b6a5f4c3d2e1f0a9b8c7d6e5f4a3b\tsrc
100644 blob 2b7c4e1d0a9f8e7d6c5b4a3f2e1d0c9b8a7f6e5d\tsrc/main.rs
040000 tree 3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d\tsrc/ui
100644 blob 4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e\tsrc/ui/list.rs
160000 commit 5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f\tvendor/dep
040000 tree 6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a\tdocs
";

    fn names(nodes: &[Node<LsTreeEntry>]) -> Vec<String> {
        nodes.iter().map(|node| node.data.path.clone()).collect()
    }

    #[test]
    fn parse_keeps_blobs_and_trees() {
        let entries = parse_ls_tree_output(SAMPLE).expect("parse");
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[1], LsTreeEntry::tree("src"));
        assert_eq!(entries[4], LsTreeEntry::blob("src/ui/list.rs"));
    }

    #[test]
    fn parse_keeps_spaces_in_paths() {
        let raw = "100644 blob abc\tdocs/release notes.md\n";
        let entries = parse_ls_tree_output(raw).expect("parse");
        assert_eq!(entries, vec![LsTreeEntry::blob("docs/release notes.md")]);
    }

    #[test]
    fn parse_reports_malformed_lines() {
        assert_eq!(
            parse_ls_tree_output("100644 blob abc README.md"),
            Err(LsTreeError::MissingPath {
                line: 1,
                raw: "100644 blob abc README.md".to_string()
            })
        );
        assert!(matches!(
            parse_ls_tree_output("\n100644 blob\tREADME.md"),
            Err(LsTreeError::MalformedHeader { line: 2, .. })
        ));
        assert!(matches!(
            parse_ls_tree_output("rw-r-- blob abc\tREADME.md"),
            Err(LsTreeError::BadMode { line: 1, .. })
        ));
    }

    #[test]
    fn build_tree_groups_by_parent_and_sorts() {
        let entries = parse_ls_tree_output(SAMPLE).expect("parse");
        let roots = build_tree(entries);
        assert_eq!(names(&roots), vec!["docs", "src", "README.md"]);

        let docs = &roots[0];
        assert!(docs.is_expandable());
        assert!(docs.children().is_empty());

        let src = &roots[1];
        assert_eq!(names(src.children()), vec!["src/ui", "src/main.rs"]);
        assert_eq!(names(src.children()[0].children()), vec!["src/ui/list.rs"]);
        assert!(roots[2].children.is_none());
    }

    #[test]
    fn empty_output_is_an_empty_forest() {
        assert!(build_tree(parse_ls_tree_output("").expect("parse")).is_empty());
    }

    #[test]
    fn client_runs_inside_the_repository() {
        let client = ShellGitClient::new("/tmp/repo");
        assert_eq!(client.repo_dir(), Path::new("/tmp/repo"));
    }
}
