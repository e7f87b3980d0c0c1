use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Tree,
    Blob,
}

impl EntryKind {
    pub fn from_object_type(kind: &str) -> Option<Self> {
        match kind {
            "tree" => Some(Self::Tree),
            "blob" => Some(Self::Blob),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Blob => "blob",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LsTreeEntry {
    pub kind: EntryKind,
    pub path: String,
}

impl LsTreeEntry {
    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Tree,
            path: path.into(),
        }
    }

    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Blob,
            path: path.into(),
        }
    }

    pub fn is_tree(&self) -> bool {
        self.kind == EntryKind::Tree
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for LsTreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.path)
    }
}

pub fn entry_key(entry: &LsTreeEntry) -> String {
    entry.path.clone()
}

pub fn compare_entries(a: &LsTreeEntry, b: &LsTreeEntry) -> Ordering {
    match (a.is_tree(), b.is_tree()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.path.cmp(&b.path),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keymap {
    Vim,
    Arrows,
}

impl Keymap {
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "arrows" => Self::Arrows,
            _ => Self::Vim,
        }
    }

    pub fn vim_letters(self) -> bool {
        self == Self::Vim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trees_sort_before_blobs() {
        let mut entries = vec![
            LsTreeEntry::blob("a.txt"),
            LsTreeEntry::tree("src"),
            LsTreeEntry::blob("Cargo.toml"),
            LsTreeEntry::tree("docs"),
        ];
        entries.sort_by(compare_entries);
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["docs", "src", "Cargo.toml", "a.txt"]);
    }

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(LsTreeEntry::blob("src/ui/list.rs").file_name(), "list.rs");
        assert_eq!(LsTreeEntry::tree("src").file_name(), "src");
    }

    #[test]
    fn keymap_falls_back_to_vim() {
        assert_eq!(Keymap::from_config("arrows"), Keymap::Arrows);
        assert_eq!(Keymap::from_config(" Arrows "), Keymap::Arrows);
        assert_eq!(Keymap::from_config("emacs"), Keymap::Vim);
        assert!(!Keymap::Arrows.vim_letters());
    }
}
