use async_trait::async_trait;
use serde::Serialize;
use std::{
    ffi::OsString,
    fs::Metadata,
    io,
    path::{Component, Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

/* ============================== Stat primitives ============================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Directory,
    Symlink,
    Unknown,
}

/// Result of a `stat` call. Timestamps are milliseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileStat {
    pub file_type: FileType,
    pub size: u64,
    pub ctime_ms: u64,
    pub mtime_ms: u64,
}

impl FileStat {
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }

    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }

    #[must_use]
    pub fn from_metadata(meta: &Metadata) -> Self {
        let ft = meta.file_type();
        let file_type = if ft.is_file() {
            FileType::File
        } else if ft.is_dir() {
            FileType::Directory
        } else if ft.is_symlink() {
            FileType::Symlink
        } else {
            FileType::Unknown
        };

        let mtime_ms = meta.modified().map(epoch_millis).unwrap_or(0);
        // Birth time is not available everywhere; fall back to mtime.
        let ctime_ms = meta.created().map(epoch_millis).unwrap_or(mtime_ms);

        Self {
            file_type,
            size: meta.len(),
            ctime_ms,
            mtime_ms,
        }
    }
}

fn epoch_millis(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// The storage collaborator the tree core reads through.
///
/// `stat` follows symlinks, so a link to a directory reports `Directory`.
/// `read_dir` returns bare names, unconverted, in whatever order the storage
/// yields them.
#[async_trait]
pub trait StatProvider: Send + Sync {
    async fn stat(&self, path: &Path) -> io::Result<FileStat>;

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>>;

    /// Never fails: any stat error reads as "absent".
    async fn exists(&self, path: &Path) -> bool {
        self.stat(path).await.is_ok()
    }

    /// Resolve symlinks. Providers without links can keep the default.
    async fn canonicalize(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/* ================================ Local disk ================================ */

/// `StatProvider` over the local disk via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl StatProvider for LocalFs {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = tokio::fs::metadata(path).await?;
        Ok(FileStat::from_metadata(&meta))
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let mut rd = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(ent) = rd.next_entry().await? {
            names.push(ent.file_name());
        }
        Ok(names)
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn canonicalize(&self, path: &Path) -> PathBuf {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || normalize_path(&owned))
            .await
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/* =========================== Filesystem & paths ============================ */

/// Lower-cased last extension with its leading dot, or empty.
#[must_use]
pub fn dot_lower_ext(p: &Path) -> String {
    match p.extension() {
        Some(os) => {
            let lossy = os.to_string_lossy();
            let mut out = String::with_capacity(lossy.len() + 1);
            out.push('.');
            out.push_str(&lossy.to_lowercase());
            out
        }
        None => String::new(),
    }
}

#[must_use]
pub fn is_ancestor_of(ancestor: &Path, p: &Path) -> bool {
    let anc_canon = dunce::canonicalize(ancestor).unwrap_or_else(|_| normalize_path(ancestor));
    let pp_canon = dunce::canonicalize(p).unwrap_or_else(|_| {
        // Deleted paths cannot be canonicalized; anchor on the parent instead.
        if let Some(parent) = p.parent()
            && let Ok(parent_canon) = dunce::canonicalize(parent)
            && let Some(file_name) = p.file_name()
        {
            return parent_canon.join(file_name);
        }
        normalize_path(p)
    });

    pp_canon.starts_with(&anc_canon)
}

/// Canonicalize when possible, otherwise fold `.` and `..` lexically.
#[must_use]
pub fn normalize_path(p: &Path) -> PathBuf {
    if p.as_os_str().is_empty() {
        return PathBuf::new();
    }

    if let Ok(c) = dunce::canonicalize(p) {
        return c;
    }

    lexical_normalize(p)
}

#[must_use]
pub fn lexical_normalize(p: &Path) -> PathBuf {
    let mut prefix: Option<OsString> = None;
    let mut has_root = false;
    let mut parts: Vec<OsString> = Vec::new();

    for comp in p.components() {
        match comp {
            Component::Prefix(pref) => {
                prefix = Some(pref.as_os_str().to_os_string());
            }
            Component::RootDir => {
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(last) = parts.last() {
                    if last == ".." {
                        parts.push(OsString::from(".."));
                    } else {
                        let _ = parts.pop();
                    }
                } else if !has_root && prefix.is_none() {
                    parts.push(OsString::from(".."));
                }
            }
            Component::Normal(name) => {
                parts.push(name.to_os_string());
            }
        }
    }

    let mut out = PathBuf::new();
    if let Some(pref) = prefix {
        out.push(pref);
    }
    if has_root {
        out.push(Component::RootDir.as_os_str());
    }
    for part in parts {
        out.push(part);
    }
    out
}
