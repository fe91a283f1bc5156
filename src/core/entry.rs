use serde::Serialize;
use std::path::{Path, PathBuf};

use super::error::{TreeError, TreeResult};
use super::fs::{FileStat, StatProvider, dot_lower_ext};

pub const MARKDOWN_EXT: &str = ".md";
pub const ASSETS_SUFFIX: &str = ".assets";
pub const DRAFT_FOLDER_NAME: &str = "draft";

/// One node of the explorer tree.
///
/// Built fresh on every directory read; nothing is cached between reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    /// Lower-cased, dot-prefixed. Empty for directories.
    pub extension: String,
    pub is_draft_folder: bool,
    /// `None` until finalized, and for synthetic workspace roots.
    pub stat: Option<FileStat>,
    pub assets_path: Option<PathBuf>,
    pub in_draft_folder: bool,
}

impl Entry {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = dot_lower_ext(&path);
        let is_draft_folder = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().to_lowercase() == DRAFT_FOLDER_NAME);

        Self {
            name: name.into(),
            path,
            extension,
            is_draft_folder,
            stat: None,
            assets_path: None,
            in_draft_folder: false,
        }
    }

    /// Resolve `stat` and, for markdown files, the assets sidecar.
    ///
    /// Fails with `NotFound` when the path vanished after it was listed.
    pub async fn finalize(mut self, fs: &dyn StatProvider) -> TreeResult<Self> {
        let stat = fs
            .stat(&self.path)
            .await
            .map_err(|e| TreeError::from_io(&self.path, e))?;

        if stat.is_dir() {
            self.extension.clear();
        } else {
            self.is_draft_folder = false;
        }

        if stat.is_file() && self.extension == MARKDOWN_EXT {
            self.assets_path = AssetResolver::new(fs).resolve(&self.path).await;
        }

        self.stat = Some(stat);
        Ok(self)
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.stat.is_some_and(|s| s.is_dir())
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.stat.is_some_and(|s| s.is_file())
    }

    #[must_use]
    pub fn is_markdown(&self) -> bool {
        self.extension == MARKDOWN_EXT
    }

    /// Basename of the underlying path, independent of any relabeling.
    #[must_use]
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_assets_folder(&self) -> bool {
        self.is_dir() && self.basename().ends_with(ASSETS_SUFFIX)
    }
}

/// Finds the `<stem>.assets` directory that sits next to `<stem>.md`.
pub struct AssetResolver<'a> {
    fs: &'a dyn StatProvider,
}

impl<'a> AssetResolver<'a> {
    #[must_use]
    pub fn new(fs: &'a dyn StatProvider) -> Self {
        Self { fs }
    }

    /// The sidecar path for a markdown file, only for paths ending in `.md`.
    #[must_use]
    pub fn candidate(file_path: &Path) -> Option<PathBuf> {
        if dot_lower_ext(file_path) != MARKDOWN_EXT {
            return None;
        }
        Some(file_path.with_extension(&ASSETS_SUFFIX[1..]))
    }

    /// Returns the sidecar only if it exists as a directory. Never errors.
    pub async fn resolve(&self, file_path: &Path) -> Option<PathBuf> {
        let candidate = Self::candidate(file_path)?;
        match self.fs.stat(&candidate).await {
            Ok(stat) if stat.is_dir() => Some(candidate),
            _ => None,
        }
    }
}
