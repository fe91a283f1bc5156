use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, path::PathBuf, sync::Arc};
use tracing::debug;

use super::entry::Entry;
use super::error::TreeResult;
use super::tree::TreeBuilder;

pub const FILE_SCHEME: &str = "file";
pub const WORKSPACE_ROOT_SUFFIX: &str = "[Workspace Root]";

/// A folder the host treats as a project boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFolder {
    pub name: String,
    pub path: PathBuf,
    pub scheme: String,
}

impl WorkspaceFolder {
    /// A local folder named after its basename.
    #[must_use]
    pub fn local(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy().into_owned(), |n| n.to_string_lossy().into_owned());
        Self {
            name,
            path,
            scheme: FILE_SCHEME.to_string(),
        }
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        self.scheme.eq_ignore_ascii_case(FILE_SCHEME)
    }
}

/// Source of workspace folders.
pub trait WorkspaceFolders: Send + Sync {
    fn workspace_folders(&self) -> Vec<WorkspaceFolder>;
}

impl WorkspaceFolders for Vec<WorkspaceFolder> {
    fn workspace_folders(&self) -> Vec<WorkspaceFolder> {
        self.clone()
    }
}

/// Ordering applied to the single-root top-level listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootOrder {
    /// Keep storage order.
    #[default]
    Listing,
    /// Directories first, then by name.
    DirectoriesFirst,
}

pub type EntryComparator = fn(&Entry, &Entry) -> Ordering;

#[must_use]
pub fn directories_first(a: &Entry, b: &Entry) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name.cmp(&b.name))
}

impl RootOrder {
    #[must_use]
    pub fn comparator(self) -> Option<EntryComparator> {
        match self {
            Self::Listing => None,
            Self::DirectoriesFirst => Some(directories_first),
        }
    }
}

/// Produces the top-level entries of the explorer.
pub struct WorkspaceRootResolver {
    builder: TreeBuilder,
    folders: Arc<dyn WorkspaceFolders>,
    comparator: Option<EntryComparator>,
}

impl WorkspaceRootResolver {
    #[must_use]
    pub fn new(builder: TreeBuilder, folders: Arc<dyn WorkspaceFolders>) -> Self {
        Self {
            builder,
            folders,
            comparator: None,
        }
    }

    #[must_use]
    pub fn with_comparator(mut self, comparator: Option<EntryComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    #[must_use]
    pub const fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    /// Folders with a local scheme, in host order.
    #[must_use]
    pub fn local_folders(&self) -> Vec<WorkspaceFolder> {
        self.folders
            .workspace_folders()
            .into_iter()
            .filter(WorkspaceFolder::is_local)
            .collect()
    }

    /// One root: `[root, ...root children]` with the root relabeled and its
    /// stat cleared. Several roots: one unexpanded entry per root.
    pub async fn top_level(&self) -> TreeResult<Vec<Entry>> {
        let folders = self.local_folders();
        debug!(roots = folders.len(), "resolving workspace roots");

        if let [single] = folders.as_slice() {
            let mut root = self.builder.entry(single.name.clone(), single.path.clone()).await?;
            let mut children = self.builder.children(&root).await?;
            if let Some(cmp) = self.comparator {
                children.sort_by(cmp);
            }
            root.name.push_str(WORKSPACE_ROOT_SUFFIX);
            root.stat = None;

            let mut out = Vec::with_capacity(children.len() + 1);
            out.push(root);
            out.extend(children);
            return Ok(out);
        }

        let mut out = Vec::with_capacity(folders.len());
        for folder in folders {
            out.push(self.builder.entry(folder.name, folder.path).await?);
        }
        Ok(out)
    }
}
