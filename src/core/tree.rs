use futures::future::{BoxFuture, FutureExt, try_join_all};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, trace, warn};

use super::entry::Entry;
use super::error::{TreeError, TreeResult};
use super::fs::StatProvider;

/// Switches applied by `TreeBuilder::read_directory`. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreePolicy {
    /// Drop files whose extension is not `.md`. Directories always survive.
    pub show_only_markdown: bool,
    /// Drop directories whose basename ends in `.assets`.
    pub hide_assets_folder: bool,
    /// Replace `draft` folders by their own (same-policy) listing.
    pub flatten_draft_folders: bool,
}

impl TreePolicy {
    /// The policy used when a directory node is expanded.
    #[must_use]
    pub const fn markdown() -> Self {
        Self {
            show_only_markdown: true,
            hide_assets_folder: true,
            flatten_draft_folders: true,
        }
    }

    /// Assets folders list everything they contain.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            show_only_markdown: false,
            hide_assets_folder: false,
            flatten_draft_folders: false,
        }
    }

    fn keeps(&self, entry: &Entry) -> bool {
        if self.show_only_markdown && entry.is_file() && !entry.is_markdown() {
            return false;
        }
        if self.hide_assets_folder && entry.is_assets_folder() {
            return false;
        }
        true
    }
}

/// Builds the filtered, flattened child list of one directory.
#[derive(Clone)]
pub struct TreeBuilder {
    fs: Arc<dyn StatProvider>,
    directory_policy: TreePolicy,
    assets_policy: TreePolicy,
}

impl TreeBuilder {
    #[must_use]
    pub fn new(fs: Arc<dyn StatProvider>) -> Self {
        Self {
            fs,
            directory_policy: TreePolicy::markdown(),
            assets_policy: TreePolicy::unrestricted(),
        }
    }

    /// Override the policies `children` uses for directories and sidecars.
    #[must_use]
    pub const fn with_policies(mut self, directory: TreePolicy, assets: TreePolicy) -> Self {
        self.directory_policy = directory;
        self.assets_policy = assets;
        self
    }

    #[must_use]
    pub fn stat_provider(&self) -> &dyn StatProvider {
        self.fs.as_ref()
    }

    #[must_use]
    pub const fn directory_policy(&self) -> TreePolicy {
        self.directory_policy
    }

    /// Finalize a single entry against this builder's provider.
    pub async fn entry(&self, name: impl Into<String>, path: impl Into<PathBuf>) -> TreeResult<Entry> {
        Entry::new(name, path).finalize(self.fs.as_ref()).await
    }

    /// List `dir` under `policy`.
    ///
    /// Output order follows the storage listing; no sort is applied. Any
    /// failure (including a child vanishing before its stat) fails the whole
    /// call.
    pub async fn read_directory(&self, dir: &Path, policy: TreePolicy) -> TreeResult<Vec<Entry>> {
        let mut ancestors = HashSet::new();
        ancestors.insert(self.fs.canonicalize(dir).await);
        self.read_directory_inner(dir.to_path_buf(), policy, &mut ancestors)
            .await
    }

    /// `ancestors` holds the canonical directories on the current flattening
    /// path only; siblings resolving to the same directory are not a cycle.
    fn read_directory_inner<'a>(
        &'a self,
        dir: PathBuf,
        policy: TreePolicy,
        ancestors: &'a mut HashSet<PathBuf>,
    ) -> BoxFuture<'a, TreeResult<Vec<Entry>>> {
        async move {
            let names = self
                .fs
                .read_dir(&dir)
                .await
                .map_err(|e| TreeError::from_io(&dir, e))?;
            debug!(dir = %dir.display(), count = names.len(), "read_directory");

            // Stats run concurrently; try_join_all keeps input order.
            let fs = self.fs.as_ref();
            let entries = try_join_all(names.into_iter().map(|name| {
                // The path keeps the raw name; only the label is lossy.
                let path = dir.join(&name);
                Entry::new(name.to_string_lossy().into_owned(), path).finalize(fs)
            }))
            .await?;

            let mut result = Vec::with_capacity(entries.len());
            for entry in entries {
                if !policy.keeps(&entry) {
                    continue;
                }

                if policy.flatten_draft_folders && entry.is_draft_folder {
                    let canonical = self.fs.canonicalize(&entry.path).await;
                    if !ancestors.insert(canonical.clone()) {
                        warn!(path = %entry.path.display(), "draft folder cycle");
                        return Err(TreeError::CyclicStructure { path: entry.path });
                    }
                    trace!(path = %entry.path.display(), "flattening draft folder");
                    let inner = self
                        .read_directory_inner(entry.path, policy, ancestors)
                        .await?;
                    ancestors.remove(&canonical);
                    result.extend(inner.into_iter().map(|mut e| {
                        e.in_draft_folder = true;
                        e
                    }));
                    continue;
                }

                result.push(entry);
            }

            Ok(result)
        }
        .boxed()
    }

    /// Children of an expanded node: directories use the directory policy,
    /// markdown files with a sidecar list the sidecar, anything else is a leaf.
    pub async fn children(&self, entry: &Entry) -> TreeResult<Vec<Entry>> {
        if entry.is_dir() {
            self.read_directory(&entry.path, self.directory_policy)
                .await
        } else if let Some(assets) = &entry.assets_path {
            self.read_directory(assets, self.assets_policy).await
        } else {
            Ok(Vec::new())
        }
    }
}

impl std::fmt::Debug for TreeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("directory_policy", &self.directory_policy)
            .field("assets_policy", &self.assets_policy)
            .finish_non_exhaustive()
    }
}
