use serde::Serialize;
use std::{path::PathBuf, sync::Arc};

use super::entry::Entry;
use super::error::TreeResult;
use super::fs::StatProvider;
use super::roots::{WorkspaceFolders, WorkspaceRootResolver};
use super::tree::TreeBuilder;
use super::workspace::ExplorerSettings;

pub const DRAFT_LABEL_SUFFIX: &str = "[DRAFT]";

/// What a host needs to draw one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderInfo {
    pub label: String,
    pub expandable: bool,
    pub open_action: Option<OpenAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenAction {
    pub path: PathBuf,
}

#[must_use]
pub fn render_info(entry: &Entry) -> RenderInfo {
    let mut label = entry.name.clone();
    if entry.in_draft_folder {
        label.push_str(DRAFT_LABEL_SUFFIX);
    }

    let expandable = entry.is_dir() || entry.assets_path.is_some();
    let open_action = entry.is_file().then(|| OpenAction {
        path: entry.path.clone(),
    });

    RenderInfo {
        label,
        expandable,
        open_action,
    }
}

/// Tree data source handed to a view.
pub struct Explorer {
    resolver: WorkspaceRootResolver,
}

impl Explorer {
    #[must_use]
    pub const fn new(resolver: WorkspaceRootResolver) -> Self {
        Self { resolver }
    }

    /// Wire the builder and resolver from persisted settings.
    #[must_use]
    pub fn from_settings(
        fs: Arc<dyn StatProvider>,
        folders: Arc<dyn WorkspaceFolders>,
        settings: &ExplorerSettings,
    ) -> Self {
        let builder = TreeBuilder::new(fs)
            .with_policies(settings.directory_policy, settings.assets_policy);
        let resolver = WorkspaceRootResolver::new(builder, folders)
            .with_comparator(settings.root_order.comparator());
        Self::new(resolver)
    }

    pub async fn top_level(&self) -> TreeResult<Vec<Entry>> {
        self.resolver.top_level().await
    }

    pub async fn children(&self, entry: &Entry) -> TreeResult<Vec<Entry>> {
        self.resolver.builder().children(entry).await
    }

    /// `None` asks for the top level, like a view's root request.
    pub async fn children_of(&self, entry: Option<&Entry>) -> TreeResult<Vec<Entry>> {
        match entry {
            Some(e) => self.children(e).await,
            None => self.top_level().await,
        }
    }

    #[must_use]
    pub fn render_info(&self, entry: &Entry) -> RenderInfo {
        render_info(entry)
    }

    #[must_use]
    pub const fn builder(&self) -> &TreeBuilder {
        self.resolver.builder()
    }
}
