use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::ModifyKind,
};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{trace, warn};

use super::entry::{ASSETS_SUFFIX, MARKDOWN_EXT};
use super::fs::{dot_lower_ext, is_ancestor_of};
use super::tree::TreePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Changed,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

/// Map a notify event to changes. Renames are reported per side: a path that
/// still exists was created, one that is gone was deleted.
#[must_use]
pub fn classify_event(event: &Event) -> Vec<FileChange> {
    let fixed = match event.kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(_) | ModifyKind::Any) | EventKind::Any => None,
        EventKind::Modify(_) => Some(ChangeKind::Changed),
        EventKind::Access(_) | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .iter()
        .map(|p| FileChange {
            kind: fixed.unwrap_or_else(|| {
                if p.exists() {
                    ChangeKind::Created
                } else {
                    ChangeKind::Deleted
                }
            }),
            path: p.clone(),
        })
        .collect()
}

/// Whether a change under one of `roots` can alter what the explorer shows.
#[must_use]
pub fn is_change_relevant(roots: &[PathBuf], path: &Path, policy: TreePolicy) -> bool {
    let Some(root) = roots.iter().find(|r| is_ancestor_of(r, path)) else {
        return false;
    };

    if !policy.show_only_markdown {
        return true;
    }

    let ext = dot_lower_ext(path);
    if ext.is_empty() || ext == MARKDOWN_EXT {
        return true;
    }

    // Sidecar contents are listed unfiltered.
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .any(|c| c.as_os_str().to_string_lossy().ends_with(ASSETS_SUFFIX))
}

/// Drain everything queued; true if any change was relevant.
pub fn drain_relevant(
    rx: &mut UnboundedReceiver<FileChange>,
    roots: &[PathBuf],
    policy: TreePolicy,
) -> bool {
    let mut any = false;
    while let Ok(change) = rx.try_recv() {
        if !any && is_change_relevant(roots, &change.path, policy) {
            trace!(path = %change.path.display(), kind = ?change.kind, "relevant change");
            any = true;
        }
    }
    any
}

/// Watch every root recursively. Keep the watcher alive as long as events
/// are wanted; dropping it closes the channel.
pub fn watch_roots(
    roots: &[PathBuf],
) -> notify::Result<(RecommendedWatcher, UnboundedReceiver<FileChange>)> {
    let (tx, rx) = unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            for change in classify_event(&event) {
                if tx.send(change).is_err() {
                    return;
                }
            }
        }
        Err(err) => warn!(%err, "watch error"),
    })?;

    for root in roots {
        watcher.watch(root, RecursiveMode::Recursive)?;
    }
    Ok((watcher, rx))
}
