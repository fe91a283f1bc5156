use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::path::PathBuf;

use super::entry::Entry;
use super::error::TreeResult;
use super::explorer::{Explorer, render_info};

/// Fully expanded view of the explorer, suitable for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotNode {
    pub label: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

/// Expand every expandable node up to `max_depth` levels below the top level.
pub async fn snapshot(explorer: &Explorer, max_depth: Option<usize>) -> TreeResult<Vec<SnapshotNode>> {
    let top = explorer.top_level().await?;
    expand_all(explorer, top, 0, max_depth).await
}

fn expand_all<'a>(
    explorer: &'a Explorer,
    entries: Vec<Entry>,
    depth: usize,
    max_depth: Option<usize>,
) -> BoxFuture<'a, TreeResult<Vec<SnapshotNode>>> {
    async move {
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let info = render_info(&entry);
            let within = max_depth.is_none_or(|m| depth < m);
            let children = if info.expandable && within {
                let kids = explorer.children(&entry).await?;
                expand_all(explorer, kids, depth + 1, max_depth).await?
            } else {
                Vec::new()
            };
            out.push(SnapshotNode {
                label: info.label,
                path: entry.path,
                open: info.open_action.map(|a| a.path),
                children,
            });
        }
        Ok(out)
    }
    .boxed()
}

/// Render a snapshot with box-drawing connectors, one label per line.
#[must_use]
pub fn render_unicode_tree(nodes: &[SnapshotNode], root_name: Option<&str>) -> String {
    fn render(nodes: &[SnapshotNode], prefix: &mut String, out: &mut String) {
        let len = nodes.len();
        for (idx, node) in nodes.iter().enumerate() {
            let last = idx + 1 == len;
            out.push_str(prefix);
            out.push_str(if last { "└── " } else { "├── " });
            out.push_str(&node.label);
            out.push('\n');

            if !node.children.is_empty() {
                let saved = prefix.len();
                prefix.push_str(if last { "    " } else { "│   " });
                render(&node.children, prefix, out);
                prefix.truncate(saved);
            }
        }
    }

    let mut out = String::new();
    if let Some(name) = root_name {
        out.push_str(name);
        out.push('\n');
    }
    let mut prefix = String::new();
    render(nodes, &mut prefix, &mut out);
    out
}

pub async fn render_tree(explorer: &Explorer, max_depth: Option<usize>) -> TreeResult<String> {
    let nodes = snapshot(explorer, max_depth).await?;
    Ok(render_unicode_tree(&nodes, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(label: &str) -> SnapshotNode {
        SnapshotNode {
            label: label.into(),
            path: PathBuf::from(label),
            open: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn connectors_follow_nesting() {
        let mut dir = leaf("guide");
        dir.children = vec![leaf("a.md"), leaf("b.md[DRAFT]")];
        let out = render_unicode_tree(&[dir, leaf("readme.md")], Some("notes"));
        assert_eq!(
            out,
            "notes\n├── guide\n│   ├── a.md\n│   └── b.md[DRAFT]\n└── readme.md\n"
        );
    }
}
