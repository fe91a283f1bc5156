use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use super::error::{TreeError, TreeResult};
use super::roots::{FILE_SCHEME, RootOrder, WorkspaceFolder, WorkspaceFolders};
use super::tree::TreePolicy;

pub const SETTINGS_VERSION: u32 = 1;

/* ============================ Workspace settings ============================ */

/// Per-project explorer configuration, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerSettings {
    pub version: u32,
    /// Folder URIs (`file:///…`) or paths relative to the project root.
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default = "TreePolicy::markdown")]
    pub directory_policy: TreePolicy,
    #[serde(default)]
    pub assets_policy: TreePolicy,
    #[serde(default)]
    pub root_order: RootOrder,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            folders: Vec::new(),
            directory_policy: TreePolicy::markdown(),
            assets_policy: TreePolicy::unrestricted(),
            root_order: RootOrder::Listing,
        }
    }
}

/// Parse one configured folder. URIs keep their scheme; anything that is not
/// a URI is a local path, resolved against `project_root` when relative.
#[must_use]
pub fn parse_folder(raw: &str, project_root: &Path) -> Option<WorkspaceFolder> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // Single-letter schemes are Windows drive letters, not URIs.
    if let Ok(url) = Url::parse(raw)
        && url.scheme().len() > 1
    {
        if url.scheme() == FILE_SCHEME {
            let path = url.to_file_path().ok()?;
            return Some(WorkspaceFolder::local(path));
        }
        let name = url
            .path_segments()
            .and_then(|mut segs| segs.rfind(|s| !s.is_empty()))
            .map_or_else(|| url.host_str().unwrap_or(raw).to_string(), str::to_string);
        return Some(WorkspaceFolder {
            name,
            path: PathBuf::from(url.path()),
            scheme: url.scheme().to_string(),
        });
    }

    let p = Path::new(raw);
    let path = if p.is_absolute() {
        p.to_path_buf()
    } else {
        project_root.join(p)
    };
    Some(WorkspaceFolder::local(path))
}

/// Folders read from a project's settings file.
#[derive(Debug, Clone)]
pub struct WorkspaceFile {
    pub project_root: PathBuf,
    pub settings: ExplorerSettings,
}

impl WorkspaceFile {
    /// Missing or corrupt settings fall back to defaults.
    #[must_use]
    pub fn open(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            settings: load_settings(project_root).unwrap_or_default(),
        }
    }
}

impl WorkspaceFolders for WorkspaceFile {
    fn workspace_folders(&self) -> Vec<WorkspaceFolder> {
        let folders: Vec<WorkspaceFolder> = self
            .settings
            .folders
            .iter()
            .filter_map(|raw| parse_folder(raw, &self.project_root))
            .collect();
        if folders.is_empty() {
            return vec![WorkspaceFolder::local(self.project_root.clone())];
        }
        folders
    }
}

/* ========================= Paths & basic workspace ========================= */

#[must_use]
pub fn workspace_dir(project_root: &Path) -> PathBuf {
    project_root.join(".blacklabel")
}

#[must_use]
pub fn settings_file(project_root: &Path) -> PathBuf {
    workspace_dir(project_root).join("workspace.json")
}

pub fn ensure_workspace_dir(project_root: &Path) -> io::Result<PathBuf> {
    let dir = workspace_dir(project_root);
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/* =============================== Settings IO =============================== */

/// Lenient load: a missing file is `None`, a corrupt one is logged and `None`.
#[must_use]
pub fn load_settings(project_root: &Path) -> Option<ExplorerSettings> {
    match read_settings(project_root) {
        Ok(s) => s,
        Err(err) => {
            warn!(%err, "ignoring unreadable explorer settings");
            None
        }
    }
}

/// Strict load, for callers that want to report a broken file.
pub fn read_settings(project_root: &Path) -> TreeResult<Option<ExplorerSettings>> {
    let path = settings_file(project_root);
    let data = match fs::read(&path) {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(TreeError::from_io(&path, e)),
    };
    serde_json::from_slice::<ExplorerSettings>(&data)
        .map(Some)
        .map_err(|source| TreeError::Settings { path, source })
}

pub fn save_settings(project_root: &Path, settings: &ExplorerSettings) -> io::Result<()> {
    ensure_workspace_dir(project_root)?;

    let path = settings_file(project_root);
    let tmp = path.with_extension("json.tmp");

    let data = serde_json::to_vec_pretty(settings).map_err(|e| io::Error::other(e.to_string()))?;

    fs::write(&tmp, data)?;
    fs::rename(&tmp, &path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_folder_handles_uris_and_paths() {
        let root = Path::new("/proj");

        let rel = parse_folder("docs", root).unwrap();
        assert_eq!(rel.path, PathBuf::from("/proj/docs"));
        assert_eq!(rel.name, "docs");
        assert!(rel.is_local());

        let remote = parse_folder("ssh://host/srv/wiki", root).unwrap();
        assert_eq!(remote.scheme, "ssh");
        assert_eq!(remote.name, "wiki");
        assert!(!remote.is_local());

        assert!(parse_folder("   ", root).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn parse_folder_decodes_file_uris() {
        let f = parse_folder("file:///srv/my%20notes", Path::new("/")).unwrap();
        assert_eq!(f.path, PathBuf::from("/srv/my notes"));
        assert_eq!(f.name, "my notes");
        assert!(f.is_local());
    }

    #[test]
    fn missing_fields_take_explorer_defaults() {
        let s: ExplorerSettings = serde_json::from_str(r#"{ "version": 1 }"#).unwrap();
        assert_eq!(s, ExplorerSettings::default());
    }
}
