use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Failures surfaced by tree construction.
///
/// Every variant carries the path that was being inspected so the caller can
/// report it without extra bookkeeping. A failed read never yields a partial
/// entry list.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },
    #[error("permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },
    #[error("draft folder cycle detected at {}", path.display())]
    CyclicStructure { path: PathBuf },
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings in {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TreeError {
    /// Classify a collaborator failure by its `io::ErrorKind`.
    #[must_use]
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::NotADirectory => Self::NotADirectory { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source: err },
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path }
            | Self::NotADirectory { path }
            | Self::PermissionDenied { path }
            | Self::CyclicStructure { path }
            | Self::Io { path, .. }
            | Self::Settings { path, .. } => path,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type TreeResult<T> = Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_kinds_map_to_variants() {
        let p = Path::new("/tmp/x");
        assert!(matches!(
            TreeError::from_io(p, io::Error::from(io::ErrorKind::NotFound)),
            TreeError::NotFound { .. }
        ));
        assert!(matches!(
            TreeError::from_io(p, io::Error::from(io::ErrorKind::NotADirectory)),
            TreeError::NotADirectory { .. }
        ));
        assert!(matches!(
            TreeError::from_io(p, io::Error::from(io::ErrorKind::PermissionDenied)),
            TreeError::PermissionDenied { .. }
        ));
        let other = TreeError::from_io(p, io::Error::other("disk on fire"));
        assert!(matches!(other, TreeError::Io { .. }));
        assert_eq!(other.path(), p);
    }
}
