//! In-memory `StatProvider`.
//!
//! Listings come back in insertion order, which makes ordering guarantees
//! observable in tests. Symlinks are supported so cycles can be built
//! without touching the disk.

use super::fs::{FileStat, FileType, StatProvider, lexical_normalize};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    ffi::OsString,
    io,
    path::{Component, Path, PathBuf},
    sync::RwLock,
};

const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum Node {
    File { size: u64 },
    Dir { children: Vec<String> },
    Symlink { target: PathBuf },
}

#[derive(Debug)]
pub struct MemoryFs {
    nodes: RwLock<HashMap<PathBuf, Node>>,
    stamp_ms: u64,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> io::Error {
    io::Error::other("lock poisoned")
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("not found: {}", path.display()),
    )
}

impl MemoryFs {
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            PathBuf::from("/"),
            Node::Dir {
                children: Vec::new(),
            },
        );
        Self {
            nodes: RwLock::new(nodes),
            stamp_ms: 1_700_000_000_000,
        }
    }

    fn key(path: &Path) -> PathBuf {
        let p = lexical_normalize(path);
        if p.is_absolute() {
            p
        } else {
            Path::new("/").join(p)
        }
    }

    fn insert(&self, path: &Path, node: Node) -> io::Result<()> {
        let key = Self::key(path);
        let mut nodes = self.nodes.write().map_err(|_| poisoned())?;

        // Create missing parents, registering each child with its parent.
        let mut chain: Vec<PathBuf> = key.ancestors().map(Path::to_path_buf).collect();
        chain.reverse();
        for pair in chain.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            let Some(name) = child.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            match nodes.get_mut(parent) {
                Some(Node::Dir { children }) => {
                    if !children.contains(&name) {
                        children.push(name);
                    }
                }
                Some(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotADirectory,
                        format!("not a directory: {}", parent.display()),
                    ));
                }
                None => return Err(not_found(parent)),
            }
            if child != &key && !nodes.contains_key(child) {
                nodes.insert(
                    child.clone(),
                    Node::Dir {
                        children: Vec::new(),
                    },
                );
            }
        }

        match (nodes.get(&key), &node) {
            (Some(Node::Dir { .. }), Node::Dir { .. }) => {}
            _ => {
                nodes.insert(key, node);
            }
        }
        Ok(())
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) -> io::Result<()> {
        self.insert(
            path.as_ref(),
            Node::Dir {
                children: Vec::new(),
            },
        )
    }

    pub fn add_file(&self, path: impl AsRef<Path>, size: u64) -> io::Result<()> {
        self.insert(path.as_ref(), Node::File { size })
    }

    /// Relative targets resolve against the link's parent directory.
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) -> io::Result<()> {
        self.insert(
            path.as_ref(),
            Node::Symlink {
                target: target.as_ref().to_path_buf(),
            },
        )
    }

    /// Remove a node and everything beneath it.
    pub fn remove(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let key = Self::key(path.as_ref());
        let mut nodes = self.nodes.write().map_err(|_| poisoned())?;
        if nodes.remove(&key).is_none() {
            return Err(not_found(&key));
        }
        nodes.retain(|p, _| !p.starts_with(&key));
        if let Some(parent) = key.parent()
            && let Some(name) = key.file_name()
            && let Some(Node::Dir { children }) = nodes.get_mut(parent)
        {
            let name = name.to_string_lossy();
            children.retain(|c| c.as_str() != name);
        }
        Ok(())
    }

    /// Resolve every symlink along `path`, returning the real key.
    fn resolve(nodes: &HashMap<PathBuf, Node>, path: &Path) -> io::Result<PathBuf> {
        let mut hops = 0usize;
        let mut current = PathBuf::from("/");
        let mut rest: Vec<PathBuf> = Self::key(path)
            .components()
            .filter_map(|c| match c {
                Component::Normal(n) => Some(PathBuf::from(n)),
                _ => None,
            })
            .collect();
        rest.reverse();

        while let Some(part) = rest.pop() {
            let candidate = current.join(&part);
            match nodes.get(&candidate) {
                Some(Node::Symlink { target }) => {
                    hops += 1;
                    if hops > MAX_LINK_HOPS {
                        return Err(io::Error::other(format!(
                            "too many levels of symbolic links: {}",
                            path.display()
                        )));
                    }
                    let absolute = if target.is_absolute() {
                        target.clone()
                    } else {
                        current.join(target)
                    };
                    let mut expanded: Vec<PathBuf> = Self::key(&absolute)
                        .components()
                        .filter_map(|c| match c {
                            Component::Normal(n) => Some(PathBuf::from(n)),
                            _ => None,
                        })
                        .collect();
                    expanded.reverse();
                    rest.extend(expanded);
                    current = PathBuf::from("/");
                }
                Some(_) => current = candidate,
                None => return Err(not_found(path)),
            }
        }
        Ok(current)
    }
}

#[async_trait]
impl StatProvider for MemoryFs {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let nodes = self.nodes.read().map_err(|_| poisoned())?;
        let real = Self::resolve(&nodes, path)?;
        let (file_type, size) = match nodes.get(&real) {
            Some(Node::File { size }) => (FileType::File, *size),
            Some(Node::Dir { .. }) => (FileType::Directory, 0),
            // `resolve` never stops on a link.
            _ => return Err(not_found(path)),
        };
        Ok(FileStat {
            file_type,
            size,
            ctime_ms: self.stamp_ms,
            mtime_ms: self.stamp_ms,
        })
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let nodes = self.nodes.read().map_err(|_| poisoned())?;
        let real = Self::resolve(&nodes, path)?;
        match nodes.get(&real) {
            Some(Node::Dir { children }) => Ok(children.iter().map(OsString::from).collect()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    async fn canonicalize(&self, path: &Path) -> PathBuf {
        self.nodes
            .read()
            .ok()
            .and_then(|nodes| Self::resolve(&nodes, path).ok())
            .unwrap_or_else(|| Self::key(path))
    }
}
