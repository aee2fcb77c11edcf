//! In-memory remote filesystem used by the test transports of both backends.
//!
//! Only compiled for tests or with the `test-util` feature. A
//! `MemoryServer` is shared between a dialer and every transport it hands
//! out, so a test can inspect the tree after the connection is gone.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

pub type SharedServer = Rc<RefCell<MemoryServer>>;

const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;
const LINK_MODE: u32 = 0o777;
/// Hops followed before a link chain counts as dangling.
const MAX_LINK_DEPTH: usize = 8;

// ── Faults ───────────────────────────────────────────────────────────────────

/// Why a tree operation was refused. Transports translate these into their
/// own reply codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryFault {
    NotFound,
    AlreadyExists,
    NotEmpty,
    NotADirectory,
    IsADirectory,
    /// Moving a directory into its own subtree.
    InvalidTarget,
}

impl fmt::Display for MemoryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotFound => "no such file or directory",
            Self::AlreadyExists => "already exists",
            Self::NotEmpty => "directory not empty",
            Self::NotADirectory => "not a directory",
            Self::IsADirectory => "is a directory",
            Self::InvalidTarget => "cannot move a directory into itself",
        };
        f.write_str(text)
    }
}

pub type MemoryResult<T> = Result<T, MemoryFault>;

// ── Tree ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Node {
    Dir { modified: DateTime<Utc>, mode: u32 },
    File { data: Vec<u8>, modified: DateTime<Utc>, mode: u32 },
    Link { target: String, modified: DateTime<Utc> },
}

/// Snapshot of a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStat {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub mode: u32,
    /// Set when the snapshot describes the link itself rather than its target.
    pub link_target: Option<String>,
}

/// Absolute-path keyed tree. Every mutation advances a fake clock by one
/// second starting at 2024-01-01T00:00:00Z, so timestamps are deterministic.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    nodes: BTreeMap<String, Node>,
    ticks: i64,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "/".to_string(),
            Node::Dir {
                modified: epoch(),
                mode: DEFAULT_DIR_MODE,
            },
        );
        Self { nodes, ticks: 0 }
    }

    fn tick(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        epoch() + Duration::seconds(self.ticks)
    }

    /// Resolve `path` against `cwd`, folding `.` and `..` segments.
    pub fn normalize(cwd: &str, path: &str) -> String {
        let joined = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("{}/{}", cwd, path)
        };
        let mut parts: Vec<&str> = Vec::new();
        for seg in joined.split('/') {
            match seg {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                s => parts.push(s),
            }
        }
        format!("/{}", parts.join("/"))
    }

    fn parent_of(path: &str) -> &str {
        match path.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &path[..pos],
        }
    }

    fn name_of(path: &str) -> &str {
        match path.rfind('/') {
            Some(pos) => &path[pos + 1..],
            None => path,
        }
    }

    fn child_prefix(dir: &str) -> String {
        if dir == "/" {
            "/".to_string()
        } else {
            format!("{}/", dir)
        }
    }

    /// Resolve `path` through any chain of links to a concrete node.
    fn follow<'a>(&'a self, path: &'a str) -> Option<(&'a str, &'a Node)> {
        let mut current = path;
        for _ in 0..=MAX_LINK_DEPTH {
            match self.nodes.get(current)? {
                Node::Link { target, .. } => current = target.as_str(),
                node => return Some((current, node)),
            }
        }
        None
    }

    fn resolved(&self, path: &str) -> MemoryResult<String> {
        self.follow(path)
            .map(|(p, _)| p.to_string())
            .ok_or(MemoryFault::NotFound)
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.follow(path), Some((_, Node::Dir { .. })))
    }

    pub fn is_file(&self, path: &str) -> bool {
        matches!(self.follow(path), Some((_, Node::File { .. })))
    }

    pub fn is_link(&self, path: &str) -> bool {
        matches!(self.nodes.get(path), Some(Node::Link { .. }))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    /// Attributes of whatever `path` leads to, following links.
    pub fn stat(&self, path: &str) -> MemoryResult<MemoryStat> {
        let (_, node) = self.follow(path).ok_or(MemoryFault::NotFound)?;
        Ok(Self::snapshot(path, node))
    }

    /// Attributes of `path` itself; a link is not followed.
    pub fn lstat(&self, path: &str) -> MemoryResult<MemoryStat> {
        let node = self.nodes.get(path).ok_or(MemoryFault::NotFound)?;
        Ok(Self::snapshot(path, node))
    }

    fn snapshot(path: &str, node: &Node) -> MemoryStat {
        let name = Self::name_of(path).to_string();
        match node {
            Node::Dir { modified, mode } => MemoryStat {
                name,
                is_dir: true,
                size: 0,
                modified: *modified,
                mode: *mode,
                link_target: None,
            },
            Node::File { data, modified, mode } => MemoryStat {
                name,
                is_dir: false,
                size: data.len() as u64,
                modified: *modified,
                mode: *mode,
                link_target: None,
            },
            Node::Link { target, modified } => MemoryStat {
                name,
                is_dir: false,
                size: target.len() as u64,
                modified: *modified,
                mode: LINK_MODE,
                link_target: Some(target.clone()),
            },
        }
    }

    /// Direct children of `dir`, sorted by name. Links among them are
    /// reported as links.
    pub fn children(&self, dir: &str) -> MemoryResult<Vec<MemoryStat>> {
        let dir = match self.follow(dir) {
            None => return Err(MemoryFault::NotFound),
            Some((resolved, Node::Dir { .. })) => resolved,
            Some(_) => return Err(MemoryFault::NotADirectory),
        };
        let prefix = Self::child_prefix(dir);
        Ok(self
            .nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| k.len() > prefix.len() && !k[prefix.len()..].contains('/'))
            .map(|(k, n)| Self::snapshot(k, n))
            .collect())
    }

    fn require_parent_dir(&self, path: &str) -> MemoryResult<()> {
        match self.nodes.get(Self::parent_of(path)) {
            Some(Node::Dir { .. }) => Ok(()),
            Some(_) => Err(MemoryFault::NotADirectory),
            None => Err(MemoryFault::NotFound),
        }
    }

    pub fn mkdir(&mut self, path: &str) -> MemoryResult<()> {
        if self.exists(path) {
            return Err(MemoryFault::AlreadyExists);
        }
        self.require_parent_dir(path)?;
        let modified = self.tick();
        self.nodes.insert(
            path.to_string(),
            Node::Dir {
                modified,
                mode: DEFAULT_DIR_MODE,
            },
        );
        Ok(())
    }

    /// Remove an empty directory. The root cannot be removed.
    pub fn rmdir(&mut self, path: &str) -> MemoryResult<()> {
        match self.nodes.get(path) {
            None => return Err(MemoryFault::NotFound),
            Some(Node::File { .. }) | Some(Node::Link { .. }) => {
                return Err(MemoryFault::NotADirectory);
            }
            Some(Node::Dir { .. }) if path == "/" => return Err(MemoryFault::InvalidTarget),
            Some(Node::Dir { .. }) => {}
        }
        if !self.children(path)?.is_empty() {
            return Err(MemoryFault::NotEmpty);
        }
        self.nodes.remove(path);
        self.tick();
        Ok(())
    }

    /// Remove a file, or a link without touching its target.
    pub fn remove_file(&mut self, path: &str) -> MemoryResult<()> {
        match self.nodes.get(path) {
            None => Err(MemoryFault::NotFound),
            Some(Node::Dir { .. }) => Err(MemoryFault::IsADirectory),
            Some(Node::File { .. }) | Some(Node::Link { .. }) => {
                self.nodes.remove(path);
                self.tick();
                Ok(())
            }
        }
    }

    /// Create or replace a file. The parent directory must exist; writing
    /// through a link replaces the link's target.
    pub fn write(&mut self, path: &str, data: &[u8]) -> MemoryResult<()> {
        let path = if self.is_link(path) {
            self.resolved(path)?
        } else {
            path.to_string()
        };
        let path = path.as_str();
        if self.is_dir(path) {
            return Err(MemoryFault::IsADirectory);
        }
        self.require_parent_dir(path)?;
        let mode = match self.nodes.get(path) {
            Some(Node::File { mode, .. }) => *mode,
            _ => DEFAULT_FILE_MODE,
        };
        let modified = self.tick();
        self.nodes.insert(
            path.to_string(),
            Node::File {
                data: data.to_vec(),
                modified,
                mode,
            },
        );
        Ok(())
    }

    pub fn read(&self, path: &str) -> MemoryResult<Vec<u8>> {
        match self.follow(path) {
            Some((_, Node::File { data, .. })) => Ok(data.clone()),
            Some(_) => Err(MemoryFault::IsADirectory),
            None => Err(MemoryFault::NotFound),
        }
    }

    /// Move a file or a whole directory subtree. Never overwrites.
    pub fn rename(&mut self, old: &str, new: &str) -> MemoryResult<()> {
        if !self.exists(old) || old == "/" {
            return Err(MemoryFault::NotFound);
        }
        if self.exists(new) {
            return Err(MemoryFault::AlreadyExists);
        }
        if new.starts_with(&Self::child_prefix(old)) {
            return Err(MemoryFault::InvalidTarget);
        }
        self.require_parent_dir(new)?;

        let prefix = Self::child_prefix(old);
        let moved: Vec<String> = self
            .nodes
            .keys()
            .filter(|k| k.as_str() == old || k.starts_with(&prefix))
            .cloned()
            .collect();
        for key in moved {
            if let Some(node) = self.nodes.remove(&key) {
                let target = format!("{}{}", new, &key[old.len()..]);
                self.nodes.insert(target, node);
            }
        }
        self.tick();
        Ok(())
    }

    /// Change permission bits, following links as `chmod` does.
    pub fn set_mode(&mut self, path: &str, new_mode: u32) -> MemoryResult<()> {
        let path = self.resolved(path)?;
        match self.nodes.get_mut(&path) {
            Some(Node::Dir { mode, .. }) | Some(Node::File { mode, .. }) => {
                *mode = new_mode;
                Ok(())
            }
            Some(Node::Link { .. }) | None => Err(MemoryFault::NotFound),
        }
    }

    /// Overwrite a node's modification time.
    pub fn set_modified(&mut self, path: &str, at: DateTime<Utc>) -> MemoryResult<()> {
        match self.nodes.get_mut(path) {
            None => Err(MemoryFault::NotFound),
            Some(Node::Dir { modified, .. })
            | Some(Node::File { modified, .. })
            | Some(Node::Link { modified, .. }) => {
                *modified = at;
                Ok(())
            }
        }
    }

    // ── Fixture builders ─────────────────────────────────────────────────────

    /// `mkdir -p`.
    pub fn add_dir_all(&mut self, path: &str) -> &mut Self {
        let path = Self::normalize("/", path);
        let mut current = String::new();
        for seg in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(seg);
            if !self.exists(&current) {
                let _ = self.mkdir(&current);
            }
        }
        self
    }

    /// Write a file, creating missing parents.
    pub fn add_file(&mut self, path: &str, data: &[u8]) -> &mut Self {
        let path = Self::normalize("/", path);
        let parent = Self::parent_of(&path).to_string();
        self.add_dir_all(&parent);
        let _ = self.write(&path, data);
        self
    }

    /// Symbolic link at `path` pointing to the absolute `target`, which
    /// need not exist.
    pub fn add_symlink(&mut self, path: &str, target: &str) -> &mut Self {
        let path = Self::normalize("/", path);
        let parent = Self::parent_of(&path).to_string();
        self.add_dir_all(&parent);
        if !self.exists(&path) {
            let modified = self.tick();
            self.nodes.insert(
                path,
                Node::Link {
                    target: Self::normalize("/", target),
                    modified,
                },
            );
        }
        self
    }

    /// Every path below the root, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.nodes.keys().filter(|k| k.as_str() != "/").cloned().collect()
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

// ── Server ───────────────────────────────────────────────────────────────────

/// A fake host: a tree plus the accounts allowed to log in.
#[derive(Debug, Clone, Default)]
pub struct MemoryServer {
    pub tree: MemoryTree,
    accounts: HashMap<String, String>,
    home: Option<String>,
    offline: bool,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, username: &str, password: &str) -> Self {
        self.accounts.insert(username.to_string(), password.to_string());
        self
    }

    /// Directory a session starts in; created if missing. Defaults to `/`.
    pub fn with_home(mut self, home: &str) -> Self {
        let home = MemoryTree::normalize("/", home);
        self.tree.add_dir_all(&home);
        self.home = Some(home);
        self
    }

    pub fn with_tree(mut self, tree: MemoryTree) -> Self {
        self.tree = tree;
        self
    }

    pub fn home(&self) -> String {
        self.home.clone().unwrap_or_else(|| "/".to_string())
    }

    pub fn accepts(&self, username: &str, password: &str) -> bool {
        self.accounts.get(username).map(|p| p == password).unwrap_or(false)
    }

    /// Refuse every new dial, simulating an unreachable host.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn shared(self) -> SharedServer {
        Rc::new(RefCell::new(self))
    }
}
