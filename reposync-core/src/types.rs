//! Domain types shared by the host client and the sync pipeline.
//!
//! File paths inside a [`ProjectFileSet`] are project-absolute strings with a
//! leading slash (`/src/App.jsx`). Tree paths sent to the host never carry the
//! leading slash; see [`normalize_tree_path`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a project in the application backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of a remote repository, derived 1:1 from a project title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoName(pub String);

impl RepoName {
    /// Derive a repository name from a project display title.
    ///
    /// Whitespace runs become a single `-`; characters outside
    /// `[A-Za-z0-9._-]` are dropped.
    pub fn from_title(title: &str) -> Result<Self, CoreError> {
        let mut name = String::with_capacity(title.len());
        let mut pending_dash = false;
        for ch in title.trim().chars() {
            if ch.is_whitespace() {
                pending_dash = true;
                continue;
            }
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                if pending_dash && !name.is_empty() {
                    name.push('-');
                }
                pending_dash = false;
                name.push(ch);
            }
        }
        if name.is_empty() {
            return Err(CoreError::InvalidRepoName {
                title: title.to_owned(),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RepoName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A repository on the host, addressed by owner login and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: RepoName,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: RepoName) -> Self {
        Self {
            owner: owner.into(),
            name,
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// Project file set
// ---------------------------------------------------------------------------

/// The authoritative set of project files: absolute path → text content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectFileSet(BTreeMap<String, String>);

impl ProjectFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.0.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Layer `self` over `defaults`; entries in `self` win on collision.
    pub fn merged_over(&self, defaults: &ProjectFileSet) -> ProjectFileSet {
        let mut merged = defaults.0.clone();
        merged.extend(self.0.iter().map(|(p, c)| (p.clone(), c.clone())));
        ProjectFileSet(merged)
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for ProjectFileSet {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(p, c)| (p.into(), c.into()))
                .collect(),
        )
    }
}

/// Strip a single leading slash so the path is repo-root-relative.
pub fn normalize_tree_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A project as known to the application backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub wallet_address: String,
}

impl Project {
    pub fn repo_name(&self) -> Result<RepoName, CoreError> {
        RepoName::from_title(&self.title)
    }
}

// ---------------------------------------------------------------------------
// Git objects
// ---------------------------------------------------------------------------

/// Tip commit and tree of a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTip {
    pub commit_sha: String,
    pub tree_sha: String,
}

pub const FILE_MODE: &str = "100644";
pub const BLOB_KIND: &str = "blob";

/// One file entry in a tree being built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
}

impl TreeEntry {
    /// A regular-file blob entry; `path` is normalized.
    pub fn blob(path: &str, sha: impl Into<String>) -> Self {
        Self {
            path: normalize_tree_path(path).to_owned(),
            mode: FILE_MODE.to_owned(),
            kind: BLOB_KIND.to_owned(),
            sha: sha.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sync status / credential
// ---------------------------------------------------------------------------

/// Observable state of the sync pipeline for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Disconnected,
    Authenticated,
    CheckingRepo,
    RepoExists,
    CreatingRepo,
    Committing,
    Error,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::Disconnected => "disconnected",
            SyncStatus::Authenticated => "authenticated",
            SyncStatus::CheckingRepo => "checking_repo",
            SyncStatus::RepoExists => "repo_exists",
            SyncStatus::CreatingRepo => "creating_repo",
            SyncStatus::Committing => "committing",
            SyncStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Bearer token plus the login it belongs to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            saved_at: None,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .field("saved_at", &self.saved_at)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
