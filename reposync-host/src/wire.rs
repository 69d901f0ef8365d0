//! Request and response shapes for the eight host operations.
//!
//! Field names follow the GitHub REST API so the same structs serialize
//! straight onto the wire.

use serde::{Deserialize, Serialize};

use reposync_core::{BranchTip, TreeEntry};

/// `{ "sha": ... }`: the common object-reference shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaRef {
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Repository metadata returned by get/create repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    pub full_name: String,
    pub owner: Owner,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRepoRequest {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub auto_init: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitTree {
    pub tree: ShaRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
    pub commit: CommitTree,
}

/// `GET /repos/{owner}/{repo}/branches/{branch}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub commit: BranchCommit,
}

impl BranchInfo {
    pub fn tip(&self) -> BranchTip {
        BranchTip {
            commit_sha: self.commit.sha.clone(),
            tree_sha: self.commit.commit.tree.sha.clone(),
        }
    }
}

/// A single file written straight onto a branch. `content` is plain text;
/// the client encodes it for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFile {
    pub path: String,
    pub content: String,
    pub message: String,
    pub branch: String,
}

/// `PUT /repos/{owner}/{repo}/contents/{path}` body.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateFileBody<'a> {
    pub message: &'a str,
    pub content: String,
    pub branch: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FileCommit {
    pub sha: String,
    pub tree: ShaRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreateFileResponse {
    pub commit: FileCommit,
}

impl CreateFileResponse {
    pub fn tip(&self) -> BranchTip {
        BranchTip {
            commit_sha: self.commit.sha.clone(),
            tree_sha: self.commit.tree.sha.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateBlobBody<'a> {
    pub content: &'a str,
    pub encoding: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTreeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tree: Option<String>,
    pub tree: Vec<TreeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCommitRequest {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateRefBody<'a> {
    pub sha: &'a str,
    pub force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RefInfo {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: ShaRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_info_exposes_commit_and_tree() {
        let json = r#"{
            "name": "main",
            "commit": {
                "sha": "c0ffee",
                "commit": { "tree": { "sha": "7ree" }, "message": "ignored" }
            },
            "protected": false
        }"#;
        let info: BranchInfo = serde_json::from_str(json).unwrap();
        assert_eq!(
            info.tip(),
            BranchTip {
                commit_sha: "c0ffee".to_owned(),
                tree_sha: "7ree".to_owned()
            }
        );
    }

    #[test]
    fn tree_request_uses_github_field_names() {
        let req = CreateTreeRequest {
            base_tree: Some("base".to_owned()),
            tree: vec![TreeEntry::blob("/index.html", "b10b")],
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["base_tree"], "base");
        assert_eq!(value["tree"][0]["path"], "index.html");
        assert_eq!(value["tree"][0]["type"], "blob");
        assert_eq!(value["tree"][0]["mode"], "100644");
    }

    #[test]
    fn tree_request_omits_absent_base() {
        let req = CreateTreeRequest {
            base_tree: None,
            tree: vec![],
        };
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("base_tree").is_none());
    }
}
