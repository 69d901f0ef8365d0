//! GitHub REST implementation of [`GitHost`] over a blocking `ureq` agent.

use std::time::Duration;

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use reposync_core::{BranchTip, Credential, RepoRef, SyncConfig};

use crate::classify::classify;
use crate::error::HostError;
use crate::host::{GitHost, HostOp};
use crate::wire::{
    BranchInfo, CreateBlobBody, CreateCommitRequest, CreateFileBody, CreateFileResponse,
    CreateRepoRequest, CreateTreeRequest, NewFile, RefInfo, RepoInfo, ShaRef, UpdateRefBody,
};

pub const ACCEPT: &str = "application/vnd.github+json";
pub const USER_AGENT: &str = concat!("reposync/", env!("CARGO_PKG_VERSION"));

/// Client for `api.github.com` (or a compatible base URL).
pub struct GithubClient {
    agent: ureq::Agent,
    api_base: String,
    api_version: String,
}

impl GithubClient {
    pub fn new(config: &SyncConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            api_version: config.api_version.clone(),
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn request(&self, method: &str, path: &str, cred: &Credential) -> ureq::Request {
        self.agent
            .request(method, &self.url(path))
            .set("Authorization", &format!("Bearer {}", cred.token))
            .set("Accept", ACCEPT)
            .set("X-GitHub-Api-Version", &self.api_version)
            .set("User-Agent", USER_AGENT)
    }

    fn get<T: DeserializeOwned>(
        &self,
        op: HostOp,
        path: &str,
        cred: &Credential,
    ) -> Result<T, HostError> {
        tracing::debug!(%op, path, "GET");
        finish(self.request("GET", path, cred).call())
    }

    fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        op: HostOp,
        method: &str,
        path: &str,
        cred: &Credential,
        body: &B,
    ) -> Result<T, HostError> {
        tracing::debug!(%op, method, path, "send");
        finish(self.request(method, path, cred).send_json(body))
    }
}

fn finish<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
) -> Result<T, HostError> {
    match result {
        Ok(response) => response
            .into_json::<T>()
            .map_err(|e| HostError::Decode(e.to_string())),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            let err = classify(status, &body);
            tracing::debug!(status, error = %err, "host rejected request");
            Err(err)
        }
        Err(ureq::Error::Transport(transport)) => Err(HostError::Transport(transport.to_string())),
    }
}

fn repo_path(repo: &RepoRef) -> String {
    format!("/repos/{}/{}", repo.owner, repo.name)
}

impl GitHost for GithubClient {
    fn get_repository(&self, cred: &Credential, repo: &RepoRef) -> Result<RepoInfo, HostError> {
        self.get(HostOp::GetRepository, &repo_path(repo), cred)
    }

    fn create_repository(
        &self,
        cred: &Credential,
        request: &CreateRepoRequest,
    ) -> Result<RepoInfo, HostError> {
        self.send(HostOp::CreateRepository, "POST", "/user/repos", cred, request)
    }

    fn get_branch(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<BranchTip, HostError> {
        let path = format!("{}/branches/{}", repo_path(repo), branch);
        let info: BranchInfo = self.get(HostOp::GetBranch, &path, cred)?;
        Ok(info.tip())
    }

    fn create_file(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        file: &NewFile,
    ) -> Result<BranchTip, HostError> {
        let path = format!("{}/contents/{}", repo_path(repo), file.path);
        let body = CreateFileBody {
            message: &file.message,
            content: base64::engine::general_purpose::STANDARD.encode(file.content.as_bytes()),
            branch: &file.branch,
        };
        let response: CreateFileResponse =
            self.send(HostOp::CreateFile, "PUT", &path, cred, &body)?;
        Ok(response.tip())
    }

    fn create_blob(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        content: &str,
    ) -> Result<String, HostError> {
        let path = format!("{}/git/blobs", repo_path(repo));
        let body = CreateBlobBody {
            content,
            encoding: "utf-8",
        };
        let blob: ShaRef = self.send(HostOp::CreateBlob, "POST", &path, cred, &body)?;
        Ok(blob.sha)
    }

    fn create_tree(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        request: &CreateTreeRequest,
    ) -> Result<String, HostError> {
        let path = format!("{}/git/trees", repo_path(repo));
        let tree: ShaRef = self.send(HostOp::CreateTree, "POST", &path, cred, request)?;
        Ok(tree.sha)
    }

    fn create_commit(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        request: &CreateCommitRequest,
    ) -> Result<String, HostError> {
        let path = format!("{}/git/commits", repo_path(repo));
        let commit: ShaRef = self.send(HostOp::CreateCommit, "POST", &path, cred, request)?;
        Ok(commit.sha)
    }

    fn update_ref(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<String, HostError> {
        let path = format!("{}/git/refs/heads/{}", repo_path(repo), branch);
        let body = UpdateRefBody { sha, force };
        let updated: RefInfo = self.send(HostOp::UpdateRef, "PATCH", &path, cred, &body)?;
        tracing::debug!(reference = %updated.name, sha = %updated.object.sha, "ref updated");
        Ok(updated.object.sha)
    }
}
