//! In-memory implementation of [`GitHost`] for tests and dry runs.
//!
//! Models just enough of a git host to exercise the sync pipeline without
//! network: content-addressed blobs, flat path → blob trees with `base_tree`
//! layering, commits with parents, branch refs with fast-forward checks, and
//! one owner account. Rejections are produced as GitHub-shaped JSON bodies and
//! run through [`classify`], so the classifier sees the same payloads it would
//! in production.
//!
//! Object ids are SHA-256 hex digests, not git SHA-1 ids.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use serde_json::json;
use sha2::{Digest, Sha256};

use reposync_core::{BranchTip, Credential, RepoRef, TreeEntry};

use crate::classify::classify;
use crate::error::HostError;
use crate::host::{GitHost, HostOp};
use crate::wire::{
    CreateCommitRequest, CreateRepoRequest, CreateTreeRequest, NewFile, Owner, RepoInfo,
};

/// A stored commit, as seen by tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub sha: String,
    pub tree: String,
    pub parents: Vec<String>,
    pub message: String,
}

#[derive(Debug, Default)]
struct MemoryRepo {
    info: Option<RepoInfo>,
    refs: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    repos: BTreeMap<String, MemoryRepo>,
    /// Names taken on the account but invisible to this token.
    foreign: BTreeSet<String>,
    blobs: HashMap<String, String>,
    trees: HashMap<String, BTreeMap<String, String>>,
    commits: HashMap<String, CommitRecord>,
    calls: HashMap<HostOp, usize>,
    faults: HashMap<HostOp, VecDeque<HostError>>,
    seq: u64,
}

/// Deterministic single-account git host.
pub struct MemoryHost {
    owner: String,
    token: String,
    state: Mutex<MemoryState>,
}

fn digest(kind: &str, payload: &str) -> String {
    let mut h = Sha256::new();
    h.update(kind.as_bytes());
    h.update([0u8]);
    h.update(payload.as_bytes());
    hex::encode(h.finalize())
}

fn reject(status: u16, message: &str) -> HostError {
    classify(status, &json!({ "message": message }).to_string())
}

fn reject_name_taken() -> HostError {
    let body = json!({
        "message": "Repository creation failed.",
        "errors": [{
            "resource": "Repository",
            "code": "custom",
            "field": "name",
            "message": "name already exists on this account"
        }]
    });
    classify(422, &body.to_string())
}

impl MemoryState {
    fn put_blob(&mut self, content: &str) -> String {
        let sha = digest("blob", content);
        self.blobs.entry(sha.clone()).or_insert_with(|| content.to_owned());
        sha
    }

    fn put_tree(&mut self, files: BTreeMap<String, String>) -> String {
        let listing: String = files
            .iter()
            .map(|(path, sha)| format!("{path}\t{sha}\n"))
            .collect();
        let sha = digest("tree", &listing);
        self.trees.entry(sha.clone()).or_insert(files);
        sha
    }

    fn put_commit(&mut self, tree: String, parents: Vec<String>, message: String) -> String {
        self.seq += 1;
        let payload = format!("{tree}\n{}\n{}\n{message}", parents.join(","), self.seq);
        let sha = digest("commit", &payload);
        self.commits.insert(
            sha.clone(),
            CommitRecord {
                sha: sha.clone(),
                tree,
                parents,
                message,
            },
        );
        sha
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        let mut stack = vec![descendant.to_owned()];
        let mut seen = BTreeSet::new();
        while let Some(sha) = stack.pop() {
            if sha == ancestor {
                return true;
            }
            if !seen.insert(sha.clone()) {
                continue;
            }
            if let Some(commit) = self.commits.get(&sha) {
                stack.extend(commit.parents.iter().cloned());
            }
        }
        false
    }

    fn repo(&self, name: &str) -> Result<&MemoryRepo, HostError> {
        self.repos
            .get(name)
            .filter(|r| r.info.is_some())
            .ok_or_else(|| reject(404, "Not Found"))
    }

    fn repo_mut(&mut self, name: &str) -> Result<&mut MemoryRepo, HostError> {
        self.repos
            .get_mut(name)
            .filter(|r| r.info.is_some())
            .ok_or_else(|| reject(404, "Not Found"))
    }

    /// Commit `files` on top of `branch` (or as a root commit) and advance it.
    fn commit_onto(
        &mut self,
        repo: &str,
        branch: &str,
        files: &[(&str, &str)],
        message: &str,
    ) -> Result<BranchTip, HostError> {
        let parent = self.repo(repo)?.refs.get(branch).cloned();
        let mut entries = match &parent {
            Some(sha) => {
                let tree = &self.commits[sha].tree;
                self.trees[tree].clone()
            }
            None => BTreeMap::new(),
        };
        for (path, content) in files {
            let blob = self.put_blob(content);
            entries.insert(path.trim_start_matches('/').to_owned(), blob);
        }
        let tree = self.put_tree(entries);
        let commit = self.put_commit(tree.clone(), parent.into_iter().collect(), message.to_owned());
        self.repo_mut(repo)?
            .refs
            .insert(branch.to_owned(), commit.clone());
        Ok(BranchTip {
            commit_sha: commit,
            tree_sha: tree,
        })
    }
}

impl MemoryHost {
    /// A host whose single account is `owner`, accepting only `token`.
    pub fn new(owner: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            token: token.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The credential this host accepts.
    pub fn credential(&self) -> Credential {
        Credential::new(self.token.clone(), self.owner.clone())
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // Poisoned only by a panicking caller; the state itself stays consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call, then either pop an injected fault or check the token.
    fn enter(&self, op: HostOp, cred: &Credential) -> Result<MutexGuard<'_, MemoryState>, HostError> {
        let mut state = self.lock();
        *state.calls.entry(op).or_default() += 1;
        if let Some(err) = state.faults.get_mut(&op).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        if cred.token != self.token {
            return Err(reject(401, "Bad credentials"));
        }
        Ok(state)
    }

    fn info_for(&self, name: &str) -> RepoInfo {
        RepoInfo {
            name: name.to_owned(),
            full_name: format!("{}/{}", self.owner, name),
            owner: Owner {
                login: self.owner.clone(),
            },
            private: true,
            default_branch: Some("main".to_owned()),
        }
    }

    // -- seeding ------------------------------------------------------------

    /// Create an empty repository owned by this account.
    pub fn add_repository(&self, name: &str) {
        let info = self.info_for(name);
        self.lock().repos.entry(name.to_owned()).or_default().info = Some(info);
    }

    /// Reserve `name` as taken by a repository this token cannot see.
    pub fn add_foreign_repository(&self, name: &str) {
        self.lock().foreign.insert(name.to_owned());
    }

    /// Commit `files` directly onto `branch`, bypassing call accounting.
    pub fn seed_commit(
        &self,
        repo: &str,
        branch: &str,
        files: &[(&str, &str)],
        message: &str,
    ) -> Result<BranchTip, HostError> {
        self.lock().commit_onto(repo, branch, files, message)
    }

    /// Fail the next call of `op` with `err`. Faults queue per operation.
    pub fn fail_next(&self, op: HostOp, err: HostError) {
        self.lock().faults.entry(op).or_default().push_back(err);
    }

    // -- inspection ---------------------------------------------------------

    pub fn calls(&self, op: HostOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Number of calls to operations that mutate remote state.
    pub fn mutation_calls(&self) -> usize {
        let state = self.lock();
        HostOp::all()
            .iter()
            .filter(|op| op.is_mutation())
            .map(|op| state.calls.get(op).copied().unwrap_or(0))
            .sum()
    }

    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn has_repository(&self, name: &str) -> bool {
        self.lock().repo(name).is_ok()
    }

    /// Distinct blob objects stored so far.
    pub fn blob_count(&self) -> usize {
        self.lock().blobs.len()
    }

    pub fn head(&self, repo: &str, branch: &str) -> Option<String> {
        self.lock().repo(repo).ok()?.refs.get(branch).cloned()
    }

    pub fn commit(&self, sha: &str) -> Option<CommitRecord> {
        self.lock().commits.get(sha).cloned()
    }

    /// Number of commits reachable from the branch tip.
    pub fn history_len(&self, repo: &str, branch: &str) -> usize {
        let state = self.lock();
        let Some(mut sha) = state.repo(repo).ok().and_then(|r| r.refs.get(branch).cloned()) else {
            return 0;
        };
        let mut count = 0;
        loop {
            count += 1;
            match state.commits.get(&sha).and_then(|c| c.parents.first()) {
                Some(parent) => sha = parent.clone(),
                None => return count,
            }
        }
    }

    /// Path → content of the tree with id `tree_sha`.
    pub fn tree_files(&self, tree_sha: &str) -> Option<BTreeMap<String, String>> {
        let state = self.lock();
        let tree = state.trees.get(tree_sha)?;
        Some(
            tree.iter()
                .map(|(path, blob)| (path.clone(), state.blobs[blob].clone()))
                .collect(),
        )
    }

    /// Path → content at the tip of `branch`.
    pub fn branch_files(&self, repo: &str, branch: &str) -> Option<BTreeMap<String, String>> {
        let commit = self.head(repo, branch)?;
        let tree = self.commit(&commit)?.tree;
        self.tree_files(&tree)
    }
}

impl GitHost for MemoryHost {
    fn get_repository(&self, cred: &Credential, repo: &RepoRef) -> Result<RepoInfo, HostError> {
        let state = self.enter(HostOp::GetRepository, cred)?;
        if repo.owner != self.owner {
            return Err(reject(404, "Not Found"));
        }
        let found = state.repo(repo.name.as_str())?;
        found.info.clone().ok_or_else(|| reject(404, "Not Found"))
    }

    fn create_repository(
        &self,
        cred: &Credential,
        request: &CreateRepoRequest,
    ) -> Result<RepoInfo, HostError> {
        let mut state = self.enter(HostOp::CreateRepository, cred)?;
        if state.foreign.contains(&request.name) || state.repo(&request.name).is_ok() {
            return Err(reject_name_taken());
        }
        let mut info = self.info_for(&request.name);
        info.private = request.private;
        state.repos.entry(request.name.clone()).or_default().info = Some(info.clone());
        Ok(info)
    }

    fn get_branch(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<BranchTip, HostError> {
        let state = self.enter(HostOp::GetBranch, cred)?;
        let found = state.repo(repo.name.as_str())?;
        let commit = found
            .refs
            .get(branch)
            .ok_or_else(|| reject(404, "Branch not found"))?;
        Ok(BranchTip {
            commit_sha: commit.clone(),
            tree_sha: state.commits[commit].tree.clone(),
        })
    }

    fn create_file(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        file: &NewFile,
    ) -> Result<BranchTip, HostError> {
        let mut state = self.enter(HostOp::CreateFile, cred)?;
        let path = file.path.trim_start_matches('/');
        if let Some(tip) = state.repo(repo.name.as_str())?.refs.get(&file.branch) {
            let tree = &state.commits[tip].tree;
            if state.trees[tree].contains_key(path) {
                return Err(reject(
                    422,
                    "Invalid request. \"sha\" wasn't supplied.",
                ));
            }
        }
        state.commit_onto(
            repo.name.as_str(),
            &file.branch,
            &[(path, file.content.as_str())],
            &file.message,
        )
    }

    fn create_blob(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        content: &str,
    ) -> Result<String, HostError> {
        let mut state = self.enter(HostOp::CreateBlob, cred)?;
        state.repo(repo.name.as_str())?;
        Ok(state.put_blob(content))
    }

    fn create_tree(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        request: &CreateTreeRequest,
    ) -> Result<String, HostError> {
        let mut state = self.enter(HostOp::CreateTree, cred)?;
        state.repo(repo.name.as_str())?;
        let mut files = match &request.base_tree {
            Some(base) => state
                .trees
                .get(base)
                .cloned()
                .ok_or_else(|| reject(422, "base_tree is not a valid tree"))?,
            None => BTreeMap::new(),
        };
        for TreeEntry { path, sha, .. } in &request.tree {
            if !state.blobs.contains_key(sha) {
                return Err(reject(422, "tree.sha is not a valid blob"));
            }
            files.insert(path.clone(), sha.clone());
        }
        Ok(state.put_tree(files))
    }

    fn create_commit(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        request: &CreateCommitRequest,
    ) -> Result<String, HostError> {
        let mut state = self.enter(HostOp::CreateCommit, cred)?;
        state.repo(repo.name.as_str())?;
        if !state.trees.contains_key(&request.tree) {
            return Err(reject(422, "Tree SHA does not exist"));
        }
        if request.parents.iter().any(|p| !state.commits.contains_key(p)) {
            return Err(reject(422, "Parent SHA does not exist or is not a commit object"));
        }
        Ok(state.put_commit(
            request.tree.clone(),
            request.parents.clone(),
            request.message.clone(),
        ))
    }

    fn update_ref(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<String, HostError> {
        let mut state = self.enter(HostOp::UpdateRef, cred)?;
        if !state.commits.contains_key(sha) {
            return Err(reject(422, "Object does not exist"));
        }
        let current = state
            .repo(repo.name.as_str())?
            .refs
            .get(branch)
            .cloned()
            .ok_or_else(|| reject(422, "Reference does not exist"))?;
        if !force && !state.is_ancestor(&current, sha) {
            return Err(reject(422, "Update is not a fast forward"));
        }
        state
            .repo_mut(repo.name.as_str())?
            .refs
            .insert(branch.to_owned(), sha.to_owned());
        Ok(sha.to_owned())
    }
}
