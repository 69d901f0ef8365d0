//! # reposync-host
//!
//! The remote git host behind a narrow trait.
//!
//! - [`GitHost`]: the eight operations the sync pipeline uses
//! - [`GithubClient`]: GitHub REST implementation over `ureq`
//! - [`MemoryHost`]: deterministic in-memory implementation
//! - [`classify`]: maps error responses onto [`HostError`]

pub mod classify;
pub mod error;
pub mod github;
pub mod host;
pub mod memory;
pub mod wire;

pub use classify::classify;
pub use error::HostError;
pub use github::GithubClient;
pub use host::{GitHost, HostOp};
pub use memory::{CommitRecord, MemoryHost};
pub use wire::{CreateCommitRequest, CreateRepoRequest, CreateTreeRequest, NewFile, RepoInfo};
