// autolog-daemon: change detection and commit-log orchestration engine.

use std::future::Future;
use std::pin::Pin;

pub mod capture;
pub mod config;
pub mod error;
pub mod git;
pub mod identity;
pub mod message;
pub mod operator;
pub mod orchestrator;
pub mod remote;
pub mod scheduler;
pub mod security;
pub mod store;

/// Boxed `Send` future returned by the collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
