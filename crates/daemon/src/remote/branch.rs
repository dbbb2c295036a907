use std::sync::Arc;

use tracing::{info, warn};

use super::RepositoryHost;
use crate::identity::RepositoryIdentity;
use crate::operator::Operator;

pub const CONVENTIONAL_BRANCHES: [&str; 2] = ["main", "master"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Rejected { branch: String },
}

/// Asks the operator before writing to a repository whose default branch
/// is not `main` or `master`. Lookup failures let the cycle proceed.
pub struct BranchSafetyGuard {
    host: Arc<dyn RepositoryHost>,
    operator: Arc<dyn Operator>,
}

impl BranchSafetyGuard {
    pub fn new(host: Arc<dyn RepositoryHost>, operator: Arc<dyn Operator>) -> Self {
        Self { host, operator }
    }

    pub async fn check(&self, identity: &RepositoryIdentity) -> GuardDecision {
        let branch = match self.host.default_branch(identity).await {
            Ok(branch) => branch,
            Err(error) => {
                warn!(%error, "default branch lookup failed; continuing");
                return GuardDecision::Proceed;
            }
        };

        if CONVENTIONAL_BRANCHES.contains(&branch.as_str()) {
            return GuardDecision::Proceed;
        }

        let prompt = format!(
            "The default branch is \"{branch}\", which is neither \"main\" nor \"master\". Continue?"
        );
        if self.operator.confirm(&prompt).await {
            info!(branch = %branch, "operator accepted unconventional default branch");
            GuardDecision::Proceed
        } else {
            GuardDecision::Rejected { branch }
        }
    }
}
