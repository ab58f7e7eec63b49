//! Cache key layout.
//!
//! Every key starts with the configured namespace. Feed keys are grouped under
//! a scope prefix so one `SCAN` can enumerate everything to invalidate:
//!
//! - `{ns}:problems:page:{page}:limit:{limit}`
//! - `{ns}:solutions:problem:{problem_id}:page:{page}:limit:{limit}`
//! - `{ns}:user_status:{user_id}`
//! - `{ns}:dashboard:global_stats`

use uuid::Uuid;

/// A cached feed scope: the global problem listing or one problem's solutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedScope {
    Problems,
    Solutions { problem_id: Uuid },
}

impl FeedScope {
    pub fn label(&self) -> &'static str {
        match self {
            FeedScope::Problems => "problems",
            FeedScope::Solutions { .. } => "solutions",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheKeys {
    namespace: String,
}

impl CacheKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Prefix shared by every page of a scope.
    pub fn scope_prefix(&self, scope: FeedScope) -> String {
        match scope {
            FeedScope::Problems => format!("{}:problems:", self.namespace),
            FeedScope::Solutions { problem_id } => {
                format!("{}:solutions:problem:{problem_id}:", self.namespace)
            }
        }
    }

    pub fn feed_page(&self, scope: FeedScope, page: u32, limit: u32) -> String {
        format!("{}page:{page}:limit:{limit}", self.scope_prefix(scope))
    }

    pub fn status_map(&self, user_id: Uuid) -> String {
        format!("{}:user_status:{user_id}", self.namespace)
    }

    pub fn dashboard_stats(&self) -> String {
        format!("{}:dashboard:global_stats", self.namespace)
    }
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new("dojo")
    }
}
