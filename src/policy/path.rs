//! Path policy evaluation.

use std::fmt;

use crate::error::StartupError;
use crate::policy::patterns::PatternList;

/// Outcome of evaluating a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Path may be forwarded.
    Allow,
    /// Path matched a reject pattern.
    RejectedByDenyList,
    /// Path matched no accept pattern.
    RejectedByAllowList,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Allow => write!(f, "allow"),
            Verdict::RejectedByDenyList => write!(f, "deny_list"),
            Verdict::RejectedByAllowList => write!(f, "not_in_allow_list"),
        }
    }
}

/// Reject and accept pattern lists, immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct PathPolicy {
    reject: PatternList,
    accept: PatternList,
}

impl PathPolicy {
    /// Compile a policy from its reject and accept specification strings.
    pub fn new(reject_paths: &str, accept_paths: &str) -> Result<Self, StartupError> {
        Ok(Self {
            reject: PatternList::parse(reject_paths)?,
            accept: PatternList::parse(accept_paths)?,
        })
    }

    /// Decide whether `path` may be forwarded.
    pub fn evaluate(&self, path: &str) -> Verdict {
        if self.reject.matches(path) {
            return Verdict::RejectedByDenyList;
        }
        if !self.accept.matches(path) {
            return Verdict::RejectedByAllowList;
        }
        Verdict::Allow
    }

    pub fn reject_patterns(&self) -> &PatternList {
        &self.reject
    }

    pub fn accept_patterns(&self) -> &PatternList {
        &self.accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{DEFAULT_PATH_ACCEPT_RE, DEFAULT_PATH_REJECT_RE};

    const EXEC: &str = "/api/v1/namespaces/foo/pods/bar/exec";
    const PODS: &str = "/api/v1/namespaces/foo/pods";

    fn policy(reject: &str, accept: &str) -> PathPolicy {
        PathPolicy::new(reject, accept).unwrap()
    }

    #[test]
    fn defaults_reject_interactive_subresources() {
        let p = policy(DEFAULT_PATH_REJECT_RE, DEFAULT_PATH_ACCEPT_RE);
        assert_eq!(p.evaluate(EXEC), Verdict::RejectedByDenyList);
        assert_eq!(
            p.evaluate("/api/v1/namespaces/foo/pods/bar/attach"),
            Verdict::RejectedByDenyList
        );
        assert_eq!(
            p.evaluate("/api/v1/namespaces/foo/pods/bar/portforward"),
            Verdict::RejectedByDenyList
        );
        assert_eq!(p.evaluate(PODS), Verdict::Allow);
        assert_eq!(p.evaluate("/apis/apps/v1/deployments"), Verdict::Allow);
    }

    #[test]
    fn reject_list_has_priority() {
        let p = policy(".*", ".*");
        assert_eq!(p.evaluate(EXEC), Verdict::RejectedByDenyList);
        assert_eq!(p.evaluate(PODS), Verdict::RejectedByDenyList);
    }

    #[test]
    fn reject_all_with_empty_accept_is_still_deny_list() {
        let p = policy(".*", "");
        assert_eq!(p.evaluate(EXEC), Verdict::RejectedByDenyList);
    }

    #[test]
    fn path_outside_accept_list_is_rejected() {
        let p = policy("", "^/api/v1/namespaces/foo/pods$");
        assert_eq!(p.evaluate(EXEC), Verdict::RejectedByAllowList);
        assert_eq!(p.evaluate(PODS), Verdict::Allow);
    }

    #[test]
    fn empty_accept_list_denies_everything() {
        let p = policy("", "");
        for path in [EXEC, PODS, "/", ""] {
            assert_eq!(p.evaluate(path), Verdict::RejectedByAllowList, "path {path:?}");
        }
    }

    #[test]
    fn accept_prefix_with_subresource_reject() {
        let p = policy(DEFAULT_PATH_REJECT_RE, "^/api/v1/.*");
        assert_eq!(p.evaluate(PODS), Verdict::Allow);
        assert_eq!(p.evaluate(EXEC), Verdict::RejectedByDenyList);
        assert_eq!(p.evaluate("/apis/apps/v1"), Verdict::RejectedByAllowList);
    }

    #[test]
    fn bad_pattern_fails_construction() {
        assert!(PathPolicy::new("[", DEFAULT_PATH_ACCEPT_RE).is_err());
        assert!(PathPolicy::new("", "(").is_err());
    }
}
