//! Deployment stages and their failure policy.
//!
//! The policy table below is the single source of truth for which stage
//! aborts the run and which merely warns.

/// One step of the deployment pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Local archive creation.
    Archive,
    /// TCP connect, SSH handshake, and password authentication.
    Connect,
    /// SCP upload of the archive to the remote staging path.
    Transfer,
    /// The combined remote deploy command sequence.
    RemoteDeploy,
    /// Removal of the staged archive on the VPS.
    RemoteCleanup,
}

/// How a stage failure affects the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Print a diagnostic and terminate with a nonzero exit. Later stages,
    /// including cleanup, do not run.
    Fatal,
    /// Warn and continue with the next stage.
    Advisory,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 5] = [
        Stage::Archive,
        Stage::Connect,
        Stage::Transfer,
        Stage::RemoteDeploy,
        Stage::RemoteCleanup,
    ];

    /// The named failure policy for this stage.
    #[must_use]
    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            Stage::Archive | Stage::Connect | Stage::Transfer => FailurePolicy::Fatal,
            Stage::RemoteDeploy | Stage::RemoteCleanup => FailurePolicy::Advisory,
        }
    }

    #[must_use]
    pub fn is_fatal(self) -> bool {
        self.failure_policy() == FailurePolicy::Fatal
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Archive => "archive",
            Stage::Connect => "connect",
            Stage::Transfer => "transfer",
            Stage::RemoteDeploy => "remote deploy",
            Stage::RemoteCleanup => "remote cleanup",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table_is_exactly_as_specified() {
        // Enumerated so a policy change shows up as a test diff, not a
        // surprise mid-deployment.
        let expected = [
            (Stage::Archive, FailurePolicy::Fatal),
            (Stage::Connect, FailurePolicy::Fatal),
            (Stage::Transfer, FailurePolicy::Fatal),
            (Stage::RemoteDeploy, FailurePolicy::Advisory),
            (Stage::RemoteCleanup, FailurePolicy::Advisory),
        ];
        for (stage, policy) in expected {
            assert_eq!(stage.failure_policy(), policy, "policy for {stage}");
        }
    }

    #[test]
    fn test_all_lists_every_stage_in_execution_order() {
        assert_eq!(
            Stage::ALL,
            [
                Stage::Archive,
                Stage::Connect,
                Stage::Transfer,
                Stage::RemoteDeploy,
                Stage::RemoteCleanup,
            ]
        );
    }

    #[test]
    fn test_is_fatal_matches_policy() {
        for stage in Stage::ALL {
            assert_eq!(stage.is_fatal(), stage.failure_policy() == FailurePolicy::Fatal);
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Stage::Archive.to_string(), "archive");
        assert_eq!(Stage::RemoteDeploy.to_string(), "remote deploy");
        assert_eq!(Stage::RemoteCleanup.to_string(), "remote cleanup");
    }
}
