//! Deployment target configuration.
//!
//! All parameters are compiled-in constants; the `deploy` subcommand exposes
//! flag/env overrides that default to them, so a bare invocation targets the
//! production VPS.

/// Production VPS address.
pub const DEFAULT_HOST: &str = "158.220.107.106";

/// SSH port on the VPS.
pub const DEFAULT_PORT: u16 = 2022;

/// SSH user the deployment authenticates as.
pub const DEFAULT_USER: &str = "root";

/// Directory on the VPS the application is deployed into.
pub const DEFAULT_DEPLOY_PATH: &str = "/root/adminhub";

/// Name of the archive written into the project root.
pub const ARCHIVE_NAME: &str = "adminhub-deploy.tar.gz";

/// Staging path the archive is uploaded to on the VPS.
pub const REMOTE_STAGING_PATH: &str = "/tmp/adminhub-deploy.tar.gz";

/// Script run on the VPS after extraction. The archive itself provides it;
/// its contents are opaque to this tool.
pub const REMOTE_DEPLOY_SCRIPT: &str = "vps-deploy.sh";

/// Port the deployed application listens on.
pub const APP_PORT: u16 = 8080;

/// Seeded admin account created by the remote deploy script.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@company.com";

/// Initial password of the seeded admin account.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Where a deployment goes: host, port, user, and remote deploy directory.
/// Immutable for the lifetime of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub deploy_path: String,
}

impl Default for DeployTarget {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            deploy_path: DEFAULT_DEPLOY_PATH.to_string(),
        }
    }
}

impl DeployTarget {
    /// `host:port` form used for the TCP connection.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL the application answers on once deployed.
    #[must_use]
    pub fn app_url(&self) -> String {
        format!("http://{}:{APP_PORT}", self.host)
    }
}
