//! RON configuration of an smsgate instance
//!
//! ```text
//! SmsGate (
//!     dsn: "sms://memory || sms://null",
//!     max_per_second: 2.5,
//!     retry_period_secs: 30,
//!     default_headers: { "From": "+33600000000" },
//! )
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use smsgate_transport::{
    Clock, DefaultHeaders, FactoryContext, HookChain, ResolveError, SystemClock, Transports,
    backends::Inbox,
};
use thiserror::Error;

use crate::sender::SmsSender;

/// Environment variable pointing at the configuration file
pub const CONFIG_ENV: &str = "SMSGATE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("SMSGATE_CONFIG points to non-existent file: {}", .0.display())]
    MissingEnvFile(PathBuf),

    #[error("No configuration file found. Tried:\n  - SMSGATE_CONFIG environment variable\n{0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsGate {
    /// Transport DSN, `||` and `&&` included
    pub dsn: String,

    /// Default rate limit of every leaf transport; 0 disables throttling
    #[serde(default)]
    pub max_per_second: f64,

    /// How long a failed router member is skipped
    ///
    /// Default: 60 seconds
    #[serde(default = "defaults::retry_period_secs")]
    pub retry_period_secs: u64,

    /// Hosts of backends that exist but are not built in, mapped to the
    /// package providing them
    #[serde(default = "defaults::optional_backends")]
    pub optional_backends: AHashMap<String, String>,

    /// Headers added to structured messages that lack them
    #[serde(default)]
    pub default_headers: AHashMap<String, String>,
}

impl SmsGate {
    /// Configuration for `dsn` with every other setting at its default
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            max_per_second: 0.0,
            retry_period_secs: defaults::retry_period_secs(),
            optional_backends: defaults::optional_backends(),
            default_headers: AHashMap::default(),
        }
    }

    /// Parse a RON document
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is not a valid `SmsGate` document.
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    /// Read and parse the file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_ron(&content)
    }

    pub const fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_period_secs)
    }

    /// The factory registry described by this configuration
    pub fn transports(&self, clock: Arc<dyn Clock>, inbox: Inbox) -> Transports {
        let mut hooks = HookChain::new();
        if !self.default_headers.is_empty() {
            hooks.push(Arc::new(DefaultHeaders::new(self.default_headers.clone())));
        }

        let context = FactoryContext {
            hooks: Arc::new(hooks),
            clock,
            max_per_second: self.max_per_second,
        };

        self.optional_backends.iter().fold(
            Transports::with_defaults(&context, inbox).with_retry_period(self.retry_period()),
            |transports, (host, package)| transports.with_optional_backend(host, package),
        )
    }

    /// Resolve the DSN into a ready to use sender
    ///
    /// # Errors
    ///
    /// Any [`ResolveError`] raised while resolving the DSN.
    pub fn build(&self) -> Result<SmsSender, ResolveError> {
        self.build_with(Arc::new(SystemClock), Inbox::new())
    }

    /// [`build`](Self::build) with an explicit clock and memory inbox
    ///
    /// # Errors
    ///
    /// Any [`ResolveError`] raised while resolving the DSN.
    pub fn build_with(&self, clock: Arc<dyn Clock>, inbox: Inbox) -> Result<SmsSender, ResolveError> {
        let transport = self.transports(clock, inbox).from_string(&self.dsn)?;
        Ok(SmsSender::new(transport))
    }
}

/// Find the configuration file using the following precedence:
/// 1. `SMSGATE_CONFIG` environment variable
/// 2. ./smsgate.config.ron (current working directory)
/// 3. /etc/smsgate/smsgate.config.ron (system-wide config)
///
/// # Errors
///
/// Returns an error if `SMSGATE_CONFIG` names a missing file, or if none of
/// the default locations exist.
pub fn find_config_file() -> Result<PathBuf, ConfigError> {
    locate_config(
        std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        &[
            PathBuf::from("./smsgate.config.ron"),
            PathBuf::from("/etc/smsgate/smsgate.config.ron"),
        ],
    )
}

/// An explicit path must exist; otherwise the first existing default wins
fn locate_config(
    env_path: Option<PathBuf>,
    default_paths: &[PathBuf],
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = env_path {
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::MissingEnvFile(path));
    }

    if let Some(path) = default_paths.iter().find(|path| path.exists()) {
        return Ok(path.clone());
    }

    let paths_tried = default_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::NotFound(paths_tried))
}

mod defaults {
    use ahash::AHashMap;

    pub const fn retry_period_secs() -> u64 {
        60
    }

    pub fn optional_backends() -> AHashMap<String, String> {
        [("twilio", "smsgate-twilio"), ("sns", "smsgate-sns")]
            .into_iter()
            .map(|(host, package)| (host.to_string(), package.to_string()))
            .collect()
    }
}
