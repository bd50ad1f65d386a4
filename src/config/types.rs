use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub s3: Option<S3Config>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub listen: String,
    /// Optional directory of static viewer assets served as a fallback.
    #[serde(default)]
    pub client_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Viewer page the client navigates to once an artifact is resolved.
    #[serde(default = "default_viewer_url_prefix")]
    pub url_prefix: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            url_prefix: default_viewer_url_prefix(),
        }
    }
}

fn default_viewer_url_prefix() -> String {
    "/log-viewer/index.html".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay before the first job-state poll; doubles per attempt afterwards.
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub interval: Duration,

    /// Hard deadline for waiting on a single extraction job.
    #[serde(with = "humantime_serde", default = "default_max_wait")]
    pub max_wait: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_wait: default_max_wait(),
        }
    }
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_max_wait() -> Duration {
    Duration::from_secs(60)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub region: String,
}
