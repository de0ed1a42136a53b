//! 配置文件解析
//!
//! 单一 TOML 文件描述整套部署：链路退避、任务模式，以及枢纽/
//! 主机各自的端点。两个子命令读同一个文件，各取所需的段。
//!
//! ```toml
//! [link]
//! retry_backoff_ms = 1000
//!
//! [task]
//! two_obstacle = false
//!
//! [hub]
//! host = { addr = "0.0.0.0:8888", role = "accept" }
//! motion = { addr = "192.168.29.21:3456", role = "dial" }
//! display = { addr = "0.0.0.0:9999", role = "accept" }
//!
//! [host]
//! hub = { addr = "192.168.29.29:8888", role = "dial" }
//! capture_dir = "captures"
//! results_dir = "results"
//! stitched_output = "results/stitched.jpg"
//! max_retries = 2
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rover_host::HostConfig;
use rover_hub::HubConfig;
use rover_link::{Endpoint, LinkConfig};
use serde::Deserialize;

/// 整个部署的配置
#[derive(Debug, Deserialize)]
pub struct RoverConfig {
    #[serde(default)]
    pub link: LinkSection,
    #[serde(default)]
    pub task: TaskSection,
    pub hub: Option<HubSection>,
    pub host: Option<HostSection>,
}

#[derive(Debug, Deserialize)]
pub struct LinkSection {
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for LinkSection {
    fn default() -> Self {
        Self {
            retry_backoff_ms: default_backoff_ms(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskSection {
    /// 双障碍任务模式
    #[serde(default)]
    pub two_obstacle: bool,
}

#[derive(Debug, Deserialize)]
pub struct HubSection {
    pub host: Endpoint,
    pub motion: Endpoint,
    pub display: Endpoint,
}

#[derive(Debug, Deserialize)]
pub struct HostSection {
    pub hub: Endpoint,
    #[serde(default = "default_capture_dir")]
    pub capture_dir: PathBuf,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_stitched_output")]
    pub stitched_output: PathBuf,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_capture_dir() -> PathBuf {
    PathBuf::from("captures")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_stitched_output() -> PathBuf {
    PathBuf::from("results/stitched.jpg")
}

fn default_max_retries() -> u32 {
    rover_host::config::DEFAULT_MAX_RETRIES
}

impl RoverConfig {
    /// 读取并解析配置文件
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            retry_backoff: Duration::from_millis(self.link.retry_backoff_ms),
        }
    }

    /// 枢纽配置（要求 `[hub]` 段存在）
    pub fn hub_config(&self) -> Result<HubConfig> {
        let section = self
            .hub
            .as_ref()
            .context("config has no [hub] section")?;

        Ok(HubConfig {
            host: section.host.clone(),
            motion: section.motion.clone(),
            display: section.display.clone(),
            task_two: self.task.two_obstacle,
            link: self.link_config(),
        })
    }

    /// 主机配置（要求 `[host]` 段存在），返回 (枢纽端点, 主机配置)
    pub fn host_config(&self) -> Result<(Endpoint, HostConfig)> {
        let section = self
            .host
            .as_ref()
            .context("config has no [host] section")?;

        Ok((
            section.hub.clone(),
            HostConfig {
                task_two: self.task.two_obstacle,
                capture_dir: section.capture_dir.clone(),
                results_dir: section.results_dir.clone(),
                stitched_output: section.stitched_output.clone(),
                max_retries: section.max_retries,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_link::Role;

    const SAMPLE: &str = r#"
[link]
retry_backoff_ms = 250

[task]
two_obstacle = true

[hub]
host = { addr = "0.0.0.0:8888", role = "accept" }
motion = { addr = "192.168.29.21:3456", role = "dial" }
display = { addr = "0.0.0.0:9999", role = "accept" }

[host]
hub = { addr = "192.168.29.29:8888", role = "dial" }
max_retries = 3
"#;

    #[test]
    fn test_parse_full_config() {
        let config: RoverConfig = toml::from_str(SAMPLE).unwrap();

        let hub = config.hub_config().unwrap();
        assert!(hub.task_two);
        assert_eq!(hub.host.role, Role::Accept);
        assert_eq!(hub.motion.addr, "192.168.29.21:3456");
        assert_eq!(hub.link.retry_backoff, Duration::from_millis(250));

        let (endpoint, host) = config.host_config().unwrap();
        assert_eq!(endpoint.role, Role::Dial);
        assert_eq!(host.max_retries, 3);
        // 未给出的路径字段取默认值
        assert_eq!(host.capture_dir, PathBuf::from("captures"));
    }

    #[test]
    fn test_missing_sections_are_reported() {
        let config: RoverConfig = toml::from_str("[task]\ntwo_obstacle = false\n").unwrap();
        assert!(config.hub_config().is_err());
        assert!(config.host_config().is_err());
    }
}
