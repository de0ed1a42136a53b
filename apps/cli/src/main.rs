//! # Rover CLI
//!
//! 协调栈的命令行入口，两个长驻子命令对应两个部署位置：
//!
//! ```bash
//! # 机器人上的中继枢纽
//! rover-cli hub --config rover.toml
//!
//! # 规划/视觉主机（脚本规划器 + 占位识别器）
//! rover-cli host --config rover.toml --script plan.json
//!
//! # 校验配置文件
//! rover-cli config check --config rover.toml
//! ```
//!
//! 两个长驻命令都响应 Ctrl-C：关停信号会传递到每条链路的
//! 收发线程，做干净退出。

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rover_host::Host;
use rover_hub::Hub;
use tracing::info;

mod config;
mod script;

use config::RoverConfig;
use script::{NoopStitcher, NullRecognizer, ScriptedPlanner};

/// Rover CLI - 多智能体机器人协调栈
#[derive(Parser, Debug)]
#[command(name = "rover-cli")]
#[command(about = "Coordination stack for the rover: relay hub and planning host", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 运行机器人上的中继枢纽
    Hub {
        /// 配置文件路径
        #[arg(short, long, default_value = "rover.toml")]
        config: PathBuf,
    },

    /// 运行规划/视觉主机
    Host {
        /// 配置文件路径
        #[arg(short, long, default_value = "rover.toml")]
        config: PathBuf,

        /// 障碍指令脚本（JSON）
        #[arg(short, long)]
        script: PathBuf,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// 解析配置文件并打印生效的各段
    Check {
        #[arg(short, long, default_value = "rover.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Hub { config } => run_hub(&config),
        Commands::Host { config, script } => run_host(&config, &script),
        Commands::Config(ConfigCommand::Check { config }) => check_config(&config),
    }
}

fn run_hub(config_path: &std::path::Path) -> Result<()> {
    let config = RoverConfig::load(config_path)?;
    let hub = Hub::spawn(config.hub_config()?)?;

    let stopper = hub.stopper();
    ctrlc::set_handler(move || {
        info!("Ctrl-C received, shutting down hub");
        stopper.stop();
    })?;

    hub.join();
    info!("hub exited cleanly");
    Ok(())
}

fn run_host(config_path: &std::path::Path, script_path: &std::path::Path) -> Result<()> {
    let config = RoverConfig::load(config_path)?;
    let (hub_endpoint, host_config) = config.host_config()?;
    let planner = ScriptedPlanner::load(script_path)?;

    let host = Host::spawn(
        hub_endpoint,
        config.link_config(),
        host_config,
        planner,
        NullRecognizer,
        NoopStitcher,
    )?;

    let stopper = host.stopper();
    ctrlc::set_handler(move || {
        info!("Ctrl-C received, shutting down host");
        stopper.stop();
    })?;

    host.join();
    info!("host exited cleanly");
    Ok(())
}

fn check_config(config_path: &std::path::Path) -> Result<()> {
    let config = RoverConfig::load(config_path)?;

    println!("link: retry backoff {}ms", config.link.retry_backoff_ms);
    println!(
        "task: {} mode",
        if config.task.two_obstacle {
            "two-obstacle"
        } else {
            "single-obstacle"
        }
    );

    match config.hub_config() {
        Ok(hub) => println!(
            "hub: host {:?} / motion {:?} / display {:?}",
            hub.host.addr, hub.motion.addr, hub.display.addr
        ),
        Err(_) => println!("hub: (not configured)"),
    }

    match config.host_config() {
        Ok((endpoint, host)) => println!(
            "host: hub {:?}, captures {}, results {}, max retries {}",
            endpoint.addr,
            host.capture_dir.display(),
            host.results_dir.display(),
            host.max_retries
        ),
        Err(_) => println!("host: (not configured)"),
    }

    Ok(())
}
