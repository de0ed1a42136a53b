//! # Rover Host
//!
//! 主机侧的障碍编排：把任务/图像事件转换为导航指令和最终识别
//! 结果的状态机。路径搜索（规划器）、视觉推理（识别器）和拼图
//! 归档（拼接器）都是黑盒协作方，经由窄接口注入。
//!
//! ## 状态机
//!
//! ```text
//! Idle ──START_TASK──► AwaitingImages ──任务结束──► Done
//!                        │    ▲
//!                        └────┘ IMAGE_TAKEN / 重试指令
//! ```
//!
//! 重试预算严格有界：预算耗尽时接受可能为空的识别结果（降级，
//! 不是成功），绝不无限循环。
//!
//! ## 模块
//!
//! - `planner`: 规划器接口
//! - `recognizer`: 识别器/拼接器接口与 [`Prediction`]
//! - `context`: 障碍上下文与识别历史回溯
//! - `orchestrator`: 状态机本体
//! - `config`: 主机配置
//! - `host`: 链路 + 编排线程的装配

pub mod config;
pub mod context;
pub mod host;
pub mod orchestrator;
pub mod planner;
pub mod recognizer;

pub use config::HostConfig;
pub use context::{ObstacleContext, latest_confident};
pub use host::Host;
pub use orchestrator::{Orchestrator, Phase};
pub use planner::Planner;
pub use recognizer::{Prediction, Recognizer, Stitcher};

use rover_link::LinkError;
use thiserror::Error;

/// 主机层错误类型
#[derive(Error, Debug)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 相机帧不是合法的 base64
    #[error("Image payload is not valid base64: {0}")]
    ImageDecode(#[from] base64::DecodeError),

    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// 规划器报告的失败
    #[error("Planner error: {0}")]
    Planner(String),

    /// 识别器报告的失败
    #[error("Recognizer error: {0}")]
    Recognizer(String),

    /// 拼接器报告的失败
    #[error("Stitcher error: {0}")]
    Stitcher(String),

    /// 规划器没有给出下一个障碍的指令
    #[error("Planner returned no command for the next obstacle")]
    EmptyPlan,

    /// 收到图像事件但没有在途的障碍上下文
    #[error("No active obstacle context")]
    NoActiveObstacle,

    /// 需要定案但识别历史为空
    #[error("Resolution reached with empty capture history")]
    NoCapture,
}
