//! # Rover Hub
//!
//! 机器人上的中继枢纽：一端面向规划/视觉主机，另一端面向
//! 运动控制器和操作员显示端，三条链路相互独立。
//!
//! 主机方向的入站消息经 [`Router`] 按类型分发到下游出站队列；
//! 显示端方向的入站消息原样转发给主机。路由本身是单线程状态机，
//! 由专门的分发线程串行驱动。
//!
//! ## 模块
//!
//! - `router`: 类型 → 下游队列的路由表与双障碍辅助绕行合成
//! - `hub`: 三条链路的装配与分发线程

pub mod hub;
pub mod router;

pub use hub::{Hub, HubConfig, HubStopper};
pub use router::Router;

use rover_link::LinkError;
use thiserror::Error;

/// 枢纽层错误类型
#[derive(Error, Debug)]
pub enum HubError {
    /// 链路层错误（含绑定/监听失败）
    #[error("Link error: {0}")]
    Link(#[from] LinkError),
}
