//! # Rover Link
//!
//! 链路层：帧化通道 + 断线重连监督
//!
//! 每条链路对应一个 TCP 连接，由一对后台线程负责收发：
//! - TX 线程从无界出站队列逐条取消息，经帧化通道发送，
//!   发送失败时触发重连并重发同一条消息（至少一次交付）；
//! - RX 线程阻塞读取完整帧，解码后交给所有者的回调。
//!
//! 连接失败永远不是致命错误：监督器以固定间隔无限重试。
//!
//! ## 模块
//!
//! - `framed`: 帧化通道（长度前缀收发）
//! - `connector`: 连接建立抽象（主动拨号 / 被动接受）
//! - `state`: 链路状态及其原子封装
//! - `link`: 监督器本体
//! - `sink`: 出站队列的统一抽象

pub mod connector;
pub mod framed;
pub mod link;
pub mod sink;
pub mod state;

pub use connector::{AcceptConnector, Connector, DialConnector, Endpoint, Role};
pub use framed::FramedStream;
pub use link::{Link, LinkConfig, LinkSender, LinkStopper};
pub use sink::MessageSink;
pub use state::{AtomicLinkState, LinkState};

use rover_protocol::ProtocolError;
use thiserror::Error;

/// 链路层错误类型
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 地址无法解析为套接字地址
    #[error("Address {0} did not resolve")]
    AddrResolve(String),

    /// 出站队列已关闭（TX 线程退出）
    #[error("Outbound queue closed")]
    ChannelClosed,

    /// 链路正在关停
    #[error("Link is shutting down")]
    ShuttingDown,
}
