//! # Rover Protocol
//!
//! 协调链路的线格式定义（无 IO、无线程依赖）
//!
//! ## 模块
//!
//! - `frame`: 长度前缀帧的编码/解码
//! - `message`: 结构化消息类型（JSON 载荷）
//! - `commands`: 运动指令词汇表常量
//!
//! ## 字节序
//!
//! 帧长度前缀使用大端字节序（4 字节无符号整数），
//! 载荷为 UTF-8 编码的 JSON 对象。

pub mod commands;
pub mod frame;
pub mod message;

// 重新导出常用类型
pub use frame::{MAX_FRAME_LEN, encode, read_from, write_to};
pub use message::{ImageResultsData, ImageTakenData, Message, NavigationData};

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 对端在帧边界处正常关闭连接
    #[error("Peer closed the connection")]
    PeerClosed,

    /// 帧长度前缀或载荷读取到一半时流被关闭
    #[error("Connection closed mid-frame while reading {context}")]
    Truncated { context: &'static str },

    /// 声明的帧长度超过上限
    #[error("Declared frame length {len} exceeds limit {max}")]
    FrameTooLarge { len: usize, max: usize },

    /// 消息编解码错误
    #[error("Message codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
