//! 结构化消息类型
//!
//! 链路上的每个帧载荷都是一个 `{"type": ..., "data": ...}` 形式的
//! JSON 对象。已知类型解析为强类型变体；未知类型解析为 [`Message::Unknown`]，
//! 结构上合法，由路由层做语义上的拒绝。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

/// 链路消息
///
/// # 已知类型
///
/// | type            | 方向         | 说明                          |
/// |-----------------|--------------|-------------------------------|
/// | `START_TASK`    | 显示端 → 主机 | 任务描述，交给规划器          |
/// | `FASTEST_PATH`  | 双向         | 竞速任务触发 / 结构化应答     |
/// | `NAVIGATION`    | 主机 → 运动  | 运动指令序列与路径点          |
/// | `IMAGE_TAKEN`   | 枢纽 → 主机  | base64 相机帧                 |
/// | `IMAGE_RESULTS` | 主机 → 显示  | 识别结果（已清理内部字段）    |
/// | `COORDINATES`   | 主机 → 显示  | 位置回报，载荷原样转发        |
/// | `PATH`          | 主机 → 显示  | 路径回报，载荷原样转发        |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "START_TASK")]
    StartTask { data: Value },

    /// 竞速任务事件。主机发回的结构化应答不携带 `data` 字段。
    #[serde(rename = "FASTEST_PATH")]
    FastestPath {
        #[serde(default, skip_serializing_if = "Value::is_null")]
        data: Value,
    },

    #[serde(rename = "NAVIGATION")]
    Navigation { data: NavigationData },

    #[serde(rename = "IMAGE_TAKEN")]
    ImageTaken {
        data: ImageTakenData,
        final_image: bool,
    },

    #[serde(rename = "IMAGE_RESULTS")]
    ImageResults { data: ImageResultsData },

    #[serde(rename = "COORDINATES")]
    Coordinates { data: Value },

    #[serde(rename = "PATH")]
    Path { data: Value },

    /// 未知的消息类型（结构合法，语义未知）
    #[serde(other)]
    Unknown,
}

/// 运动指令载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationData {
    /// 指令序列，参见 [`crate::commands`]
    pub commands: Vec<String>,
    /// 路径点（栅格坐标 `[x, y]`），可为空
    #[serde(default)]
    pub path: Vec<[i32; 2]>,
}

/// 相机帧载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageTakenData {
    /// base64 编码的 JPEG 数据
    pub image: String,
}

/// 识别结果载荷
///
/// `img_id` 为 `null` 表示重试预算耗尽后的"无可信识别"降级结果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResultsData {
    pub obs_id: String,
    pub img_id: Option<String>,
}

impl Message {
    /// 消息类型名（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            Message::StartTask { .. } => "START_TASK",
            Message::FastestPath { .. } => "FASTEST_PATH",
            Message::Navigation { .. } => "NAVIGATION",
            Message::ImageTaken { .. } => "IMAGE_TAKEN",
            Message::ImageResults { .. } => "IMAGE_RESULTS",
            Message::Coordinates { .. } => "COORDINATES",
            Message::Path { .. } => "PATH",
            Message::Unknown => "UNKNOWN",
        }
    }

    /// 构建一条运动指令消息
    pub fn navigation(commands: Vec<String>, path: Vec<[i32; 2]>) -> Self {
        Message::Navigation {
            data: NavigationData { commands, path },
        }
    }

    /// 竞速任务的结构化应答：`{"type": "FASTEST_PATH"}`
    pub fn fastest_path_ack() -> Self {
        Message::FastestPath { data: Value::Null }
    }

    /// 序列化为帧载荷字节
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// 从帧载荷字节解析
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
