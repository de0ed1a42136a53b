//! 障碍上下文
//!
//! 同一时刻至多一个障碍在途。上下文在"发出通往下一障碍的指令"
//! 时创建，在该障碍的结果定案时重置；这些状态只被编排器的单
//! 逻辑线程触碰，无需加锁。

use rover_protocol::Message;

use crate::recognizer::Prediction;

/// 在途障碍的全部可变状态
#[derive(Debug, Clone)]
pub struct ObstacleContext {
    /// 当前目标障碍 id
    pub obs_id: String,
    /// 本障碍已处理的图像帧数（也用作落盘文件的序号）
    pub image_counter: u32,
    /// 已消耗的重试次数
    pub retry_count: u32,
    /// 最近一次下发的指令（重试方向与竞速判定依赖它）
    pub pending_command: Message,
    /// 本障碍的全部识别结果，按到达顺序
    pub image_history: Vec<Prediction>,
}

impl ObstacleContext {
    pub fn new(obs_id: String, pending_command: Message) -> Self {
        Self {
            obs_id,
            image_counter: 0,
            retry_count: 0,
            pending_command,
            image_history: Vec::new(),
        }
    }
}

/// 识别历史回溯：从最近往回找第一个可信识别
///
/// 丢弃 `img_id = None` 的条目；整个历史都不可信时返回 `None`。
/// 重试决策建立在这个纯函数之上。
pub fn latest_confident(history: &[Prediction]) -> Option<&Prediction> {
    history.iter().rev().find(|p| p.is_confident())
}
