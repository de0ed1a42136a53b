//! 规划器接口
//!
//! 路径搜索与指令生成引擎是外部协作方，编排器只通过这组
//! 方法与之交互：喂入任务描述、逐个取出障碍指令、查询进度。

use rover_protocol::Message;
use serde_json::Value;

use crate::HostError;

/// 路径规划器
///
/// 实现方持有内部路线状态；`next_command` 弹出下一条指令并推进
/// 内部游标。
pub trait Planner: Send {
    /// 根据任务描述构建内部路线（副作用调用）
    fn generate_path(&mut self, task: &Value) -> Result<(), HostError>;

    /// 弹出通往下一个障碍的指令；路线耗尽时返回 `None`
    fn next_command(&mut self) -> Option<Message>;

    /// 当前目标障碍的 id
    ///
    /// 不跟踪障碍 id 的规划器可返回空字符串，编排器将自行编号。
    fn current_obstacle_id(&self) -> String;

    /// 所有障碍是否都已走完
    fn task_ended(&self) -> bool;

    /// 回报某个障碍最终解析出的符号（供规划器更新内部映射）
    fn record_resolved_symbol(&mut self, img_id: Option<&str>);
}
