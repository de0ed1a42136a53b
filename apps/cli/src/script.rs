//! 脚本规划器与占位协作方
//!
//! 真实部署里路径搜索和视觉推理是独立引擎；这里提供能把整条
//! 管线跑通的最小实现：
//!
//! - [`ScriptedPlanner`]：从 JSON 脚本读取每个障碍的指令序列，
//!   按顺序下发；
//! - [`NullRecognizer`]：总是报告"无可信识别"（用于演练重试与
//!   降级路径）；
//! - [`NoopStitcher`]：只记录拼接请求。
//!
//! 脚本格式：
//!
//! ```json
//! [
//!   {"obs_id": "1", "commands": ["LF180"], "path": [[1, 2], [2, 2]]},
//!   {"obs_id": "2", "commands": ["RF090"], "path": [[4, 4]]}
//! ]
//! ```

use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rover_host::{HostError, Planner, Prediction, Recognizer, Stitcher};
use rover_protocol::Message;
use rover_tools::Heading;
use rover_tools::grid::{self, GRID_SIZE};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

/// 脚本中的一个障碍条目
#[derive(Debug, Deserialize)]
struct ScriptEntry {
    obs_id: String,
    commands: Vec<String>,
    #[serde(default)]
    path: Vec<[i32; 2]>,
}

/// 从 JSON 脚本驱动的规划器
pub struct ScriptedPlanner {
    route: VecDeque<(String, Message)>,
    current: Option<String>,
}

impl ScriptedPlanner {
    /// 读取并校验脚本文件
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script file {}", path.display()))?;
        let entries: Vec<ScriptEntry> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse script file {}", path.display()))?;

        if entries.is_empty() {
            bail!("script {} contains no obstacles", path.display());
        }

        // 路径点必须落在场地栅格内
        for entry in &entries {
            for [x, y] in &entry.path {
                if !(0..=GRID_SIZE).contains(x) || !(0..=GRID_SIZE).contains(y) {
                    bail!(
                        "obstacle {}: waypoint [{x}, {y}] is outside the {GRID_SIZE}x{GRID_SIZE} arena",
                        entry.obs_id
                    );
                }
            }
        }

        Ok(Self {
            route: entries
                .into_iter()
                .map(|e| (e.obs_id, Message::navigation(e.commands, e.path)))
                .collect(),
            current: None,
        })
    }
}

impl Planner for ScriptedPlanner {
    fn generate_path(&mut self, task: &Value) -> Result<(), HostError> {
        // 路线来自脚本；任务载荷只用来回显机器人起始位姿
        if let Some(robot) = task.get("robot") {
            let x = robot.get("x").and_then(Value::as_i64).unwrap_or(0) as i32;
            let y = robot.get("y").and_then(Value::as_i64).unwrap_or(0) as i32;
            match robot
                .get("dir")
                .and_then(Value::as_str)
                .unwrap_or("N")
                .parse::<Heading>()
            {
                Ok(heading) => {
                    let (cx, cy) = grid::grid_to_coords(x, y);
                    info!(
                        "robot starts at ({cx:.0}cm, {cy:.0}cm) heading {}",
                        heading.as_letter()
                    );
                },
                Err(e) => warn!("{e}"),
            }
        }

        info!("scripted route: {} obstacle(s)", self.route.len());
        Ok(())
    }

    fn next_command(&mut self) -> Option<Message> {
        self.route.pop_front().map(|(obs_id, command)| {
            self.current = Some(obs_id);
            command
        })
    }

    fn current_obstacle_id(&self) -> String {
        self.current.clone().unwrap_or_default()
    }

    fn task_ended(&self) -> bool {
        self.route.is_empty()
    }

    fn record_resolved_symbol(&mut self, img_id: Option<&str>) {
        match img_id {
            Some(id) => info!("symbol {} resolved for obstacle {:?}", id, self.current),
            None => warn!("obstacle {:?} finished without a symbol", self.current),
        }
    }
}

/// 总是报告"无可信识别"的识别器
///
/// 没有模型也能演练整条管线：落盘、历史回溯、重试和降级定案。
pub struct NullRecognizer;

impl Recognizer for NullRecognizer {
    fn infer(
        &mut self,
        image_path: &Path,
        obs_id: &str,
        image_index: u32,
        _task_two: bool,
    ) -> Result<Prediction, HostError> {
        info!(
            "(stub) no inference backend, frame {} of obstacle {} recorded",
            image_index, obs_id
        );
        Ok(Prediction {
            obs_id: obs_id.to_string(),
            img_id: None,
            confidence: 0.0,
            bbox_area: 0.0,
            image_path: image_path.to_path_buf(),
        })
    }
}

/// 只记录请求的拼接器
pub struct NoopStitcher;

impl Stitcher for NoopStitcher {
    fn stitch(&self, results_dir: &Path, output: &Path) -> Result<(), HostError> {
        info!(
            "(stub) stitch requested: {} -> {}",
            results_dir.display(),
            output.display()
        );
        Ok(())
    }
}
