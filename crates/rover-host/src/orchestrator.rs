//! 障碍编排状态机
//!
//! 由链路接收回调同步驱动：一次处理一条消息，处理完才取下一条。
//! 所有可变状态都在 [`ObstacleContext`] 里，创建/重置点固定。

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rover_link::MessageSink;
use rover_protocol::{ImageTakenData, Message, commands};
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::HostError;
use crate::config::HostConfig;
use crate::context::{ObstacleContext, latest_confident};
use crate::planner::Planner;
use crate::recognizer::{Prediction, Recognizer, Stitcher};

/// 编排阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// 等待任务下发
    #[default]
    Idle,

    /// 指令已下发，等待图像回传
    AwaitingImages,

    /// 任务结束（终态）
    Done,
}

/// 定案阶段的下一步动作
enum Resolution {
    /// 下发重试指令，留在 AwaitingImages
    Retry(Message),
    /// 以该识别结果定案
    Finalize(Prediction),
}

/// 障碍编排器
///
/// 泛型注入四个协作方：规划器、识别器、拼接器和出站队列。
pub struct Orchestrator<P, R, S, O> {
    planner: P,
    recognizer: R,
    stitcher: S,
    outbound: O,
    config: HostConfig,
    phase: Phase,
    /// 在途障碍；只在 AwaitingImages 阶段存在
    ctx: Option<ObstacleContext>,
}

impl<P, R, S, O> Orchestrator<P, R, S, O>
where
    P: Planner,
    R: Recognizer,
    S: Stitcher,
    O: MessageSink,
{
    pub fn new(planner: P, recognizer: R, stitcher: S, outbound: O, config: HostConfig) -> Self {
        Self {
            planner,
            recognizer,
            stitcher,
            outbound,
            config,
            phase: Phase::Idle,
            ctx: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// 处理一条入站消息
    ///
    /// 错误（IO、协作方失败）不改变阶段：调用方记录后继续驱动。
    pub fn handle_message(&mut self, msg: Message) -> Result<(), HostError> {
        match (self.phase, msg) {
            (Phase::Done, msg) => {
                trace!("task complete, ignoring {}", msg.kind());
            },

            (_, Message::FastestPath { .. }) => self.on_fastest_path()?,

            (Phase::Idle, Message::StartTask { data }) => self.start_task(&data)?,

            (Phase::AwaitingImages, Message::ImageTaken { data, final_image }) => {
                self.on_image(&data, final_image)?;
            },

            (phase, msg) => {
                warn!("ignoring {} in phase {:?}", msg.kind(), phase);
            },
        }

        Ok(())
    }

    /// START_TASK：规划路线，下发第一条指令，建立障碍上下文
    fn start_task(&mut self, task: &Value) -> Result<(), HostError> {
        info!("task received, generating path");
        self.planner.generate_path(task)?;

        let command = self.planner.next_command().ok_or(HostError::EmptyPlan)?;
        let obs_id = self.obstacle_id_or_default();

        info!("heading to obstacle {}", obs_id);
        self.outbound.push(command.clone())?;
        self.ctx = Some(ObstacleContext::new(obs_id, command));
        self.phase = Phase::AwaitingImages;
        Ok(())
    }

    /// FASTEST_PATH：发回结构化应答，任务完成语义不受影响
    ///
    /// 应答同时成为在途指令：之后的识别定案按竞速上下文处理
    /// （无可信识别时直接采用默认符号，不做试探重试）。
    fn on_fastest_path(&mut self) -> Result<(), HostError> {
        debug!("FASTEST_PATH event, acknowledging");
        let ack = Message::fastest_path_ack();
        self.outbound.push(ack.clone())?;

        if let Some(ctx) = self.ctx.as_mut() {
            ctx.pending_command = ack;
        }
        Ok(())
    }

    /// IMAGE_TAKEN：落盘、推理、入史；终帧触发定案
    fn on_image(&mut self, data: &ImageTakenData, final_image: bool) -> Result<(), HostError> {
        let (obs_id, index) = {
            let ctx = self.ctx.as_ref().ok_or(HostError::NoActiveObstacle)?;
            (ctx.obs_id.clone(), ctx.image_counter)
        };

        let bytes = BASE64.decode(data.image.as_bytes())?;
        std::fs::create_dir_all(&self.config.capture_dir)?;
        let image_path = self.config.capture_dir.join(format!(
            "task{}_obs_id_{}_{}.jpg",
            self.config.task_no(),
            obs_id,
            index
        ));
        std::fs::write(&image_path, &bytes)?;
        debug!(
            "captured frame {} for obstacle {} ({} bytes)",
            index,
            obs_id,
            bytes.len()
        );

        let prediction =
            self.recognizer
                .infer(&image_path, &obs_id, index, self.config.task_two)?;
        trace!(
            "inference for obstacle {}: img_id {:?} (confidence {:.2})",
            obs_id, prediction.img_id, prediction.confidence
        );

        let ctx = self.ctx.as_mut().ok_or(HostError::NoActiveObstacle)?;
        ctx.image_history.push(prediction);
        ctx.image_counter += 1;

        if final_image {
            self.resolve()?;
        }
        Ok(())
    }

    /// 终帧定案：回溯识别历史，决定重试还是定案
    fn resolve(&mut self) -> Result<(), HostError> {
        let max_retries = self.config.max_retries;

        let action = {
            let ctx = self.ctx.as_mut().ok_or(HostError::NoActiveObstacle)?;

            match latest_confident(&ctx.image_history).cloned() {
                Some(winner) => Resolution::Finalize(winner),

                None if ctx.retry_count < max_retries => {
                    if matches!(ctx.pending_command, Message::FastestPath { .. }) {
                        // 竞速上下文没有重试空间：采用默认符号直接定案
                        let mut adopted = ctx
                            .image_history
                            .last()
                            .cloned()
                            .ok_or(HostError::NoCapture)?;
                        warn!(
                            "no confident detection in fastest-path context, \
                             adopting default symbol {}",
                            commands::SYMBOL_RIGHT
                        );
                        adopted.img_id = Some(commands::SYMBOL_RIGHT.to_string());
                        Resolution::Finalize(adopted)
                    } else {
                        // 试探往返：回到最后一个已知路径点，方向按重试奇偶交替
                        let waypoint = match &ctx.pending_command {
                            Message::Navigation { data } => {
                                data.path.last().copied().unwrap_or([0, 0])
                            },
                            _ => [0, 0],
                        };
                        let retry = Message::navigation(
                            commands::nudge_pair(ctx.retry_count),
                            vec![waypoint, waypoint],
                        );
                        ctx.pending_command = retry.clone();
                        ctx.retry_count += 1;
                        info!(
                            "no confident detection for obstacle {}, retry {}/{}",
                            ctx.obs_id, ctx.retry_count, max_retries
                        );
                        Resolution::Retry(retry)
                    }
                },

                None => {
                    // 预算耗尽：记录并接受尽力而为的结果（img_id 为空）
                    warn!(
                        "retry budget exhausted for obstacle {}, \
                         accepting best-effort result",
                        ctx.obs_id
                    );
                    let fallback = ctx
                        .image_history
                        .last()
                        .cloned()
                        .ok_or(HostError::NoCapture)?;
                    Resolution::Finalize(fallback)
                },
            }
        };

        match action {
            Resolution::Retry(command) => {
                // image_counter 不复位：重试帧继续顺延编号
                self.outbound.push(command)?;
                Ok(())
            },
            Resolution::Finalize(winner) => self.finalize(winner),
        }
    }

    /// 定案：归档胜出图片、上报清理后的结果、推进到下一障碍或收尾
    fn finalize(&mut self, winner: Prediction) -> Result<(), HostError> {
        let task_no = self.config.task_no();
        std::fs::create_dir_all(&self.config.results_dir)?;

        let ctx = self.ctx.as_mut().ok_or(HostError::NoActiveObstacle)?;

        let dest = self
            .config
            .results_dir
            .join(format!("task{}_result_obs_id_{}.jpg", task_no, ctx.obs_id));
        std::fs::copy(&winner.image_path, &dest)?;

        info!(
            "obstacle {} resolved: img_id {:?}",
            ctx.obs_id, winner.img_id
        );

        let img_id = winner.img_id.clone();
        self.outbound.push(Message::ImageResults {
            data: winner.into_results(),
        })?;
        self.planner.record_resolved_symbol(img_id.as_deref());

        // 双障碍模式下上游不提供障碍 id，本地推进编号
        if self.config.task_two {
            ctx.obs_id = advance_obstacle_id(&ctx.obs_id);
        }
        ctx.image_history.clear();
        ctx.image_counter = 0;

        if !self.planner.task_ended() {
            let command = self.planner.next_command().ok_or(HostError::EmptyPlan)?;
            self.outbound.push(command.clone())?;
            ctx.retry_count = 0;
            ctx.pending_command = command;

            // 规划器跟踪障碍 id 时以它为准，否则沿用本地编号
            let planner_id = self.planner.current_obstacle_id();
            if !planner_id.is_empty() {
                let ctx = self.ctx.as_mut().ok_or(HostError::NoActiveObstacle)?;
                ctx.obs_id = planner_id;
            }
            if let Some(ctx) = self.ctx.as_ref() {
                info!("heading to obstacle {}", ctx.obs_id);
            }
        } else {
            self.ctx = None;
            self.phase = Phase::Done;

            if self.config.task_two {
                info!("two-obstacle task complete");
            } else {
                info!("single-obstacle task complete, stitching results");
                self.stitcher
                    .stitch(&self.config.results_dir, &self.config.stitched_output)?;
            }
        }

        Ok(())
    }

    /// 规划器的障碍 id，为空时回落为 "1"
    fn obstacle_id_or_default(&self) -> String {
        let id = self.planner.current_obstacle_id();
        if id.is_empty() { "1".to_string() } else { id }
    }
}

/// 本地推进障碍编号（双障碍模式）
///
/// 非数字 id 保持不变并告警：编号来源一旦混乱，宁可停在原值
/// 也不要编造。
fn advance_obstacle_id(obs_id: &str) -> String {
    match obs_id.parse::<u32>() {
        Ok(n) => (n + 1).to_string(),
        Err(_) => {
            warn!("obstacle id {:?} is not numeric, leaving unchanged", obs_id);
            obs_id.to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_obstacle_id() {
        assert_eq!(advance_obstacle_id("1"), "2");
        assert_eq!(advance_obstacle_id("09"), "10");
        assert_eq!(advance_obstacle_id("A3"), "A3");
    }
}
