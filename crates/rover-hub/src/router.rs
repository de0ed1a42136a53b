//! 主机方向入站消息的路由表
//!
//! 路由是消息类型的纯函数，唯一的例外是双障碍任务模式下的
//! 绕行序数计数器（从 1 开始，只在第一次出现时前进，进程重启
//! 前不复位）。

use rover_link::MessageSink;
use rover_protocol::{Message, commands};
use tracing::{debug, warn};

use crate::HubError;

/// 路由器
///
/// 路由表（固定映射）：
///
/// | 入站类型                              | 去向                      |
/// |---------------------------------------|---------------------------|
/// | `NAVIGATION`                          | 运动队列，原样            |
/// | `IMAGE_RESULTS` / `COORDINATES` / `PATH` | 显示队列，原样         |
/// | `IMAGE_RESULTS`（双障碍模式额外）     | 运动队列，合成绕行序列    |
/// | `FASTEST_PATH`                        | 运动队列，固定单步前进    |
/// | 其余                                  | 记录并丢弃（非致命）      |
pub struct Router<M, D> {
    motion: M,
    display: D,
    task_two: bool,
    /// 双障碍模式的绕行序数，1 = 尚未处理第一个结果
    next_ordinal: u8,
}

impl<M: MessageSink, D: MessageSink> Router<M, D> {
    pub fn new(motion: M, display: D, task_two: bool) -> Self {
        Self {
            motion,
            display,
            task_two,
            next_ordinal: 1,
        }
    }

    /// 分发一条入站消息
    pub fn dispatch(&mut self, msg: Message) -> Result<(), HubError> {
        match msg {
            Message::Navigation { .. } => {
                debug!("routing {} to motion", msg.kind());
                self.motion.push(msg)?;
            },

            Message::ImageResults { ref data } => {
                let img_id = data.img_id.clone();
                debug!("routing {} to display", msg.kind());
                self.display.push(msg)?;

                if self.task_two {
                    self.push_auxiliary_maneuver(img_id.as_deref())?;
                }
            },

            Message::Coordinates { .. } | Message::Path { .. } => {
                debug!("routing {} to display", msg.kind());
                self.display.push(msg)?;
            },

            Message::FastestPath { .. } => {
                // 竞速触发：固定单步前进，与载荷内容无关
                debug!("FASTEST_PATH: issuing fixed forward step");
                self.motion
                    .push(Message::navigation(commands::fastest_forward(), vec![]))?;
            },

            other => {
                warn!("dropping message with unroutable type {}", other.kind());
            },
        }

        Ok(())
    }

    /// 合成双障碍任务的辅助绕行指令
    ///
    /// 第一次出现：方向宏 + 固定收尾，并推进序数；
    /// 之后每次：仅方向宏。
    fn push_auxiliary_maneuver(&mut self, img_id: Option<&str>) -> Result<(), HubError> {
        let commands = if self.next_ordinal == 1 {
            self.next_ordinal = 2;
            commands::first_maneuver(img_id)
        } else {
            commands::second_maneuver(img_id)
        };

        debug!("auxiliary maneuver for img_id {:?}: {:?}", img_id, commands);
        self.motion.push(Message::navigation(commands, vec![]))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{Receiver, Sender, unbounded};
    use rover_protocol::ImageResultsData;
    use serde_json::json;

    fn router(task_two: bool) -> (
        Router<Sender<Message>, Sender<Message>>,
        Receiver<Message>,
        Receiver<Message>,
    ) {
        let (motion_tx, motion_rx) = unbounded();
        let (display_tx, display_rx) = unbounded();
        (Router::new(motion_tx, display_tx, task_two), motion_rx, display_rx)
    }

    fn image_results(obs_id: &str, img_id: Option<&str>) -> Message {
        Message::ImageResults {
            data: ImageResultsData {
                obs_id: obs_id.to_string(),
                img_id: img_id.map(str::to_string),
            },
        }
    }

    #[test]
    fn test_navigation_goes_to_motion_verbatim() {
        let (mut router, motion, display) = router(false);
        let msg = Message::navigation(vec!["LF180".into()], vec![[1, 2], [1, 3]]);

        router.dispatch(msg.clone()).unwrap();
        assert_eq!(motion.try_recv().unwrap(), msg);
        assert!(display.try_recv().is_err());
    }

    #[test]
    fn test_coordinates_and_path_go_to_display() {
        let (mut router, motion, display) = router(true);

        router
            .dispatch(Message::Coordinates {
                data: json!({"x": 1, "y": 2, "dir": "N"}),
            })
            .unwrap();
        router
            .dispatch(Message::Path {
                data: json!({"path": [[0, 0], [0, 1]]}),
            })
            .unwrap();

        assert!(matches!(display.try_recv().unwrap(), Message::Coordinates { .. }));
        assert!(matches!(display.try_recv().unwrap(), Message::Path { .. }));
        // 即使在双障碍模式下，坐标/路径消息也不触发绕行
        assert!(motion.try_recv().is_err());
    }

    #[test]
    fn test_fastest_path_yields_single_fixed_forward() {
        let (mut router, motion, display) = router(false);

        router
            .dispatch(Message::FastestPath {
                data: json!({"task": "FASTEST_PATH", "robot": {"x": 1}}),
            })
            .unwrap();

        match motion.try_recv().unwrap() {
            Message::Navigation { data } => {
                assert_eq!(data.commands, vec!["YF150"]);
                assert!(data.path.is_empty());
            },
            other => panic!("unexpected {}", other.kind()),
        }
        assert!(motion.try_recv().is_err());
        assert!(display.try_recv().is_err());
    }

    #[test]
    fn test_image_results_single_obstacle_mode_no_maneuver() {
        let (mut router, motion, display) = router(false);

        router.dispatch(image_results("1", Some("39"))).unwrap();
        assert!(matches!(display.try_recv().unwrap(), Message::ImageResults { .. }));
        assert!(motion.try_recv().is_err());
    }

    #[test]
    fn test_task_two_maneuver_ordinals() {
        let (mut router, motion, display) = router(true);

        // 第一个结果："39" → 左侧绕行 + 固定收尾；序数与载荷 obs_id 无关
        router.dispatch(image_results("7", Some("39"))).unwrap();
        assert!(matches!(display.try_recv().unwrap(), Message::ImageResults { .. }));
        match motion.try_recv().unwrap() {
            Message::Navigation { data } => {
                assert_eq!(data.commands, vec!["FIRSTLEFT", "SB025", "YF150"]);
            },
            other => panic!("unexpected {}", other.kind()),
        }

        // 第二个结果："38" → 右侧绕行，无收尾
        router.dispatch(image_results("3", Some("38"))).unwrap();
        assert!(matches!(display.try_recv().unwrap(), Message::ImageResults { .. }));
        match motion.try_recv().unwrap() {
            Message::Navigation { data } => {
                assert_eq!(data.commands, vec!["SECONDRIGHT"]);
            },
            other => panic!("unexpected {}", other.kind()),
        }
    }

    #[test]
    fn test_unknown_and_unroutable_types_are_dropped() {
        let (mut router, motion, display) = router(true);

        router.dispatch(Message::Unknown).unwrap();
        router
            .dispatch(Message::StartTask {
                data: json!({"task": "EXPLORATION"}),
            })
            .unwrap();

        assert!(motion.try_recv().is_err());
        assert!(display.try_recv().is_err());
    }
}
