//! 主机运行时装配
//!
//! 一条面向枢纽的链路 + 一个编排线程。链路接收回调只负责把
//! 消息放进分发队列，编排线程串行消费；没有任何编排状态被
//! 多线程触碰。

use std::thread::JoinHandle;

use crossbeam_channel::unbounded;
use rover_link::{Endpoint, Link, LinkConfig, LinkStopper};
use tracing::{error, info};

use crate::HostError;
use crate::config::HostConfig;
use crate::orchestrator::Orchestrator;
use crate::planner::Planner;
use crate::recognizer::{Recognizer, Stitcher};

/// 运行中的主机
pub struct Host {
    link: Link,
    orchestrator_thread: JoinHandle<()>,
}

impl Host {
    /// 启动主机：建立枢纽链路并派生编排线程
    pub fn spawn<P, R, S>(
        hub: Endpoint,
        link_cfg: LinkConfig,
        config: HostConfig,
        planner: P,
        recognizer: R,
        stitcher: S,
    ) -> Result<Host, HostError>
    where
        P: Planner + 'static,
        R: Recognizer + 'static,
        S: Stitcher + 'static,
    {
        let (dispatch_tx, dispatch_rx) = unbounded();

        let link = Link::spawn("hub", hub.into_connector()?, link_cfg, move |msg| {
            // 队列关闭意味着编排已结束；此后入站消息直接丢弃
            let _ = dispatch_tx.send(msg);
        })?;

        let mut orchestrator =
            Orchestrator::new(planner, recognizer, stitcher, link.sender(), config);

        let orchestrator_thread = std::thread::Builder::new()
            .name("host-orchestrator".to_string())
            .spawn(move || {
                for msg in dispatch_rx {
                    if let Err(e) = orchestrator.handle_message(msg) {
                        error!("[orchestrator] {}", e);
                    }
                    if orchestrator.is_done() {
                        info!("[orchestrator] task finished, exiting");
                        break;
                    }
                }
            })?;

        Ok(Host {
            link,
            orchestrator_thread,
        })
    }

    /// 取得链路关停触发器（可交给 Ctrl-C 处理器）
    pub fn stopper(&self) -> LinkStopper {
        self.link.stopper()
    }

    /// 等待任务结束（或链路关停），然后收拢全部线程
    pub fn join(self) {
        let _ = self.orchestrator_thread.join();
        self.link.shutdown();
    }
}
