//! 枢纽装配
//!
//! 三条链路（主机 / 运动 / 显示）各自独立收发，互不阻塞：
//!
//! ```text
//! 主机链路 RX ──► 分发队列 ──► 路由线程 ──► {运动队列, 显示队列}
//! 显示链路 RX ──────────────────────────► 主机队列（原样转发）
//! 运动链路 RX ──► 仅记录（确认类消息）
//! ```
//!
//! 路由线程一次处理一条消息，保证分发不重入。

use std::thread::JoinHandle;

use crossbeam_channel::unbounded;
use rover_link::{Connector, Endpoint, Link, LinkConfig, LinkStopper, MessageSink};
use tracing::{debug, error, info};

use crate::router::Router;
use crate::HubError;

/// 枢纽配置
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// 面向主机的链路端点
    pub host: Endpoint,
    /// 面向运动控制器的链路端点
    pub motion: Endpoint,
    /// 面向显示端的链路端点
    pub display: Endpoint,
    /// 双障碍任务模式（启用辅助绕行合成）
    pub task_two: bool,
    /// 三条链路共用的重连配置
    pub link: LinkConfig,
}

/// 运行中的枢纽
pub struct Hub {
    links: Vec<Link>,
    router_thread: JoinHandle<()>,
    stoppers: Vec<LinkStopper>,
}

impl Hub {
    /// 按配置启动枢纽
    pub fn spawn(config: HubConfig) -> Result<Hub, HubError> {
        let task_two = config.task_two;
        let link_cfg = config.link.clone();

        Self::spawn_with_connectors(
            config.host.into_connector()?,
            config.motion.into_connector()?,
            config.display.into_connector()?,
            task_two,
            link_cfg,
        )
    }

    /// 以现成的连接器启动枢纽（测试从这里注入回环端口）
    pub fn spawn_with_connectors(
        host: Box<dyn Connector>,
        motion: Box<dyn Connector>,
        display: Box<dyn Connector>,
        task_two: bool,
        link_cfg: LinkConfig,
    ) -> Result<Hub, HubError> {
        // 运动链路：上行只有确认/遥测类消息，记录即可
        let motion_link = Link::spawn("motion", motion, link_cfg.clone(), |msg| {
            debug!("[motion] inbound {} (logged only)", msg.kind());
        })?;

        // 主机链路 RX → 分发队列
        let (dispatch_tx, dispatch_rx) = unbounded();
        let host_link = Link::spawn("host", host, link_cfg.clone(), move |msg| {
            if dispatch_tx.send(msg).is_err() {
                error!("[host] dispatch queue closed, dropping inbound message");
            }
        })?;

        // 显示链路 RX → 主机队列，原样转发（任务触发等）
        let host_sender = host_link.sender();
        let display_link = Link::spawn("display", display, link_cfg, move |msg| {
            debug!("[display] forwarding {} to host", msg.kind());
            if let Err(e) = host_sender.push(msg) {
                error!("[display] failed to forward to host: {}", e);
            }
        })?;

        // 路由线程：串行消费分发队列
        let mut router = Router::new(motion_link.sender(), display_link.sender(), task_two);
        let router_thread = std::thread::Builder::new()
            .name("hub-router".to_string())
            .spawn(move || {
                for msg in dispatch_rx {
                    if let Err(e) = router.dispatch(msg) {
                        error!("[router] dispatch failed: {}", e);
                    }
                }
                debug!("[router] dispatch queue drained, exiting");
            })
            .map_err(rover_link::LinkError::Io)?;

        info!("hub up (task_two = {})", task_two);

        let stoppers = vec![
            host_link.stopper(),
            motion_link.stopper(),
            display_link.stopper(),
        ];

        Ok(Hub {
            links: vec![host_link, motion_link, display_link],
            router_thread,
            stoppers,
        })
    }

    /// 取得关停触发器（可交给 Ctrl-C 处理器）
    pub fn stopper(&self) -> HubStopper {
        HubStopper {
            stoppers: self.stoppers.clone(),
        }
    }

    /// 等待所有后台线程退出
    pub fn join(self) {
        for link in self.links {
            link.join();
        }
        let _ = self.router_thread.join();
    }

    /// 触发关停并等待退出
    pub fn shutdown(self) {
        self.stopper().stop();
        self.join();
    }
}

/// 枢纽关停触发器
#[derive(Clone)]
pub struct HubStopper {
    stoppers: Vec<LinkStopper>,
}

impl HubStopper {
    pub fn stop(&self) {
        for stopper in &self.stoppers {
            stopper.stop();
        }
    }
}
