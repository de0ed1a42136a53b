//! 链路监督器
//!
//! 一条 [`Link`] 拥有一条 TCP 连接和一对后台线程：
//!
//! - **TX 线程**：从出站队列逐条取消息，序列化后经帧化通道发送。
//!   发送失败时把链路置为断开、等待重连完成，然后重发**同一条**
//!   消息，即每条消息至少一次交付，重连前后不重排。
//! - **RX 线程**：阻塞读取完整帧，解码为 [`Message`] 后交给所有者
//!   的回调；帧层错误与对端关闭一律触发重连。
//!
//! 两个线程并发且互不等待；重连由先观察到失败的一方触发，
//! 连接尝试经互斥门串行化（单飞），失败后按固定间隔无限重试。

use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use rover_protocol::Message;
use tracing::{error, info, trace, warn};

use crate::connector::Connector;
use crate::framed::FramedStream;
use crate::sink::MessageSink;
use crate::state::{AtomicLinkState, LinkState};
use crate::LinkError;

/// 出站队列空闲时轮询关停标志的间隔
const OUTBOUND_POLL: Duration = Duration::from_millis(200);

/// 链路配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// 连接失败后的重试间隔
    pub retry_backoff: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// TX/RX 线程共享的链路内部状态
struct Shared {
    name: String,
    connector: Mutex<Box<dyn Connector>>,
    /// 当前连接。两个线程各持有 try_clone 出的句柄，这里保存
    /// 原始句柄用于统一关闭。
    stream: Mutex<Option<TcpStream>>,
    /// 连接尝试的单飞门：同一时刻只允许一个线程执行 connect
    connect_gate: Mutex<()>,
    state: AtomicLinkState,
    shutdown: AtomicBool,
    config: LinkConfig,
}

impl Shared {
    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// 断开当前连接并把状态置为 Disconnected
    ///
    /// 对套接字双向 shutdown，使阻塞在读上的另一个线程立即返回。
    fn disconnect(&self, reason: &str) {
        if let Some(stream) = self.stream.lock().take() {
            let _ = stream.shutdown(Shutdown::Both);
            warn!("[{}] link down ({})", self.name, reason);
        }
        self.state.set(LinkState::Disconnected, Ordering::Release);
    }

    /// 取得一条已连接的流（必要时建立连接）
    ///
    /// 除关停外不会失败返回：连接尝试失败会记录日志并在固定
    /// 退避后无限重试。
    fn ensure_connected(&self) -> Result<TcpStream, LinkError> {
        loop {
            if self.is_shutdown() {
                return Err(LinkError::ShuttingDown);
            }

            if let Some(stream) = self.stream.lock().as_ref() {
                return Ok(stream.try_clone()?);
            }

            {
                let _gate = self.connect_gate.lock();

                // 持门期间另一个线程可能已完成连接
                if let Some(stream) = self.stream.lock().as_ref() {
                    return Ok(stream.try_clone()?);
                }
                if self.is_shutdown() {
                    return Err(LinkError::ShuttingDown);
                }

                self.state.set(LinkState::Connecting, Ordering::Release);
                let mut connector = self.connector.lock();
                match connector.connect(&self.shutdown) {
                    Ok(stream) => {
                        let handle = stream.try_clone()?;
                        *self.stream.lock() = Some(stream);
                        self.state.set(LinkState::Connected, Ordering::Release);
                        info!("[{}] link up ({})", self.name, connector.peer());
                        return Ok(handle);
                    },
                    Err(LinkError::ShuttingDown) => return Err(LinkError::ShuttingDown),
                    Err(e) => {
                        warn!(
                            "[{}] connect to {} failed: {}, retrying in {:?}",
                            self.name,
                            connector.peer(),
                            e,
                            self.config.retry_backoff
                        );
                        self.state.set(LinkState::Disconnected, Ordering::Release);
                    },
                }
            }

            // 门已释放，退避后重试
            std::thread::sleep(self.config.retry_backoff);
        }
    }
}

/// 一条受监督的链路
///
/// # Example
///
/// ```no_run
/// use rover_link::{Endpoint, Link, LinkConfig};
/// use rover_protocol::Message;
///
/// let connector = Endpoint::dial("192.168.29.29:8888").into_connector()?;
/// let link = Link::spawn("hub", connector, LinkConfig::default(), |msg| {
///     println!("inbound: {}", msg.kind());
/// })?;
///
/// link.enqueue(Message::fastest_path_ack())?;
/// # Ok::<(), rover_link::LinkError>(())
/// ```
pub struct Link {
    outbound: Sender<Message>,
    shared: Arc<Shared>,
    threads: Vec<JoinHandle<()>>,
}

impl Link {
    /// 启动链路：创建出站队列并派生 TX/RX 线程
    ///
    /// `on_message` 在 RX 线程上同步调用，一次一条：回调返回前
    /// 不会派发下一条消息。
    pub fn spawn<F>(
        name: impl Into<String>,
        connector: Box<dyn Connector>,
        config: LinkConfig,
        on_message: F,
    ) -> Result<Link, LinkError>
    where
        F: FnMut(Message) + Send + 'static,
    {
        let name = name.into();
        let (outbound_tx, outbound_rx) = crossbeam_channel::unbounded();

        let shared = Arc::new(Shared {
            name: name.clone(),
            connector: Mutex::new(connector),
            stream: Mutex::new(None),
            connect_gate: Mutex::new(()),
            state: AtomicLinkState::default(),
            shutdown: AtomicBool::new(false),
            config,
        });

        let tx_shared = shared.clone();
        let tx_thread = std::thread::Builder::new()
            .name(format!("{name}-tx"))
            .spawn(move || tx_loop(tx_shared, outbound_rx))?;

        let rx_shared = shared.clone();
        let rx_thread = std::thread::Builder::new()
            .name(format!("{name}-rx"))
            .spawn(move || rx_loop(rx_shared, on_message))?;

        Ok(Link {
            outbound: outbound_tx,
            shared,
            threads: vec![tx_thread, rx_thread],
        })
    }

    /// 非阻塞入队一条出站消息
    ///
    /// 队列无界；断开期间入队的消息在重连后按原有相对顺序冲刷。
    pub fn enqueue(&self, msg: Message) -> Result<(), LinkError> {
        self.outbound
            .send(msg)
            .map_err(|_| LinkError::ChannelClosed)
    }

    /// 当前链路状态（观测用）
    pub fn state(&self) -> LinkState {
        self.shared.state.get(Ordering::Acquire)
    }

    /// 取得一个可跨线程传递的关停触发器
    pub fn stopper(&self) -> LinkStopper {
        LinkStopper {
            shared: self.shared.clone(),
        }
    }

    /// 取得一个可克隆的出站入队端（供路由器等使用）
    pub fn sender(&self) -> LinkSender {
        LinkSender {
            outbound: self.outbound.clone(),
        }
    }

    /// 等待两个后台线程退出
    ///
    /// 线程只在关停触发后退出，因此通常先经由 [`LinkStopper::stop`]。
    pub fn join(self) {
        for handle in self.threads {
            let _ = handle.join();
        }
    }

    /// 触发关停并等待线程退出
    pub fn shutdown(self) {
        self.stopper().stop();
        self.join();
    }
}

impl MessageSink for Link {
    fn push(&self, msg: Message) -> Result<(), LinkError> {
        self.enqueue(msg)
    }
}

/// 链路关停触发器
///
/// 置位关停标志并关闭当前套接字，使阻塞在连接/收/发上的线程
/// 尽快观察到信号。可克隆、可跨线程（如 Ctrl-C 处理器）。
#[derive(Clone)]
pub struct LinkStopper {
    shared: Arc<Shared>,
}

impl LinkStopper {
    pub fn stop(&self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.disconnect("shutdown requested");
    }
}

/// 链路出站队列的入队端
///
/// 只持有队列发送端，不持有连接；链路存活期间可自由克隆分发。
#[derive(Clone)]
pub struct LinkSender {
    outbound: Sender<Message>,
}

impl MessageSink for LinkSender {
    fn push(&self, msg: Message) -> Result<(), LinkError> {
        self.outbound
            .send(msg)
            .map_err(|_| LinkError::ChannelClosed)
    }
}

/// TX 线程主循环
fn tx_loop(shared: Arc<Shared>, outbound: Receiver<Message>) {
    loop {
        if shared.is_shutdown() {
            break;
        }

        let msg = match outbound.recv_timeout(OUTBOUND_POLL) {
            Ok(msg) => msg,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                trace!("[{}] outbound queue closed", shared.name);
                break;
            },
        };

        let payload = match msg.to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                // 本进程构造的消息不应序列化失败；丢弃并继续
                error!("[{}] failed to encode {}: {}", shared.name, msg.kind(), e);
                continue;
            },
        };

        // 同一条消息重试到发送成功为止
        loop {
            let stream = match shared.ensure_connected() {
                Ok(stream) => stream,
                Err(LinkError::ShuttingDown) => return,
                Err(e) => {
                    warn!("[{}] TX thread: {}", shared.name, e);
                    shared.disconnect("stale stream handle");
                    std::thread::sleep(shared.config.retry_backoff);
                    continue;
                },
            };

            let mut framed = FramedStream::new(stream);
            match framed.send(&payload) {
                Ok(()) => {
                    trace!(
                        "[{}] sent {} ({} bytes)",
                        shared.name,
                        msg.kind(),
                        payload.len()
                    );
                    break;
                },
                Err(e) => {
                    warn!("[{}] send {} failed: {}", shared.name, msg.kind(), e);
                    shared.disconnect("send failure");
                },
            }
        }
    }

    trace!("[{}] TX thread: loop exited", shared.name);
}

/// RX 线程主循环
fn rx_loop<F>(shared: Arc<Shared>, mut on_message: F)
where
    F: FnMut(Message),
{
    loop {
        if shared.is_shutdown() {
            break;
        }

        let stream = match shared.ensure_connected() {
            Ok(stream) => stream,
            Err(LinkError::ShuttingDown) => break,
            Err(e) => {
                warn!("[{}] RX thread: {}", shared.name, e);
                shared.disconnect("stale stream handle");
                std::thread::sleep(shared.config.retry_backoff);
                continue;
            },
        };

        let mut framed = FramedStream::new(stream);
        loop {
            match framed.receive() {
                Ok(payload) => match Message::from_bytes(&payload) {
                    Ok(msg) => {
                        trace!("[{}] received {}", shared.name, msg.kind());
                        on_message(msg);
                    },
                    Err(e) => {
                        // 长度正确但内容不可解码：记录并丢弃，连接保持
                        warn!(
                            "[{}] dropping undecodable frame ({} bytes): {}",
                            shared.name,
                            payload.len(),
                            e
                        );
                    },
                },
                Err(e) => {
                    if !shared.is_shutdown() {
                        warn!("[{}] receive failed: {}", shared.name, e);
                    }
                    shared.disconnect("receive failure");
                    break;
                },
            }

            if shared.is_shutdown() {
                break;
            }
        }
    }

    trace!("[{}] RX thread: loop exited", shared.name);
}
