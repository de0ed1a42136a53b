//! 连接建立抽象
//!
//! 一次 `connect` 调用只做一次尝试，失败立即返回；无限重试和
//! 退避间隔是监督器的职责，连接器自身不重试。
//!
//! 两种实现对应链路的两种角色：
//! - [`DialConnector`]：主动拨号（主机侧连向枢纽）
//! - [`AcceptConnector`]：绑定监听后接受下一个对端
//!   （枢纽侧等待主机/显示端接入）

use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::info;

use crate::LinkError;

/// 拨号建立连接的超时
const DIAL_TIMEOUT: Duration = Duration::from_secs(3);

/// 等待接入时的轮询间隔（用于响应关停信号）
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// 连接器：为链路建立一条新的 TCP 连接
pub trait Connector: Send {
    /// 做一次连接尝试
    ///
    /// `stop` 置位时应尽快返回 [`LinkError::ShuttingDown`]。
    fn connect(&mut self, stop: &AtomicBool) -> Result<TcpStream, LinkError>;

    /// 对端描述（用于日志）
    fn peer(&self) -> String;
}

/// 主动拨号连接器
pub struct DialConnector {
    addr: String,
}

impl DialConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl Connector for DialConnector {
    fn connect(&mut self, stop: &AtomicBool) -> Result<TcpStream, LinkError> {
        if stop.load(Ordering::Acquire) {
            return Err(LinkError::ShuttingDown);
        }

        let addr = self
            .addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| LinkError::AddrResolve(self.addr.clone()))?;

        let stream = TcpStream::connect_timeout(&addr, DIAL_TIMEOUT)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn peer(&self) -> String {
        self.addr.clone()
    }
}

/// 被动接受连接器
///
/// 绑定发生在构造时，`connect` 只负责接受下一个对端。监听套接字
/// 设为非阻塞，以固定间隔轮询，保证关停信号能够及时生效。
pub struct AcceptConnector {
    listener: TcpListener,
    local: SocketAddr,
}

impl AcceptConnector {
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self, LinkError> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let local = listener.local_addr()?;
        Ok(Self { listener, local })
    }

    /// 实际绑定的本地地址（绑定端口 0 时用于取回分配的端口）
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }
}

impl Connector for AcceptConnector {
    fn connect(&mut self, stop: &AtomicBool) -> Result<TcpStream, LinkError> {
        loop {
            if stop.load(Ordering::Acquire) {
                return Err(LinkError::ShuttingDown);
            }

            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!("[{}] accepted peer {}", self.local, peer);
                    // 接受到的连接恢复为阻塞模式，交给帧化通道使用
                    stream.set_nonblocking(false)?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                },
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL);
                },
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn peer(&self) -> String {
        format!("accept://{}", self.local)
    }
}

/// 链路端点配置：地址 + 角色
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Endpoint {
    /// `host:port` 形式的地址
    pub addr: String,
    pub role: Role,
}

/// 链路角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Role {
    /// 主动拨号
    Dial,
    /// 绑定监听并接受
    Accept,
}

impl Endpoint {
    pub fn dial(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            role: Role::Dial,
        }
    }

    pub fn accept(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            role: Role::Accept,
        }
    }

    /// 按角色构造连接器
    ///
    /// Accept 角色在此处完成绑定，绑定失败立即报错（地址被占用
    /// 属于配置问题，不进入重试循环）。
    pub fn into_connector(self) -> Result<Box<dyn Connector>, LinkError> {
        match self.role {
            Role::Dial => Ok(Box::new(DialConnector::new(self.addr))),
            Role::Accept => Ok(Box::new(AcceptConnector::bind(&*self.addr)?)),
        }
    }
}
