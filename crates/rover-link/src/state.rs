//! 链路状态定义
//!
//! 状态由链路的监督器独占推进，TX/RX 线程和外部观察者只读。

use std::sync::atomic::{AtomicU8, Ordering};

/// 链路连接状态
///
/// 状态迁移：
/// - `Disconnected` → `Connecting`：发起连接尝试
/// - `Connecting` → `Connected`：连接成功
/// - `Connected` → `Disconnected`：任何 IO 失败或对端关闭，
///   随后自动重新进入 `Connecting`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LinkState {
    /// 未连接（初始状态 / 失败后）
    #[default]
    Disconnected = 0,

    /// 正在建立连接
    Connecting = 1,

    /// 连接已建立，可收发
    Connected = 2,
}

impl LinkState {
    /// 从 u8 转换，无效值回落为 Disconnected
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Disconnected,
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

/// 链路状态（原子版本，用于线程间共享）
#[derive(Debug)]
pub struct AtomicLinkState {
    inner: AtomicU8,
}

impl AtomicLinkState {
    pub fn new(state: LinkState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> LinkState {
        LinkState::from_u8(self.inner.load(ordering))
    }

    pub fn set(&self, state: LinkState, ordering: Ordering) {
        self.inner.store(state.as_u8(), ordering);
    }
}

impl Default for AtomicLinkState {
    fn default() -> Self {
        Self::new(LinkState::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_conversions() {
        assert_eq!(LinkState::from_u8(0), LinkState::Disconnected);
        assert_eq!(LinkState::from_u8(1), LinkState::Connecting);
        assert_eq!(LinkState::from_u8(2), LinkState::Connected);
        assert_eq!(LinkState::from_u8(255), LinkState::Disconnected); // 无效值
    }

    #[test]
    fn test_atomic_state() {
        let state = AtomicLinkState::default();
        assert_eq!(state.get(Ordering::Relaxed), LinkState::Disconnected);

        state.set(LinkState::Connecting, Ordering::Relaxed);
        assert_eq!(state.get(Ordering::Relaxed), LinkState::Connecting);

        state.set(LinkState::Connected, Ordering::Relaxed);
        assert!(state.get(Ordering::Relaxed).is_connected());
    }
}
