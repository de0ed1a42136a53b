//! 帧化通道
//!
//! 在任意字节流之上提供完整帧的收发。不向调用方暴露半帧状态：
//! `receive` 要么返回一个完整载荷，要么返回错误。

use std::io::{Read, Write};

use rover_protocol::{ProtocolError, frame};

/// 帧化字节流
///
/// 本身不持有缓冲状态，可以在每个连接周期上廉价地重建。
pub struct FramedStream<S> {
    inner: S,
}

impl<S: Read + Write> FramedStream<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// 发送一帧：长度前缀 + 载荷
    ///
    /// 前缀和载荷编码为单个缓冲区后一次写出，对调用方而言是
    /// 原子操作（同一通道上不会与另一次 send 交错，发送方
    /// 始终是单线程的 TX 循环）。
    pub fn send(&mut self, payload: &[u8]) -> Result<(), ProtocolError> {
        frame::write_to(&mut self.inner, payload)
    }

    /// 阻塞读取一个完整帧，返回载荷
    pub fn receive(&mut self) -> Result<Vec<u8>, ProtocolError> {
        frame::read_from(&mut self.inner)
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}
