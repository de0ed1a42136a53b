//! 长度前缀帧的编码/解码
//!
//! 每一帧的线格式为：`[4 字节大端长度前缀][载荷字节]`。
//!
//! # 不变式
//!
//! - 前缀值等于载荷的精确字节长度；
//! - 接收方必须读满前缀声明的字节数之后才能解析载荷；
//! - 任何中途关闭都视为协议错误，不向调用方暴露半帧状态。
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use rover_protocol::frame;
//!
//! let encoded = frame::encode(b"hello");
//! let mut cursor = Cursor::new(encoded);
//! let payload = frame::read_from(&mut cursor).unwrap();
//! assert_eq!(payload, b"hello");
//! ```

use std::io::{ErrorKind, Read, Write};

use crate::ProtocolError;

/// 单帧载荷长度上限
///
/// 取 16 MiB，足够容纳 base64 编码的相机帧；超过该值的长度前缀
/// 视为流已损坏。
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// 长度前缀的字节数
pub const LEN_PREFIX_SIZE: usize = 4;

/// 编码一帧：长度前缀 + 载荷，输出为单个连续缓冲区
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(LEN_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// 将一帧写入字节流
///
/// 先编码为单个缓冲区再一次性写出，避免前缀和载荷之间
/// 出现部分写入的窗口。
pub fn write_to<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_LEN,
        });
    }

    writer.write_all(&encode(payload))?;
    writer.flush()?;
    Ok(())
}

/// 从字节流读取一个完整帧，返回载荷
///
/// 阻塞直到读满前缀声明的字节数。
///
/// # 错误
///
/// - [`ProtocolError::PeerClosed`]: 对端在帧边界处正常关闭；
/// - [`ProtocolError::Truncated`]: 前缀或载荷读取到一半时流结束；
/// - [`ProtocolError::FrameTooLarge`]: 声明长度超过 [`MAX_FRAME_LEN`]。
pub fn read_from<R: Read>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let prefix = read_prefix(reader)?;
    let len = u32::from_be_bytes(prefix) as usize;

    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }

    let mut payload = vec![0u8; len];
    read_full(reader, &mut payload, "payload")?;
    Ok(payload)
}

/// 读取 4 字节长度前缀
///
/// 在第一个字节之前遇到 EOF 表示对端正常关闭（帧边界），
/// 之后遇到 EOF 则是半帧截断。
fn read_prefix<R: Read>(reader: &mut R) -> Result<[u8; LEN_PREFIX_SIZE], ProtocolError> {
    let mut buf = [0u8; LEN_PREFIX_SIZE];
    let mut filled = 0;

    while filled < LEN_PREFIX_SIZE {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Err(ProtocolError::PeerClosed),
            Ok(0) => {
                return Err(ProtocolError::Truncated {
                    context: "length prefix",
                });
            },
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(buf)
}

/// 读满整个缓冲区，EOF 映射为截断错误
fn read_full<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    context: &'static str,
) -> Result<(), ProtocolError> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(ProtocolError::Truncated { context }),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_encode_prefix_matches_payload_len() {
        let encoded = encode(b"abc");
        assert_eq!(&encoded[..4], &3u32.to_be_bytes());
        assert_eq!(&encoded[4..], b"abc");
    }

    #[test]
    fn test_roundtrip() {
        let payload = br#"{"type":"NAVIGATION","data":{"commands":["YF150"],"path":[]}}"#;
        let mut cursor = Cursor::new(encode(payload));
        assert_eq!(read_from(&mut cursor).unwrap(), payload.to_vec());
    }

    #[test]
    fn test_roundtrip_empty_payload() {
        let mut cursor = Cursor::new(encode(b""));
        assert_eq!(read_from(&mut cursor).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_multiple_frames_in_one_stream() {
        let mut stream = encode(b"first");
        stream.extend_from_slice(&encode(b""));
        stream.extend_from_slice(&encode(b"third"));

        let mut cursor = Cursor::new(stream);
        assert_eq!(read_from(&mut cursor).unwrap(), b"first".to_vec());
        assert_eq!(read_from(&mut cursor).unwrap(), Vec::<u8>::new());
        assert_eq!(read_from(&mut cursor).unwrap(), b"third".to_vec());
        assert!(matches!(
            read_from(&mut cursor),
            Err(ProtocolError::PeerClosed)
        ));
    }

    #[test]
    fn test_eof_at_frame_boundary_is_peer_closed() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert!(matches!(
            read_from(&mut cursor),
            Err(ProtocolError::PeerClosed)
        ));
    }

    #[test]
    fn test_truncated_prefix() {
        // 只有 2 个前缀字节
        let mut cursor = Cursor::new(vec![0u8, 0u8]);
        assert!(matches!(
            read_from(&mut cursor),
            Err(ProtocolError::Truncated {
                context: "length prefix"
            })
        ));
    }

    #[test]
    fn test_truncated_payload() {
        // 前缀声明 10 字节，实际只有 4 字节
        let mut stream = 10u32.to_be_bytes().to_vec();
        stream.extend_from_slice(b"abcd");

        let mut cursor = Cursor::new(stream);
        assert!(matches!(
            read_from(&mut cursor),
            Err(ProtocolError::Truncated { context: "payload" })
        ));
    }

    #[test]
    fn test_oversized_declared_length() {
        let stream = ((MAX_FRAME_LEN + 1) as u32).to_be_bytes().to_vec();
        let mut cursor = Cursor::new(stream);
        assert!(matches!(
            read_from(&mut cursor),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_write_to_rejects_oversized_payload() {
        let payload = vec![0u8; MAX_FRAME_LEN + 1];
        let mut sink = Vec::new();
        assert!(matches!(
            write_to(&mut sink, &payload),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
        assert!(sink.is_empty());
    }
}
