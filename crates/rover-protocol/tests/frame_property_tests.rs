//! 帧编解码的属性测试

use std::io::Cursor;

use proptest::prelude::*;
use rover_protocol::frame;

proptest! {
    /// 任意载荷（0..8KiB）编码后解码必须得到原载荷
    #[test]
    fn frame_roundtrip(payload in proptest::collection::vec(any::<u8>(), 0..8192)) {
        let mut cursor = Cursor::new(frame::encode(&payload));
        let decoded = frame::read_from(&mut cursor).unwrap();
        prop_assert_eq!(decoded, payload);
    }

    /// 连续多帧依次解码，边界互不干扰
    #[test]
    fn frame_stream_roundtrip(
        payloads in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..512),
            1..8,
        )
    ) {
        let mut stream = Vec::new();
        for p in &payloads {
            stream.extend_from_slice(&frame::encode(p));
        }

        let mut cursor = Cursor::new(stream);
        for p in &payloads {
            let decoded = frame::read_from(&mut cursor).unwrap();
            prop_assert_eq!(&decoded, p);
        }
    }
}
