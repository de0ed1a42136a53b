//! 出站队列抽象
//!
//! 路由器和编排器只需要"把消息放进某条出站队列"这一个能力。
//! 统一成 trait 之后，生产代码注入链路的发送端，测试注入普通
//! channel 即可观察输出。

use crossbeam_channel::Sender;
use rover_protocol::Message;

use crate::LinkError;

/// 非阻塞的消息入队端
pub trait MessageSink: Send {
    fn push(&self, msg: Message) -> Result<(), LinkError>;
}

impl MessageSink for Sender<Message> {
    fn push(&self, msg: Message) -> Result<(), LinkError> {
        self.send(msg).map_err(|_| LinkError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_sink() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.push(Message::fastest_path_ack()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Message::fastest_path_ack());

        drop(rx);
        assert!(matches!(
            tx.push(Message::fastest_path_ack()),
            Err(LinkError::ChannelClosed)
        ));
    }
}
