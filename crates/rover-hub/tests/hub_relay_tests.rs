//! 枢纽三链路中继的集成测试

use std::net::TcpStream;
use std::time::Duration;

use rover_hub::Hub;
use rover_link::{AcceptConnector, LinkConfig};
use rover_protocol::{ImageResultsData, Message, frame};
use serde_json::json;

fn read_msg(stream: &mut TcpStream) -> Message {
    let payload = frame::read_from(stream).unwrap();
    Message::from_bytes(&payload).unwrap()
}

fn write_msg(stream: &mut TcpStream, msg: &Message) {
    frame::write_to(stream, &msg.to_bytes().unwrap()).unwrap();
}

#[test]
fn hub_relays_between_three_links() {
    let host_conn = AcceptConnector::bind("127.0.0.1:0").unwrap();
    let motion_conn = AcceptConnector::bind("127.0.0.1:0").unwrap();
    let display_conn = AcceptConnector::bind("127.0.0.1:0").unwrap();

    let host_addr = host_conn.local_addr();
    let motion_addr = motion_conn.local_addr();
    let display_addr = display_conn.local_addr();

    let hub = Hub::spawn_with_connectors(
        Box::new(host_conn),
        Box::new(motion_conn),
        Box::new(display_conn),
        true,
        LinkConfig {
            retry_backoff: Duration::from_millis(50),
        },
    )
    .unwrap();

    let mut host = TcpStream::connect(host_addr).unwrap();
    let mut motion = TcpStream::connect(motion_addr).unwrap();
    let mut display = TcpStream::connect(display_addr).unwrap();

    // 主机 → 运动：NAVIGATION 原样转发
    let nav = Message::navigation(vec!["LF180".into()], vec![[1, 2], [1, 3]]);
    write_msg(&mut host, &nav);
    assert_eq!(read_msg(&mut motion), nav);

    // 显示 → 主机：任务触发原样转发
    let start = Message::StartTask {
        data: json!({"task": "EXPLORATION", "obstacles": []}),
    };
    write_msg(&mut display, &start);
    assert_eq!(read_msg(&mut host), start);

    // 主机 → 显示：识别结果原样转发；双障碍模式同时合成绕行
    let results = Message::ImageResults {
        data: ImageResultsData {
            obs_id: "1".into(),
            img_id: Some("39".into()),
        },
    };
    write_msg(&mut host, &results);
    assert_eq!(read_msg(&mut display), results);
    match read_msg(&mut motion) {
        Message::Navigation { data } => {
            assert_eq!(data.commands, vec!["FIRSTLEFT", "SB025", "YF150"]);
        },
        other => panic!("unexpected {}", other.kind()),
    }

    hub.shutdown();
}
