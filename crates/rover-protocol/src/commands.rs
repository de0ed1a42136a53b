//! 运动指令词汇表
//!
//! 运动控制器接受的指令字符串为固定词汇：`<动作><参数>` 形式
//! （如 `YF150` 表示快速前进 150），以及双障碍任务的绕行宏指令。
//! 常量集中在此处，枢纽和主机共用同一份词汇表。

/// 快速前进一步（竞速任务与绕行收尾使用）
pub const FORWARD_FAST: &str = "YF150";

/// 短距后退（第一段绕行的收尾调整）
pub const BACK_SHORT: &str = "SB025";

/// 微调前移（重试时的试探移动）
pub const NUDGE_FORWARD: &str = "RF010";

/// 微调后移（重试时的试探移动）
pub const NUDGE_BACK: &str = "RB010";

/// 第一障碍绕行宏指令
pub const FIRST_LEFT: &str = "FIRSTLEFT";
pub const FIRST_RIGHT: &str = "FIRSTRIGHT";

/// 第二障碍绕行宏指令
pub const SECOND_LEFT: &str = "SECONDLEFT";
pub const SECOND_RIGHT: &str = "SECONDRIGHT";

/// 左转符号的识别 id
pub const SYMBOL_LEFT: &str = "39";

/// 右转符号的识别 id，同时是竞速任务重试耗尽时的默认符号
pub const SYMBOL_RIGHT: &str = "38";

/// 识别符号是否指示左转
pub fn is_left_symbol(img_id: Option<&str>) -> bool {
    img_id == Some(SYMBOL_LEFT)
}

/// 竞速任务的固定单步前进序列
pub fn fastest_forward() -> Vec<String> {
    vec![FORWARD_FAST.to_string()]
}

/// 第一障碍的绕行序列：方向宏 + 固定的"短退再前进"收尾
pub fn first_maneuver(img_id: Option<&str>) -> Vec<String> {
    let direction = if is_left_symbol(img_id) {
        FIRST_LEFT
    } else {
        FIRST_RIGHT
    };
    vec![
        direction.to_string(),
        BACK_SHORT.to_string(),
        FORWARD_FAST.to_string(),
    ]
}

/// 第二障碍的绕行序列：仅方向宏，无收尾
pub fn second_maneuver(img_id: Option<&str>) -> Vec<String> {
    let direction = if is_left_symbol(img_id) {
        SECOND_LEFT
    } else {
        SECOND_RIGHT
    };
    vec![direction.to_string()]
}

/// 重试用的"试探往返"指令对，方向按重试次数的奇偶交替
///
/// 第一次重试（`retry_count = 0`）先退后进，第二次反过来。
pub fn nudge_pair(retry_count: u32) -> Vec<String> {
    if (retry_count + 1) % 2 == 0 {
        vec![NUDGE_FORWARD.to_string(), NUDGE_BACK.to_string()]
    } else {
        vec![NUDGE_BACK.to_string(), NUDGE_FORWARD.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_direction() {
        assert!(is_left_symbol(Some("39")));
        assert!(!is_left_symbol(Some("38")));
        assert!(!is_left_symbol(None));
    }

    #[test]
    fn test_first_maneuver_has_fixed_tail() {
        assert_eq!(
            first_maneuver(Some("39")),
            vec!["FIRSTLEFT", "SB025", "YF150"]
        );
        assert_eq!(
            first_maneuver(Some("20")),
            vec!["FIRSTRIGHT", "SB025", "YF150"]
        );
    }

    #[test]
    fn test_second_maneuver_has_no_tail() {
        assert_eq!(second_maneuver(Some("39")), vec!["SECONDLEFT"]);
        assert_eq!(second_maneuver(None), vec!["SECONDRIGHT"]);
    }

    #[test]
    fn test_nudge_pair_alternates_by_parity() {
        assert_eq!(nudge_pair(0), vec!["RB010", "RF010"]);
        assert_eq!(nudge_pair(1), vec!["RF010", "RB010"]);
        assert_eq!(nudge_pair(2), vec!["RB010", "RF010"]);
    }
}
