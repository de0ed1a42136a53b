//! 识别器/拼接器接口与识别结果
//!
//! 视觉推理引擎同样是黑盒：输入一张已落盘的图片，输出一个
//! [`Prediction`]。"没有可信识别"不是错误，用 `img_id = None`
//! 表示，由编排器的重试策略处理。

use std::path::{Path, PathBuf};

use rover_protocol::ImageResultsData;

use crate::HostError;

/// 一次推理的结果
///
/// `bbox_area` 和 `image_path` 是内部字段，定案上报时剥离。
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub obs_id: String,
    /// 识别出的符号 id；`None` 表示无可信识别
    pub img_id: Option<String>,
    pub confidence: f64,
    /// 检测框面积（像素），仅用于内部排序/调试
    pub bbox_area: f64,
    /// 原始帧的落盘路径
    pub image_path: PathBuf,
}

impl Prediction {
    /// 是否为可信识别
    pub fn is_confident(&self) -> bool {
        self.img_id.is_some()
    }

    /// 剥离内部字段，得到可上报的识别结果载荷
    pub fn into_results(self) -> ImageResultsData {
        ImageResultsData {
            obs_id: self.obs_id,
            img_id: self.img_id,
        }
    }
}

/// 视觉识别器
pub trait Recognizer: Send {
    /// 对一张已落盘的图片做推理
    fn infer(
        &mut self,
        image_path: &Path,
        obs_id: &str,
        image_index: u32,
        task_two: bool,
    ) -> Result<Prediction, HostError>;
}

/// 结果图拼接器（任务收尾时调用）
pub trait Stitcher: Send {
    fn stitch(&self, results_dir: &Path, output: &Path) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_results_strips_internal_fields() {
        let prediction = Prediction {
            obs_id: "3".into(),
            img_id: Some("39".into()),
            confidence: 0.92,
            bbox_area: 5120.0,
            image_path: PathBuf::from("captures/task1_obs_id_3_0.jpg"),
        };

        let results = prediction.into_results();
        assert_eq!(results.obs_id, "3");
        assert_eq!(results.img_id.as_deref(), Some("39"));
        // ImageResultsData 只有两个字段，bbox_area/image_path 不可能泄漏
    }
}
