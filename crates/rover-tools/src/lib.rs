//! # Rover Tools - 共享纯函数工具
//!
//! **依赖原则**: 不依赖任何链路/运行时 crate，保持纯函数
//!
//! ## 包含模块
//!
//! - `grid` - 场地栅格/连续坐标与朝向换算（纯函数）

pub mod grid;

pub use grid::{Heading, PixelMap};
