//! 场地栅格与朝向换算
//!
//! 场地是 200cm × 200cm 的正方形，划分为 [`GRID_SIZE`] × [`GRID_SIZE`]
//! 的栅格。规划器在栅格顶点上工作，运动控制与显示端使用连续坐标/
//! 像素坐标，这里提供三者之间的换算。
//!
//! 所有函数均为纯函数，无状态。

use std::f64::consts::PI;

use thiserror::Error;

/// 场地边长（厘米）
pub const ARENA_CM: f64 = 200.0;

/// 单边栅格数
pub const GRID_SIZE: i32 = 20;

/// 朝向解析错误
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid heading: {0:?} (expected one of N/S/E/W)")]
pub struct HeadingParseError(pub String);

/// 罗盘朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    North,
    South,
    East,
    West,
}

impl Heading {
    /// 朝向对应的弧度角（东为 0，逆时针为正）
    pub fn to_radians(self) -> f64 {
        match self {
            Heading::East => 0.0,
            Heading::North => PI / 2.0,
            Heading::West => PI,
            Heading::South => -PI / 2.0,
        }
    }

    /// 将弧度角量化到最近的罗盘朝向
    ///
    /// 输入须先归一化到 (-π, π]，参见 [`normalize_angle`]。
    pub fn from_radians(rad: f64) -> Heading {
        debug_assert!(rad.abs() <= PI);

        if rad > PI / 4.0 && rad <= 3.0 * PI / 4.0 {
            Heading::North
        } else if rad > -PI / 4.0 && rad <= PI / 4.0 {
            Heading::East
        } else if rad > -3.0 * PI / 4.0 && rad <= -PI / 4.0 {
            Heading::South
        } else {
            Heading::West
        }
    }

    /// 单字母表示（线格式中使用）
    pub fn as_letter(self) -> &'static str {
        match self {
            Heading::North => "N",
            Heading::South => "S",
            Heading::East => "E",
            Heading::West => "W",
        }
    }
}

impl std::str::FromStr for Heading {
    type Err = HeadingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(Heading::North),
            "S" => Ok(Heading::South),
            "E" => Ok(Heading::East),
            "W" => Ok(Heading::West),
            other => Err(HeadingParseError(other.to_string())),
        }
    }
}

/// 栅格顶点坐标 → 连续坐标（厘米）
pub fn grid_to_coords(x_g: i32, y_g: i32) -> (f64, f64) {
    let cell = ARENA_CM / GRID_SIZE as f64;
    (x_g as f64 * cell, y_g as f64 * cell)
}

/// 连续坐标（厘米）→ 栅格顶点坐标（向下取整）
pub fn coords_to_grid(x: f64, y: f64) -> (i32, i32) {
    let cell = ARENA_CM / GRID_SIZE as f64;
    ((x / cell).floor() as i32, (y / cell).floor() as i32)
}

/// 显示端地图的像素布局
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMap {
    /// 地图左上角 x 像素坐标
    pub x0: f64,
    /// 地图左上角 y 像素坐标
    pub y0: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for PixelMap {
    fn default() -> Self {
        Self {
            x0: 50.0,
            y0: 50.0,
            width: 800.0,
            height: 800.0,
        }
    }
}

/// 栅格顶点坐标 → 显示端像素坐标
///
/// 像素坐标系 y 轴向下，因此纵轴翻转。
pub fn grid_to_pixel(x_g: i32, y_g: i32, map: &PixelMap) -> (f64, f64) {
    let (x, y) = grid_to_coords(x_g, y_g);
    let px = map.x0 + x * map.width / ARENA_CM;
    let py = map.y0 + map.height - y * map.height / ARENA_CM;
    (px, py)
}

/// 平面两点的欧氏距离
pub fn l2(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
}

/// 将任意角度归一化到 (-π, π]
pub fn normalize_angle(theta: f64) -> f64 {
    let wrapped = (theta + PI).rem_euclid(2.0 * PI) - PI;
    // rem_euclid 的结果落在 [-π, π)，把 -π 折到 +π 保持半开区间
    if wrapped == -PI { PI } else { wrapped }
}
