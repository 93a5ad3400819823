//! 直流电机组运行时
//!
//! 直流电机没有位置反馈，只有使能与带符号幅值；幅值超出上限时截断而非拒绝。

use motus_types::{Direction, LinearConfig};

#[derive(Debug, Clone)]
pub struct LinearState {
    max_magnitude: u32,
}

impl LinearState {
    pub fn new(config: &LinearConfig) -> Self {
        Self {
            max_magnitude: config.max_magnitude,
        }
    }

    #[inline]
    pub fn max_magnitude(&self) -> u32 {
        self.max_magnitude
    }

    /// 带符号输出值：未运行或幅值为 0 时输出 0（两路 PWM 都拉低）
    pub fn signed_output(running: bool, magnitude: u32, direction: Direction) -> i32 {
        if !running || magnitude == 0 {
            return 0;
        }
        let magnitude = magnitude.min(i32::MAX as u32) as i32;
        match direction {
            Direction::Cw => magnitude,
            Direction::Ccw => -magnitude,
        }
    }
}
