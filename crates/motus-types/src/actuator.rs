//! 执行器数据模型
//!
//! 执行器分为两大类：
//! - **Rotary**（步进类）：有绝对位置，支持按距离运行与加减速
//! - **Linear**（直流电机组类）：只有使能与带符号的幅值
//!
//! 两类共享同一个运行模式枚举 [`RunMode`]，同一时刻只有一个模式生效。

use crate::clock::Timestamp;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 执行器标识（注册表下标，按配置声明顺序分配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActuatorId(pub usize);

impl ActuatorId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 执行器类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    /// 步进电机类（有位置）
    Rotary,
    /// 直流电机组类（无位置）
    Linear,
}

/// 旋转方向
///
/// 数值与控制器固件一致：CW = 0, CCW = 1。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// 顺时针（正方向）
    #[default]
    Cw = 0,
    /// 逆时针（负方向）
    Ccw = 1,
}

impl Direction {
    /// 方向符号：CW = +1，CCW = -1
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Cw => 1,
            Direction::Ccw => -1,
        }
    }

    /// 由带符号的距离推出方向（0 视为 CW）
    pub fn from_signed(value: i64) -> Self {
        if value < 0 { Direction::Ccw } else { Direction::Cw }
    }
}

/// 加减速曲线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampProfile {
    /// 梯形加减速（有界加速度）
    #[default]
    Trapezoidal,
    /// 无加减速：速度瞬时切换，固定步频
    None,
}

/// 运行模式
///
/// 用单个枚举替代多个互斥布尔标志；切换模式即清除其他所有模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// 空闲（未运行，输出禁用）
    #[default]
    Idle,
    /// 持续运行，直到被停止
    Continuous,
    /// 定时运行，到达截止时间后停止
    Timed {
        /// 绝对截止时间
        deadline: Timestamp,
    },
    /// 按距离运行到绝对目标位置（仅 Rotary）
    Distance {
        /// 绝对目标位置（步）
        target: i64,
    },
    /// 定时运行到期后的减速停止阶段（仅带梯形曲线的 Rotary）
    RampDown,
}

impl RunMode {
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, RunMode::Idle)
    }

    /// 截止时间（仅 Timed 模式）
    pub fn deadline(&self) -> Option<Timestamp> {
        match self {
            RunMode::Timed { deadline } => Some(*deadline),
            _ => None,
        }
    }

    /// 距离目标（仅 Distance 模式）
    pub fn target(&self) -> Option<i64> {
        match self {
            RunMode::Distance { target } => Some(*target),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunMode::Idle => "idle",
            RunMode::Continuous => "continuous",
            RunMode::Timed { .. } => "timed",
            RunMode::Distance { .. } => "distance",
            RunMode::RampDown => "ramp_down",
        }
    }
}

/// 命令状态码
///
/// 所有非致命情况都被吸收，状态码只用于告知调用方，不改变时序行为。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// 命令按原样生效
    Accepted,
    /// 幅值超过上限，已截断
    Clamped { requested: u32, applied: u32 },
    /// 时长为 0，等价于 stop
    ImplicitStop,
    /// 距离为 0 或负数，命令被忽略
    Ignored,
}

/// 阻塞调用的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 目标全部完成
    Finished,
    /// 被其他上下文的 stop / stop_all / 新命令取消
    Cancelled,
    /// 没有可执行的内容（零时长、零距离、空批次）
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_repr() {
        assert_eq!(u8::from(Direction::Cw), 0);
        assert_eq!(u8::from(Direction::Ccw), 1);
        assert_eq!(Direction::try_from(1u8).unwrap(), Direction::Ccw);
        assert!(Direction::try_from(2u8).is_err());
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Cw.sign(), 1);
        assert_eq!(Direction::Ccw.sign(), -1);
        assert_eq!(Direction::from_signed(-5), Direction::Ccw);
        assert_eq!(Direction::from_signed(0), Direction::Cw);
    }

    #[test]
    fn test_run_mode_accessors() {
        let timed = RunMode::Timed {
            deadline: Timestamp(10),
        };
        assert_eq!(timed.deadline(), Some(Timestamp(10)));
        assert_eq!(timed.target(), None);
        assert_eq!(timed.name(), "timed");

        let distance = RunMode::Distance { target: -200 };
        assert_eq!(distance.target(), Some(-200));
        assert!(RunMode::default().is_idle());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ActuatorId(3).to_string(), "#3");
    }
}
