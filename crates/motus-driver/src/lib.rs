//! # Motus Driver - 执行器运动协调
//!
//! 本 crate 提供多执行器（步进电机 + 直流电机组）的运动协调功能，包括：
//! - 执行器运行时注册表（固定大小，注册表顺序即推进顺序）
//! - 服务例程：定时截止、距离目标、梯形加减速
//! - 后台服务线程 / 纯协作两种调度模型（[`MotionCoordinator::drive`] 统一钩子）
//! - 全局暂停：阻塞调用冻结剩余时长，恢复后透明续跑
//! - 批量同步：一组异构执行器一起下发、一起等待
//! - 输出驱动接口与录制输出（有界通道）
//!
//! # 使用场景
//!
//! 上层应用（按键、脚本、任务编排）只通过 [`MotionCoordinator`] 的命令接口下发动作，
//! 具体的 STEP/DIR、PWM 引脚驱动通过 [`OutputDriver`] 接入。

mod batch;
mod builder;
mod coordinator;
mod error;
pub mod linear;
pub mod output;
pub mod pause;
pub mod registry;
pub mod rotary;
mod service;

pub use batch::{BatchCommand, BatchEntry};
pub use builder::CoordinatorBuilder;
pub use coordinator::{MotionCoordinator, MotionSnapshot};
pub use error::DriverError;
pub use output::{ActuatorOutput, NullOutput, OutputDriver, OutputEvent, RecordingOutput};
pub use pause::PauseController;
pub use registry::{ActuatorSnapshot, Registry};
pub use rotary::RotaryProfile;
