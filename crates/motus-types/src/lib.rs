//! # Motus Types - 共享数据模型
//!
//! **依赖原则**: 不依赖任何硬件或线程相关 crate，驱动层和 CLI 都只通过本 crate 交换数据。
//!
//! ## 包含模块
//!
//! - `actuator` - 执行器标识、方向、运行模式（sum type）与命令状态码
//! - `clock` - 毫秒时钟（32 位回绕）与回绕安全的比较算术
//! - `config` - TOML 配置（服务调度模型、执行器列表、加减速参数）
//! - `error` - 错误类型

pub mod actuator;
pub mod clock;
pub mod config;
pub mod error;

// 重新导出常用类型
pub use actuator::{
    ActuatorId, ActuatorKind, CommandStatus, Completion, Direction, RampProfile, RunMode,
};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp, signed_diff};
pub use config::{
    ActuatorConfig, CoordinatorConfig, LinearConfig, RotaryConfig, SchedulingModel,
    ServiceConfig,
};
pub use error::{ConfigError, MotionError};
