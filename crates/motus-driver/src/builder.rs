//! Builder 模式实现
//!
//! 提供链式构造 `MotionCoordinator` 实例的便捷方式。

use crate::coordinator::{Engine, MotionContext, MotionCoordinator};
use crate::error::DriverError;
use crate::output::{NullOutput, OutputDriver};
use crate::pause::PauseController;
use crate::registry::Registry;
use motus_types::{Clock, CoordinatorConfig, SchedulingModel, SystemClock};
use std::sync::Arc;

/// 协调器 Builder（链式构造）
///
/// # Example
///
/// ```
/// use motus_driver::{CoordinatorBuilder, RecordingOutput};
/// use motus_types::{CoordinatorConfig, RotaryConfig, SchedulingModel};
///
/// let (sink, _rx) = RecordingOutput::new();
/// let coordinator = CoordinatorBuilder::new(
///     CoordinatorConfig::new().with_rotary(RotaryConfig::new("stepper1")),
/// )
/// .scheduling(SchedulingModel::Polled)
/// .output(sink)
/// .build()
/// .unwrap();
/// assert_eq!(coordinator.len(), 1);
/// ```
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
    /// 时钟源（默认 `SystemClock`）
    clock: Option<Arc<dyn Clock>>,
    /// 输出驱动（默认丢弃）
    output: Option<Box<dyn OutputDriver>>,
    /// 共享的暂停控制（默认新建）
    pause: Option<Arc<PauseController>>,
    /// 覆盖配置中的调度模型
    model: Option<SchedulingModel>,
}

impl CoordinatorBuilder {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            clock: None,
            output: None,
            pause: None,
            model: None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn output(mut self, output: impl OutputDriver + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    pub fn pause(mut self, pause: Arc<PauseController>) -> Self {
        self.pause = Some(pause);
        self
    }

    pub fn scheduling(mut self, model: SchedulingModel) -> Self {
        self.model = Some(model);
        self
    }

    /// 校验配置并启动协调器（后台模型下同时启动服务线程）
    pub fn build(self) -> Result<MotionCoordinator, DriverError> {
        let mut config = self.config;
        if let Some(model) = self.model {
            config.service.model = model;
        }
        config.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()) as Arc<dyn Clock>);
        let output = self
            .output
            .unwrap_or_else(|| Box::new(NullOutput) as Box<dyn OutputDriver>);
        let pause = self.pause.unwrap_or_default();

        let engine = Engine::new(Registry::new(&config), output);
        let ctx = Arc::new(MotionContext::new(engine, clock, pause, config.service));
        Ok(MotionCoordinator::start(ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motus_types::{ConfigError, LinearConfig, ManualClock, Timestamp};

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = CoordinatorConfig::new()
            .with_linear(LinearConfig::new("dc"))
            .with_linear(LinearConfig::new("dc"));
        let result = CoordinatorBuilder::new(config).build();
        assert!(matches!(
            result,
            Err(DriverError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_scheduling_override_and_shared_pause() {
        let pause = Arc::new(PauseController::new());
        let coordinator = CoordinatorBuilder::new(CoordinatorConfig::new())
            .scheduling(SchedulingModel::Polled)
            .clock(Arc::new(ManualClock::new(Timestamp(7))))
            .pause(pause.clone())
            .build()
            .unwrap();

        assert_eq!(coordinator.scheduling(), SchedulingModel::Polled);
        assert!(coordinator.is_empty());
        assert_eq!(coordinator.snapshot().timestamp, Timestamp(7));

        pause.pause();
        assert!(coordinator.is_paused());
        assert!(Arc::ptr_eq(&coordinator.pause_handle(), &pause));
    }
}
