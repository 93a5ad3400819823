//! # 协调器配置
//!
//! TOML 格式，执行器按声明顺序注册（注册表顺序即服务例程的推进顺序）。
//!
//! ```toml
//! [service]
//! model = "background"
//! tick_us = 1000
//!
//! [[actuators]]
//! kind = "rotary"
//! name = "stepper1"
//! max_speed = 1200.0
//! acceleration = 800.0
//! deceleration = 800.0
//! ramp = "trapezoidal"
//!
//! [[actuators]]
//! kind = "linear"
//! name = "dc_3000"
//! max_magnitude = 255
//! ```

use crate::actuator::{ActuatorId, ActuatorKind, RampProfile};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// 步进电机默认最大速度（步/秒）
pub const DEFAULT_MAX_SPEED: f32 = 1200.0;
/// 步进电机默认加速度（步/秒²）
pub const DEFAULT_ACCELERATION: f32 = 800.0;
/// 步进电机默认减速度（步/秒²）
pub const DEFAULT_DECELERATION: f32 = 800.0;
/// 直流电机默认幅值上限（8 位 PWM）
pub const DEFAULT_MAX_MAGNITUDE: u32 = 255;

/// 服务例程调度模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingModel {
    /// 后台线程按固定周期推进服务例程
    #[default]
    Background,
    /// 纯协作模式：只有调用方的阻塞循环推进服务例程
    Polled,
}

/// 服务例程配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// 调度模型
    pub model: SchedulingModel,
    /// 后台服务周期（微秒）
    pub tick_us: u64,
    /// 阻塞循环的让出间隔（微秒），0 表示 `thread::yield_now`
    pub poll_interval_us: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model: SchedulingModel::Background,
            tick_us: 1000,
            poll_interval_us: 1000,
        }
    }
}

/// 步进电机配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotaryConfig {
    pub name: String,
    /// 最大速度（步/秒）
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    /// 加速度（步/秒²）
    #[serde(default = "default_acceleration")]
    pub acceleration: f32,
    /// 减速度（步/秒²）
    #[serde(default = "default_deceleration")]
    pub deceleration: f32,
    /// 加减速曲线
    #[serde(default)]
    pub ramp: RampProfile,
}

impl RotaryConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_speed: DEFAULT_MAX_SPEED,
            acceleration: DEFAULT_ACCELERATION,
            deceleration: DEFAULT_DECELERATION,
            ramp: RampProfile::Trapezoidal,
        }
    }

    pub fn with_profile(mut self, max_speed: f32, acceleration: f32, deceleration: f32) -> Self {
        self.max_speed = max_speed;
        self.acceleration = acceleration;
        self.deceleration = deceleration;
        self
    }

    pub fn with_ramp(mut self, ramp: RampProfile) -> Self {
        self.ramp = ramp;
        self
    }

    /// 非正数（或 NaN）参数回退到默认值
    pub fn sanitized(mut self) -> Self {
        self.max_speed = positive_or(self.max_speed, DEFAULT_MAX_SPEED);
        self.acceleration = positive_or(self.acceleration, DEFAULT_ACCELERATION);
        self.deceleration = positive_or(self.deceleration, DEFAULT_DECELERATION);
        self
    }
}

/// 直流电机组配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearConfig {
    pub name: String,
    /// 幅值上限（PWM 满量程）
    #[serde(default = "default_max_magnitude")]
    pub max_magnitude: u32,
}

impl LinearConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_magnitude: DEFAULT_MAX_MAGNITUDE,
        }
    }

    pub fn with_max_magnitude(mut self, max_magnitude: u32) -> Self {
        self.max_magnitude = max_magnitude;
        self
    }
}

/// 单个执行器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActuatorConfig {
    Rotary(RotaryConfig),
    Linear(LinearConfig),
}

impl ActuatorConfig {
    pub fn name(&self) -> &str {
        match self {
            ActuatorConfig::Rotary(c) => &c.name,
            ActuatorConfig::Linear(c) => &c.name,
        }
    }

    pub fn kind(&self) -> ActuatorKind {
        match self {
            ActuatorConfig::Rotary(_) => ActuatorKind::Rotary,
            ActuatorConfig::Linear(_) => ActuatorKind::Linear,
        }
    }
}

/// 协调器配置（根）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub actuators: Vec<ActuatorConfig>,
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rotary(mut self, config: RotaryConfig) -> Self {
        self.actuators.push(ActuatorConfig::Rotary(config));
        self
    }

    pub fn with_linear(mut self, config: LinearConfig) -> Self {
        self.actuators.push(ActuatorConfig::Linear(config));
        self
    }

    pub fn with_model(mut self, model: SchedulingModel) -> Self {
        self.service.model = model;
        self
    }

    /// 解析并校验 TOML 字符串
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CoordinatorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 校验：名称非空且唯一，后台周期非零
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for actuator in &self.actuators {
            let name = actuator.name();
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("actuator name must not be empty".into()));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate actuator name: {name}"
                )));
            }
        }

        if self.service.model == SchedulingModel::Background && self.service.tick_us == 0 {
            return Err(ConfigError::Invalid(
                "service.tick_us must be > 0 in background model".into(),
            ));
        }

        Ok(())
    }

    /// 按名称查找执行器编号
    pub fn id_of(&self, name: &str) -> Option<ActuatorId> {
        self.actuators
            .iter()
            .position(|a| a.name() == name)
            .map(ActuatorId)
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value > 0.0 && value.is_finite() { value } else { fallback }
}

fn default_max_speed() -> f32 {
    DEFAULT_MAX_SPEED
}

fn default_acceleration() -> f32 {
    DEFAULT_ACCELERATION
}

fn default_deceleration() -> f32 {
    DEFAULT_DECELERATION
}

fn default_max_magnitude() -> u32 {
    DEFAULT_MAX_MAGNITUDE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BENCH_TOML: &str = r#"
[service]
model = "polled"
poll_interval_us = 0

[[actuators]]
kind = "rotary"
name = "stepper1"
max_speed = 12000.0
acceleration = 8000.0

[[actuators]]
kind = "rotary"
name = "stepper2"
ramp = "none"

[[actuators]]
kind = "linear"
name = "dc_3000"
"#;

    #[test]
    fn test_parse_bench_config() {
        let config = CoordinatorConfig::from_toml_str(BENCH_TOML).unwrap();
        assert_eq!(config.service.model, SchedulingModel::Polled);
        assert_eq!(config.service.poll_interval_us, 0);
        // 未指定的字段使用默认值
        assert_eq!(config.service.tick_us, 1000);
        assert_eq!(config.actuators.len(), 3);

        match &config.actuators[0] {
            ActuatorConfig::Rotary(r) => {
                assert_eq!(r.max_speed, 12000.0);
                assert_eq!(r.acceleration, 8000.0);
                assert_eq!(r.deceleration, DEFAULT_DECELERATION);
                assert_eq!(r.ramp, RampProfile::Trapezoidal);
            },
            other => panic!("Expected rotary, got {:?}", other),
        }
        match &config.actuators[1] {
            ActuatorConfig::Rotary(r) => assert_eq!(r.ramp, RampProfile::None),
            other => panic!("Expected rotary, got {:?}", other),
        }
        match &config.actuators[2] {
            ActuatorConfig::Linear(l) => assert_eq!(l.max_magnitude, 255),
            other => panic!("Expected linear, got {:?}", other),
        }
    }

    #[test]
    fn test_id_of_follows_declaration_order() {
        let config = CoordinatorConfig::from_toml_str(BENCH_TOML).unwrap();
        assert_eq!(config.id_of("stepper1"), Some(ActuatorId(0)));
        assert_eq!(config.id_of("dc_3000"), Some(ActuatorId(2)));
        assert_eq!(config.id_of("missing"), None);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = CoordinatorConfig::new()
            .with_rotary(RotaryConfig::new("m"))
            .with_linear(LinearConfig::new("m"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate actuator name"));
    }

    #[test]
    fn test_zero_tick_rejected_in_background_model() {
        let mut config = CoordinatorConfig::new();
        config.service.tick_us = 0;
        assert!(config.validate().is_err());

        config.service.model = SchedulingModel::Polled;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sanitized_falls_back_to_defaults() {
        let config = RotaryConfig::new("m").with_profile(-1.0, 0.0, f32::NAN).sanitized();
        assert_eq!(config.max_speed, DEFAULT_MAX_SPEED);
        assert_eq!(config.acceleration, DEFAULT_ACCELERATION);
        assert_eq!(config.deceleration, DEFAULT_DECELERATION);

        let config = RotaryConfig::new("m").with_profile(500.0, 100.0, 50.0).sanitized();
        assert_eq!(config.max_speed, 500.0);
        assert_eq!(config.deceleration, 50.0);
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let err = CoordinatorConfig::from_toml_str(
            r#"
[[actuators]]
kind = "pneumatic"
name = "x"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BENCH_TOML.as_bytes()).unwrap();

        let config = CoordinatorConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.actuators.len(), 3);

        let missing = CoordinatorConfig::load_from_file("/nonexistent/motus.toml");
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
