//! 错误类型定义

use crate::actuator::ActuatorId;
use thiserror::Error;

/// 运动协调层错误
///
/// 所有错误都是非致命的：调用方可以忽略它们继续运行。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MotionError {
    /// 执行器编号不在注册表范围内
    #[error("Invalid actuator: {id}")]
    InvalidActuator { id: ActuatorId },

    /// 该类执行器不支持此操作（如对直流电机组发距离命令）
    #[error("Actuator {id} does not support {operation}")]
    UnsupportedOperation {
        id: ActuatorId,
        operation: &'static str,
    },

    /// 后台服务线程错误
    #[error("Service thread error: {0}")]
    ServiceThread(String),
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML 解析失败
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// 配置内容不合法
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_error_display() {
        let err = MotionError::InvalidActuator { id: ActuatorId(9) };
        assert_eq!(err.to_string(), "Invalid actuator: #9");

        let err = MotionError::UnsupportedOperation {
            id: ActuatorId(4),
            operation: "run_for_distance",
        };
        assert_eq!(err.to_string(), "Actuator #4 does not support run_for_distance");
    }

    #[test]
    fn test_config_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ConfigError = io.into();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().contains("missing"));
    }
}
