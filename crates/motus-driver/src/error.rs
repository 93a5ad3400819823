//! 驱动层错误类型定义

use motus_types::{ConfigError, MotionError};
use thiserror::Error;

/// 构建协调器时的错误
#[derive(Error, Debug)]
pub enum DriverError {
    /// 配置不合法
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 运行期错误（如后台服务线程无法启动）
    #[error("Motion error: {0}")]
    Motion(#[from] MotionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::from(ConfigError::Invalid("duplicate actuator name: m".into()));
        assert_eq!(
            err.to_string(),
            "Config error: Invalid config: duplicate actuator name: m"
        );

        let err = DriverError::from(MotionError::ServiceThread("spawn failed".into()));
        assert!(err.to_string().contains("spawn failed"));
    }
}
