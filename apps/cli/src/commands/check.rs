//! check 命令
//!
//! 校验执行器配置（可选同时校验脚本），打印注册表

use anyhow::Result;
use clap::Args;
use motus_types::ActuatorConfig;
use std::path::{Path, PathBuf};

use super::config::load_config;
use crate::script::ScriptExecutor;
use crate::validation::{InputFile, ScriptValidator};

/// 配置检查命令参数
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// 需要一并校验的脚本
    #[arg(short, long)]
    pub script: Option<PathBuf>,
}

impl CheckCommand {
    pub fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;

        println!("执行器（{} 个，服务模型 {:?}）:", config.actuators.len(), config.service.model);
        for (i, actuator) in config.actuators.iter().enumerate() {
            match actuator {
                ActuatorConfig::Rotary(c) => println!(
                    "  [{}] {:<12} rotary  max_speed={} accel={} decel={} ramp={:?}",
                    i, c.name, c.max_speed, c.acceleration, c.deceleration, c.ramp
                ),
                ActuatorConfig::Linear(c) => println!(
                    "  [{}] {:<12} linear  max_magnitude={}",
                    i, c.name, c.max_magnitude
                ),
            }
        }

        if let Some(path) = &self.script {
            InputFile::Script.check(path)?;
            let script = ScriptExecutor::load_script(path)?;
            ScriptValidator::new(&config).validate(&script)?;
            println!("✅ 脚本 '{}' 校验通过（{} 个命令）", script.name, script.commands.len());
        }

        println!("✅ 配置有效");
        Ok(())
    }
}
