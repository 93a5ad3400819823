//! 输入验证模块
//!
//! 脚本在下发任何命令前整体校验一遍，避免执行到一半才发现名称写错。

use crate::script::{BatchTask, Script, ScriptCommand};
use anyhow::{Context, Result};
use motus_types::{ActuatorKind, CoordinatorConfig};
use std::path::Path;

/// 脚本验证器
///
/// 检查：
/// - 所有执行器名称都在配置中
/// - 按步数运行只用于步进电机
/// - 批量命令非空，重复次数非零
pub struct ScriptValidator<'a> {
    config: &'a CoordinatorConfig,
}

impl<'a> ScriptValidator<'a> {
    pub fn new(config: &'a CoordinatorConfig) -> Self {
        Self { config }
    }

    fn kind_of(&self, index: usize, name: &str) -> Result<ActuatorKind> {
        self.config
            .actuators
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.kind())
            .with_context(|| format!("命令 {}: 未知执行器 '{}'", index + 1, name))
    }

    fn require_rotary(&self, index: usize, name: &str) -> Result<()> {
        if self.kind_of(index, name)? != ActuatorKind::Rotary {
            anyhow::bail!("命令 {}: '{}' 不是步进电机，不能按步数运行", index + 1, name);
        }
        Ok(())
    }

    pub fn validate(&self, script: &Script) -> Result<()> {
        if script.repeat == 0 {
            anyhow::bail!("脚本 '{}' 的重复次数为 0", script.name);
        }

        for (i, cmd) in script.commands.iter().enumerate() {
            match cmd {
                ScriptCommand::RunSteps { actuator, .. } => self.require_rotary(i, actuator)?,
                ScriptCommand::Position { actuator } => self.require_rotary(i, actuator)?,
                ScriptCommand::RunMs { actuator, .. }
                | ScriptCommand::Run { actuator, .. }
                | ScriptCommand::RunInfinite { actuator, .. }
                | ScriptCommand::Stop { actuator } => {
                    self.kind_of(i, actuator)?;
                },
                ScriptCommand::Batch { entries } => {
                    if entries.is_empty() {
                        anyhow::bail!("命令 {}: 批量命令没有条目", i + 1);
                    }
                    for entry in entries {
                        match entry {
                            BatchTask::Steps { actuator, .. } => self.require_rotary(i, actuator)?,
                            BatchTask::Timed { actuator, .. } => {
                                self.kind_of(i, actuator)?;
                            },
                        }
                    }
                },
                ScriptCommand::StopAll | ScriptCommand::WaitMs { .. } => {},
            }
        }

        Ok(())
    }
}

/// 命令行指定的输入文件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFile {
    Config,
    Script,
}

impl InputFile {
    fn label(self) -> &'static str {
        match self {
            InputFile::Config => "配置文件",
            InputFile::Script => "脚本文件",
        }
    }

    /// 确认路径指向一个能打开的普通文件
    pub fn check(self, path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            anyhow::bail!("未指定{}", self.label());
        }

        let metadata = std::fs::metadata(path)
            .with_context(|| format!("{}不存在: {}", self.label(), path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("{}不是普通文件: {}", self.label(), path.display());
        }

        std::fs::File::open(path)
            .with_context(|| format!("{}无法打开: {}", self.label(), path.display()))?;
        Ok(())
    }
}
