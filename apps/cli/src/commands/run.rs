//! run 命令
//!
//! 执行脚本文件

use anyhow::Result;
use clap::Args;
use motus_driver::CoordinatorBuilder;
use motus_types::SchedulingModel;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::config::load_config;
use crate::operator;
use crate::script::{ScriptConfig, ScriptExecutor};
use crate::sim::LoggingOutput;
use crate::validation::{InputFile, ScriptValidator};

/// 脚本执行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 脚本文件路径
    #[arg(short, long)]
    pub script: PathBuf,

    /// 覆盖脚本中的重复次数
    #[arg(long)]
    pub repeat: Option<u32>,

    /// 不启动后台服务线程，由阻塞调用推进服务例程
    #[arg(long)]
    pub polled: bool,

    /// 失败时继续执行
    #[arg(long)]
    pub continue_on_error: bool,
}

impl RunCommand {
    /// 执行脚本
    pub fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        InputFile::Script.check(&self.script)?;
        println!("📜 加载脚本: {}", self.script.display());

        let config = load_config(config_path)?;
        let mut script = ScriptExecutor::load_script(&self.script)?;
        if let Some(repeat) = self.repeat {
            script.repeat = repeat;
        }
        ScriptValidator::new(&config).validate(&script)?;

        println!("📋 脚本: {}", script.name);
        if !script.description.is_empty() {
            println!("    {}", script.description);
        }
        println!("    {} 个命令 × {} 次", script.commands.len(), script.repeat);
        println!();

        let output = LoggingOutput::new(&config);
        let step_counters = output.step_counters();
        let names: Vec<String> = config.actuators.iter().map(|a| a.name().to_string()).collect();
        let mut builder = CoordinatorBuilder::new(config).output(output);
        if self.polled {
            builder = builder.scheduling(SchedulingModel::Polled);
        }
        let coordinator = Arc::new(builder.build()?);

        let abort = Arc::new(AtomicBool::new(false));
        operator::install(&coordinator, abort.clone())?;

        let executor = ScriptExecutor::new(coordinator.clone()).with_config(ScriptConfig {
            continue_on_error: self.continue_on_error,
            abort: abort.clone(),
        });
        let result = executor.execute(&script)?;
        coordinator.stop_all();

        println!();
        println!("📊 执行结果（{}）:", result.script_name);
        println!("  总命令数: {}", result.total_commands);
        println!("  成功: {}", result.succeeded);
        println!("  失败: {}", result.failed.len());
        println!("  耗时: {:.2} 秒", result.duration_secs);
        for (name, counter) in names.iter().zip(step_counters.iter()) {
            let steps = counter.load(Ordering::Relaxed);
            if steps != 0 {
                println!("  {} 净步数: {}", name, steps);
            }
        }

        if !result.failed.is_empty() {
            println!();
            println!("❌ 失败的命令:");
            for (idx, err) in &result.failed {
                println!("  命令 {}: {}", idx + 1, err);
            }
        }

        if result.aborted || abort.load(Ordering::Acquire) {
            anyhow::bail!("脚本被操作员中止");
        }
        if !result.failed.is_empty() {
            anyhow::bail!("{} 个命令失败", result.failed.len());
        }

        println!();
        println!("✅ 执行完成");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_defaults() {
        let cmd = RunCommand {
            script: PathBuf::from("test.json"),
            repeat: None,
            polled: false,
            continue_on_error: false,
        };

        assert!(!cmd.continue_on_error);
        assert_eq!(cmd.script, PathBuf::from("test.json"));
    }

    #[test]
    fn test_missing_script_rejected_before_config() {
        let cmd = RunCommand {
            script: PathBuf::from("/nonexistent/script.json"),
            repeat: None,
            polled: true,
            continue_on_error: false,
        };
        let err = cmd.execute(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(err.to_string().contains("script.json"));
    }
}
