//! 脚本系统
//!
//! JSON 任务脚本：按执行器名称下发命令，阻塞命令在协调器内等待完成。

use anyhow::{Context, Result, bail};
use motus_driver::{BatchEntry, MotionCoordinator};
use motus_types::{ActuatorId, Completion, Direction};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// 任务脚本
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// 脚本名称
    pub name: String,

    /// 脚本描述
    #[serde(default)]
    pub description: String,

    /// 整个命令序列的重复次数
    #[serde(default = "default_repeat")]
    pub repeat: u32,

    /// 命令序列
    pub commands: Vec<ScriptCommand>,
}

fn default_repeat() -> u32 {
    1
}

fn default_wait() -> bool {
    true
}

/// 脚本命令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptCommand {
    /// 定时运行（默认阻塞到完成）
    RunMs {
        actuator: String,
        duration_ms: u32,
        magnitude: u32,
        #[serde(default)]
        direction: Direction,
        #[serde(default = "default_wait")]
        wait: bool,
    },

    /// 按步数运行（仅步进电机，默认阻塞到完成）
    RunSteps {
        actuator: String,
        steps: i64,
        #[serde(default)]
        direction: Direction,
        #[serde(default = "default_wait")]
        wait: bool,
    },

    /// 持续运行
    Run {
        actuator: String,
        magnitude: u32,
        #[serde(default)]
        direction: Direction,
    },

    /// 以最大幅值持续运行
    RunInfinite {
        actuator: String,
        #[serde(default)]
        direction: Direction,
    },

    /// 停止单个执行器
    Stop { actuator: String },

    /// 停止全部执行器
    StopAll,

    /// 批量运行，等待全部完成
    Batch { entries: Vec<BatchTask> },

    /// 等待（暂停期间不计时）
    WaitMs { duration_ms: u64 },

    /// 打印步进电机位置
    Position { actuator: String },
}

/// 批量条目（按字段区分定时 / 步数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchTask {
    Timed {
        actuator: String,
        duration_ms: u32,
        magnitude: u32,
        #[serde(default)]
        direction: Direction,
    },
    Steps {
        actuator: String,
        steps: i64,
        #[serde(default)]
        direction: Direction,
    },
}

impl BatchTask {
    pub fn actuator(&self) -> &str {
        match self {
            BatchTask::Timed { actuator, .. } | BatchTask::Steps { actuator, .. } => actuator,
        }
    }
}

/// 脚本配置
#[derive(Debug, Clone, Default)]
pub struct ScriptConfig {
    /// 失败时是否继续
    pub continue_on_error: bool,

    /// 外部中止标志（第二次 Ctrl-C）
    pub abort: Arc<AtomicBool>,
}

/// 脚本执行器
pub struct ScriptExecutor {
    coordinator: Arc<MotionCoordinator>,
    config: ScriptConfig,
}

impl ScriptExecutor {
    pub fn new(coordinator: Arc<MotionCoordinator>) -> Self {
        Self {
            coordinator,
            config: ScriptConfig::default(),
        }
    }

    /// 设置配置
    pub fn with_config(mut self, config: ScriptConfig) -> Self {
        self.config = config;
        self
    }

    /// 加载脚本文件
    pub fn load_script<P: AsRef<std::path::Path>>(path: P) -> Result<Script> {
        let content = fs::read_to_string(path).context("读取脚本文件失败")?;

        let script: Script = serde_json::from_str(&content).context("解析脚本 JSON 失败")?;

        Ok(script)
    }

    fn aborted(&self) -> bool {
        self.config.abort.load(Ordering::Acquire)
    }

    /// 执行脚本
    pub fn execute(&self, script: &Script) -> Result<ScriptResult> {
        info!("Running script '{}' ({} passes)", script.name, script.repeat);

        let started = Instant::now();
        let mut result = ScriptResult {
            script_name: script.name.clone(),
            total_commands: script.commands.len() * script.repeat as usize,
            succeeded: 0,
            failed: Vec::new(),
            aborted: false,
            duration_secs: 0.0,
        };

        'passes: for pass in 0..script.repeat {
            for (i, cmd) in script.commands.iter().enumerate() {
                let index = pass as usize * script.commands.len() + i;
                self.wait_while_paused();
                if self.aborted() {
                    result.aborted = true;
                    break 'passes;
                }

                println!("命令 {}/{}: {}", index + 1, result.total_commands, describe(cmd));
                match self.execute_command(cmd) {
                    Ok(()) => {
                        result.succeeded += 1;
                    },
                    Err(err) => {
                        println!("  ❌ 失败: {}", err);
                        result.failed.push((index, err.to_string()));

                        if self.aborted() {
                            result.aborted = true;
                            break 'passes;
                        }
                        if !self.config.continue_on_error {
                            println!("❌ 脚本执行失败，停止执行");
                            break 'passes;
                        }
                    },
                }
            }
        }

        result.duration_secs = started.elapsed().as_secs_f64();
        Ok(result)
    }

    fn resolve(&self, name: &str) -> Result<ActuatorId> {
        self.coordinator
            .id_of(name)
            .with_context(|| format!("未知执行器: {}", name))
    }

    fn finished(&self, completion: Completion) -> Result<()> {
        match completion {
            Completion::Finished | Completion::Skipped => Ok(()),
            Completion::Cancelled => bail!("被取消"),
        }
    }

    /// 执行单个命令
    fn execute_command(&self, cmd: &ScriptCommand) -> Result<()> {
        let coordinator = &self.coordinator;
        match cmd {
            ScriptCommand::RunMs {
                actuator,
                duration_ms,
                magnitude,
                direction,
                wait,
            } => {
                let id = self.resolve(actuator)?;
                if *wait {
                    let completion = coordinator.run_for_duration_blocking(
                        id,
                        *duration_ms,
                        *magnitude,
                        *direction,
                    )?;
                    self.finished(completion)
                } else {
                    coordinator.run_for_duration(id, *duration_ms, *magnitude, *direction)?;
                    Ok(())
                }
            },

            ScriptCommand::RunSteps {
                actuator,
                steps,
                direction,
                wait,
            } => {
                let id = self.resolve(actuator)?;
                if *wait {
                    let completion = coordinator.run_for_distance_blocking(id, *steps, *direction)?;
                    self.finished(completion)
                } else {
                    coordinator.run_for_distance(id, *steps, *direction)?;
                    Ok(())
                }
            },

            ScriptCommand::Run {
                actuator,
                magnitude,
                direction,
            } => {
                coordinator.run(self.resolve(actuator)?, *magnitude, *direction)?;
                Ok(())
            },

            ScriptCommand::RunInfinite {
                actuator,
                direction,
            } => {
                coordinator.run_infinite(self.resolve(actuator)?, *direction)?;
                Ok(())
            },

            ScriptCommand::Stop { actuator } => {
                coordinator.stop(self.resolve(actuator)?)?;
                Ok(())
            },

            ScriptCommand::StopAll => {
                coordinator.stop_all();
                Ok(())
            },

            ScriptCommand::Batch { entries } => {
                let entries = entries
                    .iter()
                    .map(|task| {
                        let id = self.resolve(task.actuator())?;
                        Ok(match task {
                            BatchTask::Timed {
                                duration_ms,
                                magnitude,
                                direction,
                                ..
                            } => BatchEntry::timed(id, *duration_ms, *magnitude, *direction),
                            BatchTask::Steps {
                                steps, direction, ..
                            } => BatchEntry::distance(id, *steps, *direction),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.finished(coordinator.run_batch_blocking(&entries))
            },

            ScriptCommand::WaitMs { duration_ms } => self.wait_ms(*duration_ms),

            ScriptCommand::Position { actuator } => {
                let position = coordinator.get_position(self.resolve(actuator)?)?;
                println!("  {}: {} 步", actuator, position);
                Ok(())
            },
        }
    }

    /// 等待指定时长；暂停期间不计时，期间持续推进服务例程
    fn wait_ms(&self, duration_ms: u64) -> Result<()> {
        let mut remaining = Duration::from_millis(duration_ms);
        let mut last = Instant::now();

        while !remaining.is_zero() {
            if self.aborted() {
                bail!("被中止");
            }
            self.coordinator.drive();
            thread::sleep(remaining.min(Duration::from_millis(1)));

            let now = Instant::now();
            if !self.coordinator.is_paused() {
                remaining = remaining.saturating_sub(now - last);
            }
            last = now;
        }
        Ok(())
    }

    /// 命令之间遇到暂停时，等待恢复再下发下一条
    fn wait_while_paused(&self) {
        if !self.coordinator.is_paused() {
            return;
        }
        debug!("Script paused between commands");
        while self.coordinator.is_paused() && !self.aborted() {
            self.coordinator.drive();
            thread::sleep(Duration::from_millis(5));
        }
    }
}

fn describe(cmd: &ScriptCommand) -> String {
    match cmd {
        ScriptCommand::RunMs {
            actuator,
            duration_ms,
            magnitude,
            direction,
            ..
        } => format!("{} 运行 {} ms（幅值 {}，{:?}）", actuator, duration_ms, magnitude, direction),
        ScriptCommand::RunSteps {
            actuator,
            steps,
            direction,
            ..
        } => format!("{} 运行 {} 步（{:?}）", actuator, steps, direction),
        ScriptCommand::Run {
            actuator,
            magnitude,
            direction,
        } => format!("{} 持续运行（幅值 {}，{:?}）", actuator, magnitude, direction),
        ScriptCommand::RunInfinite {
            actuator,
            direction,
        } => format!("{} 全速持续运行（{:?}）", actuator, direction),
        ScriptCommand::Stop { actuator } => format!("{} 停止", actuator),
        ScriptCommand::StopAll => "全部停止".to_string(),
        ScriptCommand::Batch { entries } => format!("批量运行 {} 个执行器", entries.len()),
        ScriptCommand::WaitMs { duration_ms } => format!("等待 {} ms", duration_ms),
        ScriptCommand::Position { actuator } => format!("查询 {} 位置", actuator),
    }
}

/// 脚本执行结果
#[derive(Debug)]
pub struct ScriptResult {
    /// 脚本名称
    pub script_name: String,

    /// 总命令数（含重复）
    pub total_commands: usize,

    /// 成功的命令数
    pub succeeded: usize,

    /// 失败的命令索引和错误
    pub failed: Vec<(usize, String)>,

    /// 是否被操作员中止
    pub aborted: bool,

    /// 脚本执行时长（秒）
    pub duration_secs: f64,
}
