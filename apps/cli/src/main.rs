//! # Motus CLI
//!
//! 执行器运动协调器的命令行工具：加载执行器配置，按 JSON 脚本下发运动任务。
//!
//! ```bash
//! # 写入示例配置（3 个步进电机 + 3 组直流电机）
//! motus-cli config init
//!
//! # 校验配置和脚本
//! motus-cli check --script scripts/demo.json
//!
//! # 执行脚本（Ctrl-C 暂停，Enter 继续，暂停中再按 Ctrl-C 全部停止）
//! motus-cli --config configs/bench.toml run --script scripts/demo.json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod operator;
mod script;
mod sim;
mod validation;

use commands::{CheckCommand, ConfigCommand, RunCommand};

/// Motus CLI - 执行器运动协调命令行工具
#[derive(Parser, Debug)]
#[command(name = "motus-cli")]
#[command(about = "Command-line interface for the actuator motion coordinator", long_about = None)]
#[command(version)]
struct Cli {
    /// 执行器配置文件（默认 <config_dir>/motus/config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 校验配置和脚本
    Check {
        #[command(flatten)]
        args: CheckCommand,
    },

    /// 执行脚本
    Run {
        #[command(flatten)]
        args: RunCommand,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("motus_cli=info".parse()?)
                .add_directive("motus_driver=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(config),
        Commands::Check { args } => args.execute(config),
        Commands::Run { args } => args.execute(config),
    }
}
