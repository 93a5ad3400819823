//! 配置管理命令
//!
//! 执行器配置默认位于 `<config_dir>/motus/config.toml`，可用 `--config` 覆盖。

use anyhow::{Context, Result};
use clap::Subcommand;
use motus_types::{CoordinatorConfig, LinearConfig, RotaryConfig};
use std::fs;
use std::path::{Path, PathBuf};

use crate::validation::InputFile;

/// 配置目录
fn config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("motus");
    Ok(path)
}

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = config_dir()?;
    path.push("config.toml");
    Ok(path)
}

/// 加载执行器配置（显式路径优先）
pub fn load_config(explicit: Option<&Path>) -> Result<CoordinatorConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    InputFile::Config
        .check(&path)
        .context("找不到执行器配置，可先运行 `motus-cli config init`")?;

    CoordinatorConfig::load_from_file(&path)
        .with_context(|| format!("加载配置失败: {}", path.display()))
}

/// 示例配置：三个步进电机，一个大功率直流电机，两组小直流电机
pub fn sample_config() -> CoordinatorConfig {
    let stepper = |name: &str| RotaryConfig::new(name).with_profile(12000.0, 8000.0, 8000.0);
    CoordinatorConfig::new()
        .with_rotary(stepper("stepper1"))
        .with_rotary(stepper("stepper2"))
        .with_rotary(stepper("stepper3"))
        .with_linear(LinearConfig::new("dc_3000"))
        .with_linear(LinearConfig::new("dc1_300"))
        .with_linear(LinearConfig::new("dc2_300"))
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印配置文件路径
    Path,

    /// 写入示例配置
    Init {
        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 打印生效的配置
    Show,
}

impl ConfigCommand {
    pub fn execute(self, explicit: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Path => {
                let path = match explicit {
                    Some(path) => path.to_path_buf(),
                    None => default_config_path()?,
                };
                println!("{}", path.display());
                Ok(())
            },

            ConfigCommand::Init { force } => Self::init_(explicit, force),

            ConfigCommand::Show => {
                let config = load_config(explicit)?;
                let content = toml::to_string_pretty(&config).context("序列化配置失败")?;
                print!("{}", content);
                Ok(())
            },
        }
    }

    fn init_(explicit: Option<&Path>, force: bool) -> Result<()> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };

        if path.exists() && !force {
            anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("创建配置目录失败")?;
        }

        let content = toml::to_string_pretty(&sample_config()).context("序列化配置失败")?;
        fs::write(&path, content).context("写入配置文件失败")?;

        println!("✅ 已写入示例配置: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_round_trips_through_toml() {
        let sample = sample_config();
        let content = toml::to_string_pretty(&sample).unwrap();
        let parsed = CoordinatorConfig::from_toml_str(&content).unwrap();
        assert_eq!(parsed, sample);
        assert_eq!(parsed.actuators.len(), 6);
    }

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        ConfigCommand::Init { force: false }.execute(Some(&path)).unwrap();
        assert!(ConfigCommand::Init { force: false }.execute(Some(&path)).is_err());
        ConfigCommand::Init { force: true }.execute(Some(&path)).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(config.id_of("dc2_300").is_some());
    }

    #[test]
    fn test_load_missing_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
