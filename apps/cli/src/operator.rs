//! 操作员控制
//!
//! - Ctrl-C（运行中）：暂停全部执行器，剩余时长 / 目标被保留
//! - Enter（暂停中）：恢复
//! - Ctrl-C（暂停中）：停止全部执行器并中止脚本

use anyhow::{Context, Result};
use motus_driver::MotionCoordinator;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use tracing::warn;

pub fn install(coordinator: &Arc<MotionCoordinator>, abort: Arc<AtomicBool>) -> Result<()> {
    let weak: Weak<MotionCoordinator> = Arc::downgrade(coordinator);
    let pause = coordinator.pause_handle();

    ctrlc::set_handler(move || {
        if !pause.is_paused() {
            pause.pause();
            eprintln!("\n⏸️  已暂停：按 Enter 继续，再按 Ctrl-C 停止全部执行器");
            return;
        }

        warn!("Operator requested stop");
        abort.store(true, Ordering::Release);
        if let Some(coordinator) = weak.upgrade() {
            coordinator.stop_all();
        }
        pause.resume();
        eprintln!("\n🛑 已停止全部执行器");
    })
    .context("安装 Ctrl-C 处理器失败")?;

    let pause = coordinator.pause_handle();
    thread::Builder::new()
        .name("motus-operator".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                if line.is_err() {
                    break;
                }
                if pause.resume() {
                    println!("▶️  继续执行");
                }
            }
        })
        .context("启动输入线程失败")?;

    Ok(())
}
