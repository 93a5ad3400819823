//! 后台服务线程
//!
//! 后台调度模型下按固定周期推进服务例程，直到运行标志被清除。

use crate::coordinator::MotionContext;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, trace};

/// 服务线程循环
///
/// # 参数
/// - `ctx`: 共享上下文（注册表锁 + 快照）
/// - `is_running`: 运行标志，协调器 Drop 时清除
pub(crate) fn service_loop(ctx: Arc<MotionContext>, is_running: Arc<AtomicBool>) {
    // 设置线程优先级（可选 feature）
    #[cfg(feature = "realtime")]
    {
        use thread_priority::*;
        use tracing::warn;

        match set_current_thread_priority(ThreadPriority::Max) {
            Ok(_) => {
                info!("Service thread priority set to MAX (realtime)");
            },
            Err(e) => {
                warn!(
                    "Failed to set service thread priority: {}. \
                    On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                    e
                );
            },
        }
    }

    let tick = Duration::from_micros(ctx.service.tick_us.max(1));
    info!("Service thread started (tick {:?})", tick);

    let mut passes: u64 = 0;
    let mut overruns: u64 = 0;

    while is_running.load(Ordering::Acquire) {
        let started = Instant::now();
        ctx.service_pass();
        passes += 1;

        // 使用 spin_sleep 获得亚毫秒级的周期精度
        let elapsed = started.elapsed();
        if let Some(rest) = tick.checked_sub(elapsed) {
            spin_sleep::sleep(rest);
        } else {
            overruns += 1;
            trace!("Service pass took {:?}, longer than tick {:?}", elapsed, tick);
        }
    }

    info!(
        "Service thread stopped after {} passes ({} overruns)",
        passes, overruns
    );
}
