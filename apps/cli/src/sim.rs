//! 模拟输出
//!
//! 没有接硬件时，把协调器推送的输出写进日志，并累计每个步进电机发出的步数。

use motus_driver::{OutputDriver, OutputEvent};
use motus_types::CoordinatorConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{info, trace};

pub struct LoggingOutput {
    names: Vec<String>,
    last: Vec<(bool, i32)>,
    steps: Arc<Vec<AtomicI64>>,
}

impl LoggingOutput {
    pub fn new(config: &CoordinatorConfig) -> Self {
        let names: Vec<String> = config.actuators.iter().map(|a| a.name().to_string()).collect();
        let steps = Arc::new(names.iter().map(|_| AtomicI64::new(0)).collect());
        Self {
            last: vec![(false, 0); names.len()],
            names,
            steps,
        }
    }

    /// 累计步数计数器（按注册表顺序）
    pub fn step_counters(&self) -> Arc<Vec<AtomicI64>> {
        self.steps.clone()
    }
}

impl OutputDriver for LoggingOutput {
    fn write(&mut self, event: &OutputEvent) {
        let i = event.id.index();
        let (Some(name), Some(counter)) = (self.names.get(i), self.steps.get(i)) else {
            return;
        };

        let total = counter.fetch_add(event.output.steps as i64, Ordering::Relaxed)
            + event.output.steps as i64;

        let state = (event.output.enabled, event.output.signed_magnitude);
        if self.last[i] == state {
            return;
        }
        let was_enabled = self.last[i].0;
        self.last[i] = state;

        match (was_enabled, state.0) {
            (false, true) => info!("{} enabled at {}", name, state.1),
            (true, false) => info!("{} disabled ({} steps emitted)", name, total),
            _ => trace!("{} -> {}", name, state.1),
        }
    }
}
