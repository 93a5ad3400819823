//! 集成测试公共工具

#![allow(dead_code)]

use motus_driver::{CoordinatorBuilder, MotionCoordinator};
use motus_types::{
    ActuatorId, CoordinatorConfig, LinearConfig, ManualClock, RampProfile, RotaryConfig,
    SchedulingModel, Timestamp,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

pub const RAMPED: ActuatorId = ActuatorId(0);
pub const FIXED: ActuatorId = ActuatorId(1);
pub const DC: ActuatorId = ActuatorId(2);
pub const DC_SMALL: ActuatorId = ActuatorId(3);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 台架配置：两个步进电机（梯形 / 无加减速）+ 两组直流电机
pub fn bench_config() -> CoordinatorConfig {
    let mut config = CoordinatorConfig::new()
        .with_rotary(RotaryConfig::new("stepper1"))
        .with_rotary(RotaryConfig::new("stepper2").with_ramp(RampProfile::None))
        .with_linear(LinearConfig::new("dc_3000"))
        .with_linear(LinearConfig::new("dc1_300"))
        .with_model(SchedulingModel::Polled);
    config.service.poll_interval_us = 100;
    config
}

/// 纯协作模型 + 手动时钟
pub fn polled(start: u32) -> (MotionCoordinator, Arc<ManualClock>) {
    init_tracing();
    let clock = Arc::new(ManualClock::new(Timestamp(start)));
    let coordinator = CoordinatorBuilder::new(bench_config())
        .clock(clock.clone())
        .build()
        .unwrap();
    (coordinator, clock)
}

/// 等待条件成立；真实时间仅作为防挂死的上限
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let limit = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < limit, "timed out waiting for: {}", what);
        thread::sleep(Duration::from_micros(200));
    }
}

/// 给阻塞线程一点时间运行（只用于断言"尚未返回"）
pub fn settle() {
    thread::sleep(Duration::from_millis(5));
}
