//! 运动协调器
//!
//! 命令调用与服务例程共享同一把锁（注册表 + 输出驱动），任何读-改-写序列都不会交错。
//! 每次修改结束时在锁内发布一份 [`MotionSnapshot`]，读取类接口（`get_position`、`read`、
//! `snapshot`）走 ArcSwap，不与服务例程竞争锁。
//!
//! # 调度模型
//!
//! - [`SchedulingModel::Background`]：后台线程按 `tick_us` 周期推进服务例程
//! - [`SchedulingModel::Polled`]：只有阻塞调用（或外部调用 [`MotionCoordinator::service`]）推进
//!
//! 阻塞调用在每次轮询中都调用 [`MotionCoordinator::drive`]，两种模型下行为一致。

use crate::batch::Member;
use crate::output::{OutputDriver, OutputEvent};
use crate::pause::PauseController;
use crate::registry::{ActuatorSnapshot, ModeParams, Registry};
use crate::rotary::RotaryProfile;
use crate::service::service_loop;
use arc_swap::ArcSwap;
use motus_types::clock::MAX_DURATION_MS;
use motus_types::{
    ActuatorId, Clock, CommandStatus, Completion, Direction, MotionError, RunMode,
    SchedulingModel, ServiceConfig, Timestamp,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 全部执行器在某一时刻的快照
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSnapshot {
    /// 发布时刻（协调器时钟）
    pub timestamp: Timestamp,
    /// 按注册表顺序排列
    pub actuators: Vec<ActuatorSnapshot>,
}

impl MotionSnapshot {
    pub fn get(&self, id: ActuatorId) -> Option<&ActuatorSnapshot> {
        self.actuators.get(id.index())
    }

    pub fn all_complete(&self) -> bool {
        self.actuators.iter().all(|a| a.complete)
    }
}

/// 一次下发的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Issued {
    pub status: CommandStatus,
    pub generation: u64,
    /// 截断后实际生效的幅值
    pub magnitude: u32,
}

/// 锁保护的可变部分
pub(crate) struct Engine {
    pub(crate) registry: Registry,
    output: Box<dyn OutputDriver>,
}

impl Engine {
    pub(crate) fn new(registry: Registry, output: Box<dyn OutputDriver>) -> Self {
        Self { registry, output }
    }

    fn emit(&mut self, now: Timestamp, id: ActuatorId) -> Result<(), MotionError> {
        let output = self.registry.current_output(id)?;
        self.output.write(&OutputEvent {
            timestamp: now,
            id,
            output,
        });
        Ok(())
    }

    /// 下发运行模式（幅值截断到该执行器上限），并立即推送输出
    pub(crate) fn issue(
        &mut self,
        now: Timestamp,
        id: ActuatorId,
        mode: RunMode,
        direction: Direction,
        magnitude: u32,
    ) -> Result<Issued, MotionError> {
        let max = self.registry.get(id)?.max_magnitude();
        let applied = magnitude.min(max);
        let status = if applied < magnitude {
            warn!(
                "Actuator {} magnitude {} clamped to {}",
                id, magnitude, applied
            );
            CommandStatus::Clamped {
                requested: magnitude,
                applied,
            }
        } else {
            CommandStatus::Accepted
        };

        let generation = self.registry.set_mode(
            id,
            mode,
            ModeParams {
                direction,
                magnitude: applied,
            },
        )?;
        self.registry.stamp(id, now)?;
        self.emit(now, id)?;

        debug!(
            "Actuator {} -> {} ({:?}, magnitude {}, generation {})",
            id,
            mode.name(),
            direction,
            applied,
            generation
        );
        Ok(Issued {
            status,
            generation,
            magnitude: applied,
        })
    }

    /// 定时运行；0 时长等价于 stop，返回 None
    pub(crate) fn issue_timed(
        &mut self,
        now: Timestamp,
        id: ActuatorId,
        duration_ms: u32,
        magnitude: u32,
        direction: Direction,
    ) -> Result<Option<(Issued, Timestamp)>, MotionError> {
        if duration_ms == 0 {
            self.stop(now, id)?;
            debug!("Actuator {} zero duration, stopped", id);
            return Ok(None);
        }

        let duration_ms = if duration_ms > MAX_DURATION_MS {
            warn!(
                "Actuator {} duration {} ms clamped to {} ms",
                id, duration_ms, MAX_DURATION_MS
            );
            MAX_DURATION_MS
        } else {
            duration_ms
        };

        let deadline = now.wrapping_add(duration_ms);
        let issued = self.issue(now, id, RunMode::Timed { deadline }, direction, magnitude)?;
        Ok(Some((issued, deadline)))
    }

    /// 按相对距离运行；距离不为正时返回 None
    pub(crate) fn issue_distance(
        &mut self,
        now: Timestamp,
        id: ActuatorId,
        distance: i64,
        direction: Direction,
    ) -> Result<Option<(Issued, i64)>, MotionError> {
        let position = self.rotary_position(id, "distance")?;
        if distance <= 0 {
            return Ok(None);
        }
        let target = position.saturating_add(direction.sign() * distance);
        self.issue_distance_to(now, id, target)
    }

    /// 朝绝对目标运行；已经在目标上时返回 None
    pub(crate) fn issue_distance_to(
        &mut self,
        now: Timestamp,
        id: ActuatorId,
        target: i64,
    ) -> Result<Option<(Issued, i64)>, MotionError> {
        let position = self.rotary_position(id, "distance")?;
        if position == target {
            return Ok(None);
        }
        let direction = Direction::from_signed(target.saturating_sub(position));
        let max = self.registry.get(id)?.max_magnitude();
        let issued = self.issue(now, id, RunMode::Distance { target }, direction, max)?;
        Ok(Some((issued, target)))
    }

    fn rotary_position(&self, id: ActuatorId, operation: &'static str) -> Result<i64, MotionError> {
        self.registry
            .get(id)?
            .position()
            .ok_or(MotionError::UnsupportedOperation { id, operation })
    }

    /// 外部 stop：清空并递增 generation
    pub(crate) fn stop(&mut self, now: Timestamp, id: ActuatorId) -> Result<u64, MotionError> {
        let generation = self.registry.clear(id)?;
        self.emit(now, id)?;
        Ok(generation)
    }

    pub(crate) fn stop_all(&mut self, now: Timestamp) {
        for id in self.registry.ids() {
            if let Err(e) = self.stop(now, id) {
                warn!("stop_all: {}", e);
            }
        }
    }

    /// 暂停路径上的停机，不改变 generation
    pub(crate) fn halt(&mut self, now: Timestamp, id: ActuatorId) -> Result<(), MotionError> {
        self.registry.halt(id)?;
        self.emit(now, id)
    }

    /// 一轮服务例程：按注册表顺序推进每个执行器并推送输出
    pub(crate) fn pass(&mut self, now: Timestamp) {
        let Engine { registry, output } = self;
        registry.advance_all(now, |id, out| {
            output.write(&OutputEvent {
                timestamp: now,
                id,
                output: out,
            });
        });
    }
}

/// 协调器共享上下文（服务线程与命令调用方共享）
pub(crate) struct MotionContext {
    engine: Mutex<Engine>,
    published: ArcSwap<MotionSnapshot>,
    clock: Arc<dyn Clock>,
    pub(crate) pause: Arc<PauseController>,
    pub(crate) service: ServiceConfig,
}

impl MotionContext {
    pub(crate) fn new(
        engine: Engine,
        clock: Arc<dyn Clock>,
        pause: Arc<PauseController>,
        service: ServiceConfig,
    ) -> Self {
        let published = ArcSwap::from_pointee(MotionSnapshot {
            timestamp: clock.now(),
            actuators: engine.registry.snapshots(),
        });
        Self {
            engine: Mutex::new(engine),
            published,
            clock,
            pause,
            service,
        }
    }

    /// 在锁内执行一次修改，结束前发布快照
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut Engine, Timestamp) -> R) -> R {
        let mut engine = self.engine.lock();
        let now = self.clock.now();
        let result = f(&mut *engine, now);
        self.published.store(Arc::new(MotionSnapshot {
            timestamp: now,
            actuators: engine.registry.snapshots(),
        }));
        result
    }

    pub(crate) fn service_pass(&self) {
        self.mutate(|engine, now| engine.pass(now));
    }

    pub(crate) fn load(&self) -> Arc<MotionSnapshot> {
        self.published.load_full()
    }
}

fn logged<T>(result: Result<T, MotionError>) -> Result<T, MotionError> {
    result.inspect_err(|e| warn!("Command rejected: {}", e))
}

/// 运动协调器
///
/// 可以在多个线程间共享引用（`&MotionCoordinator` 或 `Arc<MotionCoordinator>`）：
/// 一个线程阻塞等待时，另一个线程可以 `stop` / `stop_all` 取消它。
///
/// # Example
///
/// ```
/// use motus_driver::CoordinatorBuilder;
/// use motus_types::{CoordinatorConfig, Direction, LinearConfig, RotaryConfig, SchedulingModel};
///
/// let config = CoordinatorConfig::new()
///     .with_rotary(RotaryConfig::new("stepper1"))
///     .with_linear(LinearConfig::new("dc_3000"))
///     .with_model(SchedulingModel::Polled);
/// let coordinator = CoordinatorBuilder::new(config).build().unwrap();
///
/// let dc = coordinator.id_of("dc_3000").unwrap();
/// coordinator.run(dc, 200, Direction::Ccw).unwrap();
/// assert!(!coordinator.is_complete(dc).unwrap());
/// coordinator.stop(dc).unwrap();
/// assert!(coordinator.is_complete(dc).unwrap());
/// ```
pub struct MotionCoordinator {
    ctx: Arc<MotionContext>,
    is_running: Arc<AtomicBool>,
    service_thread: Option<JoinHandle<()>>,
}

impl MotionCoordinator {
    /// 按配置的调度模型启动（后台模型下启动服务线程）
    pub(crate) fn start(ctx: Arc<MotionContext>) -> Result<Self, MotionError> {
        let is_running = Arc::new(AtomicBool::new(true));

        let service_thread = match ctx.service.model {
            SchedulingModel::Background => {
                let ctx_clone = ctx.clone();
                let is_running_clone = is_running.clone();
                let handle = std::thread::Builder::new()
                    .name("motus-service".into())
                    .spawn(move || service_loop(ctx_clone, is_running_clone))
                    .map_err(|e| MotionError::ServiceThread(e.to_string()))?;
                Some(handle)
            },
            SchedulingModel::Polled => None,
        };

        info!(
            "Motion coordinator started ({:?}, {} actuators)",
            ctx.service.model,
            ctx.load().actuators.len()
        );

        Ok(Self {
            ctx,
            is_running,
            service_thread,
        })
    }

    // ============================================================
    // 非阻塞命令
    // ============================================================

    /// 持续运行，直到被停止
    ///
    /// 幅值：步进电机为速度（步/秒），直流电机为 PWM；超过上限时截断。
    pub fn run(
        &self,
        id: ActuatorId,
        magnitude: u32,
        direction: Direction,
    ) -> Result<CommandStatus, MotionError> {
        let issued = self
            .ctx
            .mutate(|engine, now| engine.issue(now, id, RunMode::Continuous, direction, magnitude));
        Ok(logged(issued)?.status)
    }

    /// 以最大幅值持续运行
    pub fn run_infinite(
        &self,
        id: ActuatorId,
        direction: Direction,
    ) -> Result<CommandStatus, MotionError> {
        let issued = self.ctx.mutate(|engine, now| {
            let max = engine.registry.get(id)?.max_magnitude();
            engine.issue(now, id, RunMode::Continuous, direction, max)
        });
        Ok(logged(issued)?.status)
    }

    /// 定时运行；`duration_ms == 0` 等价于 `stop(id)`
    pub fn run_for_duration(
        &self,
        id: ActuatorId,
        duration_ms: u32,
        magnitude: u32,
        direction: Direction,
    ) -> Result<CommandStatus, MotionError> {
        let issued = self.ctx.mutate(|engine, now| {
            engine.issue_timed(now, id, duration_ms, magnitude, direction)
        });
        Ok(match logged(issued)? {
            Some((issued, _)) => issued.status,
            None => CommandStatus::ImplicitStop,
        })
    }

    /// 按距离运行（仅 Rotary）；`distance <= 0` 时忽略
    pub fn run_for_distance(
        &self,
        id: ActuatorId,
        distance: i64,
        direction: Direction,
    ) -> Result<CommandStatus, MotionError> {
        let issued = self
            .ctx
            .mutate(|engine, now| engine.issue_distance(now, id, distance, direction));
        Ok(match logged(issued)? {
            Some((issued, _)) => issued.status,
            None => {
                warn!("Actuator {} distance {} ignored", id, distance);
                CommandStatus::Ignored
            },
        })
    }

    /// 立即停止：清空运行模式、幅值归零、禁用输出（幂等）
    pub fn stop(&self, id: ActuatorId) -> Result<CommandStatus, MotionError> {
        let stopped = self.ctx.mutate(|engine, now| engine.stop(now, id));
        logged(stopped)?;
        debug!("Actuator {} stopped", id);
        Ok(CommandStatus::Accepted)
    }

    pub fn stop_all(&self) {
        self.ctx.mutate(|engine, now| engine.stop_all(now));
        info!("All actuators stopped");
    }

    /// 在线更新步进电机参数（非正数回退到默认值），不改变当前运行模式
    pub fn set_profile(
        &self,
        id: ActuatorId,
        max_speed: f32,
        acceleration: f32,
        deceleration: f32,
    ) -> Result<CommandStatus, MotionError> {
        let updated = self.ctx.mutate(|engine, _| {
            let ramp = engine
                .registry
                .get(id)?
                .ramp()
                .ok_or(MotionError::UnsupportedOperation {
                    id,
                    operation: "set_profile",
                })?;
            let profile = RotaryProfile::sanitized(max_speed, acceleration, deceleration, ramp);
            engine.registry.set_profile(id, profile)?;
            Ok(profile)
        });
        let profile = logged(updated)?;
        debug!("Actuator {} profile updated: {:?}", id, profile);
        Ok(CommandStatus::Accepted)
    }

    /// 重设步进电机当前位置；进行中的距离运行随之取消，等待它的阻塞调用返回 `Cancelled`
    pub fn set_position(&self, id: ActuatorId, position: i64) -> Result<CommandStatus, MotionError> {
        let updated = self.ctx.mutate(|engine, now| {
            engine.registry.set_position(id, position)?;
            engine.emit(now, id)
        });
        logged(updated)?;
        debug!("Actuator {} position set to {}", id, position);
        Ok(CommandStatus::Accepted)
    }

    // ============================================================
    // 读取（无锁）
    // ============================================================

    /// 最近一次提交的绝对位置（仅 Rotary）
    pub fn get_position(&self, id: ActuatorId) -> Result<i64, MotionError> {
        self.read(id)?
            .position
            .ok_or(MotionError::UnsupportedOperation {
                id,
                operation: "position",
            })
    }

    pub fn read(&self, id: ActuatorId) -> Result<ActuatorSnapshot, MotionError> {
        self.ctx
            .load()
            .get(id)
            .cloned()
            .ok_or(MotionError::InvalidActuator { id })
    }

    pub fn snapshot(&self) -> Arc<MotionSnapshot> {
        self.ctx.load()
    }

    /// 完成判定（与阻塞调用使用同一判定）
    pub fn is_complete(&self, id: ActuatorId) -> Result<bool, MotionError> {
        Ok(self.read(id)?.complete)
    }

    pub fn id_of(&self, name: &str) -> Option<ActuatorId> {
        self.ctx
            .load()
            .actuators
            .iter()
            .find(|a| &*a.name == name)
            .map(|a| a.id)
    }

    pub fn len(&self) -> usize {
        self.ctx.load().actuators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ============================================================
    // 服务例程与暂停
    // ============================================================

    pub fn scheduling(&self) -> SchedulingModel {
        self.ctx.service.model
    }

    /// 推进服务例程的统一钩子：纯协作模型下执行一轮，后台模型下什么也不做
    pub fn drive(&self) {
        if self.ctx.service.model == SchedulingModel::Polled {
            self.ctx.service_pass();
        }
    }

    /// 无条件执行一轮服务例程（供外部定时源调用）
    pub fn service(&self) {
        self.ctx.service_pass();
    }

    /// 暂停控制句柄，可交给按键、信号处理等其他上下文
    pub fn pause_handle(&self) -> Arc<PauseController> {
        self.ctx.pause.clone()
    }

    pub fn is_paused(&self) -> bool {
        self.ctx.pause.is_paused()
    }

    // ============================================================
    // 阻塞命令
    // ============================================================

    /// 定时运行并等待完成
    ///
    /// 暂停期间冻结剩余时长，恢复后按剩余时长重新下发；
    /// 其他上下文调用 `stop` / `stop_all` 或对同一执行器下发新命令时返回 [`Completion::Cancelled`]。
    pub fn run_for_duration_blocking(
        &self,
        id: ActuatorId,
        duration_ms: u32,
        magnitude: u32,
        direction: Direction,
    ) -> Result<Completion, MotionError> {
        let issued = self.ctx.mutate(|engine, now| {
            engine.issue_timed(now, id, duration_ms, magnitude, direction)
        });
        let Some((issued, deadline)) = logged(issued)? else {
            return Ok(Completion::Skipped);
        };

        let mut members = [Member::timed(id, &issued, deadline, direction)];
        Ok(self.wait_members(&mut members))
    }

    /// 按距离运行并等待到达目标
    ///
    /// 暂停期间停机，恢复后朝原来的绝对目标继续运行。
    pub fn run_for_distance_blocking(
        &self,
        id: ActuatorId,
        distance: i64,
        direction: Direction,
    ) -> Result<Completion, MotionError> {
        let issued = self
            .ctx
            .mutate(|engine, now| engine.issue_distance(now, id, distance, direction));
        let Some((issued, target)) = logged(issued)? else {
            warn!("Actuator {} distance {} ignored", id, distance);
            return Ok(Completion::Skipped);
        };

        let mut members = [Member::distance(id, &issued, target)];
        Ok(self.wait_members(&mut members))
    }

    pub(crate) fn context(&self) -> &MotionContext {
        &self.ctx
    }

    /// 阻塞循环每轮的让出
    pub(crate) fn yield_now(&self) {
        match self.ctx.service.poll_interval_us {
            0 => std::thread::yield_now(),
            us => spin_sleep::sleep(Duration::from_micros(us)),
        }
    }
}

impl Drop for MotionCoordinator {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::Release);

        if let Some(handle) = self.service_thread.take()
            && handle.join().is_err()
        {
            error!("Service thread panicked");
        }

        // 退出前禁用所有输出
        self.ctx.mutate(|engine, now| engine.stop_all(now));
        info!("Motion coordinator shut down");
    }
}
