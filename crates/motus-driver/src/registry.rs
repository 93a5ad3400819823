//! 执行器运行时注册表
//!
//! 固定大小：初始化时按配置创建全部记录，进程生命周期内不增不减。
//! 注册表本身不加锁，由 [`MotionCoordinator`](crate::MotionCoordinator) 放在同一把锁里，
//! 保证命令调用和服务例程互斥，任何人都看不到半更新的记录。

use crate::linear::LinearState;
use crate::output::ActuatorOutput;
use crate::rotary::{RotaryProfile, RotaryState};
use motus_types::{
    ActuatorConfig, ActuatorId, ActuatorKind, CoordinatorConfig, Direction, MotionError,
    RampProfile, RunMode, Timestamp, signed_diff,
};
use std::sync::Arc;
use tracing::trace;

/// 按类别区分的运行时状态
#[derive(Debug, Clone)]
pub(crate) enum KindState {
    Rotary(RotaryState),
    Linear(LinearState),
}

/// 设置模式时附带的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeParams {
    pub direction: Direction,
    /// 已截断的幅值
    pub magnitude: u32,
}

/// 单个执行器的运行时记录
#[derive(Debug, Clone)]
pub struct ActuatorRecord {
    name: Arc<str>,
    state: KindState,
    mode: RunMode,
    direction: Direction,
    magnitude: u32,
    /// 每次外部修改递增，阻塞调用据此判断自己是否被取消
    generation: u64,
    /// 上一次推进到的时刻；空闲时为 None，由下发命令重新起算
    since: Option<Timestamp>,
}

/// `from` 到 `to` 经过的秒数（倒退按 0 计）
fn elapsed_s(from: Timestamp, to: Timestamp) -> f32 {
    signed_diff(to, from).max(0) as f32 / 1000.0
}

impl ActuatorRecord {
    fn new(config: &ActuatorConfig) -> Self {
        let state = match config {
            ActuatorConfig::Rotary(c) => KindState::Rotary(RotaryState::new(RotaryProfile::from(c))),
            ActuatorConfig::Linear(c) => KindState::Linear(LinearState::new(c)),
        };
        Self {
            name: Arc::from(config.name()),
            state,
            mode: RunMode::Idle,
            direction: Direction::Cw,
            magnitude: 0,
            generation: 0,
            since: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ActuatorKind {
        match self.state {
            KindState::Rotary(_) => ActuatorKind::Rotary,
            KindState::Linear(_) => ActuatorKind::Linear,
        }
    }

    #[inline]
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    /// 幅值上限：步进电机为最大速度（取整），直流电机为 PWM 满量程
    pub fn max_magnitude(&self) -> u32 {
        match &self.state {
            KindState::Rotary(r) => r.profile().max_speed as u32,
            KindState::Linear(l) => l.max_magnitude(),
        }
    }

    pub fn position(&self) -> Option<i64> {
        match &self.state {
            KindState::Rotary(r) => Some(r.position()),
            KindState::Linear(_) => None,
        }
    }

    /// 加减速曲线（仅 Rotary）
    pub fn ramp(&self) -> Option<RampProfile> {
        match &self.state {
            KindState::Rotary(r) => Some(r.profile().ramp),
            KindState::Linear(_) => None,
        }
    }

    fn rotary_mut(&mut self) -> Option<&mut RotaryState> {
        match &mut self.state {
            KindState::Rotary(r) => Some(r),
            KindState::Linear(_) => None,
        }
    }

    /// 完成判定
    ///
    /// 没有截止时间、没有距离目标、不在持续运行、（步进电机）没有剩余运动。
    /// 单个阻塞调用与批量同步器共用这一判定。
    pub fn is_complete(&self) -> bool {
        let no_deadline = self.mode.deadline().is_none();
        let no_target = self.mode.target().is_none();
        let settled = match &self.state {
            KindState::Rotary(r) => r.speed() == 0.0 && self.mode != RunMode::RampDown,
            KindState::Linear(_) => true,
        };
        no_deadline && no_target && settled && self.mode != RunMode::Continuous
    }

    /// 当前应推给输出驱动的值（不含步脉冲）
    fn output(&self, steps: i64) -> ActuatorOutput {
        let running = !self.mode.is_idle();
        match &self.state {
            KindState::Rotary(r) => ActuatorOutput {
                enabled: running,
                signed_magnitude: r.speed().round() as i32,
                steps: steps.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            },
            KindState::Linear(_) => ActuatorOutput {
                enabled: running,
                signed_magnitude: LinearState::signed_output(running, self.magnitude, self.direction),
                steps: 0,
            },
        }
    }

    /// 立即停止：清空模式、幅值归零（不递增 generation）
    fn halt(&mut self) {
        self.mode = RunMode::Idle;
        self.magnitude = 0;
        self.since = None;
        if let KindState::Rotary(r) = &mut self.state {
            r.halt();
        }
    }

    fn target_speed(&self) -> f32 {
        self.direction.sign() as f32 * self.magnitude as f32
    }

    /// 推进一轮服务例程，返回本轮输出
    fn advance(&mut self, now: Timestamp) -> ActuatorOutput {
        let mut since = self.since;
        let mut steps = 0;

        // 1. 定时截止：先按指令速度走完截止前的最后一段，再停机
        if let RunMode::Timed { deadline } = self.mode
            && deadline.has_elapsed(now)
        {
            let target_speed = self.target_speed();
            if let (KindState::Rotary(r), Some(from)) = (&mut self.state, since) {
                steps += r.advance_velocity(target_speed, elapsed_s(from, deadline));
            }
            since = since.map(|_| deadline);

            let ramped = match &self.state {
                KindState::Rotary(r) => r.is_ramped() && r.speed() != 0.0,
                KindState::Linear(_) => false,
            };
            if ramped {
                self.mode = RunMode::RampDown;
                self.magnitude = 0;
            } else {
                self.halt();
            }
            trace!("{} timed run elapsed at {:?}", self.name, now);
        }

        let dt_s = since.map_or(0.0, |from| elapsed_s(from, now));
        let target_speed = self.target_speed();
        let direction = self.direction;
        let mode = self.mode;

        steps += match (&mut self.state, mode) {
            // 2. 距离目标
            (KindState::Rotary(r), RunMode::Distance { target }) => {
                let passed = (r.position() - target) * direction.sign() >= 0;
                if passed {
                    r.snap_to(target);
                    self.mode = RunMode::Idle;
                    self.magnitude = 0;
                    0
                } else {
                    let (delta, reached) = r.advance_distance(target, dt_s);
                    if reached {
                        r.snap_to(target);
                        self.mode = RunMode::Idle;
                        self.magnitude = 0;
                        trace!("{} reached target {}", self.name, target);
                    }
                    delta
                }
            },
            // 减速停止阶段
            (KindState::Rotary(r), RunMode::RampDown) => {
                let delta = r.advance_velocity(0.0, dt_s);
                if r.speed() == 0.0 {
                    self.mode = RunMode::Idle;
                }
                delta
            },
            // 3. 持续运行 / 定时运行中：恒定指令速度
            (KindState::Rotary(r), RunMode::Continuous | RunMode::Timed { .. }) => {
                r.advance_velocity(target_speed, dt_s)
            },
            (KindState::Rotary(r), RunMode::Idle) => {
                r.halt();
                0
            },
            (KindState::Linear(_), _) => 0,
        };

        self.since = if self.mode.is_idle() { None } else { Some(now) };
        self.output(steps)
    }
}

/// 只读快照
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorSnapshot {
    pub id: ActuatorId,
    pub name: Arc<str>,
    pub kind: ActuatorKind,
    pub mode: RunMode,
    pub direction: Direction,
    pub magnitude: u32,
    /// 绝对位置（仅 Rotary）
    pub position: Option<i64>,
    /// 当前带符号速度（步进电机，步/秒；直流电机为带符号幅值）
    pub speed: f32,
    pub generation: u64,
    pub complete: bool,
}

impl ActuatorSnapshot {
    #[inline]
    pub fn running(&self) -> bool {
        !self.mode.is_idle()
    }
}

/// 注册表
#[derive(Debug, Clone)]
pub struct Registry {
    records: Vec<ActuatorRecord>,
}

impl Registry {
    pub fn new(config: &CoordinatorConfig) -> Self {
        Self {
            records: config.actuators.iter().map(ActuatorRecord::new).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ActuatorId> + use<> {
        (0..self.records.len()).map(ActuatorId)
    }

    pub fn id_of(&self, name: &str) -> Option<ActuatorId> {
        self.records
            .iter()
            .position(|r| r.name() == name)
            .map(ActuatorId)
    }

    pub fn get(&self, id: ActuatorId) -> Result<&ActuatorRecord, MotionError> {
        self.records
            .get(id.index())
            .ok_or(MotionError::InvalidActuator { id })
    }

    pub(crate) fn get_mut(&mut self, id: ActuatorId) -> Result<&mut ActuatorRecord, MotionError> {
        self.records
            .get_mut(id.index())
            .ok_or(MotionError::InvalidActuator { id })
    }

    /// 切换运行模式（原子地清除其他所有模式），返回新的 generation
    pub fn set_mode(
        &mut self,
        id: ActuatorId,
        mode: RunMode,
        params: ModeParams,
    ) -> Result<u64, MotionError> {
        let record = self.get_mut(id)?;
        if matches!(mode, RunMode::Distance { .. } | RunMode::RampDown)
            && record.kind() == ActuatorKind::Linear
        {
            return Err(MotionError::UnsupportedOperation {
                id,
                operation: mode.name(),
            });
        }

        if mode.is_idle() {
            record.halt();
        } else {
            record.mode = mode;
            record.direction = params.direction;
            record.magnitude = params.magnitude;
        }
        record.generation = record.generation.wrapping_add(1);
        Ok(record.generation)
    }

    /// 是否全部空闲（没有任何执行器在运动）
    pub fn all_idle(&self) -> bool {
        self.records.iter().all(|r| r.mode.is_idle())
    }

    /// 在线更新步进电机参数，已下发的幅值按新上限截断
    pub fn set_profile(&mut self, id: ActuatorId, profile: RotaryProfile) -> Result<(), MotionError> {
        let record = self.get_mut(id)?;
        let rotary = record.rotary_mut().ok_or(MotionError::UnsupportedOperation {
            id,
            operation: "set_profile",
        })?;
        rotary.set_profile(profile);
        record.magnitude = record.magnitude.min(profile.max_speed as u32);
        Ok(())
    }

    /// 重设步进电机当前位置
    ///
    /// 正在进行的距离运行以旧坐标为目标，重设后随即取消（递增 generation），
    /// 位置保持为调用方给定的值。
    pub fn set_position(&mut self, id: ActuatorId, position: i64) -> Result<(), MotionError> {
        let record = self.get_mut(id)?;
        record
            .rotary_mut()
            .ok_or(MotionError::UnsupportedOperation {
                id,
                operation: "set_position",
            })?
            .set_position(position);

        if record.mode.target().is_some() {
            record.halt();
            record.generation = record.generation.wrapping_add(1);
            trace!("{} distance run cancelled by set_position", record.name);
        }
        Ok(())
    }

    /// 命令生效时刻：空闲记录从 `now` 开始计时，运动中的记录沿用上一次推进时刻
    pub(crate) fn stamp(&mut self, id: ActuatorId, now: Timestamp) -> Result<(), MotionError> {
        let record = self.get_mut(id)?;
        if !record.mode.is_idle() && record.since.is_none() {
            record.since = Some(now);
        }
        Ok(())
    }

    /// 停止并清空（递增 generation，等价于外部 stop）
    pub fn clear(&mut self, id: ActuatorId) -> Result<u64, MotionError> {
        let record = self.get_mut(id)?;
        record.halt();
        record.generation = record.generation.wrapping_add(1);
        Ok(record.generation)
    }

    /// 暂停路径上的停止：不递增 generation，持有该执行器的阻塞调用仍然拥有它
    pub(crate) fn halt(&mut self, id: ActuatorId) -> Result<(), MotionError> {
        self.get_mut(id)?.halt();
        Ok(())
    }

    pub fn is_complete(&self, id: ActuatorId) -> Result<bool, MotionError> {
        Ok(self.get(id)?.is_complete())
    }

    pub fn read(&self, id: ActuatorId) -> Result<ActuatorSnapshot, MotionError> {
        let record = self.get(id)?;
        Ok(snapshot_of(id, record))
    }

    pub fn snapshots(&self) -> Vec<ActuatorSnapshot> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| snapshot_of(ActuatorId(i), r))
            .collect()
    }

    /// 当前输出（命令生效后立即推送用）
    pub(crate) fn current_output(&self, id: ActuatorId) -> Result<ActuatorOutput, MotionError> {
        Ok(self.get(id)?.output(0))
    }

    /// 按注册表顺序推进全部执行器
    pub(crate) fn advance_all(
        &mut self,
        now: Timestamp,
        mut emit: impl FnMut(ActuatorId, ActuatorOutput),
    ) {
        for (index, record) in self.records.iter_mut().enumerate() {
            let output = record.advance(now);
            emit(ActuatorId(index), output);
        }
    }
}

fn snapshot_of(id: ActuatorId, record: &ActuatorRecord) -> ActuatorSnapshot {
    let speed = match &record.state {
        KindState::Rotary(r) => r.speed(),
        KindState::Linear(_) => {
            LinearState::signed_output(!record.mode.is_idle(), record.magnitude, record.direction)
                as f32
        },
    };
    ActuatorSnapshot {
        id,
        name: record.name.clone(),
        kind: record.kind(),
        mode: record.mode,
        direction: record.direction,
        magnitude: record.magnitude,
        position: record.position(),
        speed,
        generation: record.generation,
        complete: record.is_complete(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motus_types::{LinearConfig, RotaryConfig};

    fn registry() -> Registry {
        let config = CoordinatorConfig::new()
            .with_rotary(RotaryConfig::new("ramped"))
            .with_rotary(RotaryConfig::new("fixed").with_ramp(RampProfile::None))
            .with_linear(LinearConfig::new("dc"));
        Registry::new(&config)
    }

    fn params(direction: Direction, magnitude: u32) -> ModeParams {
        ModeParams {
            direction,
            magnitude,
        }
    }

    #[test]
    fn test_registry_order_and_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.id_of("fixed"), Some(ActuatorId(1)));
        assert_eq!(registry.get(ActuatorId(2)).unwrap().kind(), ActuatorKind::Linear);
        assert_eq!(
            registry.read(ActuatorId(7)).unwrap_err(),
            MotionError::InvalidActuator { id: ActuatorId(7) }
        );
    }

    #[test]
    fn test_set_mode_replaces_previous_mode() {
        let mut registry = registry();
        let id = ActuatorId(0);
        registry
            .set_mode(
                id,
                RunMode::Timed {
                    deadline: Timestamp(100),
                },
                params(Direction::Cw, 500),
            )
            .unwrap();
        registry
            .set_mode(id, RunMode::Distance { target: 40 }, params(Direction::Cw, 1200))
            .unwrap();

        let snapshot = registry.read(id).unwrap();
        assert_eq!(snapshot.mode, RunMode::Distance { target: 40 });
        assert_eq!(snapshot.mode.deadline(), None);
        assert_eq!(snapshot.generation, 2);
    }

    #[test]
    fn test_distance_on_linear_rejected() {
        let mut registry = registry();
        let err = registry
            .set_mode(ActuatorId(2), RunMode::Distance { target: 1 }, params(Direction::Cw, 1))
            .unwrap_err();
        assert!(matches!(err, MotionError::UnsupportedOperation { .. }));
        assert!(registry.is_complete(ActuatorId(2)).unwrap());
    }

    #[test]
    fn test_clear_is_terminal_and_idempotent() {
        let mut registry = registry();
        for id in registry.ids().collect::<Vec<_>>() {
            registry
                .set_mode(id, RunMode::Continuous, params(Direction::Ccw, 100))
                .unwrap();
            assert!(!registry.is_complete(id).unwrap());
            registry.clear(id).unwrap();
            assert!(registry.is_complete(id).unwrap());
            registry.clear(id).unwrap();
            assert!(registry.is_complete(id).unwrap());
            assert_eq!(registry.current_output(id).unwrap(), ActuatorOutput::DISABLED);
        }
    }

    #[test]
    fn test_halt_keeps_generation() {
        let mut registry = registry();
        let id = ActuatorId(1);
        let generation = registry
            .set_mode(id, RunMode::Continuous, params(Direction::Cw, 300))
            .unwrap();
        registry.halt(id).unwrap();
        let snapshot = registry.read(id).unwrap();
        assert!(snapshot.complete);
        assert_eq!(snapshot.generation, generation);
    }

    #[test]
    fn test_linear_timed_expiry() {
        let mut registry = registry();
        let id = ActuatorId(2);
        registry
            .set_mode(
                id,
                RunMode::Timed {
                    deadline: Timestamp(50),
                },
                params(Direction::Ccw, 200),
            )
            .unwrap();

        let mut outputs = Vec::new();
        registry.advance_all(Timestamp(49), |i, o| {
            if i == id {
                outputs.push(o)
            }
        });
        registry.advance_all(Timestamp(50), |i, o| {
            if i == id {
                outputs.push(o)
            }
        });

        assert_eq!(outputs[0].signed_magnitude, -200);
        assert!(outputs[0].enabled);
        assert_eq!(outputs[1], ActuatorOutput::DISABLED);
        assert!(registry.is_complete(id).unwrap());
    }

    #[test]
    fn test_ramped_timed_expiry_decelerates() {
        let mut registry = registry();
        let id = ActuatorId(0);
        registry
            .set_mode(
                id,
                RunMode::Timed {
                    deadline: Timestamp(1000),
                },
                params(Direction::Cw, 400),
            )
            .unwrap();
        registry.stamp(id, Timestamp(0)).unwrap();

        // 1 秒内以 800 步/秒² 加速到 400 步/秒
        for t in 1..=999u32 {
            registry.advance_all(Timestamp(t), |_, _| {});
        }
        assert!((registry.read(id).unwrap().speed - 400.0).abs() < 1.0);

        registry.advance_all(Timestamp(1000), |_, _| {});
        let snapshot = registry.read(id).unwrap();
        assert_eq!(snapshot.mode, RunMode::RampDown);
        assert!(!snapshot.complete);

        // 400 / 800 = 0.5 秒减速
        for t in 1001..=1600u32 {
            registry.advance_all(Timestamp(t), |_, _| {});
        }
        let snapshot = registry.read(id).unwrap();
        assert!(snapshot.complete);
        assert_eq!(snapshot.speed, 0.0);
    }

    #[test]
    fn test_fixed_timed_expiry_snaps_to_zero() {
        let mut registry = registry();
        let id = ActuatorId(1);
        registry
            .set_mode(
                id,
                RunMode::Timed {
                    deadline: Timestamp(10),
                },
                params(Direction::Ccw, 1000),
            )
            .unwrap();
        registry.stamp(id, Timestamp(0)).unwrap();
        registry.advance_all(Timestamp(5), |_, _| {});
        assert_eq!(registry.read(id).unwrap().speed, -1000.0);

        registry.advance_all(Timestamp(10), |_, _| {});
        let snapshot = registry.read(id).unwrap();
        assert!(snapshot.complete);
        assert_eq!(snapshot.speed, 0.0);
        assert!(snapshot.position.unwrap() < 0);
    }

    #[test]
    fn test_timed_expiry_counts_steps_up_to_deadline() {
        let mut registry = registry();
        let id = ActuatorId(1);
        registry
            .set_mode(
                id,
                RunMode::Timed {
                    deadline: Timestamp(10),
                },
                params(Direction::Ccw, 1000),
            )
            .unwrap();
        registry.stamp(id, Timestamp(0)).unwrap();
        registry.advance_all(Timestamp(4), |_, _| {});

        // 服务轮次晚于截止时刻：只补走到截止为止的 6 毫秒
        let mut last = None;
        registry.advance_all(Timestamp(12), |i, o| {
            if i == id {
                last = Some(o)
            }
        });
        let position = registry.read(id).unwrap().position.unwrap();
        assert!((-10..=-9).contains(&position), "position {}", position);
        assert_eq!(last, Some(ActuatorOutput::DISABLED));
        assert!(registry.is_complete(id).unwrap());
    }

    #[test]
    fn test_stamp_starts_clock_at_issue_time() {
        let mut registry = registry();
        let id = ActuatorId(1);
        registry
            .set_mode(id, RunMode::Continuous, params(Direction::Cw, 1000))
            .unwrap();
        // 未记录起始时刻的记录本轮不走步
        registry.advance_all(Timestamp(50), |_, _| {});
        assert_eq!(registry.read(id).unwrap().position, Some(0));

        registry.clear(id).unwrap();
        registry
            .set_mode(id, RunMode::Continuous, params(Direction::Cw, 1000))
            .unwrap();
        registry.stamp(id, Timestamp(100)).unwrap();
        // 运动中再次下发不重置起始时刻
        registry.stamp(id, Timestamp(105)).unwrap();
        registry.advance_all(Timestamp(110), |_, _| {});
        let position = registry.read(id).unwrap().position.unwrap();
        assert!((9..=10).contains(&position), "position {}", position);
    }

    #[test]
    fn test_set_profile_clamps_magnitude() {
        let mut registry = registry();
        let id = ActuatorId(0);
        registry
            .set_mode(id, RunMode::Continuous, params(Direction::Cw, 1000))
            .unwrap();
        let profile = RotaryProfile {
            max_speed: 300.0,
            acceleration: 100.0,
            deceleration: 100.0,
            ramp: RampProfile::Trapezoidal,
        };
        registry.set_profile(id, profile).unwrap();
        assert_eq!(registry.get(id).unwrap().magnitude(), 300);
        assert_eq!(registry.get(id).unwrap().max_magnitude(), 300);

        let err = registry.set_profile(ActuatorId(2), profile).unwrap_err();
        assert!(matches!(err, MotionError::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_all_idle() {
        let mut registry = registry();
        assert!(registry.all_idle());
        registry
            .set_mode(ActuatorId(2), RunMode::Continuous, params(Direction::Cw, 10))
            .unwrap();
        assert!(!registry.all_idle());
        registry.clear(ActuatorId(2)).unwrap();
        assert!(registry.all_idle());
    }

    #[test]
    fn test_distance_target_already_passed_snaps() {
        let mut registry = registry();
        let id = ActuatorId(1);
        registry.set_position(id, 15).unwrap();
        registry
            .set_mode(id, RunMode::Distance { target: 10 }, params(Direction::Cw, 1200))
            .unwrap();
        registry.stamp(id, Timestamp(0)).unwrap();

        registry.advance_all(Timestamp(1), |_, _| {});
        let snapshot = registry.read(id).unwrap();
        assert_eq!(snapshot.position, Some(10));
        assert!(snapshot.complete);
    }

    #[test]
    fn test_set_position_cancels_distance_run() {
        let mut registry = registry();
        let id = ActuatorId(1);
        let generation = registry
            .set_mode(id, RunMode::Distance { target: 500 }, params(Direction::Cw, 1200))
            .unwrap();
        registry.stamp(id, Timestamp(0)).unwrap();
        registry.advance_all(Timestamp(10), |_, _| {});

        registry.set_position(id, 1000).unwrap();
        let snapshot = registry.read(id).unwrap();
        assert!(snapshot.complete);
        assert_eq!(snapshot.generation, generation + 1);

        registry.advance_all(Timestamp(11), |_, _| {});
        assert_eq!(registry.read(id).unwrap().position, Some(1000));
    }

    #[test]
    fn test_set_position_keeps_continuous_run() {
        let mut registry = registry();
        let id = ActuatorId(1);
        let generation = registry
            .set_mode(id, RunMode::Continuous, params(Direction::Cw, 1000))
            .unwrap();
        registry.set_position(id, -40).unwrap();
        let snapshot = registry.read(id).unwrap();
        assert_eq!(snapshot.mode, RunMode::Continuous);
        assert_eq!(snapshot.generation, generation);
        assert_eq!(snapshot.position, Some(-40));
    }
}
