//! 步进电机运行时（位置跟踪 + 梯形加减速）
//!
//! 服务例程每一轮传入自上一轮以来经过的时间 `dt`，本模块据此：
//! 1. 按加减速约束更新带符号速度（步/秒）
//! 2. 把 `|speed| * dt` 累积为整步，更新绝对位置
//!
//! 无加减速模式（[`RampProfile::None`]）下速度瞬时切换，步频固定。
//! 距离模式下单轮发出的步数永远不会超过剩余距离，因此最终位置精确落在目标上。

use motus_types::{RampProfile, RotaryConfig};

/// 步进电机运动参数（已做默认值回退）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotaryProfile {
    /// 最大速度（步/秒）
    pub max_speed: f32,
    /// 加速度（步/秒²）
    pub acceleration: f32,
    /// 减速度（步/秒²）
    pub deceleration: f32,
    pub ramp: RampProfile,
}

impl From<&RotaryConfig> for RotaryProfile {
    fn from(config: &RotaryConfig) -> Self {
        let config = config.clone().sanitized();
        Self {
            max_speed: config.max_speed,
            acceleration: config.acceleration,
            deceleration: config.deceleration,
            ramp: config.ramp,
        }
    }
}

impl RotaryProfile {
    /// 由原始参数构造，非正数回退到默认值
    pub fn sanitized(max_speed: f32, acceleration: f32, deceleration: f32, ramp: RampProfile) -> Self {
        let config = RotaryConfig {
            name: String::new(),
            max_speed,
            acceleration,
            deceleration,
            ramp,
        };
        Self::from(&config)
    }
}

/// 单个步进电机的运行时状态
#[derive(Debug, Clone)]
pub struct RotaryState {
    /// 绝对位置（步）
    position: i64,
    /// 当前带符号速度（步/秒），正值为 CW
    speed: f32,
    /// 尚未发出的小数步
    step_accum: f32,
    profile: RotaryProfile,
}

impl RotaryState {
    pub fn new(profile: RotaryProfile) -> Self {
        Self {
            position: 0,
            speed: 0.0,
            step_accum: 0.0,
            profile,
        }
    }

    #[inline]
    pub fn position(&self) -> i64 {
        self.position
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn profile(&self) -> &RotaryProfile {
        &self.profile
    }

    pub fn set_profile(&mut self, profile: RotaryProfile) {
        self.profile = profile;
        self.speed = self
            .speed
            .clamp(-self.profile.max_speed, self.profile.max_speed);
    }

    pub fn set_position(&mut self, position: i64) {
        self.position = position;
        self.step_accum = 0.0;
    }

    /// 把位置吸附到目标（距离模式完成时）
    pub fn snap_to(&mut self, target: i64) {
        self.position = target;
        self.halt();
    }

    /// 立即停止：速度归零，丢弃小数步
    pub fn halt(&mut self) {
        self.speed = 0.0;
        self.step_accum = 0.0;
    }

    pub fn is_ramped(&self) -> bool {
        self.profile.ramp == RampProfile::Trapezoidal
    }

    /// 从静止发出第一步时的速度（步/秒），避免在目标附近以接近 0 的速度爬行
    fn min_speed(&self) -> f32 {
        (2.0 * self.profile.acceleration)
            .sqrt()
            .min(self.profile.max_speed)
    }

    /// 以当前速度按减速度停下所需的步数
    fn stopping_distance(&self, speed: f32) -> f32 {
        speed * speed / (2.0 * self.profile.deceleration)
    }

    /// 速度模式：向目标速度逼近，返回本轮发出的带符号步数
    pub fn advance_velocity(&mut self, target_speed: f32, dt_s: f32) -> i64 {
        let max = self.profile.max_speed;
        let target = target_speed.clamp(-max, max);

        self.speed = match self.profile.ramp {
            RampProfile::None => target,
            RampProfile::Trapezoidal => ramp_toward(
                self.speed,
                target,
                self.profile.acceleration,
                self.profile.deceleration,
                dt_s,
            ),
        };

        self.emit_steps(dt_s, None)
    }

    /// 距离模式：朝 `target` 运动，返回本轮发出的带符号步数以及是否已经到达
    pub fn advance_distance(&mut self, target: i64, dt_s: f32) -> (i64, bool) {
        let remaining = target - self.position;
        if remaining == 0 {
            self.halt();
            return (0, true);
        }

        let want = if remaining > 0 { 1.0 } else { -1.0 };
        let max = self.profile.max_speed;

        self.speed = match self.profile.ramp {
            RampProfile::None => want * max,
            RampProfile::Trapezoidal => {
                if self.speed * want < 0.0 {
                    // 反向：先刹停
                    ramp_toward(self.speed, 0.0, 0.0, self.profile.deceleration, dt_s)
                } else {
                    let v = self.speed.abs();
                    let v = if self.stopping_distance(v) >= remaining.unsigned_abs() as f32 {
                        v - self.profile.deceleration * dt_s
                    } else {
                        (v + self.profile.acceleration * dt_s).min(max)
                    };
                    want * v.max(self.min_speed())
                }
            },
        };

        let delta = self.emit_steps(dt_s, Some(remaining.unsigned_abs()));
        let reached = self.position == target;
        if reached {
            self.halt();
        }
        (delta, reached)
    }

    /// 把 `|speed| * dt` 累积成整步；`limit` 限制本轮最多发出的步数
    fn emit_steps(&mut self, dt_s: f32, limit: Option<u64>) -> i64 {
        if self.speed == 0.0 {
            self.step_accum = 0.0;
            return 0;
        }

        self.step_accum += self.speed.abs() * dt_s;
        let whole = self.step_accum.floor();
        self.step_accum -= whole;

        let mut steps = whole as u64;
        if let Some(limit) = limit
            && steps >= limit
        {
            steps = limit;
            self.step_accum = 0.0;
        }

        let delta = if self.speed > 0.0 {
            steps as i64
        } else {
            -(steps as i64)
        };
        self.position += delta;
        delta
    }
}

/// 有界加速度下的速度逼近
///
/// 远离 0 时使用加速度，朝 0 方向（含换向）时使用减速度；换向时本轮只减到 0。
fn ramp_toward(current: f32, target: f32, acceleration: f32, deceleration: f32, dt_s: f32) -> f32 {
    let reversing = current != 0.0 && target != 0.0 && (current > 0.0) != (target > 0.0);
    let target = if reversing { 0.0 } else { target };

    let speeding_up = target.abs() > current.abs();
    let rate = if speeding_up { acceleration } else { deceleration };
    let step = rate * dt_s;

    if (target - current).abs() <= step {
        target
    } else if target > current {
        current + step
    } else {
        current - step
    }
}
