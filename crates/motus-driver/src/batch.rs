//! 批量同步与阻塞等待
//!
//! 单个阻塞调用和批量调用共用同一套等待循环：每个成员记录自己的 generation、
//! 作业参数和暂停时捕获的剩余量，暂停 / 恢复按成员独立处理。

use crate::coordinator::{Engine, Issued, MotionCoordinator};
use motus_types::{ActuatorId, Completion, Direction, MotionError, RunMode, Timestamp};
use smallvec::SmallVec;
use tracing::{debug, warn};

/// 批量成员命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchCommand {
    /// 定时运行
    Timed {
        duration_ms: u32,
        magnitude: u32,
        direction: Direction,
    },
    /// 按距离运行（仅 Rotary）
    Distance { distance: i64, direction: Direction },
}

/// 批量条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchEntry {
    pub id: ActuatorId,
    pub command: BatchCommand,
}

impl BatchEntry {
    pub fn timed(id: ActuatorId, duration_ms: u32, magnitude: u32, direction: Direction) -> Self {
        Self {
            id,
            command: BatchCommand::Timed {
                duration_ms,
                magnitude,
                direction,
            },
        }
    }

    pub fn distance(id: ActuatorId, distance: i64, direction: Direction) -> Self {
        Self {
            id,
            command: BatchCommand::Distance {
                distance,
                direction,
            },
        }
    }
}

/// 成员作业（恢复时据此重新下发）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Timed {
        deadline: Timestamp,
        magnitude: u32,
        direction: Direction,
    },
    Distance {
        target: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberState {
    Running,
    /// 暂停中；`remaining_ms` 仅对定时作业有意义
    Suspended { remaining_ms: u32 },
    Done(Completion),
}

/// 被阻塞调用持有的执行器
#[derive(Debug, Clone)]
pub(crate) struct Member {
    id: ActuatorId,
    generation: u64,
    job: Job,
    state: MemberState,
}

impl Member {
    pub(crate) fn timed(
        id: ActuatorId,
        issued: &Issued,
        deadline: Timestamp,
        direction: Direction,
    ) -> Self {
        Self {
            id,
            generation: issued.generation,
            job: Job::Timed {
                deadline,
                magnitude: issued.magnitude,
                direction,
            },
            state: MemberState::Running,
        }
    }

    pub(crate) fn distance(id: ActuatorId, issued: &Issued, target: i64) -> Self {
        Self {
            id,
            generation: issued.generation,
            job: Job::Distance { target },
            state: MemberState::Running,
        }
    }

    fn is_done(&self) -> bool {
        matches!(self.state, MemberState::Done(_))
    }

    fn finish(&mut self, completion: Completion) {
        debug!("Actuator {} blocking wait: {:?}", self.id, completion);
        self.state = MemberState::Done(completion);
    }

    /// 其他上下文是否接管了该执行器
    fn owned(&self, engine: &Engine) -> bool {
        engine
            .registry
            .get(self.id)
            .is_ok_and(|r| r.generation() == self.generation)
    }

    /// 观察完成 / 取消
    fn poll(&mut self, engine: &Engine) {
        match self.state {
            MemberState::Done(_) => {},
            _ if !self.owned(engine) => self.finish(Completion::Cancelled),
            MemberState::Running => {
                if engine.registry.is_complete(self.id).unwrap_or(true) {
                    self.finish(Completion::Finished);
                }
            },
            MemberState::Suspended { .. } => {},
        }
    }

    /// 暂停：捕获剩余量并停机（不改变 generation）
    fn suspend(&mut self, engine: &mut Engine, now: Timestamp) {
        if self.state != MemberState::Running {
            return;
        }
        if !self.owned(engine) {
            self.finish(Completion::Cancelled);
            return;
        }
        if engine.registry.is_complete(self.id).unwrap_or(true) {
            self.finish(Completion::Finished);
            return;
        }

        let remaining_ms = match self.job {
            Job::Timed { deadline, .. } => deadline.remaining_from(now),
            Job::Distance { .. } => 0,
        };
        if let Err(e) = engine.halt(now, self.id) {
            warn!("Failed to halt {} on pause: {}", self.id, e);
        }
        debug!(
            "Actuator {} suspended ({} ms remaining)",
            self.id, remaining_ms
        );
        self.state = MemberState::Suspended { remaining_ms };
    }

    /// 恢复：按捕获的剩余量重新下发
    fn resume(&mut self, engine: &mut Engine, now: Timestamp) {
        let MemberState::Suspended { remaining_ms } = self.state else {
            return;
        };
        if !self.owned(engine) {
            self.finish(Completion::Cancelled);
            return;
        }

        let reissued: Result<Option<(Issued, Job)>, MotionError> = match self.job {
            Job::Timed { .. } if remaining_ms == 0 => Ok(None),
            Job::Timed {
                magnitude,
                direction,
                ..
            } => {
                let deadline = now.wrapping_add(remaining_ms);
                engine
                    .issue(now, self.id, RunMode::Timed { deadline }, direction, magnitude)
                    .map(|issued| {
                        Some((
                            issued,
                            Job::Timed {
                                deadline,
                                magnitude,
                                direction,
                            },
                        ))
                    })
            },
            Job::Distance { target } => engine
                .issue_distance_to(now, self.id, target)
                .map(|o| o.map(|(issued, target)| (issued, Job::Distance { target }))),
        };

        match reissued {
            Ok(Some((issued, job))) => {
                debug!("Actuator {} resumed as {:?}", self.id, job);
                self.generation = issued.generation;
                self.job = job;
                self.state = MemberState::Running;
            },
            Ok(None) => self.finish(Completion::Finished),
            Err(e) => {
                warn!("Failed to resume {}: {}", self.id, e);
                self.finish(Completion::Cancelled);
            },
        }
    }
}

fn aggregate(members: &[Member]) -> Completion {
    let cancelled = members
        .iter()
        .any(|m| m.state == MemberState::Done(Completion::Cancelled));
    if cancelled {
        Completion::Cancelled
    } else {
        Completion::Finished
    }
}

impl MotionCoordinator {
    /// 批量运行并等待全部成员完成
    ///
    /// 所有合法条目在同一次加锁内下发（同一轮服务前全部生效）。非法条目（编号越界、
    /// 对直流电机发距离命令、零时长、零距离）被跳过；全部无效或为空时返回 [`Completion::Skipped`]。
    /// 同一执行器出现多次时以最后一条为准。
    ///
    /// 任何成员被其他上下文取消时结果为 [`Completion::Cancelled`]，但仍会等待其余成员结束。
    pub fn run_batch_blocking(&self, entries: &[BatchEntry]) -> Completion {
        let mut members: SmallVec<[Member; 8]> = SmallVec::new();

        self.context().mutate(|engine, now| {
            for entry in entries {
                let stops = matches!(entry.command, BatchCommand::Timed { duration_ms: 0, .. });
                let issued = match entry.command {
                    BatchCommand::Timed {
                        duration_ms,
                        magnitude,
                        direction,
                    } => engine
                        .issue_timed(now, entry.id, duration_ms, magnitude, direction)
                        .map(|o| {
                            o.map(|(issued, deadline)| {
                                Member::timed(entry.id, &issued, deadline, direction)
                            })
                        }),
                    BatchCommand::Distance {
                        distance,
                        direction,
                    } => engine
                        .issue_distance(now, entry.id, distance, direction)
                        .map(|o| o.map(|(issued, target)| Member::distance(entry.id, &issued, target))),
                };

                match issued {
                    Ok(Some(member)) => {
                        if let Some(existing) = members.iter_mut().find(|m| m.id == member.id) {
                            warn!("Batch entry for {} replaces an earlier entry", member.id);
                            *existing = member;
                        } else {
                            members.push(member);
                        }
                    },
                    Ok(None) => {
                        debug!("Batch entry for {} has nothing to run", entry.id);
                        // 零时长条目已经停止了该执行器，早先的同编号成员不再有效
                        if stops {
                            members.retain(|m| m.id != entry.id);
                        }
                    },
                    Err(e) => warn!("Batch entry skipped: {}", e),
                }
            }
        });

        if members.is_empty() {
            warn!("Batch has no runnable entries");
            return Completion::Skipped;
        }

        debug!("Batch started with {} members", members.len());
        self.wait_members(&mut members)
    }

    /// 阻塞等待所有成员完成，期间处理暂停 / 恢复与取消
    pub(crate) fn wait_members(&self, members: &mut [Member]) -> Completion {
        let ctx = self.context();
        let mut holding = false;

        loop {
            self.drive();

            let paused = ctx.pause.is_paused();
            ctx.mutate(|engine, now| {
                if paused && !holding {
                    for member in members.iter_mut() {
                        member.suspend(engine, now);
                    }
                } else if !paused && holding {
                    for member in members.iter_mut() {
                        member.resume(engine, now);
                    }
                }
                for member in members.iter_mut() {
                    member.poll(engine);
                }
            });
            holding = paused;

            if members.iter().all(Member::is_done) {
                return aggregate(members);
            }
            self.yield_now();
        }
    }
}
