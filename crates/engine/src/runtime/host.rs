use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    LocalWatchdog,
    RemoteSweep,
    ThrottleFlush,
}

/// Display-frame and timer scheduling provided by whatever drives the
/// engine. Every handle it returns must be cancellable.
pub trait FrameHost {
    fn request_frame(&mut self) -> FrameRequestId;

    fn cancel_frame(&mut self, id: FrameRequestId);

    fn set_timer(&mut self, kind: TimerKind, delay: Duration, repeating: bool) -> TimerId;

    fn clear_timer(&mut self, id: TimerId);
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTimer {
    kind: TimerKind,
    due: Instant,
    period: Option<Duration>,
}

/// Deterministic host driven by an explicit clock. Used by the headless
/// client loop and by tests that assert strict cleanup.
#[derive(Debug)]
pub struct ManualFrameHost {
    now: Instant,
    next_id: u64,
    frame: Option<FrameRequestId>,
    frames_requested: u64,
    timers: BTreeMap<TimerId, ScheduledTimer>,
}

impl ManualFrameHost {
    pub fn new(now: Instant) -> Self {
        Self {
            now,
            next_id: 0,
            frame: None,
            frames_requested: 0,
            timers: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Moves the host clock forward; it never runs backwards.
    pub fn advance_to(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    pub fn pending_frame(&self) -> Option<FrameRequestId> {
        self.frame
    }

    /// Consumes the outstanding frame request, as a display refresh would.
    pub fn take_frame(&mut self) -> Option<FrameRequestId> {
        self.frame.take()
    }

    pub fn frames_requested(&self) -> u64 {
        self.frames_requested
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn has_timer(&self, kind: TimerKind) -> bool {
        self.timers.values().any(|timer| timer.kind == kind)
    }

    /// Outstanding frame requests plus live timers.
    pub fn outstanding(&self) -> usize {
        usize::from(self.frame.is_some()) + self.timers.len()
    }

    pub fn next_timer_due(&self) -> Option<Instant> {
        self.timers.values().map(|timer| timer.due).min()
    }

    /// Timers due at or before `now`, earliest first. One-shot timers are
    /// removed; repeating timers are re-armed one period after `now`.
    pub fn take_due_timers(&mut self, now: Instant) -> Vec<(TimerId, TimerKind)> {
        self.advance_to(now);
        let mut due: Vec<(Instant, TimerId, TimerKind)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due <= now)
            .map(|(id, timer)| (timer.due, *id, timer.kind))
            .collect();
        due.sort_by_key(|(at, id, _)| (*at, *id));

        for (_, id, _) in &due {
            let Some(timer) = self.timers.get_mut(id) else {
                continue;
            };
            match timer.period {
                Some(period) => timer.due = now + period,
                None => {
                    self.timers.remove(id);
                }
            }
        }
        due.into_iter().map(|(_, id, kind)| (id, kind)).collect()
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }
}

impl FrameHost for ManualFrameHost {
    fn request_frame(&mut self) -> FrameRequestId {
        if let Some(existing) = self.frame {
            return existing;
        }
        let id = FrameRequestId(self.alloc_id());
        self.frame = Some(id);
        self.frames_requested = self.frames_requested.saturating_add(1);
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        if self.frame == Some(id) {
            self.frame = None;
        }
    }

    fn set_timer(&mut self, kind: TimerKind, delay: Duration, repeating: bool) -> TimerId {
        let id = TimerId(self.alloc_id());
        self.timers.insert(
            id,
            ScheduledTimer {
                kind,
                due: self.now + delay,
                period: repeating.then_some(delay),
            },
        );
        id
    }

    fn clear_timer(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }
}
