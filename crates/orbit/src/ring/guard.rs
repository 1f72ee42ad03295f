//! Permission state machine for mutating selection, rotation and highlight.
//!
//! The guard is always in exactly one [`GuardPhase`]. New operations may only
//! start from `Idle`, except that a running scroll (`Animating`) can be merged
//! into or preempted by a lock. Locks are scoped: dropping a [`SelectionLock`]
//! releases it, and a lock that was superseded (auto-repair, disposal) releases
//! nothing.

use crate::sys::Clock;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;
use strum::Display as StrumDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
pub enum LockReason {
    Animating,
    Transitioning,
    ForcedIndex,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquireOptions {
    pub lock_rotation: bool,
    pub prevent_highlight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldLock {
    pub token: u64,
    pub reason: LockReason,
    pub forced_index: Option<usize>,
    pub lock_rotation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Idle,
    Animating { since: Duration },
    Locked { lock: HeldLock, since: Duration },
    Disposing,
    Disposed,
}

impl fmt::Display for GuardPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Animating { .. } => write!(f, "animating"),
            Self::Locked { lock, .. } => write!(f, "locked ({})", lock.reason),
            Self::Disposing => write!(f, "disposing"),
            Self::Disposed => write!(f, "disposed"),
        }
    }
}

struct GuardCore {
    phase: GuardPhase,
    next_token: u64,
    max_transition: Duration,
    clock: Rc<dyn Clock>,
}

impl GuardCore {
    fn release(&mut self, token: u64) -> bool {
        match self.phase {
            GuardPhase::Locked { lock, .. } if lock.token == token => {
                self.phase = GuardPhase::Idle;
                true
            }
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct SelectionGuard {
    core: Rc<RefCell<GuardCore>>,
}

impl fmt::Debug for SelectionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionGuard")
            .field("phase", &self.phase())
            .finish()
    }
}

impl SelectionGuard {
    pub fn new(clock: Rc<dyn Clock>, max_transition: Duration) -> Self {
        Self {
            core: Rc::new(RefCell::new(GuardCore {
                phase: GuardPhase::Idle,
                next_token: 0,
                max_transition,
                clock,
            })),
        }
    }

    pub fn phase(&self) -> GuardPhase {
        self.core.borrow().phase
    }

    pub fn max_transition(&self) -> Duration {
        self.core.borrow().max_transition
    }

    pub fn can_scroll(&self) -> bool {
        matches!(
            self.phase(),
            GuardPhase::Idle | GuardPhase::Animating { .. }
        )
    }

    /// `force` lets a running scroll update the highlight from its frames.
    pub fn can_update_highlight(&self, force: bool) -> bool {
        match self.phase() {
            GuardPhase::Idle => true,
            GuardPhase::Animating { .. } => force,
            GuardPhase::Locked { .. } | GuardPhase::Disposing | GuardPhase::Disposed => false,
        }
    }

    pub fn forced_index(&self) -> Option<usize> {
        match self.phase() {
            GuardPhase::Locked { lock, .. } => lock.forced_index,
            _ => None,
        }
    }

    pub fn is_animating(&self) -> bool {
        matches!(
            self.phase(),
            GuardPhase::Animating { .. } | GuardPhase::Locked { .. }
        )
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.phase(), GuardPhase::Locked { .. })
    }

    pub fn is_disposing(&self) -> bool {
        matches!(self.phase(), GuardPhase::Disposing | GuardPhase::Disposed)
    }

    pub fn acquire(&self, index: Option<usize>, options: AcquireOptions) -> Option<SelectionLock> {
        let mut core = self.core.borrow_mut();
        if !matches!(
            core.phase,
            GuardPhase::Idle | GuardPhase::Animating { .. }
        ) {
            log::debug!("Lock denied while {}", core.phase);
            return None;
        }

        core.next_token += 1;
        let reason = match (index, options.lock_rotation) {
            (Some(_), _) => LockReason::ForcedIndex,
            (None, true) => LockReason::Transitioning,
            (None, false) => LockReason::Animating,
        };
        let lock = HeldLock {
            token: core.next_token,
            reason,
            forced_index: index,
            lock_rotation: options.lock_rotation,
        };
        core.phase = GuardPhase::Locked {
            lock,
            since: core.clock.now(),
        };

        Some(SelectionLock {
            core: Rc::downgrade(&self.core),
            token: lock.token,
            prevent_highlight: options.prevent_highlight,
        })
    }

    /// Marks a free-running scroll tween. Restarts the repair timer if one is already running.
    pub fn begin_animating(&self) -> bool {
        let mut core = self.core.borrow_mut();
        match core.phase {
            GuardPhase::Idle | GuardPhase::Animating { .. } => {
                core.phase = GuardPhase::Animating {
                    since: core.clock.now(),
                };
                true
            }
            _ => false,
        }
    }

    pub fn finish_animating(&self) {
        let mut core = self.core.borrow_mut();
        if let GuardPhase::Animating { .. } = core.phase {
            core.phase = GuardPhase::Idle;
        }
    }

    /// Resets a lock or animation held past `max_transition`. Returns whether it fired.
    pub fn check_and_auto_repair(&self) -> bool {
        let mut core = self.core.borrow_mut();
        let since = match core.phase {
            GuardPhase::Animating { since } | GuardPhase::Locked { since, .. } => since,
            _ => return false,
        };
        let held = core.clock.now().saturating_sub(since);
        if held <= core.max_transition {
            return false;
        }
        log::warn!(
            "Selection guard stuck {} for {:?} (limit {:?}), resetting to idle",
            core.phase,
            held,
            core.max_transition
        );
        core.phase = GuardPhase::Idle;
        true
    }

    pub fn begin_disposal(&self) {
        let mut core = self.core.borrow_mut();
        if core.phase != GuardPhase::Disposed {
            core.phase = GuardPhase::Disposing;
        }
    }

    pub fn mark_disposed(&self) {
        self.core.borrow_mut().phase = GuardPhase::Disposed;
    }
}

/// Scoped hold on a [`SelectionGuard`]. Released on [`SelectionLock::release`] or drop.
#[derive(Debug)]
pub struct SelectionLock {
    core: Weak<RefCell<GuardCore>>,
    token: u64,
    prevent_highlight: bool,
}

impl SelectionLock {
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Whether the holder may move the highlight while committing.
    pub fn permits_highlight(&self) -> bool {
        !self.prevent_highlight
    }

    /// Idempotent; only the first call can return the guard to idle.
    pub fn release(&mut self) -> bool {
        let released = self
            .core
            .upgrade()
            .is_some_and(|core| core.borrow_mut().release(self.token));
        self.core = Weak::new();
        released
    }
}

impl Drop for SelectionLock {
    fn drop(&mut self) {
        self.release();
    }
}
