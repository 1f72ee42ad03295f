use crate::config::RingConfig;
use crate::error::{HostError, RingError};
use crate::events::RingInput;
use crate::ring::angle::{AngleModel, shortest_delta};
use crate::ring::guard::{AcquireOptions, GuardPhase, SelectionGuard, SelectionLock};
use crate::ring::highlight::HighlightController;
use crate::ring::lifecycle::Lifecycle;
use crate::sys::{
    Clock, HandleId, SceneHost, SystemClock, TweenEngine, TweenEvent, TweenHandle, TweenProperty,
    TweenSink, TweenSpec, Tweener,
};
use async_channel::Receiver;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingItem {
    pub index: usize,
    pub angle: f64,
    pub handle: HandleId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionState {
    pub current_index: usize,
    /// Unbounded; accumulates across wraps so consecutive scrolls keep their direction.
    pub target_rotation: f64,
    pub rotation: f64,
}

/// Read-only view of a ring for tooling and tests.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RingSnapshot {
    pub current_index: usize,
    pub target_rotation: f64,
    pub rotation: f64,
    pub is_animating: bool,
    pub is_locked: bool,
    pub highlighted: Option<usize>,
    pub disposed: bool,
}

impl fmt::Display for RingSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.disposed {
            return write!(f, "disposed");
        }
        write!(
            f,
            "index={} target={:.4} rotation={:.4} animating={} locked={} highlighted={}",
            self.current_index,
            self.target_rotation,
            self.rotation,
            self.is_animating,
            self.is_locked,
            self.highlighted
                .map_or_else(|| "-".to_string(), |i| i.to_string()),
        )
    }
}

#[derive(Debug)]
pub(crate) enum ActiveTween {
    Scroll {
        handle: TweenHandle,
        index: usize,
    },
    Select {
        handle: TweenHandle,
        index: usize,
        lock: SelectionLock,
    },
}

impl ActiveTween {
    pub(crate) fn handle(&self) -> TweenHandle {
        match self {
            Self::Scroll { handle, .. } | Self::Select { handle, .. } => *handle,
        }
    }
}

/// Everything a live ring owns. Dropped as a whole on disposal.
#[derive(Debug)]
pub(crate) struct RingCore {
    pub(crate) angles: AngleModel,
    pub(crate) items: Vec<RingItem>,
    pub(crate) guard: SelectionGuard,
    pub(crate) state: SelectionState,
    pub(crate) highlight: HighlightController,
    pub(crate) active: Option<ActiveTween>,
    pub(crate) sink: TweenSink,
    events: Receiver<TweenEvent>,
}

impl RingCore {
    /// Index that the next scroll steps from.
    fn current_front_index(&self) -> usize {
        if let Some(forced) = self.guard.forced_index() {
            return forced;
        }
        match self.active {
            Some(ActiveTween::Scroll { index, .. }) => index,
            _ => self.state.current_index,
        }
    }

    fn is_active(&self, handle: TweenHandle) -> bool {
        self.active.as_ref().is_some_and(|a| a.handle() == handle)
    }

    fn apply_rotation<H: SceneHost>(
        &mut self,
        host: &mut H,
        ring: HandleId,
        value: f64,
    ) -> Result<(), HostError> {
        self.state.rotation = value;
        host.set_property(ring, TweenProperty::Rotation, value)
    }

    /// Commits a selection. The lock is released after every mutation, on every path.
    fn finish_select<H: SceneHost, T: TweenEngine>(
        &mut self,
        host: &mut H,
        tweens: &mut T,
        index: usize,
        mut lock: SelectionLock,
    ) -> Result<(), HostError> {
        self.state.current_index = index;
        let result = if lock.permits_highlight() {
            self.highlight
                .highlight_item_at_index(host, tweens, &self.sink, index)
        } else {
            Ok(())
        };
        lock.release();
        result
    }

    fn apply_event<H: SceneHost, T: TweenEngine>(
        &mut self,
        host: &mut H,
        tweens: &mut T,
        ring: HandleId,
        live_highlight: bool,
        event: TweenEvent,
    ) -> Result<(), HostError> {
        match event {
            TweenEvent::Update { handle, value } if self.is_active(handle) => {
                self.apply_rotation(host, ring, value)?;
                let scrolling = matches!(self.active, Some(ActiveTween::Scroll { .. }));
                if self.guard.can_update_highlight(scrolling && live_highlight) {
                    let front = self.angles.front_index_at(value);
                    if self.highlight.highlighted() != Some(front) {
                        self.highlight
                            .highlight_item_at_index(host, tweens, &self.sink, front)?;
                    }
                }
                Ok(())
            }
            TweenEvent::Complete { handle, value } if self.is_active(handle) => {
                // settle first so a failed write cannot strand the lock
                let active = self.active.take();
                let rotated = self.apply_rotation(host, ring, value);
                let settled = match active {
                    Some(ActiveTween::Scroll { .. }) => {
                        self.guard.finish_animating();
                        self.state.current_index =
                            self.angles.front_index_at(self.state.target_rotation);
                        let index = self.state.current_index;
                        self.highlight
                            .highlight_item_at_index(host, tweens, &self.sink, index)
                    }
                    Some(ActiveTween::Select { index, lock, .. }) => {
                        self.finish_select(host, tweens, index, lock)
                    }
                    None => Ok(()),
                };
                rotated.and(settled)
            }
            TweenEvent::Update { handle, value } => {
                if !self.highlight.apply_scale(host, handle, value, false)? {
                    log::trace!("Dropping update from stale {}", handle);
                }
                Ok(())
            }
            TweenEvent::Complete { handle, value } => {
                if !self.highlight.apply_scale(host, handle, value, true)? {
                    log::trace!("Dropping completion from stale {}", handle);
                }
                Ok(())
            }
        }
    }

    fn drain(&self) -> Vec<TweenEvent> {
        std::iter::from_fn(|| self.events.try_recv().ok()).collect()
    }
}

/// A ring of selectable items driven by scroll and click input.
///
/// The ring owns its selection state and guard. Scene objects and tweens
/// belong to `H` and `T`; the ring only refers to them by handle.
pub struct Ring<H, T> {
    pub(crate) host: H,
    pub(crate) tweens: T,
    pub(crate) handle: HandleId,
    config: RingConfig,
    pub(crate) core: Option<RingCore>,
    pub(crate) lifecycle: Lifecycle,
}

impl<H: SceneHost, T: TweenEngine> Ring<H, T> {
    pub fn new(
        host: H,
        tweens: T,
        handle: HandleId,
        items: Vec<HandleId>,
        config: RingConfig,
    ) -> Result<Self, RingError> {
        Self::with_clock(host, tweens, handle, items, config, Rc::new(SystemClock::default()))
    }

    pub fn with_clock(
        mut host: H,
        mut tweens: T,
        handle: HandleId,
        items: Vec<HandleId>,
        config: RingConfig,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, RingError> {
        let angles = AngleModel::new(items.len()).ok_or(RingError::Empty)?;
        let items: Vec<RingItem> = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| RingItem {
                index,
                angle: angles.angle_of(index),
                handle: item,
            })
            .collect();

        let initial = if angles.contains(config.initial_index) {
            config.initial_index
        } else {
            log::warn!(
                "Initial index {} out of range for {} items, starting at 0",
                config.initial_index,
                angles.count()
            );
            0
        };

        host.attach(handle)?;
        for item in &items {
            host.attach(item.handle)?;
        }

        let (tx, events) = async_channel::unbounded();
        let rotation = angles.angle_of(initial);
        let mut core = RingCore {
            angles,
            highlight: HighlightController::new(
                items.iter().map(|i| i.handle),
                config.highlight_scale,
                config.highlight_duration(),
            ),
            items,
            guard: SelectionGuard::new(clock, config.max_transition()),
            state: SelectionState {
                current_index: initial,
                target_rotation: rotation,
                rotation,
            },
            active: None,
            sink: TweenSink::new(tx),
            events,
        };
        core.apply_rotation(&mut host, handle, rotation)?;
        core.highlight
            .highlight_item_at_index(&mut host, &mut tweens, &core.sink, initial)?;

        log::debug!("Ring {} built with {} items", handle, core.items.len());

        Ok(Self {
            host,
            tweens,
            handle,
            config,
            core: Some(core),
            lifecycle: Lifecycle::Live,
        })
    }

    pub fn handle_input(&mut self, input: RingInput) -> Result<(), RingError> {
        match input {
            RingInput::Scroll(delta) => self.on_scroll(delta),
            RingInput::Activate(index) => self.on_item_activated(index),
        }
    }

    /// Wheel or drag input. Only the sign of `delta` matters.
    pub fn on_scroll(&mut self, delta: f64) -> Result<(), RingError> {
        if delta == 0.0 || !delta.is_finite() {
            return Ok(());
        }
        self.scroll(if delta > 0.0 { 1 } else { -1 })
    }

    pub fn on_item_activated(&mut self, index: usize) -> Result<(), RingError> {
        self.handle_item_click(index)
    }

    /// Steps the ring one slot forward (`delta > 0`) or back.
    ///
    /// Ignored while a selection holds the guard. A scroll arriving during
    /// another scroll stacks onto the accumulated target.
    pub fn scroll(&mut self, delta: i32) -> Result<(), RingError> {
        let Some(core) = self.core.as_mut() else {
            log::debug!("Scroll on disposed ring {}", self.handle);
            return Ok(());
        };
        core.guard.check_and_auto_repair();
        if delta == 0 {
            return Ok(());
        }
        if !core.guard.can_scroll() {
            log::debug!("Scroll ignored while {}", core.guard.phase());
            return Ok(());
        }

        let next = core.angles.wrap(core.current_front_index(), delta.signum());
        let difference = shortest_delta(core.state.target_rotation, core.angles.angle_of(next));
        core.state.target_rotation += difference;

        if let Some(active) = core.active.take() {
            self.tweens.cancel(active.handle())?;
        }

        let spec = TweenSpec {
            target: self.handle,
            property: TweenProperty::Rotation,
            from: core.state.rotation,
            to: core.state.target_rotation,
            duration: self.config.scroll_duration(),
            ease: self.config.scroll_ease,
        };
        core.guard.begin_animating();
        let handle = match self.tweens.animate(spec, core.sink.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                core.guard.finish_animating();
                return Err(e.into());
            }
        };
        core.active = Some(ActiveTween::Scroll {
            handle,
            index: next,
        });
        log::debug!(
            "Scrolling to {} (target {:.4}, delta {:.4})",
            next,
            core.state.target_rotation,
            difference
        );
        Ok(())
    }

    /// Click entry point. All locking happens in [`Ring::select_item`].
    pub fn handle_item_click(&mut self, index: usize) -> Result<(), RingError> {
        if index >= self.len() {
            log::warn!("Click on index {} ignored, ring has {} items", index, self.len());
            return Ok(());
        }
        self.select_item(index, true)
    }

    /// Rotates `index` to the front and commits it once the rotation settles.
    pub fn select_item(&mut self, index: usize, animate: bool) -> Result<(), RingError> {
        let Some(core) = self.core.as_mut() else {
            log::debug!("Select on disposed ring {}", self.handle);
            return Ok(());
        };
        core.guard.check_and_auto_repair();
        if !core.angles.contains(index) {
            log::warn!(
                "Select of index {} ignored, ring has {} items",
                index,
                core.angles.count()
            );
            return Ok(());
        }

        let Some(lock) = core.guard.acquire(
            Some(index),
            AcquireOptions {
                lock_rotation: true,
                prevent_highlight: false,
            },
        ) else {
            log::debug!("Select of {} ignored while {}", index, core.guard.phase());
            return Ok(());
        };

        // a scroll in flight is superseded by the selection
        if let Some(active) = core.active.take() {
            self.tweens.cancel(active.handle())?;
        }

        let target = core.angles.angle_in_turn(core.state.target_rotation, index);

        if animate {
            let spec = TweenSpec {
                target: self.handle,
                property: TweenProperty::Rotation,
                from: core.state.rotation,
                to: target,
                duration: self.config.select_duration(),
                ease: self.config.select_ease,
            };
            let handle = self.tweens.animate(spec, core.sink.clone())?;
            core.state.target_rotation = target;
            core.active = Some(ActiveTween::Select {
                handle,
                index,
                lock,
            });
            Ok(())
        } else {
            core.state.target_rotation = target;
            let rotated = core.apply_rotation(&mut self.host, self.handle, target);
            let finished = core.finish_select(&mut self.host, &mut self.tweens, index, lock);
            rotated?;
            Ok(finished?)
        }
    }

    /// Applies every queued tween event. Call once per frame after the engine advanced.
    ///
    /// A host failure on one event does not stop the rest of the batch; the
    /// first failure is returned once every event has been applied.
    pub fn pump(&mut self) -> Result<usize, RingError> {
        let Some(core) = self.core.as_mut() else {
            return Ok(0);
        };
        let live = self.config.live_highlight_during_scroll;
        let events = core.drain();
        let count = events.len();
        let mut first_error = None;
        for event in events {
            let applied =
                core.apply_event(&mut self.host, &mut self.tweens, self.handle, live, event);
            if let Err(e) = applied {
                log::error!("Applying {:?} failed: {}", event, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(count),
        }
    }

    pub fn snapshot(&self) -> RingSnapshot {
        let Some(core) = self.core.as_ref() else {
            return RingSnapshot {
                disposed: true,
                ..RingSnapshot::default()
            };
        };
        RingSnapshot {
            current_index: core.state.current_index,
            target_rotation: core.state.target_rotation,
            rotation: core.state.rotation,
            is_animating: core.guard.is_animating(),
            is_locked: core.guard.is_locked(),
            highlighted: core.highlight.highlighted(),
            disposed: false,
        }
    }
}

impl<H, T> Ring<H, T> {
    pub fn handle(&self) -> HandleId {
        self.handle
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn tweens(&self) -> &T {
        &self.tweens
    }

    pub fn tweens_mut(&mut self) -> &mut T {
        &mut self.tweens
    }

    pub fn items(&self) -> &[RingItem] {
        self.core
            .as_ref()
            .map(|c| c.items.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn guard_phase(&self) -> GuardPhase {
        self.core
            .as_ref()
            .map_or(GuardPhase::Disposed, |c| c.guard.phase())
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle == Lifecycle::Disposed
    }
}

impl<H: SceneHost> Ring<H, Tweener> {
    /// Advances the built-in tweener by one frame and applies its events.
    pub fn advance(&mut self, dt: Duration) -> Result<usize, RingError> {
        self.tweens.advance(dt);
        self.pump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::{ManualClock, SceneArena};
    use std::f64::consts::TAU;

    const FRAME: Duration = Duration::from_millis(16);

    fn ring(count: usize) -> (Ring<SceneArena, Tweener>, ManualClock) {
        let mut arena = SceneArena::new();
        let handle = arena.spawn("ring");
        let items = (0..count).map(|i| arena.spawn(format!("item-{i}"))).collect();
        let clock = ManualClock::new();
        let ring = Ring::with_clock(
            arena,
            Tweener::new(),
            handle,
            items,
            RingConfig::default(),
            Rc::new(clock.clone()),
        )
        .unwrap();
        (ring, clock)
    }

    fn settle(ring: &mut Ring<SceneArena, Tweener>, clock: &ManualClock) {
        for _ in 0..120 {
            clock.advance(FRAME);
            ring.advance(FRAME).unwrap();
        }
    }

    fn highlighted_indices(ring: &Ring<SceneArena, Tweener>) -> Vec<usize> {
        let highlighted = ring.host().highlighted();
        ring.items()
            .iter()
            .filter(|item| highlighted.contains(&item.handle))
            .map(|item| item.index)
            .collect()
    }

    #[test]
    fn test_new_ring_highlights_initial_index() {
        let (ring, _) = ring(8);
        assert_eq!(highlighted_indices(&ring), vec![0]);
        assert_eq!(ring.snapshot().current_index, 0);
        assert!(!ring.snapshot().is_animating);
    }

    #[test]
    fn test_empty_ring_rejected() {
        let mut arena = SceneArena::new();
        let handle = arena.spawn("ring");
        let result = Ring::new(arena, Tweener::new(), handle, Vec::new(), RingConfig::default());
        assert!(matches!(result, Err(RingError::Empty)));
    }

    #[test]
    fn test_select_commits_after_animation() {
        let (mut ring, clock) = ring(8);
        ring.select_item(5, true).unwrap();

        let snapshot = ring.snapshot();
        assert!((snapshot.target_rotation - 3.927).abs() < 1e-3);
        assert!(snapshot.is_locked);
        assert_eq!(snapshot.current_index, 0);

        settle(&mut ring, &clock);
        let snapshot = ring.snapshot();
        assert_eq!(snapshot.current_index, 5);
        assert!(!snapshot.is_locked);
        assert_eq!(highlighted_indices(&ring), vec![5]);
        let node = ring.host().node(ring.handle()).unwrap();
        assert!((node.rotation - 5.0 * TAU / 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_select_without_animation_is_synchronous() {
        let (mut ring, _) = ring(6);
        ring.select_item(4, false).unwrap();
        let snapshot = ring.snapshot();
        assert_eq!(snapshot.current_index, 4);
        assert!(!snapshot.is_locked);
        assert_eq!(highlighted_indices(&ring), vec![4]);
    }

    #[test]
    fn test_scroll_steps_and_wraps() {
        let (mut ring, clock) = ring(8);
        ring.scroll(-1).unwrap();
        settle(&mut ring, &clock);
        assert_eq!(ring.snapshot().current_index, 7);

        let before = ring.snapshot().target_rotation;
        ring.scroll(1).unwrap();
        settle(&mut ring, &clock);
        let snapshot = ring.snapshot();
        assert_eq!(snapshot.current_index, 0);
        assert!((snapshot.target_rotation - before - TAU / 8.0).abs() < 1e-9);
        assert_eq!(highlighted_indices(&ring), vec![0]);
    }

    #[test]
    fn test_scrolls_accumulate_past_one_turn() {
        let (mut ring, clock) = ring(4);
        for _ in 0..10 {
            ring.scroll(1).unwrap();
            settle(&mut ring, &clock);
        }
        let snapshot = ring.snapshot();
        assert_eq!(snapshot.current_index, 2);
        assert!((snapshot.target_rotation - 2.5 * TAU).abs() < 1e-9);
    }

    #[test]
    fn test_scroll_merges_into_running_scroll() {
        let (mut ring, clock) = ring(8);
        ring.scroll(1).unwrap();
        clock.advance(FRAME);
        ring.advance(FRAME).unwrap();
        ring.scroll(1).unwrap();
        settle(&mut ring, &clock);
        assert_eq!(ring.snapshot().current_index, 2);
        assert_eq!(ring.tweens().active_count(), 0);
    }

    #[test]
    fn test_scroll_ignored_during_select() {
        let (mut ring, clock) = ring(8);
        ring.select_item(3, true).unwrap();
        ring.scroll(1).unwrap();
        settle(&mut ring, &clock);
        assert_eq!(ring.snapshot().current_index, 3);
        assert_eq!(highlighted_indices(&ring), vec![3]);
    }

    #[test]
    fn test_clicks_keep_working() {
        let (mut ring, clock) = ring(8);
        for index in [2, 6, 1, 1, 7] {
            ring.handle_item_click(index).unwrap();
            settle(&mut ring, &clock);
            assert_eq!(ring.snapshot().current_index, index);
        }
    }

    #[test]
    fn test_click_after_winding_stays_within_a_turn() {
        let (mut ring, clock) = ring(4);
        for _ in 0..10 {
            ring.scroll(1).unwrap();
            settle(&mut ring, &clock);
        }
        let wound = ring.snapshot();
        assert_eq!(wound.current_index, 2);

        // clicking the item already in front goes nowhere
        ring.handle_item_click(2).unwrap();
        assert!((ring.snapshot().target_rotation - wound.target_rotation).abs() < 1e-9);
        settle(&mut ring, &clock);
        assert_eq!(ring.snapshot().current_index, 2);

        ring.handle_item_click(3).unwrap();
        let travel = ring.snapshot().target_rotation - ring.snapshot().rotation;
        assert!((travel - TAU / 4.0).abs() < 1e-9);
        settle(&mut ring, &clock);
        assert_eq!(ring.snapshot().current_index, 3);

        // and scrolling carries on in the same direction afterwards
        let before = ring.snapshot().target_rotation;
        ring.scroll(1).unwrap();
        settle(&mut ring, &clock);
        assert_eq!(ring.snapshot().current_index, 0);
        assert!((ring.snapshot().target_rotation - before - TAU / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_finish_without_highlight_permission_commits_silently() {
        let (mut ring, _) = ring(4);
        let core = ring.core.as_mut().unwrap();
        let lock = core
            .guard
            .acquire(Some(2), AcquireOptions {
                lock_rotation: true,
                prevent_highlight: true,
            })
            .unwrap();
        core.finish_select(&mut ring.host, &mut ring.tweens, 2, lock)
            .unwrap();

        assert_eq!(ring.snapshot().current_index, 2);
        assert_eq!(highlighted_indices(&ring), vec![0]);
        assert_eq!(ring.guard_phase(), GuardPhase::Idle);
    }

    #[test]
    fn test_out_of_range_click_is_noop() {
        let (mut ring, _) = ring(8);
        ring.handle_item_click(8).unwrap();
        ring.select_item(42, false).unwrap();
        let snapshot = ring.snapshot();
        assert_eq!(snapshot.current_index, 0);
        assert!(!snapshot.is_locked);
    }

    #[test]
    fn test_input_surface() {
        let (mut ring, clock) = ring(5);
        ring.handle_input(RingInput::Scroll(-120.0)).unwrap();
        settle(&mut ring, &clock);
        assert_eq!(ring.snapshot().current_index, 4);

        ring.handle_input(RingInput::Scroll(0.0)).unwrap();
        assert!(!ring.snapshot().is_animating);

        ring.handle_input(RingInput::Activate(2)).unwrap();
        settle(&mut ring, &clock);
        assert_eq!(ring.snapshot().current_index, 2);
    }

    #[test]
    fn test_snapshot_display() {
        let (ring, _) = ring(3);
        assert_eq!(
            ring.snapshot().to_string(),
            "index=0 target=0.0000 rotation=0.0000 animating=false locked=false highlighted=0"
        );
    }
}
