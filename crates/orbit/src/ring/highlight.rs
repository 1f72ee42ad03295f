use crate::error::HostError;
use crate::ring::SCALE_EPSILON;
use crate::sys::{
    Ease, HandleId, SceneHost, TweenEngine, TweenHandle, TweenProperty, TweenSink, TweenSpec,
    VisualVariant,
};
use std::time::Duration;

#[derive(Debug, Clone)]
struct ItemVisual {
    handle: HandleId,
    scale: f64,
    tween: Option<TweenHandle>,
}

/// Keeps exactly one ring item in the highlighted variant.
///
/// Callers are expected to have asked the selection guard first; this type
/// does no permission checks of its own.
#[derive(Debug)]
pub struct HighlightController {
    visuals: Vec<ItemVisual>,
    highlighted: Option<usize>,
    highlight_scale: f64,
    duration: Duration,
}

impl HighlightController {
    pub fn new(
        handles: impl IntoIterator<Item = HandleId>,
        highlight_scale: f64,
        duration: Duration,
    ) -> Self {
        Self {
            visuals: handles
                .into_iter()
                .map(|handle| ItemVisual {
                    handle,
                    scale: 1.0,
                    tween: None,
                })
                .collect(),
            highlighted: None,
            highlight_scale,
            duration,
        }
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn highlight_item_at_index<H: SceneHost, T: TweenEngine>(
        &mut self,
        host: &mut H,
        tweens: &mut T,
        sink: &TweenSink,
        index: usize,
    ) -> Result<(), HostError> {
        if index >= self.visuals.len() {
            log::warn!(
                "Ignoring highlight of index {} on a ring of {} items",
                index,
                self.visuals.len()
            );
            return Ok(());
        }

        for (i, visual) in self.visuals.iter().enumerate() {
            let variant = if i == index {
                VisualVariant::Highlighted
            } else {
                VisualVariant::Normal
            };
            host.set_visual_variant(visual.handle, variant)?;
        }

        let previous = self.highlighted.replace(index);
        if previous != Some(index) {
            if let Some(prev) = previous {
                self.retarget_scale(host, tweens, sink, prev, 1.0)?;
            }
            self.retarget_scale(host, tweens, sink, index, self.highlight_scale)?;
        }
        Ok(())
    }

    fn retarget_scale<H: SceneHost, T: TweenEngine>(
        &mut self,
        host: &mut H,
        tweens: &mut T,
        sink: &TweenSink,
        index: usize,
        to: f64,
    ) -> Result<(), HostError> {
        let visual = &mut self.visuals[index];
        if let Some(running) = visual.tween.take() {
            tweens.cancel(running)?;
        }
        if (visual.scale - to).abs() < SCALE_EPSILON {
            return Ok(());
        }
        if self.duration.is_zero() {
            visual.scale = to;
            return host.set_property(visual.handle, TweenProperty::Scale, to);
        }
        let spec = TweenSpec {
            target: visual.handle,
            property: TweenProperty::Scale,
            from: visual.scale,
            to,
            duration: self.duration,
            ease: Ease::EaseOut,
        };
        visual.tween = Some(tweens.animate(spec, sink.clone())?);
        Ok(())
    }

    /// Applies a scale tween event. Returns `false` when no item owns `handle`.
    pub fn apply_scale<H: SceneHost>(
        &mut self,
        host: &mut H,
        handle: TweenHandle,
        value: f64,
        finished: bool,
    ) -> Result<bool, HostError> {
        let Some(visual) = self.visuals.iter_mut().find(|v| v.tween == Some(handle)) else {
            return Ok(false);
        };
        visual.scale = value;
        if finished {
            visual.tween = None;
        }
        host.set_property(visual.handle, TweenProperty::Scale, value)?;
        Ok(true)
    }

    /// Hands over every running scale tween so it can be cancelled.
    pub fn take_scale_tweens(&mut self) -> Vec<TweenHandle> {
        self.visuals
            .iter_mut()
            .filter_map(|v| v.tween.take())
            .collect()
    }

    pub fn clear(&mut self) {
        self.highlighted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::{SceneArena, TweenEvent, Tweener};

    fn setup(
        count: usize,
        scale: f64,
        duration: Duration,
    ) -> (SceneArena, Vec<HandleId>, HighlightController) {
        let mut arena = SceneArena::new();
        let handles: Vec<_> = (0..count).map(|i| arena.spawn(format!("item-{i}"))).collect();
        let controller = HighlightController::new(handles.clone(), scale, duration);
        (arena, handles, controller)
    }

    #[test]
    fn test_exactly_one_highlighted() {
        let (mut arena, handles, mut controller) = setup(6, 1.0, Duration::ZERO);
        let (tx, _rx) = async_channel::unbounded();
        let sink = TweenSink::new(tx);
        let mut tweener = Tweener::new();

        for index in [2, 5, 0, 5] {
            controller
                .highlight_item_at_index(&mut arena, &mut tweener, &sink, index)
                .unwrap();
            assert_eq!(arena.highlighted(), vec![handles[index]]);
            assert_eq!(controller.highlighted(), Some(index));
        }
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let (mut arena, handles, mut controller) = setup(4, 1.0, Duration::ZERO);
        let (tx, _rx) = async_channel::unbounded();
        let sink = TweenSink::new(tx);
        let mut tweener = Tweener::new();

        controller
            .highlight_item_at_index(&mut arena, &mut tweener, &sink, 1)
            .unwrap();
        controller
            .highlight_item_at_index(&mut arena, &mut tweener, &sink, 4)
            .unwrap();
        assert_eq!(arena.highlighted(), vec![handles[1]]);
    }

    #[test]
    fn test_instant_scale_without_duration() {
        let (mut arena, handles, mut controller) = setup(3, 1.2, Duration::ZERO);
        let (tx, _rx) = async_channel::unbounded();
        let sink = TweenSink::new(tx);
        let mut tweener = Tweener::new();

        controller
            .highlight_item_at_index(&mut arena, &mut tweener, &sink, 0)
            .unwrap();
        controller
            .highlight_item_at_index(&mut arena, &mut tweener, &sink, 1)
            .unwrap();
        assert!(tweener.is_idle());
        assert_eq!(arena.node(handles[0]).unwrap().scale, 1.0);
        assert_eq!(arena.node(handles[1]).unwrap().scale, 1.2);
    }

    #[test]
    fn test_scale_tween_retargets() {
        let (mut arena, handles, mut controller) = setup(3, 1.5, Duration::from_millis(100));
        let (tx, rx) = async_channel::unbounded();
        let sink = TweenSink::new(tx);
        let mut tweener = Tweener::new();

        controller
            .highlight_item_at_index(&mut arena, &mut tweener, &sink, 0)
            .unwrap();
        assert_eq!(tweener.active_count(), 1);

        tweener.advance(Duration::from_millis(200));
        while let Ok(event) = rx.try_recv() {
            let (handle, value, finished) = match event {
                TweenEvent::Update { handle, value } => (handle, value, false),
                TweenEvent::Complete { handle, value } => (handle, value, true),
            };
            assert!(controller.apply_scale(&mut arena, handle, value, finished).unwrap());
        }
        assert_eq!(arena.node(handles[0]).unwrap().scale, 1.5);

        controller
            .highlight_item_at_index(&mut arena, &mut tweener, &sink, 2)
            .unwrap();
        let running = controller.take_scale_tweens();
        assert_eq!(running.len(), 2);
        assert!(controller.take_scale_tweens().is_empty());
    }
}
