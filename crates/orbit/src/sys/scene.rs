use crate::error::HostError;
use crate::sys::tween::TweenProperty;
use derive_more::{Display, From, Into};
use strum::{Display as StrumDisplay, EnumString};

/// Lookup-only reference to an object owned by the scene host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("#{_0}")]
pub struct HandleId(usize);

impl HandleId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, StrumDisplay, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum VisualVariant {
    #[default]
    Normal,
    Highlighted,
}

/// The scene graph the ring renders into. The ring never creates or destroys objects itself.
pub trait SceneHost {
    fn attach(&mut self, handle: HandleId) -> Result<(), HostError>;
    fn detach(&mut self, handle: HandleId) -> Result<(), HostError>;
    fn set_visual_variant(
        &mut self,
        handle: HandleId,
        variant: VisualVariant,
    ) -> Result<(), HostError>;
    fn set_property(
        &mut self,
        handle: HandleId,
        property: TweenProperty,
        value: f64,
    ) -> Result<(), HostError>;
    fn release_resources(&mut self, handle: HandleId) -> Result<(), HostError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub label: String,
    pub attached: bool,
    pub variant: VisualVariant,
    pub rotation: f64,
    pub scale: f64,
    pub released: bool,
}

impl SceneNode {
    fn new(label: String) -> Self {
        Self {
            label,
            attached: false,
            variant: VisualVariant::Normal,
            rotation: 0.0,
            scale: 1.0,
            released: false,
        }
    }
}

/// In-memory scene host keeping a table of live nodes.
///
/// A node is freed once its resources have been released and it has been
/// detached; any later call with its handle fails with [`HostError::StaleHandle`].
#[derive(Debug, Default)]
pub struct SceneArena {
    nodes: Vec<Option<SceneNode>>,
}

impl SceneArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, label: impl Into<String>) -> HandleId {
        self.nodes.push(Some(SceneNode::new(label.into())));
        HandleId(self.nodes.len() - 1)
    }

    pub fn node(&self, handle: HandleId) -> Option<&SceneNode> {
        self.nodes.get(handle.0).and_then(Option::as_ref)
    }

    pub fn live_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn highlighted(&self) -> Vec<HandleId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| {
                n.as_ref()
                    .filter(|n| n.variant == VisualVariant::Highlighted)
                    .map(|_| HandleId(i))
            })
            .collect()
    }

    fn live_mut(&mut self, handle: HandleId) -> Result<&mut SceneNode, HostError> {
        self.nodes
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .filter(|n| !n.released)
            .ok_or(HostError::StaleHandle(handle))
    }
}

impl SceneHost for SceneArena {
    fn attach(&mut self, handle: HandleId) -> Result<(), HostError> {
        self.live_mut(handle)?.attached = true;
        Ok(())
    }

    fn detach(&mut self, handle: HandleId) -> Result<(), HostError> {
        let slot = self
            .nodes
            .get_mut(handle.0)
            .ok_or(HostError::StaleHandle(handle))?;
        let node = slot.as_mut().ok_or(HostError::StaleHandle(handle))?;
        node.attached = false;
        if node.released {
            *slot = None;
        }
        Ok(())
    }

    fn set_visual_variant(
        &mut self,
        handle: HandleId,
        variant: VisualVariant,
    ) -> Result<(), HostError> {
        self.live_mut(handle)?.variant = variant;
        Ok(())
    }

    fn set_property(
        &mut self,
        handle: HandleId,
        property: TweenProperty,
        value: f64,
    ) -> Result<(), HostError> {
        let node = self.live_mut(handle)?;
        match property {
            TweenProperty::Rotation => node.rotation = value,
            TweenProperty::Scale => node.scale = value,
        }
        Ok(())
    }

    fn release_resources(&mut self, handle: HandleId) -> Result<(), HostError> {
        let node = self.live_mut(handle)?;
        node.released = true;
        node.variant = VisualVariant::Normal;
        Ok(())
    }
}
