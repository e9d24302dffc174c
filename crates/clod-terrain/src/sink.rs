//! Boundary between the engine and whatever renders its patches.
//!
//! The engine never touches GPU objects. It tells a [`RenderSink`] when a
//! patch's render resource is created, shown, hidden, textured, given new
//! geometry, or destroyed; the sink owns everything behind those calls.

use std::collections::BTreeMap;

use crate::{PatchId, PatchMesh};

/// Display material shared by every patch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatchMaterial {
    /// Linear RGBA base color.
    pub base_color: [f32; 4],
    /// Surface smoothness in `[0, 1]`.
    pub glossiness: f32,
}

impl Default for PatchMaterial {
    fn default() -> Self {
        Self {
            base_color: [0.5, 0.5, 0.5, 1.0],
            glossiness: 0.1,
        }
    }
}

/// Receiver of patch render-resource lifecycle events.
pub trait RenderSink {
    /// A patch was created; `parent` owns it in the scene hierarchy.
    fn create(&mut self, id: PatchId, parent: Option<PatchId>);
    /// Show or hide a patch.
    fn set_visible(&mut self, id: PatchId, visible: bool);
    /// Assign the display material. Called once per patch.
    fn apply_material(&mut self, id: PatchId, material: &PatchMaterial);
    /// Replace the patch's geometry with a finished mesh.
    fn upload(&mut self, id: PatchId, mesh: &PatchMesh);
    /// Release the patch's resource. The id may be reused afterwards.
    fn destroy(&mut self, id: PatchId);
}

/// Sink that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn create(&mut self, _id: PatchId, _parent: Option<PatchId>) {}
    fn set_visible(&mut self, _id: PatchId, _visible: bool) {}
    fn apply_material(&mut self, _id: PatchId, _material: &PatchMaterial) {}
    fn upload(&mut self, _id: PatchId, _mesh: &PatchMesh) {}
    fn destroy(&mut self, _id: PatchId) {}
}

/// Last known state of one render resource held by a [`RecordingSink`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordedPatch {
    /// Scene parent at creation time.
    pub parent: Option<PatchId>,
    /// Current visibility.
    pub visible: bool,
    /// Material, once applied.
    pub material: Option<PatchMaterial>,
    /// Most recently uploaded mesh.
    pub mesh: Option<PatchMesh>,
}

/// Event counters kept by a [`RecordingSink`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub created: usize,
    pub destroyed: usize,
    pub uploads: usize,
    pub materials: usize,
    pub visibility_changes: usize,
}

/// In-memory sink that mirrors resource state, for headless runs and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    resources: BTreeMap<PatchId, RecordedPatch>,
    stats: SinkStats,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a live resource.
    pub fn get(&self, id: PatchId) -> Option<&RecordedPatch> {
        self.resources.get(&id)
    }

    /// Live resources in id order.
    pub fn resources(&self) -> impl Iterator<Item = (PatchId, &RecordedPatch)> {
        self.resources.iter().map(|(id, patch)| (*id, patch))
    }

    /// Ids of resources currently shown.
    pub fn visible(&self) -> Vec<PatchId> {
        self.resources
            .iter()
            .filter(|(_, patch)| patch.visible)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
    }
}

impl RenderSink for RecordingSink {
    fn create(&mut self, id: PatchId, parent: Option<PatchId>) {
        self.stats.created += 1;
        self.resources.insert(
            id,
            RecordedPatch {
                parent,
                ..Default::default()
            },
        );
    }

    fn set_visible(&mut self, id: PatchId, visible: bool) {
        self.stats.visibility_changes += 1;
        if let Some(patch) = self.resources.get_mut(&id) {
            patch.visible = visible;
        }
    }

    fn apply_material(&mut self, id: PatchId, material: &PatchMaterial) {
        self.stats.materials += 1;
        if let Some(patch) = self.resources.get_mut(&id) {
            patch.material = Some(*material);
        }
    }

    fn upload(&mut self, id: PatchId, mesh: &PatchMesh) {
        self.stats.uploads += 1;
        if let Some(patch) = self.resources.get_mut(&id) {
            patch.mesh = Some(mesh.clone());
        }
    }

    fn destroy(&mut self, id: PatchId) {
        self.stats.destroyed += 1;
        self.resources.remove(&id);
    }
}
