//! Scene emission for the rendering surface.
//!
//! The engine does not draw. Per occupied visible slot it emits a
//! vector path, a placement transform, and text lines; a thin adapter
//! on the host side pushes those into whatever scene graph is in use.

use std::collections::HashMap;

use kurbo::BezPath;

use fandoku_logic::ahnentafel::Slot;
use fandoku_logic::config::FanGeometryConfig;
use fandoku_logic::layout::place;
use fandoku_logic::wedge::WedgeCache;

use crate::index::AhnentafelIndex;
use crate::person::Person;
use crate::store::AncestorStore;

/// Placement transform for one drawn slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransform {
    pub x: f64,
    pub y: f64,
    pub rotation_deg: f64,
}

/// One draw item: shape, transform, and text for a slot.
#[derive(Debug, Clone)]
pub struct SceneItem {
    pub slot: Slot,
    pub shape: BezPath,
    pub transform: SceneTransform,
    /// Name, lifespan, birth place. Empty for private records.
    pub text: Vec<String>,
}

/// Ordered draw items for one frame, inner rings first.
#[derive(Debug, Clone, Default)]
pub struct ScenePlan {
    pub items: Vec<SceneItem>,
}

/// Build the plan for every occupied slot in the displayed range.
pub fn build_scene(
    store: &AncestorStore,
    index: &AhnentafelIndex,
    config: &FanGeometryConfig,
    cache: &mut WedgeCache,
) -> ScenePlan {
    cache.ensure(config);
    let mut items = Vec::new();
    for g in 0..config.num_generations {
        for slot in index.occupied_in(g) {
            let wedge = match cache.shape_for(slot) {
                Some(wedge) => wedge,
                None => continue,
            };
            let placement = place(slot, config);
            let text = index
                .person_at(slot)
                .and_then(|id| store.get(id))
                .map(person_text)
                .unwrap_or_default();
            items.push(SceneItem {
                slot,
                shape: wedge.to_path(),
                transform: SceneTransform {
                    x: placement.x,
                    y: placement.y,
                    rotation_deg: placement.rotation_deg,
                },
                text,
            });
        }
    }
    ScenePlan { items }
}

fn person_text(person: &Person) -> Vec<String> {
    if person.private {
        return Vec::new();
    }
    let mut lines = vec![person.display_name()];
    let lifespan = person.lifespan();
    if !lifespan.is_empty() {
        lines.push(lifespan);
    }
    if let Some(place) = &person.birth.place {
        lines.push(place.clone());
    }
    lines
}

/// The renderer contract: shapes, transforms, and text keyed by slot.
/// The host wires clicks back through the same keys.
pub trait RenderSurface {
    fn set_shape(&mut self, slot: Slot, path: &BezPath);
    fn set_transform(&mut self, slot: Slot, x: f64, y: f64, rotation_deg: f64);
    fn set_text(&mut self, slot: Slot, lines: &[String]);
}

/// Push a plan through a surface, item order preserved.
pub fn apply_plan(plan: &ScenePlan, surface: &mut dyn RenderSurface) {
    for item in &plan.items {
        surface.set_shape(item.slot, &item.shape);
        surface.set_transform(
            item.slot,
            item.transform.x,
            item.transform.y,
            item.transform.rotation_deg,
        );
        surface.set_text(item.slot, &item.text);
    }
}

/// Surface that records what it was told; for tests and debugging.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub shapes: Vec<Slot>,
    pub transforms: HashMap<Slot, (f64, f64, f64)>,
    pub texts: HashMap<Slot, Vec<String>>,
}

impl RenderSurface for RecordingSurface {
    fn set_shape(&mut self, slot: Slot, _path: &BezPath) {
        self.shapes.push(slot);
    }

    fn set_transform(&mut self, slot: Slot, x: f64, y: f64, rotation_deg: f64) {
        self.transforms.insert(slot, (x, y, rotation_deg));
    }

    fn set_text(&mut self, slot: Slot, lines: &[String]) {
        self.texts.insert(slot, lines.to_vec());
    }
}
