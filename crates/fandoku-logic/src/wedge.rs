//! Sector and annulus-wedge shapes for the fan rings.
//!
//! The center and its two parents draw as full sectors from the origin;
//! generation 2 and beyond draw as annulus wedges bounded by an inner
//! and outer radius. Shape angles come from the same arc partition the
//! label layout uses, so wedges and labels stay aligned.

use kurbo::{BezPath, CircleSegment, Point, Shape};
use serde::{Deserialize, Serialize};

use crate::ahnentafel::{first_slot, generation, position, slots_in_generation, Slot};
use crate::config::FanGeometryConfig;
use crate::layout::arc_bounds;

/// Curve-flattening tolerance for emitted paths.
const PATH_TOLERANCE: f64 = 0.1;

/// One slot's shape around the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WedgeShape {
    pub generation: u32,
    pub position: u64,
    pub start_deg: f64,
    pub end_deg: f64,
    /// Zero for the full sectors of generations 0 and 1.
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl WedgeShape {
    /// Whether this shape reaches the origin (generations 0 and 1).
    pub fn is_sector(&self) -> bool {
        self.inner_radius == 0.0
    }

    /// Render the shape as a vector path around the origin.
    pub fn to_path(&self) -> BezPath {
        let segment = CircleSegment::new(
            Point::ORIGIN,
            self.outer_radius,
            self.inner_radius,
            self.start_deg.to_radians(),
            (self.end_deg - self.start_deg).to_radians(),
        );
        segment.to_path(PATH_TOLERANCE)
    }
}

/// Build the shape for one slot.
pub fn wedge_for(slot: Slot, config: &FanGeometryConfig) -> WedgeShape {
    let g = generation(slot);
    let (start_deg, end_deg) = arc_bounds(slot, config.max_angle);
    let rpg = config.radius_per_generation;
    let (inner_radius, outer_radius) = match g {
        0 => (0.0, config.inner_radius),
        1 => (0.0, 1.5 * rpg),
        _ => ((g as f64 - 0.5) * rpg, (g as f64 + 0.5) * rpg),
    };
    WedgeShape {
        generation: g,
        position: position(slot),
        start_deg,
        end_deg,
        inner_radius,
        outer_radius,
    }
}

/// Shapes for one ring. Rings past the displayed generation count are
/// kept but hidden, so growing the count again is cheap.
#[derive(Debug, Clone)]
pub struct GenerationShapes {
    pub generation: u32,
    pub visible: bool,
    /// Shapes in position order.
    pub wedges: Vec<WedgeShape>,
}

/// Cache of built ring shapes.
///
/// A change comparator on the two inputs that affect shape geometry —
/// the arc width and the generation count — gates rebuilds: an angle
/// change rebuilds every ring, generation-count growth appends only the
/// missing rings, and shrinking only toggles visibility.
#[derive(Debug, Clone, Default)]
pub struct WedgeCache {
    built_for_angle: Option<f64>,
    rings: Vec<GenerationShapes>,
}

impl WedgeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the cache in line with `config`.
    ///
    /// Returns the generations whose shapes were (re)built; untouched
    /// rings keep their shapes.
    pub fn ensure(&mut self, config: &FanGeometryConfig) -> Vec<u32> {
        if self.built_for_angle != Some(config.max_angle) {
            self.rings.clear();
            self.built_for_angle = Some(config.max_angle);
        }

        let want = config.num_generations;
        let mut rebuilt = Vec::new();
        while (self.rings.len() as u32) < want {
            let g = self.rings.len() as u32;
            let wedges = (0..slots_in_generation(g))
                .map(|p| wedge_for(first_slot(g) + p, config))
                .collect();
            self.rings.push(GenerationShapes { generation: g, visible: true, wedges });
            rebuilt.push(g);
        }
        for ring in &mut self.rings {
            ring.visible = ring.generation < want;
        }
        rebuilt
    }

    pub fn ring(&self, generation: u32) -> Option<&GenerationShapes> {
        self.rings.get(generation as usize)
    }

    /// Shape for a slot, if its ring has been built.
    pub fn shape_for(&self, slot: Slot) -> Option<&WedgeShape> {
        let ring = self.ring(generation(slot))?;
        ring.wedges.get(position(slot) as usize)
    }

    pub fn is_visible(&self, generation: u32) -> bool {
        self.ring(generation).map(|r| r.visible).unwrap_or(false)
    }
}
