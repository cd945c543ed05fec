//! Layout configuration.

use tm_core::Polygon;
use tm_grid::{GridKind, Penalties};

/// All knobs of the octilinearizer.
///
/// The defaults reproduce the standard schematic-map look: 100-unit cells,
/// octilinear base graph, single un-rotated pass.
#[derive(Clone, Debug)]
pub struct LayoutConfig {
    /// Grid cell size in input units.
    pub cell_size: f64,
    /// Padding added around the input bounding box before gridding.
    pub border_rad: f64,
    /// Base-graph variant.
    pub base_graph: GridKind,
    /// Layout penalty weights.
    pub pens: Penalties,
    /// Maximum node displacement, in cells, the widening target-candidate
    /// search may reach.
    pub max_grid_dist: f64,
    /// Stop routing after this many generations and keep the layout so far.
    pub abort_after: Option<usize>,
    /// Hanan-grid densification rounds.  The regular grid variant does not
    /// support densification; a non-zero value is ignored with a warning.
    pub hanan_iters: usize,
    /// Rotations (degrees) to try; the cheapest layout wins and is rotated
    /// back.  Empty means a single pass at 0°.
    pub rotations: Vec<f64>,
    /// Obstacle polygons; real edges crossing them are closed.
    pub obstacles: Vec<Polygon>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cell_size: 100.0,
            border_rad: 0.0,
            base_graph: GridKind::Octilinear,
            pens: Penalties::default(),
            max_grid_dist: 3.0,
            abort_after: None,
            hanan_iters: 0,
            rotations: Vec::new(),
            obstacles: Vec::new(),
        }
    }
}

impl LayoutConfig {
    /// Threshold below which transit edges are collapsed before layout.
    pub fn short_edge_threshold(&self) -> f64 {
        self.cell_size / 2.0
    }
}
