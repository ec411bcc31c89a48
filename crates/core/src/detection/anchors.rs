//! Anchor (prior box) generation for single-shot face detectors.
//!
//! Two layout modes produce the same thing, an ordered sequence of
//! normalized anchor rectangles matching the detector's output head:
//! a procedural grid for models whose anchors form a regular lattice,
//! and a table loaded from a text resource for models whose geometry
//! is precomputed offline.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::shared::rect::RectF;

/// Anchor center offset within a grid cell (cell-center convention).
const DEFAULT_OFFSET: f32 = 0.5;

/// Procedural anchor layout: an ordered list of `(grid_size, replicas)`
/// pairs. For each grid size `S` the generator emits `S × S` cells in
/// row-major order, each replicated `replicas` times consecutively,
/// with a unit 1×1 box centered in the cell.
#[derive(Clone, Debug)]
pub struct GridAnchorLayout {
    pub cells: Vec<(u32, u32)>,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl GridAnchorLayout {
    pub fn new(cells: Vec<(u32, u32)>) -> Self {
        Self {
            cells,
            offset_x: DEFAULT_OFFSET,
            offset_y: DEFAULT_OFFSET,
        }
    }

    /// BlazeFace short-range layout: 16×16 cells × 2 anchors plus
    /// 8×8 cells × 6 anchors = 896.
    pub fn short_range() -> Self {
        Self::new(vec![(16, 2), (8, 6)])
    }

    /// Generate the ordered anchor sequence.
    ///
    /// The total count must equal the detector's declared box count;
    /// that is a caller contract, not enforced here.
    pub fn generate(&self) -> Vec<RectF> {
        let mut anchors = Vec::new();
        for &(size, replicas) in &self.cells {
            for y in 0..size {
                for x in 0..size {
                    let cx = (x as f32 + self.offset_x) / size as f32;
                    let cy = (y as f32 + self.offset_y) / size as f32;
                    for _ in 0..replicas {
                        anchors.push(RectF::from_center(cx, cy, 1.0, 1.0));
                    }
                }
            }
        }
        anchors
    }
}

/// Parse a precomputed anchor table: one anchor per line as
/// `cx,cy,w,h`, each converting to `(cx − w/2, cy − h/2, w, h)`.
///
/// Lines that fail to parse are skipped with a warning rather than
/// aborting the load; a mismatched anchor count then surfaces as a
/// caller-contract violation downstream.
pub fn parse_anchor_table(reader: impl BufRead) -> std::io::Result<Vec<RectF>> {
    let mut anchors = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_anchor_line(&line) {
            Some(anchor) => anchors.push(anchor),
            None => {
                if !line.trim().is_empty() {
                    log::warn!("skipping malformed anchor table line {}", line_no + 1);
                }
            }
        }
    }
    Ok(anchors)
}

/// Load an anchor table from a file path.
pub fn load_anchor_table(path: &Path) -> std::io::Result<Vec<RectF>> {
    let file = File::open(path)?;
    parse_anchor_table(BufReader::new(file))
}

fn parse_anchor_line(line: &str) -> Option<RectF> {
    let mut fields = line.split(',');
    let cx: f32 = fields.next()?.trim().parse().ok()?;
    let cy: f32 = fields.next()?.trim().parse().ok()?;
    let w: f32 = fields.next()?.trim().parse().ok()?;
    let h: f32 = fields.next()?.trim().parse().ok()?;
    Some(RectF::from_center(cx, cy, w, h))
}
