use std::collections::HashMap;

use crate::geometry::{Rect, rectangles_overlap};

const GRID_CELL: f32 = 64.0;
/// Rectangles spanning more cells than this skip the grid and are scanned
/// linearly.
const MAX_INDEXED_CELLS: i64 = 4096;

/// Rectangles committed so far in one run, with a uniform grid for fast
/// collision queries.
///
/// Reserved rectangles take part in every collision test but are not
/// counted among the placed labels.
#[derive(Debug, Clone)]
pub struct PlacedSet {
    rects: Vec<Rect>,
    reserved: usize,
    padding: f32,
    cell: f32,
    /// Maps grid cell (ix, iy) to indices into `rects`.
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Indices of rects too large for the grid.
    oversized: Vec<usize>,
}

impl PlacedSet {
    pub fn new(padding: f32) -> Self {
        Self {
            rects: Vec::new(),
            reserved: 0,
            padding: padding.max(0.0),
            cell: GRID_CELL,
            cells: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    pub fn with_reserved(padding: f32, reserved: Option<Rect>) -> Self {
        let mut set = Self::new(padding);
        if let Some(rect) = reserved {
            set.reserve(rect);
        }
        set
    }

    /// Seed a rectangle that blocks placement without being a label.
    ///
    /// Must happen before the first [`PlacedSet::push`].
    pub fn reserve(&mut self, rect: Rect) {
        debug_assert_eq!(self.rects.len(), self.reserved, "reserve after push");
        self.insert(rect);
        self.reserved += 1;
    }

    pub fn push(&mut self, rect: Rect) {
        self.insert(rect);
    }

    fn insert(&mut self, rect: Rect) {
        let idx = self.rects.len();
        let range = self.cell_range(&rect);
        if cell_count(range) > MAX_INDEXED_CELLS {
            self.oversized.push(idx);
            self.rects.push(rect);
            return;
        }
        let (x0, y0, x1, y1) = range;
        for ix in x0..=x1 {
            for iy in y0..=y1 {
                self.cells.entry((ix, iy)).or_default().push(idx);
            }
        }
        self.rects.push(rect);
    }

    /// True when `candidate` comes within the padding of any committed rect.
    pub fn collides(&self, candidate: &Rect) -> bool {
        let hits = |idx: usize| rectangles_overlap(candidate, &self.rects[idx], self.padding);
        if self.oversized.iter().any(|&idx| hits(idx)) {
            return true;
        }
        let range = self.cell_range(&candidate.inflate(self.padding));
        if cell_count(range) > MAX_INDEXED_CELLS {
            return (0..self.rects.len()).any(hits);
        }
        let (x0, y0, x1, y1) = range;
        for ix in x0..=x1 {
            for iy in y0..=y1 {
                let Some(indices) = self.cells.get(&(ix, iy)) else {
                    continue;
                };
                if indices.iter().any(|&idx| hits(idx)) {
                    return true;
                }
            }
        }
        false
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    /// All committed rectangles, reserved ones first.
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Committed label rectangles, without the reserved ones.
    pub fn placed(&self) -> &[Rect] {
        &self.rects[self.reserved..]
    }

    pub fn len(&self) -> usize {
        self.rects.len() - self.reserved
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell_range(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        // Float-to-int casts saturate, so huge extents stay in range.
        let x0 = (rect.left() / self.cell).floor() as i32;
        let y0 = (rect.top() / self.cell).floor() as i32;
        let x1 = (rect.right() / self.cell).floor() as i32;
        let y1 = (rect.bottom() / self.cell).floor() as i32;
        (x0, y0, x1.max(x0), y1.max(y0))
    }
}

fn cell_count((x0, y0, x1, y1): (i32, i32, i32, i32)) -> i64 {
    (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1)
}
