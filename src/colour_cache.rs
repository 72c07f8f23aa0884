use crate::constants::{SWATCH_COLUMNS, SWATCH_ROWS};
use crate::pixel_grid::Colour;
use egui::{pos2, vec2, Pos2, Rect};
use image::Rgba;
use std::collections::VecDeque;

/// Recently used colours: distinct, oldest first, bounded by `cols * rows`.
#[derive(Clone, Debug)]
pub struct RecentColours {
    colours: VecDeque<Colour>,
    cols: usize,
    rows: usize,
}

impl Default for RecentColours {
    fn default() -> Self {
        let mut recent = Self::new(SWATCH_COLUMNS, SWATCH_ROWS);
        for colour in [
            Rgba([255, 0, 0, 255]),
            Rgba([0, 255, 0, 255]),
            Rgba([0, 0, 255, 255]),
        ] {
            recent.add(colour);
        }
        recent
    }
}

impl RecentColours {
    pub fn new(cols: usize, rows: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            colours: VecDeque::with_capacity(cols * rows),
            cols,
            rows,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cols * self.rows
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }

    pub fn columns(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn get(&self, index: usize) -> Option<Colour> {
        self.colours.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Colour> + '_ {
        self.colours.iter().copied()
    }

    /// Appends `colour` unless an identical one is already held. Evicts the oldest when full.
    pub fn add(&mut self, colour: Colour) {
        if self.colours.contains(&colour) {
            return;
        }
        if self.colours.len() >= self.capacity() {
            self.colours.pop_front();
        }
        self.colours.push_back(colour);
    }

    /// Square cell side and the top-left of the centred swatch grid inside `rect`.
    fn layout(&self, rect: Rect) -> (Pos2, f32) {
        let side = (rect.width() / self.cols as f32).min(rect.height() / self.rows as f32);
        let origin = pos2(
            rect.left() + (rect.width() - self.cols as f32 * side) / 2.0,
            rect.top() + (rect.height() - self.rows as f32 * side) / 2.0,
        );
        (origin, side)
    }

    /// Screen rectangle of swatch `index` when the grid is drawn into `rect`.
    pub fn cell_rect(&self, index: usize, rect: Rect) -> Rect {
        let (origin, side) = self.layout(rect);
        let col = (index % self.cols) as f32;
        let row = (index / self.cols) as f32;
        Rect::from_min_size(origin + vec2(col * side, row * side), vec2(side, side))
    }

    /// Returns the colour drawn under `pos`, if that cell is occupied.
    pub fn hit_test(&self, pos: Pos2, rect: Rect) -> Option<Colour> {
        let (origin, side) = self.layout(rect);
        if side <= 0.0 {
            return None;
        }
        let col = ((pos.x - origin.x) / side).floor();
        let row = ((pos.y - origin.y) / side).floor();
        if col < 0.0 || row < 0.0 || col >= self.cols as f32 || row >= self.rows as f32 {
            return None;
        }
        self.get(row as usize * self.cols + col as usize)
    }
}

/// A colour being adjusted in an interactive picker.
///
/// Pickers report a new value on every frame of a drag; only the value left when
/// the picker closes is handed on, so intermediate colours never reach the cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingColour {
    draft: Option<Colour>,
}

impl PendingColour {
    /// The draft if one is in progress, otherwise `committed`.
    pub fn current(&self, committed: Colour) -> Colour {
        self.draft.unwrap_or(committed)
    }

    pub fn edit(&mut self, colour: Colour) {
        self.draft = Some(colour);
    }

    /// Hands out the draft once the picker is closed.
    pub fn settle(&mut self, picker_open: bool) -> Option<Colour> {
        if picker_open {
            None
        } else {
            self.draft.take()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey(v: u8) -> Colour {
        Rgba([v, v, v, 255])
    }

    fn contents(recent: &RecentColours) -> Vec<Colour> {
        recent.iter().collect()
    }

    #[test]
    fn test_fifo_eviction() {
        let mut recent = RecentColours::new(2, 2);
        for v in 1..=5 {
            recent.add(grey(v));
        }
        assert_eq!(contents(&recent), vec![grey(2), grey(3), grey(4), grey(5)]);

        recent.add(grey(3));
        assert_eq!(contents(&recent), vec![grey(2), grey(3), grey(4), grey(5)]);
    }

    #[test]
    fn test_duplicates_do_not_reorder() {
        let mut recent = RecentColours::new(4, 1);
        recent.add(grey(1));
        recent.add(grey(2));
        recent.add(grey(1));
        assert_eq!(recent.len(), 2);

        recent.add(grey(3));
        recent.add(grey(4));
        recent.add(grey(5));
        // grey(1) was re-added but is still the oldest
        assert_eq!(contents(&recent), vec![grey(2), grey(3), grey(4), grey(5)]);
    }

    #[test]
    fn test_exact_match_includes_alpha() {
        let mut recent = RecentColours::new(4, 1);
        recent.add(Rgba([1, 2, 3, 255]));
        recent.add(Rgba([1, 2, 3, 128]));
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_default_palette() {
        let recent = RecentColours::default();
        assert_eq!(recent.capacity(), 64);
        assert_eq!(recent.get(0), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(recent.len(), 3);
    }

    #[test]
    fn test_hit_test_letterboxed_grid() {
        let mut recent = RecentColours::new(4, 2);
        for v in 1..=5 {
            recent.add(grey(v));
        }
        // 200x50 area: cells are 25px squares, grid is 100px wide and centred at x=50
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(200.0, 50.0));

        assert_eq!(recent.hit_test(pos2(60.0, 10.0), rect), Some(grey(1)));
        assert_eq!(recent.hit_test(pos2(140.0, 10.0), rect), Some(grey(4)));
        assert_eq!(recent.hit_test(pos2(60.0, 30.0), rect), Some(grey(5)));
        // unoccupied cell
        assert_eq!(recent.hit_test(pos2(90.0, 30.0), rect), None);
        // letterbox margins
        assert_eq!(recent.hit_test(pos2(20.0, 10.0), rect), None);
        assert_eq!(recent.hit_test(pos2(160.0, 10.0), rect), None);
    }

    #[test]
    fn test_cell_rect_matches_hit_test() {
        let recent = RecentColours::default();
        let rect = Rect::from_min_size(pos2(10.0, 10.0), vec2(256.0, 64.0));
        let cell = recent.cell_rect(2, rect);
        assert_eq!(recent.hit_test(cell.center(), rect), recent.get(2));
    }

    #[test]
    fn test_pending_colour_settles_once() {
        let mut recent = RecentColours::new(4, 1);
        let mut pending = PendingColour::default();
        assert_eq!(pending.current(grey(1)), grey(1));

        for v in 10..200 {
            pending.edit(grey(v));
            assert_eq!(pending.settle(true), None);
        }
        assert_eq!(pending.current(grey(1)), grey(199));

        if let Some(colour) = pending.settle(false) {
            recent.add(colour);
        }
        assert_eq!(pending.settle(false), None);
        assert_eq!(contents(&recent), vec![grey(199)]);
    }
}
