//! Pixel-precise editing surface.
//!
//! The canvas keeps the original asset, the edited overlay drawn by the user and the
//! derived state needed to show both inside a widget: the letterboxed display
//! rectangle, the opacity-scaled copy of the original and the paint state machine.
//! It does not draw anything itself; the host asks for [`Canvas::checker_cells`],
//! [`Canvas::layer_order`] and the two layer grids and paints them.

use crate::constants::{CHECKER_CELL_SIZE, PLACEHOLDER_IMAGE_SIZE};
use crate::pixel_grid::{Colour, PixelGrid, TRANSPARENT};
use egui::{vec2, Pos2, Rect};
use image::Rgba;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToolMode {
    #[default]
    Draw,
    ColourPick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Pointer input in widget coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Press { pos: Pos2, button: PointerButton },
    Move { pos: Pos2 },
    Release { pos: Pos2, button: PointerButton },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaintState {
    #[default]
    Idle,
    Painting,
    Erasing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Original,
    Edited,
}

/// What a pointer event asks the canvas to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaintEffect {
    Put(Pos2),
    Clear(Pos2),
    Sample(Layer, Pos2),
}

/// Notifications for the host, drained with [`Canvas::take_events`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasEvent {
    ColourChanged(Colour),
    ColourPicked(Colour),
    ImageEdited,
}

/// Paint state transition. Pure: the caller applies the returned effect.
pub fn step(
    state: PaintState,
    mode: ToolMode,
    event: PointerEvent,
) -> (PaintState, Option<PaintEffect>) {
    match mode {
        ToolMode::Draw => match event {
            PointerEvent::Press {
                pos,
                button: PointerButton::Primary,
            } => (PaintState::Painting, Some(PaintEffect::Put(pos))),
            PointerEvent::Press {
                pos,
                button: PointerButton::Secondary,
            } => (PaintState::Erasing, Some(PaintEffect::Clear(pos))),
            PointerEvent::Move { pos } => match state {
                PaintState::Painting => (state, Some(PaintEffect::Put(pos))),
                PaintState::Erasing => (state, Some(PaintEffect::Clear(pos))),
                PaintState::Idle => (state, None),
            },
            PointerEvent::Release { .. } => (PaintState::Idle, None),
        },
        ToolMode::ColourPick => match event {
            PointerEvent::Release { pos, button } => {
                let layer = match button {
                    PointerButton::Primary => Layer::Edited,
                    PointerButton::Secondary => Layer::Original,
                };
                (PaintState::Idle, Some(PaintEffect::Sample(layer, pos)))
            }
            _ => (PaintState::Idle, None),
        },
    }
}

/// Largest rectangle with the image's aspect ratio that fits centred in `widget`.
pub fn display_rect(widget: Rect, image_size: (u32, u32)) -> Rect {
    let (iw, ih) = (image_size.0.max(1) as f32, image_size.1.max(1) as f32);
    let (w, h) = (widget.width().max(0.0), widget.height().max(0.0));

    let height_from_width = (w / iw * ih).floor();
    let width_from_height = (h / ih * iw).floor();
    let size = if width_from_height > w {
        vec2(w, height_from_width)
    } else {
        vec2(width_from_height, h)
    };

    let offset = vec2(((w - size.x) / 2.0).floor(), ((h - size.y) / 2.0).floor());
    Rect::from_min_size(widget.min + offset, size)
}

/// Maps a widget position to an image pixel, or None when it falls outside the image.
///
/// Both axes share the horizontal scale factor: `rect` has the image's aspect ratio,
/// so this is the single letterbox scale.
pub fn widget_to_image(pos: Pos2, rect: Rect, image_size: (u32, u32)) -> Option<(u32, u32)> {
    if rect.width() <= 0.0 {
        return None;
    }
    let scale = image_size.0 as f32 / rect.width();
    let rel = pos - rect.min;
    let x = (rel.x * scale).floor();
    let y = (rel.y * scale).floor();
    if x < 0.0 || y < 0.0 || x >= image_size.0 as f32 || y >= image_size.1 as f32 {
        return None;
    }
    Some((x as u32, y as u32))
}

pub struct Canvas {
    original: PixelGrid,
    original_alpha_image: PixelGrid,
    image: PixelGrid,
    mode: ToolMode,
    state: PaintState,
    colour: Colour,
    image_dirty: bool,
    original_alpha: u8,
    original_on_top: bool,
    widget_rect: Rect,
    image_rect: Rect,
    original_revision: u64,
    image_revision: u64,
    redraw: bool,
    events: Vec<CanvasEvent>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        let original = PixelGrid::new(PLACEHOLDER_IMAGE_SIZE, PLACEHOLDER_IMAGE_SIZE);
        let widget_rect = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        Self {
            original_alpha_image: original.clone(),
            image: original.clone(),
            image_rect: display_rect(widget_rect, original.size()),
            original,
            mode: ToolMode::Draw,
            state: PaintState::Idle,
            colour: Rgba([0, 0, 0, 255]),
            image_dirty: false,
            original_alpha: u8::MAX,
            original_on_top: false,
            widget_rect,
            original_revision: 0,
            image_revision: 0,
            redraw: false,
            events: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Images
    // ─────────────────────────────────────────────────────────────────────────────

    /// Shows a new original and starts a blank, same-sized edited layer.
    pub fn set_original_image(&mut self, original: PixelGrid) {
        self.image = PixelGrid::new(original.width(), original.height());
        self.original = original;
        self.image_dirty = false;
        self.state = PaintState::Idle;
        self.update_image_rect();
        self.update_original_alpha_image();
        self.image_revision += 1;
        self.redraw = true;
    }

    /// Replaces only the edited layer, e.g. with a previously stored edit.
    pub fn set_image(&mut self, image: PixelGrid) {
        self.image = image;
        self.image_dirty = false;
        self.image_revision += 1;
        self.redraw = true;
    }

    pub fn original(&self) -> &PixelGrid {
        &self.original
    }

    /// The original with the current opacity applied. Cached until opacity or original change.
    pub fn original_alpha_image(&self) -> &PixelGrid {
        &self.original_alpha_image
    }

    pub fn image(&self) -> &PixelGrid {
        &self.image
    }

    pub fn image_is_dirty(&self) -> bool {
        self.image_dirty
    }

    /// Hands out the edited layer if it changed since the last image was set or taken.
    pub fn take_dirty_image(&mut self) -> Option<PixelGrid> {
        if !self.image_dirty {
            return None;
        }
        self.image_dirty = false;
        Some(self.image.clone())
    }

    /// Bumped whenever [`Self::original_alpha_image`] is recomputed.
    pub fn original_revision(&self) -> u64 {
        self.original_revision
    }

    /// Bumped whenever the edited layer changes.
    pub fn image_revision(&self) -> u64 {
        self.image_revision
    }

    fn update_original_alpha_image(&mut self) {
        self.original_alpha_image = self.original.with_alpha_scaled(self.original_alpha);
        self.original_revision += 1;
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Render settings
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn original_alpha(&self) -> u8 {
        self.original_alpha
    }

    pub fn set_original_alpha(&mut self, alpha: u8) {
        if self.original_alpha == alpha {
            return;
        }
        self.original_alpha = alpha;
        self.update_original_alpha_image();
        self.redraw = true;
    }

    pub fn original_on_top(&self) -> bool {
        self.original_on_top
    }

    pub fn set_original_on_top(&mut self, on_top: bool) {
        self.original_on_top = on_top;
        self.redraw = true;
    }

    /// Back-to-front order in which the two layers are painted.
    pub fn layer_order(&self) -> [Layer; 2] {
        if self.original_on_top {
            [Layer::Edited, Layer::Original]
        } else {
            [Layer::Original, Layer::Edited]
        }
    }

    pub fn layer(&self, layer: Layer) -> &PixelGrid {
        match layer {
            Layer::Original => &self.original_alpha_image,
            Layer::Edited => &self.image,
        }
    }

    /// Returns true once after anything visible changed.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Geometry
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn set_widget_rect(&mut self, rect: Rect) {
        if self.widget_rect != rect {
            self.widget_rect = rect;
            self.update_image_rect();
        }
    }

    pub fn image_rect(&self) -> Rect {
        self.image_rect
    }

    fn update_image_rect(&mut self) {
        self.image_rect = display_rect(self.widget_rect, self.original.size());
    }

    pub fn widget_to_image(&self, pos: Pos2) -> Option<(u32, u32)> {
        widget_to_image(pos, self.image_rect, self.original.size())
    }

    /// Darker checkerboard cells, clipped to the image rectangle.
    pub fn checker_cells(&self) -> Vec<Rect> {
        let rect = self.image_rect;
        let cols = (rect.width() / CHECKER_CELL_SIZE) as usize + 1;
        let rows = (rect.height() / CHECKER_CELL_SIZE) as usize + 1;
        let mut cells = Vec::with_capacity(cols * rows / 2 + 1);
        for y in 0..rows {
            for x in 0..cols {
                if (x + y) % 2 != 0 {
                    continue;
                }
                let min = rect.min + vec2(x as f32, y as f32) * CHECKER_CELL_SIZE;
                let cell = Rect::from_min_size(min, vec2(CHECKER_CELL_SIZE, CHECKER_CELL_SIZE))
                    .intersect(rect);
                if cell.is_positive() {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Tools and colour
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ToolMode) {
        self.state = PaintState::Idle;
        self.mode = mode;
    }

    pub fn state(&self) -> PaintState {
        self.state
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }

    pub fn set_colour(&mut self, colour: Colour) {
        if self.colour == colour {
            return;
        }
        self.colour = colour;
        self.events.push(CanvasEvent::ColourChanged(colour));
    }

    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Pointer input
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let (state, effect) = step(self.state, self.mode, event);
        self.state = state;
        match effect {
            Some(PaintEffect::Put(pos)) => self.put_pixel(pos, self.colour),
            Some(PaintEffect::Clear(pos)) => self.put_pixel(pos, TRANSPARENT),
            Some(PaintEffect::Sample(layer, pos)) => {
                let colour = self.sample(layer, pos);
                self.events.push(CanvasEvent::ColourPicked(colour));
            }
            None => {}
        }
    }

    /// Colour of `layer` under a widget position; transparent black outside the image.
    pub fn sample(&self, layer: Layer, pos: Pos2) -> Colour {
        let grid = match layer {
            Layer::Original => &self.original,
            Layer::Edited => &self.image,
        };
        self.widget_to_image(pos)
            .filter(|&(x, y)| self.image.contains(x, y))
            .and_then(|(x, y)| grid.get(x, y))
            .unwrap_or(TRANSPARENT)
    }

    fn put_pixel(&mut self, pos: Pos2, colour: Colour) {
        let Some((x, y)) = self.widget_to_image(pos) else {
            return;
        };
        if !self.image.set(x, y, colour) {
            return;
        }
        self.image_dirty = true;
        self.image_revision += 1;
        self.redraw = true;
        if self.events.last() != Some(&CanvasEvent::ImageEdited) {
            self.events.push(CanvasEvent::ImageEdited);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    const RED: Colour = Rgba([255, 0, 0, 255]);
    const BLUE: Colour = Rgba([0, 0, 255, 255]);

    fn widget(w: f32, h: f32) -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(w, h))
    }

    /// 16x16 original in a 160x160 widget: one image pixel per 10 screen pixels.
    fn canvas_16() -> Canvas {
        let mut canvas = Canvas::new();
        canvas.set_widget_rect(widget(160.0, 160.0));
        canvas.set_original_image(PixelGrid::filled(16, 16, BLUE));
        canvas.set_colour(RED);
        canvas.take_events();
        canvas
    }

    fn press(x: f32, y: f32, button: PointerButton) -> PointerEvent {
        PointerEvent::Press {
            pos: pos2(x, y),
            button,
        }
    }

    fn moved(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Move { pos: pos2(x, y) }
    }

    fn release(x: f32, y: f32, button: PointerButton) -> PointerEvent {
        PointerEvent::Release {
            pos: pos2(x, y),
            button,
        }
    }

    #[test]
    fn test_display_rect_letterboxes_wide_widget() {
        let rect = display_rect(widget(300.0, 100.0), (16, 16));
        assert_eq!(rect, Rect::from_min_size(pos2(100.0, 0.0), vec2(100.0, 100.0)));
    }

    #[test]
    fn test_display_rect_letterboxes_tall_widget() {
        let rect = display_rect(widget(100.0, 300.0), (32, 16));
        assert_eq!(rect, Rect::from_min_size(pos2(0.0, 125.0), vec2(100.0, 50.0)));
    }

    #[test]
    fn test_display_rect_keeps_widget_offset() {
        let widget = Rect::from_min_size(pos2(20.0, 40.0), vec2(64.0, 32.0));
        let rect = display_rect(widget, (8, 8));
        assert_eq!(rect.min, pos2(36.0, 40.0));
        assert_eq!(rect.size(), vec2(32.0, 32.0));
    }

    #[test]
    fn test_centre_maps_inside_image_for_any_widget() {
        for image in [(16, 16), (16, 32), (64, 16), (1, 1), (7, 3)] {
            for (w, h) in [(100.0, 100.0), (640.0, 123.0), (37.0, 512.0), (1000.0, 999.0)] {
                let rect = display_rect(widget(w, h), image);
                let (x, y) = widget_to_image(rect.center(), rect, image)
                    .unwrap_or_else(|| panic!("centre unmapped for {image:?} in {w}x{h}"));
                assert!(x < image.0 && y < image.1);
            }
        }
    }

    #[test]
    fn test_mapping_uses_single_scale_and_rejects_outside() {
        let rect = Rect::from_min_size(pos2(10.0, 20.0), vec2(80.0, 40.0));
        assert_eq!(widget_to_image(pos2(10.0, 20.0), rect, (16, 8)), Some((0, 0)));
        assert_eq!(widget_to_image(pos2(89.9, 59.9), rect, (16, 8)), Some((15, 7)));
        assert_eq!(widget_to_image(pos2(9.0, 25.0), rect, (16, 8)), None);
        assert_eq!(widget_to_image(pos2(15.0, 19.5), rect, (16, 8)), None);
        assert_eq!(widget_to_image(pos2(50.0, 60.0), rect, (16, 8)), None);
    }

    #[test]
    fn test_step_draw_mode() {
        use PaintState::*;
        let mode = ToolMode::Draw;
        let (state, effect) = step(Idle, mode, press(1.0, 1.0, PointerButton::Primary));
        assert_eq!(state, Painting);
        assert_eq!(effect, Some(PaintEffect::Put(pos2(1.0, 1.0))));

        let (state, effect) = step(Painting, mode, moved(2.0, 2.0));
        assert_eq!(state, Painting);
        assert_eq!(effect, Some(PaintEffect::Put(pos2(2.0, 2.0))));

        let (state, effect) = step(Idle, mode, press(1.0, 1.0, PointerButton::Secondary));
        assert_eq!(state, Erasing);
        assert_eq!(effect, Some(PaintEffect::Clear(pos2(1.0, 1.0))));

        assert_eq!(step(Idle, mode, moved(3.0, 3.0)), (Idle, None));
        assert_eq!(
            step(Erasing, mode, release(3.0, 3.0, PointerButton::Secondary)),
            (Idle, None)
        );
    }

    #[test]
    fn test_step_pick_mode_only_samples_on_release() {
        use PaintState::*;
        let mode = ToolMode::ColourPick;
        assert_eq!(step(Idle, mode, press(1.0, 1.0, PointerButton::Primary)), (Idle, None));
        assert_eq!(step(Idle, mode, moved(1.0, 1.0)), (Idle, None));
        assert_eq!(
            step(Idle, mode, release(1.0, 1.0, PointerButton::Primary)).1,
            Some(PaintEffect::Sample(Layer::Edited, pos2(1.0, 1.0)))
        );
        assert_eq!(
            step(Idle, mode, release(1.0, 1.0, PointerButton::Secondary)).1,
            Some(PaintEffect::Sample(Layer::Original, pos2(1.0, 1.0)))
        );
    }

    #[test]
    fn test_drawing_and_erasing_pixels() {
        let mut canvas = canvas_16();
        canvas.handle_pointer(press(5.0, 5.0, PointerButton::Primary));
        canvas.handle_pointer(moved(15.0, 5.0));
        canvas.handle_pointer(release(15.0, 5.0, PointerButton::Primary));

        assert_eq!(canvas.image().get(0, 0), Some(RED));
        assert_eq!(canvas.image().get(1, 0), Some(RED));
        assert!(canvas.image_is_dirty());
        assert_eq!(canvas.state(), PaintState::Idle);
        assert_eq!(canvas.take_events(), vec![CanvasEvent::ImageEdited]);

        canvas.handle_pointer(press(15.0, 5.0, PointerButton::Secondary));
        canvas.handle_pointer(moved(5.0, 5.0));
        assert_eq!(canvas.image().get(0, 0), Some(TRANSPARENT));
        assert_eq!(canvas.image().get(1, 0), Some(TRANSPARENT));
    }

    #[test]
    fn test_hover_without_button_does_not_erase() {
        let mut canvas = canvas_16();
        canvas.handle_pointer(press(5.0, 5.0, PointerButton::Primary));
        canvas.handle_pointer(release(5.0, 5.0, PointerButton::Primary));
        let revision = canvas.image_revision();

        canvas.handle_pointer(moved(5.0, 5.0));
        assert_eq!(canvas.image().get(0, 0), Some(RED));
        assert_eq!(canvas.image_revision(), revision);
    }

    #[test]
    fn test_out_of_bounds_press_is_ignored() {
        let mut canvas = Canvas::new();
        canvas.set_widget_rect(widget(300.0, 100.0));
        canvas.set_original_image(PixelGrid::new(10, 10));
        canvas.handle_pointer(press(50.0, 50.0, PointerButton::Primary));
        assert_eq!(canvas.state(), PaintState::Painting);
        assert!(!canvas.image_is_dirty());
    }

    #[test]
    fn test_colour_pick_samples_layers() {
        let mut canvas = canvas_16();
        canvas.handle_pointer(press(5.0, 5.0, PointerButton::Primary));
        canvas.handle_pointer(release(5.0, 5.0, PointerButton::Primary));
        canvas.take_events();

        canvas.set_mode(ToolMode::ColourPick);
        canvas.handle_pointer(press(5.0, 5.0, PointerButton::Primary));
        canvas.handle_pointer(release(5.0, 5.0, PointerButton::Primary));
        canvas.handle_pointer(release(5.0, 5.0, PointerButton::Secondary));
        canvas.handle_pointer(release(500.0, 5.0, PointerButton::Secondary));

        assert_eq!(
            canvas.take_events(),
            vec![
                CanvasEvent::ColourPicked(RED),
                CanvasEvent::ColourPicked(BLUE),
                CanvasEvent::ColourPicked(TRANSPARENT),
            ]
        );
        assert_eq!(canvas.image().get(0, 0), Some(RED));
    }

    #[test]
    fn test_mode_switch_returns_to_idle() {
        let mut canvas = canvas_16();
        canvas.handle_pointer(press(5.0, 5.0, PointerButton::Primary));
        assert_eq!(canvas.state(), PaintState::Painting);
        canvas.set_mode(ToolMode::ColourPick);
        assert_eq!(canvas.state(), PaintState::Idle);
        canvas.set_mode(ToolMode::Draw);
        let revision = canvas.image_revision();
        canvas.handle_pointer(moved(25.0, 5.0));
        assert_eq!(canvas.image().get(2, 0), Some(TRANSPARENT));
        assert_eq!(canvas.image_revision(), revision);

        // Same for an interrupted erase over painted pixels.
        canvas.set_image(PixelGrid::filled(16, 16, BLUE));
        canvas.handle_pointer(press(5.0, 5.0, PointerButton::Secondary));
        assert_eq!(canvas.state(), PaintState::Erasing);
        canvas.set_mode(ToolMode::ColourPick);
        canvas.set_mode(ToolMode::Draw);
        let revision = canvas.image_revision();
        canvas.handle_pointer(moved(25.0, 5.0));
        assert_eq!(canvas.image().get(2, 0), Some(BLUE));
        assert_eq!(canvas.image_revision(), revision);
    }

    #[test]
    fn test_set_colour_notifies_only_on_change() {
        let mut canvas = canvas_16();
        canvas.set_colour(RED);
        assert!(canvas.take_events().is_empty());
        canvas.set_colour(BLUE);
        assert_eq!(canvas.take_events(), vec![CanvasEvent::ColourChanged(BLUE)]);
    }

    #[test]
    fn test_set_original_resets_edited_layer() {
        let mut canvas = canvas_16();
        canvas.handle_pointer(press(5.0, 5.0, PointerButton::Primary));
        canvas.set_original_image(PixelGrid::filled(8, 4, RED));

        assert_eq!(canvas.image(), &PixelGrid::new(8, 4));
        assert!(!canvas.image_is_dirty());
        assert_eq!(canvas.state(), PaintState::Idle);
        assert_eq!(canvas.image_rect().size(), vec2(160.0, 80.0));
    }

    #[test]
    fn test_set_image_and_take_dirty_image() {
        let mut canvas = canvas_16();
        canvas.set_image(PixelGrid::filled(16, 16, RED));
        assert!(canvas.take_dirty_image().is_none());

        canvas.handle_pointer(press(5.0, 5.0, PointerButton::Secondary));
        let taken = canvas.take_dirty_image().unwrap();
        assert_eq!(taken.get(0, 0), Some(TRANSPARENT));
        assert!(!canvas.image_is_dirty());
        assert!(canvas.take_dirty_image().is_none());
    }

    #[test]
    fn test_alpha_cache_invalidation() {
        let mut canvas = canvas_16();
        let revision = canvas.original_revision();

        canvas.set_original_alpha(255);
        assert_eq!(canvas.original_revision(), revision);

        canvas.set_original_alpha(0);
        assert_eq!(canvas.original_revision(), revision + 1);
        assert_eq!(canvas.original_alpha_image().get(0, 0), Some(Rgba([0, 0, 255, 0])));
        assert_eq!(canvas.original().get(0, 0), Some(BLUE));

        canvas.set_original_on_top(true);
        assert_eq!(canvas.original_revision(), revision + 1);

        canvas.set_original_image(PixelGrid::filled(2, 2, RED));
        assert_eq!(canvas.original_revision(), revision + 2);
        assert_eq!(canvas.original_alpha_image().get(1, 1), Some(Rgba([255, 0, 0, 0])));
    }

    #[test]
    fn test_view_settings_leave_image_clean() {
        let mut canvas = canvas_16();
        canvas.set_image(PixelGrid::filled(16, 16, RED));
        let revision = canvas.image_revision();

        canvas.set_original_alpha(40);
        canvas.set_original_on_top(true);
        canvas.set_original_alpha(200);
        canvas.set_original_on_top(false);

        assert!(!canvas.image_is_dirty());
        assert!(canvas.take_dirty_image().is_none());
        assert_eq!(canvas.image_revision(), revision);
    }

    #[test]
    fn test_layer_order_follows_z_flag() {
        let mut canvas = canvas_16();
        assert_eq!(canvas.layer_order(), [Layer::Original, Layer::Edited]);
        canvas.set_original_on_top(true);
        assert_eq!(canvas.layer_order(), [Layer::Edited, Layer::Original]);
        assert!(canvas.take_redraw_request());
        assert!(!canvas.take_redraw_request());
    }

    #[test]
    fn test_checker_cells_clipped_to_image() {
        let mut canvas = Canvas::new();
        canvas.set_widget_rect(widget(100.0, 40.0));
        canvas.set_original_image(PixelGrid::new(1, 1));
        let rect = canvas.image_rect();
        assert_eq!(rect, Rect::from_min_size(pos2(30.0, 0.0), vec2(40.0, 40.0)));

        let cells = canvas.checker_cells();
        assert!(cells.iter().all(|cell| rect.contains_rect(*cell)));
        // rows 0..3, cols 0..3, even (x + y): (0,0) (2,0) (1,1) (0,2) (2,2)
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[1].width(), 8.0);
    }
}
