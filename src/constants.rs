//! Centralized constants for canvas rendering, swatches and window sizing.

use egui::Color32;

// =============================================================================
// CANVAS CONSTANTS
// =============================================================================

/// Side length, in screen pixels, of one checkerboard cell behind the image.
pub const CHECKER_CELL_SIZE: f32 = 16.0;

/// Fill for the part of the canvas widget outside the image rectangle.
pub const COLOR_CANVAS_BACKGROUND: Color32 = Color32::DARK_GRAY;

/// Checkerboard shade of the cells with even `(x + y)`.
pub const COLOR_CHECKER_DARK: Color32 = Color32::LIGHT_GRAY;

/// Checkerboard shade of the remaining cells (the image rectangle base fill).
pub const COLOR_CHECKER_LIGHT: Color32 = Color32::WHITE;

/// Minimum side of the canvas widget.
pub const MIN_CANVAS_SIZE: f32 = 100.0;

/// Size of the placeholder original shown before any asset is selected.
pub const PLACEHOLDER_IMAGE_SIZE: u32 = 16;

// =============================================================================
// SWATCH CONSTANTS
// =============================================================================

/// Columns of the recent colour grid.
pub const SWATCH_COLUMNS: usize = 16;

/// Rows of the recent colour grid.
pub const SWATCH_ROWS: usize = 4;

/// Preferred side of one swatch cell.
pub const SWATCH_CELL_SIZE: f32 = 16.0;

// =============================================================================
// ASSET LIST CONSTANTS
// =============================================================================

/// Longest side of list thumbnails.
pub const THUMBNAIL_SIZE: u32 = 32;

/// Height of one asset row.
pub const ASSET_ROW_HEIGHT: f32 = 34.0;

// =============================================================================
// WINDOW CONSTANTS
// =============================================================================

pub const INITIAL_WINDOW_WIDTH: f32 = 1100.0;
pub const INITIAL_WINDOW_HEIGHT: f32 = 700.0;
