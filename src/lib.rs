//! Editing core for texture resource packs: original assets from a base archive,
//! hand-drawn overlays on top of them, and the canvas used to paint those overlays.

pub mod asset_source;
pub mod asset_store;
pub mod canvas;
pub mod colour_cache;
pub mod constants;
pub mod error;
pub mod paths;
pub mod pixel_grid;
pub mod settings;

pub use asset_source::{AssetSource, DirectorySource, MemorySource, ZipSource};
pub use asset_store::{AssetStore, DuplicateReport, StoreEvent};
pub use canvas::{Canvas, CanvasEvent, PointerButton, PointerEvent, ToolMode};
pub use colour_cache::{PendingColour, RecentColours};
pub use error::{Diagnostic, DiagnosticKind, SourceError, StoreError};
pub use pixel_grid::{Colour, PixelGrid};
