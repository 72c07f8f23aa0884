use eframe::egui::{
    self, pos2, vec2, Align2, Color32, Rect, Sense, Stroke, TextureHandle, TextureOptions,
};
use egui_extras::{Column, TableBuilder};
use pack_skinner::canvas::Layer;
use pack_skinner::constants::{
    ASSET_ROW_HEIGHT, COLOR_CANVAS_BACKGROUND, COLOR_CHECKER_DARK, COLOR_CHECKER_LIGHT,
    INITIAL_WINDOW_HEIGHT, INITIAL_WINDOW_WIDTH, MIN_CANVAS_SIZE, PLACEHOLDER_IMAGE_SIZE,
    SWATCH_CELL_SIZE, THUMBNAIL_SIZE,
};
use pack_skinner::paths::AppPaths;
use pack_skinner::settings::Settings;
use pack_skinner::{
    AssetSource, AssetStore, Canvas, CanvasEvent, Colour, DirectorySource, DuplicateReport,
    PendingColour, PixelGrid, PointerButton, PointerEvent, RecentColours, StoreError,
    StoreEvent, ToolMode, ZipSource,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([INITIAL_WINDOW_WIDTH, INITIAL_WINDOW_HEIGHT]),
        ..Default::default()
    };

    eframe::run_native(
        "Pack Skinner",
        options,
        Box::new(|cc| Ok(Box::new(SkinnerApp::new(cc)))),
    )
}

/// Actions that discard the current edits and therefore ask first.
#[derive(Clone, Copy, PartialEq)]
enum PendingAction {
    NewPack,
    OpenPack,
    Quit,
}

/// GPU copies of the two canvas layers, refreshed when the canvas revisions move.
#[derive(Default)]
struct LayerTextures {
    original: Option<TextureHandle>,
    edited: Option<TextureHandle>,
    original_revision: Option<u64>,
    image_revision: Option<u64>,
}

impl LayerTextures {
    fn refresh(&mut self, ctx: &egui::Context, canvas: &Canvas) {
        if self.original_revision != Some(canvas.original_revision()) {
            upload(ctx, &mut self.original, "canvas-original", canvas.layer(Layer::Original));
            self.original_revision = Some(canvas.original_revision());
        }
        if self.image_revision != Some(canvas.image_revision()) {
            upload(ctx, &mut self.edited, "canvas-edited", canvas.layer(Layer::Edited));
            self.image_revision = Some(canvas.image_revision());
        }
    }

    fn get(&self, layer: Layer) -> Option<&TextureHandle> {
        match layer {
            Layer::Original => self.original.as_ref(),
            Layer::Edited => self.edited.as_ref(),
        }
    }
}

fn upload(ctx: &egui::Context, slot: &mut Option<TextureHandle>, name: &str, grid: &PixelGrid) {
    let image = grid.to_color_image();
    match slot {
        Some(texture) => texture.set(image, TextureOptions::NEAREST),
        None => *slot = Some(ctx.load_texture(name, image, TextureOptions::NEAREST)),
    }
}

fn to_color32(colour: Colour) -> Color32 {
    let [r, g, b, a] = colour.0;
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

fn from_color32(color: Color32) -> Colour {
    image::Rgba(color.to_srgba_unmultiplied())
}

struct SkinnerApp {
    store: AssetStore,
    canvas: Canvas,
    recent: RecentColours,
    colour_draft: PendingColour,
    settings: Settings,
    settings_path: Option<PathBuf>,
    current: Option<String>,
    filter: String,
    thumbnails: HashMap<(String, Layer), Option<TextureHandle>>,
    layer_textures: LayerTextures,
    pointer_captured: bool,
    pending: Option<PendingAction>,
    report: Option<DuplicateReport>,
    status: String,
    allow_close: bool,
}

impl SkinnerApp {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let paths = AppPaths::from_project_dirs();
        if let Some(paths) = &paths {
            if let Err(err) = paths.ensure_dirs_exist() {
                log::warn!("Could not create settings directory: {err}");
            }
        }
        let settings_path = paths.map(|p| p.settings_file());
        let settings = settings_path
            .as_deref()
            .map(Settings::load)
            .unwrap_or_default();

        let mut canvas = Canvas::new();
        canvas.set_colour(settings.colour());
        canvas.set_original_alpha(settings.original_alpha);
        canvas.set_original_on_top(settings.original_on_top);
        canvas.take_events();

        let mut app = Self {
            store: AssetStore::new(),
            canvas,
            recent: settings.recent_colours(),
            colour_draft: PendingColour::default(),
            settings,
            settings_path,
            current: None,
            filter: String::new(),
            thumbnails: HashMap::new(),
            layer_textures: LayerTextures::default(),
            pointer_captured: false,
            pending: None,
            report: None,
            status: String::new(),
            allow_close: false,
        };

        if let Some(archive) = app.settings.archive.clone() {
            if archive.exists() {
                app.open_source(&archive);
            }
        }
        app
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Document flow
    // ─────────────────────────────────────────────────────────────────────────────

    /// Flushes the canvas into the store so edits survive switching assets.
    fn sync_image_to_store(&mut self) {
        let Some(path) = self.current.clone() else {
            return;
        };
        if let Some(image) = self.canvas.take_dirty_image() {
            self.store.set_edited(&path, image);
        }
    }

    fn select_asset(&mut self, path: String) {
        self.sync_image_to_store();
        self.current = Some(path);
        self.show_current();
    }

    /// Puts the current asset (original and stored edit) onto the canvas.
    fn show_current(&mut self) {
        let Some(path) = self.current.clone() else {
            self.canvas
                .set_original_image(PixelGrid::new(PLACEHOLDER_IMAGE_SIZE, PLACEHOLDER_IMAGE_SIZE));
            return;
        };
        match self.store.get_original(&path) {
            Ok(original) => self.canvas.set_original_image(original),
            Err(err) => {
                log::error!("{err}");
                self.status = err.to_string();
                self.canvas.set_original_image(PixelGrid::new(
                    PLACEHOLDER_IMAGE_SIZE,
                    PLACEHOLDER_IMAGE_SIZE,
                ));
            }
        }
        if let Ok(edited) = self.store.get_edited(&path) {
            self.canvas.set_image(edited.clone());
        }
    }

    fn copy_original(&mut self) {
        let Some(path) = self.current.clone() else {
            return;
        };
        match self.store.copy_original(&path) {
            Ok(original) => self.canvas.set_image(original),
            Err(err) => self.report_error(err),
        }
    }

    fn request(&mut self, ctx: &egui::Context, action: PendingAction) {
        self.sync_image_to_store();
        if self.store.is_dirty() {
            self.pending = Some(action);
        } else {
            self.perform(ctx, action);
        }
    }

    fn perform(&mut self, ctx: &egui::Context, action: PendingAction) {
        match action {
            PendingAction::NewPack => {
                self.store.clear();
                self.show_current();
                self.status = "New pack".to_string();
            }
            PendingAction::OpenPack => self.open_pack(),
            PendingAction::Quit => {
                self.allow_close = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn open_pack(&mut self) {
        let mut dialog = rfd::FileDialog::new().set_title("Open pack");
        if let Some(root) = &self.settings.pack_root {
            dialog = dialog.set_directory(root);
        }
        let Some(root) = dialog.pick_folder() else {
            return;
        };
        match self.store.load(&root) {
            Ok(()) => {
                self.status = format!(
                    "Opened {} ({} edited images)",
                    root.display(),
                    self.store.edited_len()
                );
                self.settings.pack_root = Some(root);
                self.show_current();
            }
            Err(err) => self.report_error(err),
        }
    }

    /// Saves to the known pack directory, asking for one when unset.
    fn save_pack(&mut self) -> bool {
        self.sync_image_to_store();
        if !self.store.has_path() {
            return self.save_pack_as();
        }
        match self.store.save() {
            Ok(()) => {
                self.status = "Saved".to_string();
                true
            }
            Err(err) => {
                self.report_error(err);
                false
            }
        }
    }

    fn save_pack_as(&mut self) -> bool {
        self.sync_image_to_store();
        let Some(root) = rfd::FileDialog::new().set_title("Save pack").pick_folder() else {
            return false;
        };
        match self.store.save_as(&root) {
            Ok(()) => {
                self.status = format!("Saved to {}", root.display());
                self.settings.pack_root = Some(root);
                true
            }
            Err(err) => {
                self.report_error(err);
                false
            }
        }
    }

    fn pick_source(&mut self, directory: bool) {
        let picked = if directory {
            rfd::FileDialog::new()
                .set_title("Open base pack folder")
                .pick_folder()
        } else {
            rfd::FileDialog::new()
                .set_title("Open base archive")
                .add_filter("Archive", &["jar", "zip"])
                .pick_file()
        };
        if let Some(path) = picked {
            self.open_source(&path);
        }
    }

    fn open_source(&mut self, path: &Path) {
        let opened = if path.is_dir() {
            DirectorySource::open(path).map(|s| Box::new(s) as Box<dyn AssetSource>)
        } else {
            ZipSource::open(path).map(|s| Box::new(s) as Box<dyn AssetSource>)
        };
        match opened {
            Ok(source) => {
                self.sync_image_to_store();
                self.store.set_source(Some(source));
                self.settings.archive = Some(path.to_path_buf());
                self.status = format!("Base assets: {}", path.display());
                self.show_current();
            }
            Err(err) => {
                log::error!("Failed to open {}: {err}", path.display());
                self.status = format!("Failed to open {}: {err}", path.display());
            }
        }
    }

    fn remove_duplicates(&mut self) {
        self.sync_image_to_store();
        match self.store.remove_duplicates() {
            Ok(report) => {
                self.status = format!("Removed {} unchanged images", report.removed.len());
                self.report = Some(report);
                self.show_current();
            }
            Err(err) => self.report_error(err),
        }
    }

    fn report_error(&mut self, err: StoreError) {
        log::error!("{err}");
        self.status = err.to_string();
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────────────────────────

    fn process_events(&mut self, ctx: &egui::Context) {
        for event in self.store.take_events() {
            match event {
                StoreEvent::AllChanged => self.thumbnails.clear(),
                StoreEvent::ImageChanged(path) => {
                    self.thumbnails.remove(&(path.clone(), Layer::Original));
                    self.thumbnails.remove(&(path, Layer::Edited));
                }
            }
        }

        loop {
            let events = self.canvas.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                match event {
                    CanvasEvent::ColourChanged(colour) => self.recent.add(colour),
                    CanvasEvent::ColourPicked(colour) => self.canvas.set_colour(colour),
                    CanvasEvent::ImageEdited => {}
                }
            }
        }

        if self.canvas.take_redraw_request() {
            ctx.request_repaint();
        }
    }

    fn thumbnail(&mut self, ctx: &egui::Context, path: &str, layer: Layer) -> Option<TextureHandle> {
        let key = (path.to_string(), layer);
        if let Some(cached) = self.thumbnails.get(&key) {
            return cached.clone();
        }
        let grid = match layer {
            Layer::Original => self.store.get_original(path).ok(),
            Layer::Edited => self.store.get_edited(path).ok().cloned(),
        };
        let texture = grid.map(|grid| {
            ctx.load_texture(
                format!("thumb-{layer:?}-{path}"),
                grid.thumbnail(THUMBNAIL_SIZE).to_color_image(),
                TextureOptions::NEAREST,
            )
        });
        self.thumbnails.insert(key, texture.clone());
        texture
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Panels
    // ─────────────────────────────────────────────────────────────────────────────

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New Pack").clicked() {
                        ui.close_menu();
                        self.request(ctx, PendingAction::NewPack);
                    }
                    ui.separator();
                    if ui.button("Open Pack").clicked() {
                        ui.close_menu();
                        self.request(ctx, PendingAction::OpenPack);
                    }
                    if ui.button("Save Pack").clicked() {
                        ui.close_menu();
                        self.save_pack();
                    }
                    if ui.button("Save Pack As").clicked() {
                        ui.close_menu();
                        self.save_pack_as();
                    }
                    ui.separator();
                    if ui.button("Open Base Archive").clicked() {
                        ui.close_menu();
                        self.pick_source(false);
                    }
                    if ui.button("Open Base Folder").clicked() {
                        ui.close_menu();
                        self.pick_source(true);
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ui.close_menu();
                        self.request(ctx, PendingAction::Quit);
                    }
                });
                ui.menu_button("Tools", |ui| {
                    if ui.button("Remove duplicates").clicked() {
                        ui.close_menu();
                        self.remove_duplicates();
                    }
                });
            });
        });
    }

    fn asset_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("assets")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                ui.add(egui::TextEdit::singleline(&mut self.filter).hint_text("Enter Filter Text"));
                ui.separator();

                let paths: Vec<String> = self
                    .store
                    .filtered_paths(&self.filter)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let mut clicked = None;
                let thumb_width = THUMBNAIL_SIZE as f32 + 8.0;

                TableBuilder::new(ui)
                    .striped(true)
                    .column(Column::exact(thumb_width))
                    .column(Column::exact(thumb_width))
                    .column(Column::remainder())
                    .header(20.0, |mut header| {
                        header.col(|ui| {
                            ui.strong("Orig");
                        });
                        header.col(|ui| {
                            ui.strong("Edit");
                        });
                        header.col(|ui| {
                            ui.strong("File");
                        });
                    })
                    .body(|body| {
                        body.rows(ASSET_ROW_HEIGHT, paths.len(), |mut row| {
                            let path = &paths[row.index()];
                            for layer in [Layer::Original, Layer::Edited] {
                                row.col(|ui| {
                                    if let Some(texture) = self.thumbnail(ctx, path, layer) {
                                        ui.add(egui::Image::from_texture(&texture));
                                    }
                                });
                            }
                            row.col(|ui| {
                                let selected = self.current.as_deref() == Some(path.as_str());
                                if ui.selectable_label(selected, path.as_str()).clicked() {
                                    clicked = Some(path.clone());
                                }
                            });
                        });
                    });

                if let Some(path) = clicked {
                    self.select_asset(path);
                }
            });
    }

    fn tool_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("tools")
            .resizable(false)
            .show(ctx, |ui| {
                self.swatches(ui);
                ui.separator();

                let mut color = to_color32(self.colour_draft.current(self.canvas.colour()));
                ui.horizontal(|ui| {
                    if egui::color_picker::color_edit_button_srgba(
                        ui,
                        &mut color,
                        egui::color_picker::Alpha::OnlyBlend,
                    )
                    .changed()
                    {
                        self.colour_draft.edit(from_color32(color));
                    }
                    ui.label("Colour");
                });
                let picker_open = ui.memory(|mem| mem.any_popup_open());
                if let Some(colour) = self.colour_draft.settle(picker_open) {
                    self.canvas.set_colour(colour);
                }

                ui.group(|ui| {
                    ui.label("Tools");
                    let mut mode = self.canvas.mode();
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut mode, ToolMode::Draw, "Draw");
                        ui.radio_value(&mut mode, ToolMode::ColourPick, "Pick");
                    });
                    if mode != self.canvas.mode() {
                        self.canvas.set_mode(mode);
                    }
                });

                let mut alpha = self.canvas.original_alpha();
                if ui
                    .add(egui::Slider::new(&mut alpha, 0..=255).text("Original opacity"))
                    .changed()
                {
                    self.canvas.set_original_alpha(alpha);
                }

                let mut on_top = self.canvas.original_on_top();
                if ui.checkbox(&mut on_top, "Original on top").changed() {
                    self.canvas.set_original_on_top(on_top);
                }

                if ui
                    .add_enabled(self.current.is_some(), egui::Button::new("Copy Original"))
                    .clicked()
                {
                    self.copy_original();
                }
            });
    }

    fn swatches(&mut self, ui: &mut egui::Ui) {
        let size = vec2(
            self.recent.columns() as f32 * SWATCH_CELL_SIZE,
            self.recent.rows() as f32 * SWATCH_CELL_SIZE,
        );
        let (response, painter) = ui.allocate_painter(size, Sense::click());
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, Color32::WHITE);
        for (index, colour) in self.recent.iter().enumerate() {
            let cell = self.recent.cell_rect(index, rect).shrink(1.0);
            painter.rect(cell, 0.0, to_color32(colour), Stroke::new(1.0, Color32::BLACK));
        }

        if response.clicked() {
            if let Some(colour) = response
                .interact_pointer_pos()
                .and_then(|pos| self.recent.hit_test(pos, rect))
            {
                self.canvas.set_colour(colour);
            }
        }
    }

    fn canvas_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let size = ui
                .available_size()
                .max(vec2(MIN_CANVAS_SIZE, MIN_CANVAS_SIZE));
            let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
            self.canvas.set_widget_rect(response.rect);
            self.feed_pointer(ctx, response.rect, response.hovered());
            self.layer_textures.refresh(ctx, &self.canvas);

            let image_rect = self.canvas.image_rect();
            painter.rect_filled(response.rect, 0.0, COLOR_CANVAS_BACKGROUND);
            painter.rect_filled(image_rect, 0.0, COLOR_CHECKER_LIGHT);
            for cell in self.canvas.checker_cells() {
                painter.rect_filled(cell, 0.0, COLOR_CHECKER_DARK);
            }
            let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
            for layer in self.canvas.layer_order() {
                if let Some(texture) = self.layer_textures.get(layer) {
                    painter.image(texture.id(), image_rect, uv, Color32::WHITE);
                }
            }
        });
    }

    /// Translates egui pointer state into canvas events.
    fn feed_pointer(&mut self, ctx: &egui::Context, rect: Rect, hovered: bool) {
        const BUTTONS: [(egui::PointerButton, PointerButton); 2] = [
            (egui::PointerButton::Primary, PointerButton::Primary),
            (egui::PointerButton::Secondary, PointerButton::Secondary),
        ];

        let mut events = Vec::new();
        ctx.input(|i| {
            let Some(pos) = i.pointer.latest_pos() else {
                return;
            };
            for (egui_button, button) in BUTTONS {
                if hovered && rect.contains(pos) && i.pointer.button_pressed(egui_button) {
                    events.push(PointerEvent::Press { pos, button });
                }
            }
            if i.pointer.delta() != egui::Vec2::ZERO {
                events.push(PointerEvent::Move { pos });
            }
            for (egui_button, button) in BUTTONS {
                if i.pointer.button_released(egui_button) {
                    events.push(PointerEvent::Release { pos, button });
                }
            }
        });

        for event in events {
            match event {
                PointerEvent::Press { .. } => self.pointer_captured = true,
                PointerEvent::Release { .. } if !self.pointer_captured => continue,
                PointerEvent::Release { .. } => self.pointer_captured = false,
                PointerEvent::Move { .. } => {}
            }
            self.canvas.handle_pointer(event);
        }
    }

    fn dialogs(&mut self, ctx: &egui::Context) {
        if let Some(action) = self.pending {
            egui::Window::new("Pack modified")
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label("The pack has unsaved modifications.\nDo you want to save it?");
                    ui.horizontal(|ui| {
                        if ui.button("Save").clicked() {
                            self.pending = None;
                            if self.save_pack() {
                                self.perform(ctx, action);
                            }
                        }
                        if ui.button("Discard").clicked() {
                            self.pending = None;
                            self.perform(ctx, action);
                        }
                        if ui.button("Cancel").clicked() {
                            self.pending = None;
                        }
                    });
                });
        }

        let mut open = true;
        if let Some(report) = &self.report {
            egui::Window::new("Remove duplicates")
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.label(format!("Removed {} unchanged images.", report.removed.len()));
                    if !report.diagnostics.is_empty() {
                        ui.separator();
                        egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                            for diagnostic in &report.diagnostics {
                                ui.label(diagnostic.to_string());
                            }
                        });
                    }
                });
        }
        if !open {
            self.report = None;
        }
    }
}

impl eframe::App for SkinnerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) && !self.allow_close {
            self.sync_image_to_store();
            if self.store.is_dirty() {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                self.pending = Some(PendingAction::Quit);
            }
        }

        self.menu_bar(ctx);
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let dirty = if self.store.is_dirty() { " (modified)" } else { "" };
            ui.label(format!("{}{dirty}", self.status));
        });
        self.asset_panel(ctx);
        self.tool_panel(ctx);
        self.canvas_panel(ctx);
        self.dialogs(ctx);
        self.process_events(ctx);
    }

    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        self.settings.colour = self.canvas.colour().0;
        self.settings.original_alpha = self.canvas.original_alpha();
        self.settings.original_on_top = self.canvas.original_on_top();
        self.settings.set_recent_colours(&self.recent);
        if let Some(path) = &self.settings_path {
            if let Err(err) = self.settings.save(path) {
                log::warn!("{err}");
            }
        }
    }
}
