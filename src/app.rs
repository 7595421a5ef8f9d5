use std::borrow::Cow;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use chrono::Local;
use eframe::egui::{self, Context as EguiContext, Key, RichText, TopBottomPanel};
use eframe::{App, Frame};
use log::{error, warn};

use crate::action_bar;
use crate::analysis::{self, AnalysisJob, VisionModel};
use crate::annotation::DrawTool;
use crate::canvas;
use crate::report;
use crate::session::{EditorState, ImageSource};
use crate::session_store::SessionStore;
use crate::theme::{self, AppTheme};
use crate::toolbar;
use crate::ui_controls;

const SPLASH_SECONDS: f64 = 2.5;
const COPY_FEEDBACK_SECONDS: f64 = 1.5;

#[derive(Default)]
struct AppUiFlags {
    copy_feedback_until: Option<f64>,
    ask_replace_upload: Option<ImageSource>,
}

pub struct MediMarkApp {
    state: EditorState,
    session: SessionStore,
    model: Arc<dyn VisionModel>,
    job: Option<AnalysisJob>,
    ui_flags: AppUiFlags,
    theme: AppTheme,
    splash_until: Option<f64>,
    login_name: String,
    login_password: String,
}

impl MediMarkApp {
    pub fn new(cc: &eframe::CreationContext<'_>, model: Arc<dyn VisionModel>) -> Self {
        let theme = theme::clinical_theme();
        theme::apply_theme(&cc.egui_ctx, &theme);

        let session = SessionStore::load().unwrap_or_default();
        let state = EditorState::new(session.last_modality);

        Self {
            state,
            session,
            model,
            job: None,
            ui_flags: AppUiFlags::default(),
            theme,
            splash_until: None,
            login_name: String::new(),
            login_password: String::new(),
        }
    }

    fn pump_analysis(&mut self, ctx: &EguiContext) {
        let Some(job) = &self.job else {
            return;
        };
        match job.try_take() {
            Some(Ok(report)) => {
                self.job = None;
                self.state.analysis_running = false;
                self.state.report = Some(report);
                self.state.status = None;
            }
            Some(Err(err)) => {
                self.job = None;
                self.state.analysis_running = false;
                error!("analysis failed: {err:#}");
                self.state.status = Some(format!("Analysis failed: {err:#}"));
            }
            None => {
                // Keep polling while the worker is out.
                ctx.request_repaint_after(Duration::from_millis(150));
            }
        }
    }

    fn start_analysis(&mut self) {
        if self.job.is_some() {
            return;
        }
        let Some(displayed) = self.state.displayed.as_ref() else {
            return;
        };

        match analysis::build_request(self.state.modality, displayed.media_type(), &displayed.bytes)
        {
            Ok(request) => {
                self.state.report = None;
                self.state.status = None;
                self.state.analysis_running = true;
                self.job = Some(AnalysisJob::spawn(Arc::clone(&self.model), request));
            }
            Err(err) => {
                warn!("cannot start analysis: {err:#}");
                self.state.status = Some(format!("Cannot start analysis: {err:#}"));
            }
        }
    }

    fn queue_upload(&mut self, source: ImageSource) {
        if self.state.has_annotations {
            self.ui_flags.ask_replace_upload = Some(source);
        } else {
            self.load_upload(source);
        }
    }

    fn load_upload(&mut self, source: ImageSource) {
        // An in-flight analysis refers to the previous image; drop it.
        self.job = None;
        self.state.analysis_running = false;
        if let Err(err) = self.state.load_source(source) {
            warn!("upload rejected: {err:#}");
            self.state.status = Some(format!("Cannot load image: {err:#}"));
        }
    }

    fn open_file_dialog(&mut self) {
        let file = rfd::FileDialog::new()
            .set_title("Choose a clinical image")
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "webp"])
            .pick_file();
        let Some(path) = file else {
            return;
        };

        match fs::read(&path) {
            Ok(bytes) => {
                let filename = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("upload")
                    .to_string();
                match ImageSource::from_bytes(bytes, filename) {
                    Ok(source) => self.queue_upload(source),
                    Err(err) => {
                        warn!("unsupported upload: {err:#}");
                        self.state.status = Some(format!("Cannot load image: {err:#}"));
                    }
                }
            }
            Err(err) => {
                warn!("cannot read {}: {err:#}", path.display());
                self.state.status = Some(format!("Cannot read file: {err:#}"));
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &EguiContext) {
        let Some(file) = ctx.input(|input| input.raw.dropped_files.first().cloned()) else {
            return;
        };

        let filename = file
            .path
            .as_ref()
            .and_then(|path| path.file_name())
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| file.name.clone());

        let bytes = if let Some(bytes) = file.bytes {
            bytes.to_vec()
        } else if let Some(path) = &file.path {
            match fs::read(path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("cannot read dropped file {}: {err:#}", path.display());
                    self.state.status = Some(format!("Cannot read dropped file: {err:#}"));
                    return;
                }
            }
        } else {
            return;
        };

        match ImageSource::from_bytes(bytes, filename) {
            Ok(source) => self.queue_upload(source),
            Err(err) => {
                warn!("unsupported drop: {err:#}");
                self.state.status = Some(format!("Cannot load image: {err:#}"));
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &EguiContext) {
        let cmd = ctx.input(|input| input.modifiers.command || input.modifiers.ctrl);

        if ctx.input(|input| input.key_pressed(Key::Escape)) {
            if let Some(tool) = self.state.active_tool {
                self.state.toggle_tool(tool);
            }
        }

        if !cmd {
            if ctx.input(|input| input.key_pressed(Key::B)) {
                self.state.toggle_tool(DrawTool::Box);
            }
            if ctx.input(|input| input.key_pressed(Key::A)) {
                self.state.toggle_tool(DrawTool::Arrow);
            }
            if ctx.input(|input| input.key_pressed(Key::U)) {
                self.state.undo_annotations();
            }
            return;
        }

        if ctx.input(|input| input.key_pressed(Key::Enter)) {
            self.start_analysis();
        }
        if ctx.input(|input| input.key_pressed(Key::S)) {
            if let Err(err) = self.save_to_file() {
                warn!("save failed: {err:#}");
                self.state.status = Some(format!("Save failed: {err:#}"));
            }
        }
        if ctx.input(|input| input.key_pressed(Key::C)) {
            if let Err(err) = self.copy_image_to_clipboard(ctx) {
                warn!("copy failed: {err:#}");
                self.state.status = Some(format!("Copy failed: {err:#}"));
            }
        }
        if ctx.input(|input| input.key_pressed(Key::Z)) {
            self.state.undo_annotations();
        }
        if ctx.input(|input| input.key_pressed(Key::Plus) || input.key_pressed(Key::Equals)) {
            self.state.zoom_in();
        }
        if ctx.input(|input| input.key_pressed(Key::Minus)) {
            self.state.zoom_out();
        }
        if ctx.input(|input| input.key_pressed(Key::Num0)) {
            self.state.reset_view();
        }
    }

    fn save_to_file(&mut self) -> Result<()> {
        let Some(displayed) = self.state.displayed.as_ref() else {
            return Ok(());
        };

        let extension = match displayed.format {
            image::ImageFormat::Jpeg => "jpg",
            _ => "png",
        };
        let stem = self
            .state
            .source
            .as_ref()
            .map(|source| source.filename.clone())
            .and_then(|name| name.rsplit_once('.').map(|(stem, _)| stem.to_string()))
            .unwrap_or_else(|| "clinical image".to_string());
        let default_name = format!(
            "{stem} marked {}.{extension}",
            Local::now().format("%Y-%m-%d at %H.%M.%S")
        );

        let file = rfd::FileDialog::new()
            .set_title("Save marked image")
            .set_file_name(&default_name)
            .add_filter("PNG", &["png"])
            .add_filter("JPEG", &["jpg", "jpeg"])
            .save_file();
        let Some(path) = file else {
            return Ok(());
        };

        fs::write(&path, &displayed.bytes)
            .with_context(|| format!("cannot save to {}", path.display()))?;
        Ok(())
    }

    fn copy_image_to_clipboard(&mut self, ctx: &EguiContext) -> Result<()> {
        let Some(displayed) = self.state.displayed.as_ref() else {
            return Ok(());
        };

        let rgba = displayed.bitmap.to_rgba8();
        let mut clipboard = arboard::Clipboard::new().context("cannot access clipboard")?;
        clipboard
            .set_image(arboard::ImageData {
                width: rgba.width() as usize,
                height: rgba.height() as usize,
                bytes: Cow::Owned(rgba.into_raw()),
            })
            .context("cannot write image to clipboard")?;

        self.ui_flags.copy_feedback_until =
            Some(ctx.input(|input| input.time) + COPY_FEEDBACK_SECONDS);
        Ok(())
    }

    fn copy_report_text(&self, ctx: &EguiContext) {
        if let Some(report) = &self.state.report {
            let text = report::report_as_text(report);
            ctx.output_mut(|output| output.copied_text = text);
        }
    }

    fn sign_out(&mut self) {
        self.session.sign_out();
        if let Err(err) = self.session.save() {
            warn!("cannot persist session: {err:#}");
        }
        self.job = None;
        self.state.clear_image();
        self.login_name.clear();
        self.login_password.clear();
    }

    fn show_splash(&mut self, ctx: &EguiContext) -> bool {
        let now = ctx.input(|input| input.time);
        let until = *self.splash_until.get_or_insert(now + SPLASH_SECONDS);
        if now >= until {
            return false;
        }

        let theme = &self.theme;
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme.surfaces.app_bg))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let painter = ui.painter();
                painter.text(
                    rect.center() - egui::vec2(0.0, 18.0),
                    egui::Align2::CENTER_CENTER,
                    "MediMark",
                    egui::FontId::proportional(36.0),
                    theme.text.accent,
                );
                painter.text(
                    rect.center() + egui::vec2(0.0, 18.0),
                    egui::Align2::CENTER_CENTER,
                    "Clinical image markup & analysis",
                    egui::FontId::proportional(15.0),
                    theme.text.secondary,
                );
            });
        ctx.request_repaint();
        true
    }

    fn show_login(&mut self, ctx: &EguiContext) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.surfaces.app_bg))
            .show(ctx, |ui| {
                let card_rect = egui::Rect::from_center_size(
                    ui.max_rect().center(),
                    egui::vec2(360.0, 260.0),
                );
                let mut card_ui =
                    ui.child_ui(card_rect, egui::Layout::top_down(egui::Align::Min));

                ui_controls::card_frame(&self.theme).show(&mut card_ui, |ui| {
                    ui.label(
                        RichText::new("MediMark")
                            .size(24.0)
                            .strong()
                            .color(self.theme.text.accent),
                    );
                    ui.label(
                        RichText::new("Sign in to start a review session")
                            .color(self.theme.text.secondary),
                    );
                    ui.add_space(self.theme.layout.space_3);

                    ui.label(RichText::new("Clinician").color(self.theme.text.muted).size(12.0));
                    let name_field = ui.text_edit_singleline(&mut self.login_name);
                    ui.add_space(self.theme.layout.space_2);
                    ui.label(RichText::new("Password").color(self.theme.text.muted).size(12.0));
                    ui.add(egui::TextEdit::singleline(&mut self.login_password).password(true));
                    ui.add_space(self.theme.layout.space_3);

                    let can_sign_in = !self.login_name.trim().is_empty();
                    let submitted = name_field.lost_focus()
                        && ui.input(|input| input.key_pressed(Key::Enter));
                    let clicked = ui
                        .add_enabled_ui(can_sign_in, |ui| {
                            ui_controls::primary_button(
                                ui,
                                &self.theme,
                                "Sign in",
                                egui::vec2(ui.available_width(), 34.0),
                            )
                        })
                        .inner
                        .clicked();

                    if can_sign_in && (clicked || submitted) {
                        self.session.sign_in(self.login_name.clone());
                        if let Err(err) = self.session.save() {
                            warn!("cannot persist session: {err:#}");
                        }
                        self.login_password.clear();
                    }
                });
            });
    }

    fn replace_dialog(
        ctx: &EguiContext,
        app_theme: &AppTheme,
        pending: &mut Option<ImageSource>,
    ) -> Option<ImageSource> {
        let mut out = None;

        if pending.is_none() {
            return out;
        }

        egui::Window::new("Replace current image")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .frame(ui_controls::card_frame(app_theme))
            .show(ctx, |ui| {
                ui.label(
                    RichText::new(
                        "The current image has burned-in annotations that will be lost.",
                    )
                    .color(app_theme.text.secondary)
                    .size(14.0),
                );
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui_controls::primary_button(
                        ui,
                        app_theme,
                        "Replace",
                        egui::vec2(116.0, 34.0),
                    )
                    .clicked()
                    {
                        out = pending.take();
                    }
                    if ui_controls::ghost_button(
                        ui,
                        app_theme,
                        "Keep Current",
                        egui::vec2(128.0, 34.0),
                    )
                    .clicked()
                    {
                        *pending = None;
                    }
                });
            });

        out
    }
}

impl App for MediMarkApp {
    fn update(&mut self, ctx: &EguiContext, _frame: &mut Frame) {
        theme::apply_theme(ctx, &self.theme);

        if self.show_splash(ctx) {
            return;
        }
        if !self.session.is_signed_in() {
            self.show_login(ctx);
            return;
        }

        self.pump_analysis(ctx);
        self.handle_dropped_files(ctx);
        self.handle_shortcuts(ctx);

        if let Some(source) =
            Self::replace_dialog(ctx, &self.theme, &mut self.ui_flags.ask_replace_upload)
        {
            self.load_upload(source);
        }

        let toolbar_out = TopBottomPanel::top("toolbar")
            .exact_height(self.theme.layout.toolbar_height)
            .frame(ui_controls::toolbar_frame(&self.theme))
            .show(ctx, |ui| {
                let width_class = self.theme.width_class(ui.available_width());
                toolbar::show_toolbar(ui, &self.theme, &mut self.state, width_class)
            })
            .inner;

        if toolbar_out.modality_changed {
            self.session.last_modality = self.state.modality;
            if let Err(err) = self.session.save() {
                warn!("cannot persist session: {err:#}");
            }
        }

        let copied_feedback = self
            .ui_flags
            .copy_feedback_until
            .is_some_and(|deadline| ctx.input(|input| input.time) <= deadline);

        let action_out = TopBottomPanel::bottom("action_bar")
            .exact_height(self.theme.layout.action_bar_height)
            .frame(ui_controls::action_bar_frame(&self.theme))
            .show(ctx, |ui| {
                let width_class = self.theme.width_class(ui.available_width());
                action_bar::show_action_bar(
                    ui,
                    &self.theme,
                    &self.state,
                    copied_feedback,
                    width_class,
                )
            })
            .inner;

        let report_out = egui::SidePanel::right("report_panel")
            .default_width(self.theme.layout.report_panel_width)
            .resizable(true)
            .frame(
                egui::Frame::none()
                    .fill(self.theme.surfaces.panel_bg)
                    .inner_margin(egui::Margin::symmetric(
                        self.theme.layout.panel_padding_x,
                        self.theme.layout.panel_padding_y + 4.0,
                    )),
            )
            .show(ctx, |ui| {
                report::show_report_panel(
                    ui,
                    &self.theme,
                    self.state.report.as_ref(),
                    self.state.analysis_running,
                )
            })
            .inner;

        let canvas_out = egui::CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(self.theme.surfaces.app_bg)
                    .inner_margin(egui::Margin::symmetric(
                        self.theme.layout.panel_padding_x,
                        self.theme.layout.panel_padding_y + 2.0,
                    )),
            )
            .show(ctx, |ui| canvas::show_canvas(ui, ctx, &self.theme, &mut self.state))
            .inner;

        if canvas_out.upload_clicked {
            self.open_file_dialog();
        }
        if report_out.copy_report {
            self.copy_report_text(ctx);
        }
        if action_out.analyze {
            self.start_analysis();
        }
        if action_out.save {
            if let Err(err) = self.save_to_file() {
                warn!("save failed: {err:#}");
                self.state.status = Some(format!("Save failed: {err:#}"));
            }
        }
        if action_out.copy_image {
            if let Err(err) = self.copy_image_to_clipboard(ctx) {
                warn!("copy failed: {err:#}");
                self.state.status = Some(format!("Copy failed: {err:#}"));
            }
        }
        if action_out.clear_image {
            self.job = None;
            self.state.clear_image();
        }
        if action_out.sign_out {
            self.sign_out();
        }
    }
}
