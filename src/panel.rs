//! Live tuning panel (requires the `egui` feature).
//!
//! The panel edits a full copy of the engine's [`EngineConfig`]. Nothing
//! reaches the engine until the draft is applied, which goes through
//! [`ParticleEngine::configure`]; a rejected draft leaves the running
//! emitter untouched and the error is shown under the Apply button.

use egui::Ui;
use glam::Vec3;

use crate::config::{BlendMode, EmitterStyle, EngineConfig, Keyframes, PRESET_NAMES};
use crate::engine::ParticleEngine;
use crate::time::FrameClock;

/// Tuning panel state.
pub struct Panel {
    draft: EngineConfig,
    error: Option<String>,
    preset: usize,
    auto_apply: bool,
}

impl Panel {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            draft: config.clone(),
            error: None,
            preset: 0,
            auto_apply: false,
        }
    }

    /// Configuration being edited.
    pub fn draft(&self) -> &EngineConfig {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut EngineConfig {
        &mut self.draft
    }

    /// Last validation error, if the last apply was rejected.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Hand the draft to the engine. Returns whether it was accepted.
    pub fn apply(&mut self, engine: &mut ParticleEngine) -> bool {
        match engine.configure(self.draft.clone()) {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// Replace the draft with a named preset and apply it.
    pub fn load_preset(&mut self, name: &str, engine: &mut ParticleEngine) -> bool {
        match EngineConfig::preset(name) {
            Ok(config) => {
                self.draft = config;
                self.apply(engine)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// Draw the panel for one frame.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        engine: &mut ParticleEngine,
        clock: &mut FrameClock,
        rotation_speed: &mut f32,
    ) {
        egui::SidePanel::right("tuning_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.stats_section(ui, engine, clock, rotation_speed);
                    ui.separator();

                    self.preset_section(ui, engine);
                    ui.separator();

                    let mut changed = false;

                    egui::CollapsingHeader::new("Position")
                        .default_open(true)
                        .show(ui, |ui| changed |= position_section(ui, &mut self.draft));
                    egui::CollapsingHeader::new("Velocity")
                        .default_open(true)
                        .show(ui, |ui| changed |= velocity_section(ui, &mut self.draft));
                    egui::CollapsingHeader::new("Acceleration")
                        .show(ui, |ui| {
                            changed |= vec3_row(ui, "Base", &mut self.draft.acc_base);
                            changed |= vec3_row(ui, "Spread", &mut self.draft.acc_spread);
                        });
                    egui::CollapsingHeader::new("Size")
                        .show(ui, |ui| changed |= size_section(ui, &mut self.draft));
                    egui::CollapsingHeader::new("Color")
                        .show(ui, |ui| changed |= color_section(ui, &mut self.draft));
                    egui::CollapsingHeader::new("Opacity")
                        .show(ui, |ui| changed |= opacity_section(ui, &mut self.draft));
                    egui::CollapsingHeader::new("Emitter")
                        .default_open(true)
                        .show(ui, |ui| changed |= emitter_section(ui, &mut self.draft));

                    ui.separator();
                    self.apply_section(ui, engine, changed);
                });
            });
    }

    fn stats_section(
        &mut self,
        ui: &mut Ui,
        engine: &mut ParticleEngine,
        clock: &mut FrameClock,
        rotation_speed: &mut f32,
    ) {
        ui.heading("Sparkfield");
        ui.label(format!("FPS: {:.0}", clock.fps()));
        ui.label(format!(
            "Live: {} / {}",
            engine.live_count(),
            engine.particle_count()
        ));
        ui.label(format!(
            "Emitter: {:.1}s {}",
            engine.emitter_age(),
            if engine.is_firing() { "firing" } else { "stopped" }
        ));
        if engine.dropped_spawns() > 0 {
            ui.label(
                egui::RichText::new(format!("Dropped spawns: {}", engine.dropped_spawns()))
                    .small()
                    .color(egui::Color32::YELLOW),
            );
        }

        ui.horizontal(|ui| {
            let label = if clock.is_paused() { "Resume" } else { "Pause" };
            if ui.button(label).clicked() {
                clock.toggle_pause();
            }
            if ui.button("Restart").clicked() {
                engine.restart();
            }
        });

        let mut scale = clock.time_scale();
        if ui
            .add(egui::Slider::new(&mut scale, 0.0..=4.0).text("Time Scale"))
            .changed()
        {
            clock.set_time_scale(scale);
        }
        ui.add(egui::Slider::new(rotation_speed, 0.0..=2.5).text("Rotation (rad/s)"));
    }

    fn preset_section(&mut self, ui: &mut Ui, engine: &mut ParticleEngine) {
        let mut selected = self.preset;
        ui.horizontal(|ui| {
            ui.label("Preset:");
            egui::ComboBox::from_id_salt("preset")
                .selected_text(PRESET_NAMES[self.preset])
                .show_index(ui, &mut selected, PRESET_NAMES.len(), |i| PRESET_NAMES[i]);
        });
        if selected != self.preset {
            self.preset = selected;
            self.load_preset(PRESET_NAMES[selected], engine);
        }
    }

    fn apply_section(&mut self, ui: &mut Ui, engine: &mut ParticleEngine, changed: bool) {
        ui.checkbox(&mut self.auto_apply, "Apply on change")
            .on_hover_text("Every edit restarts the emitter");

        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                self.apply(engine);
            }
            if ui.button("Revert").clicked() {
                self.draft = engine.config().clone();
                self.error = None;
            }
        });

        if changed && self.auto_apply {
            self.apply(engine);
        }

        if let Some(err) = &self.error {
            ui.label(egui::RichText::new(err).color(egui::Color32::LIGHT_RED));
        }

        ui.collapsing("JSON", |ui| {
            if let Ok(json) = self.draft.to_json() {
                ui.add(egui::Label::new(egui::RichText::new(json).monospace().small()).wrap());
            }
        });
    }
}

fn position_section(ui: &mut Ui, config: &mut EngineConfig) -> bool {
    let mut changed = style_combo(ui, "pos_style", &mut config.pos_style);
    changed |= vec3_row(ui, "Base", &mut config.pos_base);
    match config.pos_style {
        EmitterStyle::Cube => changed |= vec3_row(ui, "Spread", &mut config.pos_spread),
        EmitterStyle::Sphere => {
            changed |= ui
                .add(egui::Slider::new(&mut config.pos_radius, 0.0..=5.0).text("Radius"))
                .changed();
        }
    }
    changed
}

fn velocity_section(ui: &mut Ui, config: &mut EngineConfig) -> bool {
    let mut changed = style_combo(ui, "vel_style", &mut config.vel_style);
    match config.vel_style {
        EmitterStyle::Cube => {
            changed |= vec3_row(ui, "Base", &mut config.vel_base);
            changed |= vec3_row(ui, "Spread", &mut config.vel_spread);
        }
        EmitterStyle::Sphere => {
            changed |= ui
                .add(egui::Slider::new(&mut config.speed_base, 0.0..=10.0).text("Speed"))
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut config.speed_spread, 0.0..=10.0).text("Speed Spread"))
                .changed();
        }
    }
    changed
}

fn size_section(ui: &mut Ui, config: &mut EngineConfig) -> bool {
    let mut changed = ui
        .add(egui::Slider::new(&mut config.size_base, 0.0..=1.0).text("Base"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut config.size_spread, 0.0..=1.0).text("Spread"))
        .changed();
    ui.label("Over lifetime:");
    changed |= scalar_keyframes(ui, "size_tween", &mut config.size_tween, 0.0);
    changed
}

fn color_section(ui: &mut Ui, config: &mut EngineConfig) -> bool {
    let mut changed = hsl_row(ui, "Base", &mut config.col_base);
    changed |= hsl_row(ui, "Spread", &mut config.col_spread);
    ui.label("Over lifetime (HSL):");
    changed |= hsl_keyframes(ui, "col_tween", &mut config.col_tween, config.col_base);
    changed
}

fn opacity_section(ui: &mut Ui, config: &mut EngineConfig) -> bool {
    let mut changed = ui
        .add(egui::Slider::new(&mut config.opacity_base, 0.0..=1.0).text("Base"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut config.opacity_spread, 0.0..=1.0).text("Spread"))
        .changed();
    ui.label("Over lifetime:");
    changed |= scalar_keyframes(ui, "opacity_tween", &mut config.opacity_tween, 1.0);
    changed
}

fn emitter_section(ui: &mut Ui, config: &mut EngineConfig) -> bool {
    let mut changed = ui
        .add(
            egui::Slider::new(&mut config.pps, 1.0..=20_000.0)
                .text("Particles / s")
                .logarithmic(true),
        )
        .changed();
    changed |= ui
        .add(
            egui::Slider::new(&mut config.particle_death, 0.05..=30.0)
                .text("Particle Lifetime")
                .logarithmic(true),
        )
        .changed();
    changed |= ui
        .add(
            egui::Slider::new(&mut config.emitter_death, 0.05..=600.0)
                .text("Emitter Lifetime")
                .logarithmic(true),
        )
        .changed();

    let capacity = config
        .particle_count()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| "too many".to_string());
    ui.label(egui::RichText::new(format!("Pool size: {capacity}")).small().weak());

    ui.horizontal(|ui| {
        ui.label("Blend:");
        egui::ComboBox::from_id_salt("blend")
            .selected_text(config.blend.name())
            .show_ui(ui, |ui| {
                for mode in [BlendMode::Normal, BlendMode::Additive, BlendMode::Multiply] {
                    changed |= ui
                        .selectable_value(&mut config.blend, mode, mode.name())
                        .changed();
                }
            });
    });
    changed
}

fn style_combo(ui: &mut Ui, id: &str, style: &mut EmitterStyle) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label("Style:");
        egui::ComboBox::from_id_salt(id)
            .selected_text(style.name())
            .show_ui(ui, |ui| {
                for option in [EmitterStyle::Cube, EmitterStyle::Sphere] {
                    changed |= ui.selectable_value(style, option, option.name()).changed();
                }
            });
    });
    changed
}

fn vec3_row(ui: &mut Ui, label: &str, v: &mut Vec3) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);
        changed |= ui.add(egui::DragValue::new(&mut v.x).speed(0.01).prefix("X: ")).changed();
        changed |= ui.add(egui::DragValue::new(&mut v.y).speed(0.01).prefix("Y: ")).changed();
        changed |= ui.add(egui::DragValue::new(&mut v.z).speed(0.01).prefix("Z: ")).changed();
    });
    changed
}

fn hsl_row(ui: &mut Ui, label: &str, v: &mut Vec3) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);
        changed |= ui
            .add(egui::DragValue::new(&mut v.x).speed(0.005).range(0.0..=1.0).prefix("H: "))
            .changed();
        changed |= ui
            .add(egui::DragValue::new(&mut v.y).speed(0.005).range(0.0..=1.0).prefix("S: "))
            .changed();
        changed |= ui
            .add(egui::DragValue::new(&mut v.z).speed(0.005).range(0.0..=1.0).prefix("L: "))
            .changed();
    });
    changed
}

fn scalar_keyframes(ui: &mut Ui, id: &str, frames: &mut Keyframes<f32>, default: f32) -> bool {
    let mut changed = false;
    let mut remove = None;

    egui::Grid::new(id).num_columns(3).show(ui, |ui| {
        for (i, (time, value)) in frames
            .times
            .iter_mut()
            .zip(frames.values.iter_mut())
            .enumerate()
        {
            changed |= ui
                .add(egui::DragValue::new(time).speed(0.01).prefix("t: "))
                .changed();
            changed |= ui.add(egui::DragValue::new(value).speed(0.01)).changed();
            if ui.small_button("x").clicked() {
                remove = Some(i);
            }
            ui.end_row();
        }
    });

    if let Some(i) = remove {
        frames.times.remove(i);
        frames.values.remove(i);
        changed = true;
    }
    if ui.small_button("+ keyframe").clicked() {
        let t = frames.times.last().map_or(0.0, |t| t + 1.0);
        let v = frames.values.last().copied().unwrap_or(default);
        frames.times.push(t);
        frames.values.push(v);
        changed = true;
    }
    changed
}

fn hsl_keyframes(ui: &mut Ui, id: &str, frames: &mut Keyframes<Vec3>, default: Vec3) -> bool {
    let mut changed = false;
    let mut remove = None;

    egui::Grid::new(id).num_columns(2).show(ui, |ui| {
        for (i, (time, value)) in frames
            .times
            .iter_mut()
            .zip(frames.values.iter_mut())
            .enumerate()
        {
            changed |= ui
                .add(egui::DragValue::new(time).speed(0.01).prefix("t: "))
                .changed();
            ui.horizontal(|ui| {
                changed |= hsl_row(ui, "", value);
                if ui.small_button("x").clicked() {
                    remove = Some(i);
                }
            });
            ui.end_row();
        }
    });

    if let Some(i) = remove {
        frames.times.remove(i);
        frames.values.remove(i);
        changed = true;
    }
    if ui.small_button("+ keyframe").clicked() {
        let t = frames.times.last().map_or(0.0, |t| t + 1.0);
        let v = frames.values.last().copied().unwrap_or(default);
        frames.times.push(t);
        frames.values.push(v);
        changed = true;
    }
    changed
}
