//! Interactive window: drives the engine once per frame and draws the field.
//!
//! ```ignore
//! use sparkfield::prelude::*;
//!
//! Viewer::new(EngineConfig::fountain())
//!     .with_rotation_speed(0.2)
//!     .run()?;
//! ```
//!
//! Controls: left-drag orbits, the wheel zooms, Space pauses, R restarts the
//! emitter and Escape quits.

use std::path::PathBuf;
use std::sync::Arc;

use glam::Mat4;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::config::EngineConfig;
use crate::engine::ParticleEngine;
use crate::error::ViewerError;
use crate::gpu::{Camera, Renderer, SpriteImage, DEFAULT_ALPHA_TEST};
use crate::time::FrameClock;

#[cfg(feature = "egui")]
use crate::gpu::egui_integration::EguiIntegration;
#[cfg(feature = "egui")]
use crate::panel::Panel;

const STAR_SIZE: u32 = 64;

/// Builder for the viewer window.
pub struct Viewer {
    config: EngineConfig,
    texture: Option<PathBuf>,
    rotation_speed: f32,
    title: String,
    seed: Option<u64>,
    alpha_test: f32,
}

impl Viewer {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            texture: None,
            rotation_speed: 0.05,
            title: "Sparkfield".to_string(),
            seed: None,
            alpha_test: DEFAULT_ALPHA_TEST,
        }
    }

    /// Sprite image drawn on each particle. Defaults to a generated star.
    pub fn with_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.texture = Some(path.into());
        self
    }

    /// Spin of the whole field around its Z axis, in radians per second.
    pub fn with_rotation_speed(mut self, speed: f32) -> Self {
        self.rotation_speed = speed;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Seed the spawn sampler for a reproducible run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fragments below this alpha are discarded.
    pub fn with_alpha_test(mut self, alpha_test: f32) -> Self {
        self.alpha_test = alpha_test.clamp(0.0, 1.0);
        self
    }

    /// Open the window and run until it is closed.
    pub fn run(self) -> Result<(), ViewerError> {
        let engine = match self.seed {
            Some(seed) => ParticleEngine::with_seed(self.config, seed)?,
            None => ParticleEngine::new(self.config)?,
        };
        let sprite = match &self.texture {
            Some(path) => SpriteImage::from_file(path)?,
            None => SpriteImage::star(STAR_SIZE),
        };

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        #[cfg(feature = "egui")]
        let panel = Panel::new(engine.config());

        let mut app = App {
            window: None,
            renderer: None,
            engine,
            clock: FrameClock::new(),
            camera: Camera::new(),
            sprite,
            title: self.title,
            rotation_speed: self.rotation_speed,
            rotation: 0.0,
            alpha_test: self.alpha_test,
            mouse_pressed: false,
            last_mouse_pos: None,
            #[cfg(feature = "egui")]
            egui: None,
            #[cfg(feature = "egui")]
            panel,
            error: None,
        };

        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct App {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    engine: ParticleEngine,
    clock: FrameClock,
    camera: Camera,
    sprite: SpriteImage,
    title: String,
    rotation_speed: f32,
    rotation: f32,
    alpha_test: f32,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    #[cfg(feature = "egui")]
    egui: Option<EguiIntegration>,
    #[cfg(feature = "egui")]
    panel: Panel,
    error: Option<ViewerError>,
}

impl App {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let renderer = pollster::block_on(Renderer::new(
            window.clone(),
            self.engine.particle_count(),
            self.engine.config().blend,
            &self.sprite,
            self.alpha_test,
        ))?;

        #[cfg(feature = "egui")]
        {
            self.egui = Some(EguiIntegration::new(
                renderer.device(),
                renderer.format(),
                &window,
            ));
        }

        log::info!(
            "viewer started: {} slots, blend {}",
            self.engine.particle_count(),
            self.engine.config().blend.name()
        );

        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Named(NamedKey::Space) => self.clock.toggle_pause(),
            Key::Character(c) if c.eq_ignore_ascii_case("r") => self.engine.restart(),
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        self.engine.tick(dt);
        self.rotation += self.rotation_speed * dt;

        let (Some(window), Some(renderer)) = (self.window.as_ref(), self.renderer.as_mut()) else {
            return;
        };

        #[cfg(feature = "egui")]
        let ui_output = self.egui.as_mut().map(|egui| {
            egui.run(window, |ctx| {
                self.panel.show(
                    ctx,
                    &mut self.engine,
                    &mut self.clock,
                    &mut self.rotation_speed,
                )
            })
        });

        renderer.set_blend(self.engine.config().blend);
        renderer.sync(self.engine.buffers_mut());

        let model = Mat4::from_rotation_z(self.rotation);

        #[cfg(feature = "egui")]
        let result = {
            let egui = &mut self.egui;
            renderer.render(&self.camera, model, |target| {
                if let (Some(egui), Some(output)) = (egui.as_mut(), ui_output) {
                    egui.paint(target, output);
                }
            })
        };
        #[cfg(not(feature = "egui"))]
        let result = renderer.render(&self.camera, model, |_| {});

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {e:?}"),
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.init(event_loop) {
                log::error!("{err}");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        if let (Some(window), Some(egui)) = (self.window.as_ref(), self.egui.as_mut()) {
            if egui.on_window_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;
                        self.camera.orbit(dx as f32, dy as f32);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.camera.zoom(scroll);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let viewer = Viewer::new(EngineConfig::smoke())
            .with_texture("sprites/star.png")
            .with_rotation_speed(0.3)
            .with_title("Smoke")
            .with_seed(9)
            .with_alpha_test(2.0);

        assert_eq!(viewer.texture, Some(PathBuf::from("sprites/star.png")));
        assert_eq!(viewer.rotation_speed, 0.3);
        assert_eq!(viewer.title, "Smoke");
        assert_eq!(viewer.seed, Some(9));
        assert_eq!(viewer.alpha_test, 1.0);
    }
}
