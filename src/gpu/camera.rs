//! Camera for 3D orbit view.

use glam::{Mat4, Vec3};

/// Orbit camera for viewing the particle field.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Camera {
    /// Create a camera looking at the origin from a few units back.
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.3,
            distance: 4.0,
            target: Vec3::ZERO,
            fov_y: 40.0_f32.to_radians(),
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Combined projection * view for the given aspect ratio.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), 0.1, 1000.0);
        proj * self.view_matrix()
    }

    /// Rotate from a mouse drag, in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * 0.005;
        self.pitch = (self.pitch + dy * 0.005).clamp(-1.5, 1.5);
    }

    /// Move closer or further from a scroll amount, in lines.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance - scroll * 0.3).clamp(0.5, 50.0);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_keeps_distance() {
        let mut camera = Camera::new();
        camera.orbit(120.0, -40.0);
        let d = camera.position().distance(camera.target);
        assert!((d - camera.distance).abs() < 1e-4);
    }

    #[test]
    fn test_pitch_and_zoom_are_clamped() {
        let mut camera = Camera::new();
        camera.orbit(0.0, 10_000.0);
        assert_eq!(camera.pitch, 1.5);
        camera.zoom(1_000.0);
        assert_eq!(camera.distance, 0.5);
        camera.zoom(-1_000.0);
        assert_eq!(camera.distance, 50.0);
    }
}
