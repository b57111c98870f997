//! Per-slot attribute arrays handed to the renderer.
//!
//! Every array has one entry per pool slot, index-aligned with the engine's
//! particle pool. The engine rewrites all of them each tick and raises the
//! dirty flag; the renderer uploads and clears it.

use crate::particle::Particle;

/// Parallel attribute arrays for the particle pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeBuffers {
    visible: Vec<f32>,
    size: Vec<f32>,
    opacity: Vec<f32>,
    color: Vec<[f32; 3]>,
    position: Vec<[f32; 3]>,
    dirty: bool,
}

impl AttributeBuffers {
    /// Buffers for `capacity` slots, all hidden.
    pub fn new(capacity: usize) -> Self {
        Self {
            visible: vec![0.0; capacity],
            size: vec![0.0; capacity],
            opacity: vec![0.0; capacity],
            color: vec![[0.0; 3]; capacity],
            position: vec![[0.0; 3]; capacity],
            dirty: true,
        }
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.visible.len()
    }

    /// Write one slot from a particle. Dead particles are hidden.
    pub(crate) fn write_slot(&mut self, index: usize, particle: &Particle) {
        if particle.is_alive() {
            self.visible[index] = 1.0;
            self.size[index] = particle.size;
            self.opacity[index] = particle.opacity;
            self.color[index] = particle.color.to_array();
            self.position[index] = particle.position.to_array();
        } else {
            self.visible[index] = 0.0;
            self.opacity[index] = 0.0;
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the buffers changed since the last upload.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after uploading.
    #[inline]
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Return the dirty flag and clear it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Number of slots flagged visible.
    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|&&v| v > 0.0).count()
    }

    /// 1.0 for live slots, 0.0 otherwise.
    pub fn visible(&self) -> &[f32] {
        &self.visible
    }

    pub fn size(&self) -> &[f32] {
        &self.size
    }

    pub fn opacity(&self) -> &[f32] {
        &self.opacity
    }

    /// RGB per slot.
    pub fn color(&self) -> &[[f32; 3]] {
        &self.color
    }

    /// World-space position per slot.
    pub fn position(&self) -> &[[f32; 3]] {
        &self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleCurves;
    use glam::Vec3;
    use std::sync::Arc;

    #[test]
    fn test_new_buffers_are_hidden_and_dirty() {
        let buffers = AttributeBuffers::new(4);
        assert_eq!(buffers.capacity(), 4);
        assert_eq!(buffers.visible_count(), 0);
        assert!(buffers.is_dirty());
    }

    #[test]
    fn test_write_slot() {
        let curves = Arc::new(ParticleCurves::default());
        let mut buffers = AttributeBuffers::new(2);

        let mut live = Particle::new(curves.clone(), 1.0);
        live.position = Vec3::new(1.0, 2.0, 3.0);
        live.size = 0.5;
        live.opacity = 0.25;
        buffers.write_slot(0, &live);
        let mut expired = Particle::new(curves, 1.0);
        expired.advance(1.0);
        buffers.write_slot(1, &expired);

        assert_eq!(buffers.visible(), &[1.0_f32, 0.0]);
        assert_eq!(buffers.position()[0], [1.0, 2.0, 3.0]);
        assert_eq!(buffers.size()[0], 0.5);
        assert_eq!(buffers.opacity(), &[0.25_f32, 0.0]);
    }

    #[test]
    fn test_take_dirty() {
        let mut buffers = AttributeBuffers::new(1);
        assert!(buffers.take_dirty());
        assert!(!buffers.take_dirty());
        buffers.mark_dirty();
        assert!(buffers.is_dirty());
        buffers.mark_clean();
        assert!(!buffers.is_dirty());
    }
}
