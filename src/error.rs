//! Error types for Sparkfield.
//!
//! Configuration problems are reported synchronously by
//! [`ParticleEngine::configure`](crate::ParticleEngine::configure) and never
//! silently clamped. GPU and window failures belong to the viewer.

use thiserror::Error;

/// Errors raised while validating or loading an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value that must be strictly positive was zero or negative.
    #[error("`{field}` must be greater than zero (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    /// A value that must be zero or more was negative.
    #[error("`{field}` must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },

    /// A value was NaN or infinite.
    #[error("`{field}` must be a finite number")]
    NotFinite { field: &'static str },

    /// A value fell outside its allowed range.
    #[error("`{field}` must be within {min}..={max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// A keyframe curve has a different number of times and values.
    #[error("curve `{curve}` has {times} keyframe times but {values} values")]
    KeyframeLengthMismatch {
        curve: &'static str,
        times: usize,
        values: usize,
    },

    /// Keyframe times go backwards or are not finite.
    #[error("curve `{curve}` keyframe {index} is out of order or not finite")]
    KeyframeOrder { curve: &'static str, index: usize },

    /// The computed pool capacity is larger than the engine allows.
    #[error("pool capacity of {requested} particles exceeds the maximum of {max}")]
    CapacityTooLarge { requested: f64, max: usize },

    /// No preset is registered under the requested name.
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),

    /// Configuration JSON could not be parsed.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during GPU initialization and texture upload.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; ensure your system supports Vulkan, Metal, DX12 or WebGPU")]
    NoAdapter,

    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    /// The surface reports no usable texture format for this adapter.
    #[error("surface is not supported by the selected GPU adapter")]
    UnsupportedSurface,

    /// Failed to load the sprite texture.
    #[error("failed to load sprite texture: {0}")]
    Texture(#[from] image::ImageError),
}

/// Errors that can occur when running the viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Render(#[from] RenderError),

    /// The initial configuration was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
