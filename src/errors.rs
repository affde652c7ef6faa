use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlimeError {
    #[error("field dimensions must be positive and within bounds, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("a simulation needs at least one agent")]
    NoAgents,
    #[error("decay factor must lie in (0, 1], got {0}")]
    InvalidDecayFactor(f64),
    #[error("invalid diffusion kernel: {0}")]
    InvalidKernel(String),
    #[error("invalid setting '{name}': {reason}")]
    InvalidSetting { name: &'static str, reason: String },
    #[error("agent {id} starts outside of the field")]
    AgentOutOfBounds { id: usize },
    #[error("Pixels encountered an issue: {0}")]
    Pixels(#[from] pixels::Error),
    #[error("{0}")]
    Window(#[from] winit::error::OsError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Config(#[from] config::ConfigError),
    #[error("render sink failed: {0}")]
    Render(String),
}
