pub mod agent;
pub mod errors;
pub mod kernel;
pub mod point2;
pub mod presets;
pub mod rect;
pub mod render;
pub mod settings;
pub mod simulation;
pub mod swapper;
pub mod timing;
pub mod trail;

pub use agent::Agent;
pub use point2::Point2;
pub use simulation::{Simulation, StopSignal};
pub use swapper::Swapper;
pub use trail::TrailField;
