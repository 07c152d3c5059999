mod component;
mod config;
mod engine;
mod interaction;
mod overlay;
mod preprocess;
mod quadtree;
mod render;
mod scheduler;
mod simulation;
mod types;

pub use component::SocialGraphCanvas;
pub use types::AgentRecord;
