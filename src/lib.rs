//! Orrery - deterministic schema-galaxy layout and animation engine.
//!
//! Renders a database schema graph as a living galaxy: seeded procedural
//! layout, metric-driven visual attributes, curved edges that never
//! jitter, and a cooperative per-frame animation loop with particle flow
//! and camera choreography.

pub mod camera;
pub mod config;
pub mod curve;
pub mod layout;
pub mod metrics;
pub mod render;
pub mod rng;
pub mod scene;
pub mod sound;
pub mod topology;
pub mod visual;

pub use config::OrreryConfig;
pub use metrics::{GraphSnapshot, SchemaGraph};
pub use rng::SeededRng;
pub use scene::{Command, Scene};
