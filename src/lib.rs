//! Synviz
//!
//! Skeleton and synapse visualizer for neuPrint-style connectome servers:
//! - Typed client for the connectome HTTP API (skeletons, synapse
//!   connections, neuron metadata) behind a `ConnectomeStore` trait
//! - Skeleton segment reconstruction for 2D rendering
//! - Partner ranking by synapse count with top-N truncation
//! - Palette selection and cyclic color assignment
//! - SVG figure output (skeleton segments + colored synapse scatter)

pub mod config;
pub mod neuprint;
pub mod palette;
pub mod ranking;
pub mod skeleton;
pub mod viz;

pub use config::Config;
pub use neuprint::{ConnectomeStore, NeuprintClient};
pub use palette::{Color, Palette, PaletteFamily};
pub use ranking::ConnectionRanking;
pub use viz::{VisualizeOptions, Visualizer, VizError};
