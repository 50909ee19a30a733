pub mod app;
pub mod config;
pub mod events;
pub mod helpers;
pub mod input;
pub mod scene;
pub mod selection;
pub mod shortcuts;

pub use app::{Inspector, InspectorModule, StartupPhase};
