#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod events;
pub mod settings;

pub use error::EngineError;

pub use config::{load_typed_json, save_typed_json};
pub use events::{CommandQueue, FireCommand};
pub use settings::{
    parse_boundary_type, parse_source_type, BoundaryType, ChangeEffect, PresetCycle, Resolution,
    Settings, SettingsChange, SourceMode, SourceType, MAX_GRID_AXIS, MAX_ITERATIONS,
};
