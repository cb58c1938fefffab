mod registry;
mod selectors;

pub use registry::{ModelRegistry, ModelSpec, SizePreset, SizePresets, DEFAULT_MODEL};
pub use selectors::{ModelSelection, ModelSelector};
