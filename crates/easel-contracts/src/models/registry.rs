use indexmap::IndexMap;
use serde::Serialize;

pub const DEFAULT_MODEL: &str = "jimeng-3.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizePreset {
    pub width: u32,
    pub height: u32,
}

impl SizePreset {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Sizes a backend accepts, plus the fallback preset for each orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizePresets {
    pub exact: Vec<SizePreset>,
    pub landscape: SizePreset,
    pub portrait: SizePreset,
    pub square: SizePreset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<String>,
    pub sizes: SizePresets,
}

impl ModelSpec {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|item| item == capability)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, capability: &str) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: &str) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

fn jimeng_sizes() -> SizePresets {
    SizePresets {
        exact: vec![
            SizePreset::new(1024, 1024),
            SizePreset::new(1280, 720),
            SizePreset::new(720, 1280),
            SizePreset::new(1152, 864),
            SizePreset::new(864, 1152),
        ],
        landscape: SizePreset::new(1280, 720),
        portrait: SizePreset::new(720, 1280),
        square: SizePreset::new(1024, 1024),
    }
}

// dall-e-2 only serves square outputs; orientation picks the resolution tier.
fn dalle2_sizes() -> SizePresets {
    SizePresets {
        exact: vec![
            SizePreset::new(1024, 1024),
            SizePreset::new(512, 512),
            SizePreset::new(256, 256),
        ],
        landscape: SizePreset::new(1024, 1024),
        portrait: SizePreset::new(512, 512),
        square: SizePreset::new(256, 256),
    }
}

fn dalle3_sizes() -> SizePresets {
    SizePresets {
        exact: vec![
            SizePreset::new(1024, 1024),
            SizePreset::new(1792, 1024),
            SizePreset::new(1024, 1792),
        ],
        landscape: SizePreset::new(1792, 1024),
        portrait: SizePreset::new(1024, 1792),
        square: SizePreset::new(1024, 1024),
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, provider: &str, capabilities: &[&str], sizes: SizePresets| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                provider: provider.to_string(),
                capabilities: capabilities
                    .iter()
                    .map(|item| (*item).to_string())
                    .collect(),
                sizes,
            },
        );
    };

    insert(DEFAULT_MODEL, "jimeng", &["image", "edit"], jimeng_sizes());
    insert("jimeng-2.1", "jimeng", &["image", "edit"], jimeng_sizes());
    insert("dall-e-2", "openai", &["image", "edit"], dalle2_sizes());
    insert("dall-e-3", "openai", &["image"], dalle3_sizes());

    map
}
