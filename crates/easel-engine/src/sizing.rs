use easel_contracts::models::{SizePreset, SizePresets};

pub const LANDSCAPE_RATIO: f64 = 1.3;
pub const PORTRAIT_RATIO: f64 = 0.77;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

/// Three-way split shared by every backend: `> 1.3` landscape, `< 0.77`
/// portrait, anything else (including NaN) square.
pub fn classify_ratio(ratio: f64) -> Orientation {
    if ratio > LANDSCAPE_RATIO {
        Orientation::Landscape
    } else if ratio < PORTRAIT_RATIO {
        Orientation::Portrait
    } else {
        Orientation::Square
    }
}

pub fn preset_for(presets: &SizePresets, orientation: Orientation) -> SizePreset {
    match orientation {
        Orientation::Landscape => presets.landscape,
        Orientation::Portrait => presets.portrait,
        Orientation::Square => presets.square,
    }
}

/// Closest preset to an explicit size; exact matches win.
pub fn preset_for_dimensions(presets: &SizePresets, width: u32, height: u32) -> SizePreset {
    if let Some(exact) = presets
        .exact
        .iter()
        .find(|preset| preset.width == width && preset.height == height)
    {
        return *exact;
    }
    if width == 0 || height == 0 {
        return presets.square;
    }
    preset_for(
        presets,
        classify_ratio(f64::from(width) / f64::from(height)),
    )
}

/// Preset for an `"W:H"` (or `"W/H"`) ratio string. Unparseable ratios get
/// the square preset.
pub fn preset_for_aspect_ratio(presets: &SizePresets, aspect_ratio: &str) -> SizePreset {
    match parse_ratio(aspect_ratio) {
        Some((width, height)) => preset_for(presets, classify_ratio(width / height)),
        None => presets.square,
    }
}

/// Explicit dimensions take priority over the ratio; default ratio is 1:1.
pub fn negotiate_size(
    presets: &SizePresets,
    width: Option<u32>,
    height: Option<u32>,
    aspect_ratio: Option<&str>,
) -> SizePreset {
    if let (Some(width), Some(height)) = (width, height) {
        return preset_for_dimensions(presets, width, height);
    }
    preset_for_aspect_ratio(presets, aspect_ratio.unwrap_or("1:1"))
}

fn parse_ratio(raw: &str) -> Option<(f64, f64)> {
    let raw = raw.trim();
    let (left, right) = raw.split_once(':').or_else(|| raw.split_once('/'))?;
    let width = left.trim().parse::<f64>().ok()?;
    let height = right.trim().parse::<f64>().ok()?;
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use easel_contracts::models::ModelRegistry;

    use super::*;

    fn presets(model: &str) -> SizePresets {
        ModelRegistry::new(None)
            .get(model)
            .map(|spec| spec.sizes.clone())
            .expect("registered model")
    }

    #[test]
    fn aspect_ratios_classify_three_ways() {
        let table = presets("jimeng-3.0");
        assert_eq!(preset_for_aspect_ratio(&table, "16:9"), table.landscape);
        assert_eq!(preset_for_aspect_ratio(&table, "9:16"), table.portrait);
        assert_eq!(preset_for_aspect_ratio(&table, "1:1"), table.square);
        assert_eq!(preset_for_aspect_ratio(&table, "4/3"), table.landscape);
    }

    #[test]
    fn boundaries_are_exclusive() {
        assert_eq!(classify_ratio(1.3), Orientation::Square);
        assert_eq!(classify_ratio(1.3001), Orientation::Landscape);
        assert_eq!(classify_ratio(0.77), Orientation::Square);
        assert_eq!(classify_ratio(0.7699), Orientation::Portrait);
        assert_eq!(classify_ratio(f64::NAN), Orientation::Square);
    }

    #[test]
    fn exact_presets_win_over_classification() {
        let table = presets("dall-e-2");
        let exact = preset_for_dimensions(&table, 512, 512);
        assert_eq!(exact, SizePreset::new(512, 512));
        // 1:1 but not a preset, so it falls into the square bucket
        assert_eq!(preset_for_dimensions(&table, 700, 700), table.square);
        assert_eq!(preset_for_dimensions(&table, 1920, 1080), table.landscape);
        assert_eq!(preset_for_dimensions(&table, 1080, 1920), table.portrait);
    }

    #[test]
    fn tables_differ_but_algorithm_is_shared() {
        let jimeng = presets("jimeng-3.0");
        let dalle3 = presets("dall-e-3");
        assert_eq!(
            preset_for_aspect_ratio(&jimeng, "16:9").label(),
            "1280x720"
        );
        assert_eq!(
            preset_for_aspect_ratio(&dalle3, "16:9").label(),
            "1792x1024"
        );
    }

    #[test]
    fn garbage_ratio_falls_back_to_square() {
        let table = presets("jimeng-3.0");
        assert_eq!(preset_for_aspect_ratio(&table, "wide"), table.square);
        assert_eq!(preset_for_aspect_ratio(&table, "0:9"), table.square);
        assert_eq!(preset_for_dimensions(&table, 0, 10), table.square);
    }

    #[test]
    fn explicit_size_beats_ratio() {
        let table = presets("jimeng-3.0");
        let size = negotiate_size(&table, Some(720), Some(1280), Some("16:9"));
        assert_eq!(size, SizePreset::new(720, 1280));
        let half_specified = negotiate_size(&table, Some(720), None, None);
        assert_eq!(half_specified, table.square);
    }
}
