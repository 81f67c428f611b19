use serde::Deserialize;

/// Options for GPX to GeoJSON conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Include elevation as the 3rd coordinate value (default: true)
    #[serde(default = "default_true")]
    pub include_elevation: bool,

    /// Include timestamps in coordinateProperties.times (default: true)
    #[serde(default = "default_true")]
    pub include_time: bool,

    /// Include metadata (name, desc, etc.) in properties (default: true)
    #[serde(default = "default_true")]
    pub include_metadata: bool,

    /// Which GPX element types to convert (default: all)
    #[serde(default)]
    pub types: Option<Vec<GpxElementType>>,

    /// Track simplification settings
    #[serde(flatten)]
    pub simplification: ImportOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            include_elevation: true,
            include_time: true,
            include_metadata: true,
            types: None,
            simplification: ImportOptions::default(),
        }
    }
}

impl ConvertOptions {
    pub fn should_include(&self, element_type: GpxElementType) -> bool {
        match &self.types {
            None => true,
            Some(types) => types.contains(&element_type),
        }
    }
}

/// How an uploaded track is reduced before it is stored or rendered.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    /// Run Douglas-Peucker on tracks (default: true)
    #[serde(default = "default_true")]
    pub simplify: bool,

    /// Fixed tolerance in squared coordinate-degrees. `None` picks one
    /// from the track's own spacing (default: None)
    #[serde(default)]
    pub tolerance: Option<f64>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            simplify: true,
            tolerance: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpxElementType {
    Waypoint,
    Track,
}

fn default_true() -> bool {
    true
}
