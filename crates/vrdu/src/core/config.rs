//! Configuration loading and management.
//!
//! [`VrduConfig`] can be loaded from TOML, YAML or JSON files, discovered by
//! walking up from the current directory, or built programmatically. Every
//! field has a default, so an empty file is a valid configuration.

use crate::types::{AggregationPolicy, FieldKind};
use crate::{Result, VrduError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Name of the file searched for by [`VrduConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "vrdu.toml";

/// Main engine configuration.
///
/// # Example
///
/// ```rust
/// use vrdu::core::config::VrduConfig;
///
/// let config = VrduConfig::default();
/// assert_eq!(config.locator.max_radius, 250.0);
///
/// // let config = VrduConfig::from_toml_file("vrdu.toml")?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VrduConfig {
    /// Filtering applied to words before any layout work
    #[serde(default)]
    pub ocr: OcrFilterConfig,

    /// Row banding and precedence graph construction
    #[serde(default)]
    pub graph: GraphConfig,

    /// Radial anchor search
    #[serde(default)]
    pub locator: LocatorConfig,

    /// Table grid reconstruction
    #[serde(default)]
    pub grid: GridConfig,

    /// Per-kind value validation
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Background job orchestration
    #[serde(default)]
    pub jobs: JobConfig,
}

/// Word filtering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrFilterConfig {
    /// Words below this recognition confidence (0.0-1.0) are dropped
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

/// Spatial graph configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Row tolerance as a fraction of the page's median word height
    #[serde(default = "default_row_tolerance_ratio")]
    pub row_tolerance_ratio: f64,

    /// Half-width of a word's column band, as a multiple of the median height
    #[serde(default = "default_column_band_ratio")]
    pub column_band_ratio: f64,
}

/// Direction from an anchor towards a candidate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Right,
    Below,
    Left,
    Above,
}

/// Distance between two bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Chebyshev,
}

/// Anchor locator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Maximum gap between anchor and value boxes, in page units
    #[serde(default = "default_max_radius")]
    pub max_radius: f64,

    /// Directions searched, most preferred first
    #[serde(default = "default_preferred_directions")]
    pub preferred_directions: Vec<Direction>,

    /// Score penalty per rank in `preferred_directions` (0.0-1.0)
    #[serde(default = "default_direction_weight")]
    pub direction_weight: f64,

    #[serde(default)]
    pub distance_metric: DistanceMetric,

    /// Upper bound on label edit distance; short labels get less
    #[serde(default = "default_max_edit_distance")]
    pub max_edit_distance: usize,

    /// Same-row words closer than this multiple of the median height are joined into the value
    #[serde(default = "default_join_gap_ratio")]
    pub join_gap_ratio: f64,
}

/// Table grid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Adjacent words closer than this multiple of the median height share a cell
    #[serde(default = "default_cell_gap_ratio")]
    pub cell_gap_ratio: f64,

    /// A column must be populated in at least this fraction of rows
    #[serde(default = "default_min_column_fill")]
    pub min_column_fill: f64,

    /// Rows covering fewer than this fraction of the columns are unassigned
    #[serde(default = "default_min_row_overlap")]
    pub min_row_overlap: f64,

    /// Cells a header row needs before a field is treated as tabular
    #[serde(default = "default_min_header_cells")]
    pub min_header_cells: usize,

    /// Attach a page-level grid to each page summary
    #[serde(default = "default_true")]
    pub page_tables: bool,
}

/// Validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Explicit kinds keyed by field name (case-insensitive)
    #[serde(default)]
    pub field_kinds: HashMap<String, FieldKind>,

    /// Confidence multiplier for values that matched only after repair
    #[serde(default = "default_repair_penalty")]
    pub repair_penalty: f64,

    /// Confidence multiplier for values that never matched
    #[serde(default = "default_mismatch_penalty")]
    pub mismatch_penalty: f64,
}

/// Job orchestration configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    /// Multi-page aggregation policy
    #[serde(default)]
    pub aggregation: AggregationPolicy,

    /// Maximum wall time for one job (None = unbounded)
    #[serde(default)]
    pub max_job_duration_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}
fn default_min_confidence() -> f64 {
    0.40
}
fn default_row_tolerance_ratio() -> f64 {
    0.5
}
fn default_column_band_ratio() -> f64 {
    1.0
}
fn default_max_radius() -> f64 {
    250.0
}
fn default_preferred_directions() -> Vec<Direction> {
    vec![Direction::Right, Direction::Below]
}
fn default_direction_weight() -> f64 {
    0.3
}
fn default_max_edit_distance() -> usize {
    2
}
fn default_join_gap_ratio() -> f64 {
    0.6
}
fn default_cell_gap_ratio() -> f64 {
    1.0
}
fn default_min_column_fill() -> f64 {
    0.5
}
fn default_min_row_overlap() -> f64 {
    0.5
}
fn default_min_header_cells() -> usize {
    3
}
fn default_repair_penalty() -> f64 {
    0.85
}
fn default_mismatch_penalty() -> f64 {
    0.5
}

impl Default for OcrFilterConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            row_tolerance_ratio: default_row_tolerance_ratio(),
            column_band_ratio: default_column_band_ratio(),
        }
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            max_radius: default_max_radius(),
            preferred_directions: default_preferred_directions(),
            direction_weight: default_direction_weight(),
            distance_metric: DistanceMetric::default(),
            max_edit_distance: default_max_edit_distance(),
            join_gap_ratio: default_join_gap_ratio(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_gap_ratio: default_cell_gap_ratio(),
            min_column_fill: default_min_column_fill(),
            min_row_overlap: default_min_row_overlap(),
            min_header_cells: default_min_header_cells(),
            page_tables: true,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            field_kinds: HashMap::new(),
            repair_penalty: default_repair_penalty(),
            mismatch_penalty: default_mismatch_penalty(),
        }
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(VrduError::validation(format!("{} must be within 0.0..=1.0, got {}", name, value)));
    }
    Ok(())
}

impl VrduConfig {
    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `VrduError::Validation` naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        check_unit("ocr.min_confidence", self.ocr.min_confidence)?;
        check_unit("locator.direction_weight", self.locator.direction_weight)?;
        check_unit("grid.min_column_fill", self.grid.min_column_fill)?;
        check_unit("grid.min_row_overlap", self.grid.min_row_overlap)?;
        check_unit("validation.repair_penalty", self.validation.repair_penalty)?;
        check_unit("validation.mismatch_penalty", self.validation.mismatch_penalty)?;

        if self.graph.row_tolerance_ratio <= 0.0 {
            return Err(VrduError::validation("graph.row_tolerance_ratio must be positive"));
        }
        if self.locator.max_radius <= 0.0 {
            return Err(VrduError::validation("locator.max_radius must be positive"));
        }
        if self.locator.preferred_directions.is_empty() {
            return Err(VrduError::validation("locator.preferred_directions must not be empty"));
        }
        if self.jobs.max_job_duration_secs == Some(0) {
            return Err(VrduError::validation("jobs.max_job_duration_secs must be positive"));
        }
        Ok(())
    }

    /// Look up an explicit kind for `field` from `validation.field_kinds`.
    pub fn configured_kind(&self, field: &str) -> Option<FieldKind> {
        self.validation
            .field_kinds
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, kind)| *kind)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `VrduError::Validation` if the file can't be read, isn't valid
    /// TOML, or holds out-of-range values.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| VrduError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_yaml_ng::from_str(&content)
            .map_err(|e| VrduError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| VrduError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration choosing the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(VrduError::validation(format!(
                "Unsupported config file extension: {} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }

    /// Discover `vrdu.toml` in the current directory or any parent.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(VrduError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| VrduError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = VrduConfig::default();
        assert_eq!(config.ocr.min_confidence, 0.40);
        assert_eq!(config.graph.row_tolerance_ratio, 0.5);
        assert_eq!(
            config.locator.preferred_directions,
            vec![Direction::Right, Direction::Below]
        );
        assert_eq!(config.jobs.aggregation, AggregationPolicy::FirstFound);
        assert!(config.grid.page_tables);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vrdu.toml");

        fs::write(
            &config_path,
            r#"
[locator]
max_radius = 400.0
preferred_directions = ["below", "right"]
distance_metric = "chebyshev"

[validation.field_kinds]
"Issued On" = "date"

[jobs]
aggregation = "last_found"
max_job_duration_secs = 30
        "#,
        )
        .unwrap();

        let config = VrduConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.locator.max_radius, 400.0);
        assert_eq!(config.locator.preferred_directions[0], Direction::Below);
        assert_eq!(config.locator.distance_metric, DistanceMetric::Chebyshev);
        assert_eq!(config.locator.direction_weight, 0.3);
        assert_eq!(config.configured_kind("issued on"), Some(FieldKind::Date));
        assert_eq!(config.jobs.aggregation, AggregationPolicy::LastFound);
        assert_eq!(config.jobs.max_job_duration_secs, Some(30));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vrdu.yaml");

        fs::write(
            &config_path,
            "grid:\n  min_column_fill: 0.7\n  page_tables: false\nocr:\n  min_confidence: 0.6\n",
        )
        .unwrap();

        let config = VrduConfig::from_file(&config_path).unwrap();
        assert_eq!(config.grid.min_column_fill, 0.7);
        assert!(!config.grid.page_tables);
        assert_eq!(config.grid.min_header_cells, 3);
        assert_eq!(config.ocr.min_confidence, 0.6);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vrdu.json");

        fs::write(&config_path, r#"{"graph": {"row_tolerance_ratio": 0.8}}"#).unwrap();

        let config = VrduConfig::from_file(&config_path).unwrap();
        assert_eq!(config.graph.row_tolerance_ratio, 0.8);
        assert_eq!(config.graph.column_band_ratio, 1.0);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vrdu.toml");

        fs::write(&config_path, "[locator]\ndirection_weight = 1.5\n").unwrap();

        let err = VrduConfig::from_toml_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("locator.direction_weight"));
    }

    #[test]
    fn test_empty_directions_rejected() {
        let mut config = VrduConfig::default();
        config.locator.preferred_directions.clear();
        assert!(matches!(config.validate(), Err(VrduError::Validation { .. })));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = VrduConfig::from_file("settings.ini").unwrap_err();
        assert!(err.to_string().contains("Unsupported config file extension"));
    }

    #[test]
    #[serial_test::serial]
    fn test_discover_vrdu_toml() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("invoices").join("2024");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[locator]\nmax_radius = 120.0\n").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&nested).unwrap();

        let result = std::panic::catch_unwind(|| {
            let config = VrduConfig::discover().unwrap();
            assert!(config.is_some());
            assert_eq!(config.unwrap().locator.max_radius, 120.0);
        });

        std::env::set_current_dir(&original_dir).unwrap();

        if let Err(e) = result {
            std::panic::resume_unwind(e);
        }
    }
}
