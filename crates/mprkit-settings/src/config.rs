//! Post-processor options
//!
//! Options come from three layers applied in order: built-in defaults, an
//! optional TOML or JSON configuration file, and the argument string the host
//! passes to the post processor (e.g. `--no-comments --precision=2`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, SettingsError, SettingsResult};

/// Tool number assumed before the first tool change
pub const DEFAULT_TOOL: u32 = 101;

/// Largest accepted decimal precision
pub const MAX_PRECISION: u32 = 10;

/// Per-axis sign multipliers applied when coordinates are formatted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisSigns {
    /// X multiplier (+1 or -1)
    pub x: f64,
    /// Y multiplier (+1 or -1)
    pub y: f64,
    /// Z multiplier (+1 or -1)
    pub z: f64,
}

impl Default for AxisSigns {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

/// Options recognized for one post-processing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostOptions {
    /// Emit annotation lines (`KM=`, `<101 \Comment\`, G-code comments)
    pub output_comments: bool,
    /// Decimal places for every formatted number
    pub precision: u32,
    /// Configured workpiece length (mm)
    pub workpiece_length: Option<f64>,
    /// Configured workpiece width (mm)
    pub workpiece_width: Option<f64>,
    /// Configured workpiece thickness (mm)
    pub workpiece_thickness: Option<f64>,
    /// Prefer the part name over the model name for the base name
    pub use_part_name: bool,
    /// Work coordinate system requested by flag (`G54`..`G59`)
    pub coordinate_system: Option<String>,
    /// Verbose logging
    pub verbose: bool,
    /// Tool number used before the first tool change
    pub default_tool: u32,
    /// Axis sign convention
    pub axis_signs: AxisSigns,
}

impl Default for PostOptions {
    fn default() -> Self {
        Self {
            output_comments: true,
            precision: 3,
            workpiece_length: None,
            workpiece_width: None,
            workpiece_thickness: None,
            use_part_name: false,
            coordinate_system: None,
            verbose: false,
            default_tool: DEFAULT_TOOL,
            axis_signs: AxisSigns::default(),
        }
    }
}

fn parse_positive(key: &str, value: &str) -> SettingsResult<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(SettingsError::invalid(
            key,
            format!("expected a positive number in mm, got '{}'", value),
        )),
    }
}

fn parse_sign(key: &str, value: &str) -> SettingsResult<f64> {
    match value.trim() {
        "1" | "+1" | "+" => Ok(1.0),
        "-1" | "-" => Ok(-1.0),
        other => Err(SettingsError::invalid(
            key,
            format!("expected +1 or -1, got '{}'", other),
        )),
    }
}

fn fixture_name(flag: &str) -> Option<String> {
    let upper = flag.to_ascii_uppercase();
    match upper.as_str() {
        "G54" | "G55" | "G56" | "G57" | "G58" | "G59" => Some(upper),
        _ => None,
    }
}

impl PostOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by a host argument string
    pub fn from_args(args: &str) -> SettingsResult<Self> {
        let mut options = Self::default();
        options.apply_args(args)?;
        Ok(options)
    }

    /// Apply a host argument string on top of the current values.
    ///
    /// Flags may be written `--flag`, `-flag` or `/flag`. Unknown flags are
    /// logged and ignored; malformed values are errors.
    pub fn apply_args(&mut self, args: &str) -> SettingsResult<()> {
        for arg in args.split_whitespace() {
            let normalized = arg.trim_start_matches('-').trim_start_matches('/');
            let (key, value) = match normalized.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (normalized, None),
            };

            match (key.to_ascii_lowercase().as_str(), value) {
                ("no-comments", None) => self.output_comments = false,
                ("use-part-name", None) => self.use_part_name = true,
                ("log", None) => self.verbose = true,
                ("precision", Some(v)) => {
                    self.precision = v.trim().parse::<u32>().map_err(|_| {
                        SettingsError::invalid(
                            "precision",
                            format!("expected a non-negative integer, got '{}'", v),
                        )
                    })?;
                }
                ("workpiece-length", Some(v)) => {
                    self.workpiece_length = Some(parse_positive("workpiece-length", v)?)
                }
                ("workpiece-width", Some(v)) => {
                    self.workpiece_width = Some(parse_positive("workpiece-width", v)?)
                }
                ("workpiece-thickness", Some(v)) => {
                    self.workpiece_thickness = Some(parse_positive("workpiece-thickness", v)?)
                }
                ("default-tool", Some(v)) => {
                    self.default_tool = v.trim().parse::<u32>().map_err(|_| {
                        SettingsError::invalid(
                            "default-tool",
                            format!("expected a tool number, got '{}'", v),
                        )
                    })?;
                }
                ("sign-x", Some(v)) => self.axis_signs.x = parse_sign("sign-x", v)?,
                ("sign-y", Some(v)) => self.axis_signs.y = parse_sign("sign-y", v)?,
                ("sign-z", Some(v)) => self.axis_signs.z = parse_sign("sign-z", v)?,
                (flag, None) if fixture_name(flag).is_some() => {
                    self.coordinate_system = fixture_name(flag);
                    tracing::debug!("Coordinate system set to {} via {}", flag, arg);
                }
                _ => tracing::warn!("Ignoring unknown post processor argument: {}", arg),
            }
        }

        self.validate()
    }

    /// Load options from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let options: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        options.validate()?;
        tracing::debug!("Loaded options from {}", path.display());
        Ok(options)
    }

    /// Save options to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate option values
    pub fn validate(&self) -> SettingsResult<()> {
        if self.precision > MAX_PRECISION {
            return Err(ConfigError::ValueOutOfRange {
                key: "precision".to_string(),
                value: self.precision.to_string(),
            }
            .into());
        }

        let dims = [
            ("workpiece_length", self.workpiece_length),
            ("workpiece_width", self.workpiece_width),
            ("workpiece_thickness", self.workpiece_thickness),
        ];
        for (key, value) in dims {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(ConfigError::ValueOutOfRange {
                        key: key.to_string(),
                        value: v.to_string(),
                    }
                    .into());
                }
            }
        }

        let signs = [
            ("axis_signs.x", self.axis_signs.x),
            ("axis_signs.y", self.axis_signs.y),
            ("axis_signs.z", self.axis_signs.z),
        ];
        for (key, value) in signs {
            if value != 1.0 && value != -1.0 {
                return Err(ConfigError::ValueOutOfRange {
                    key: key.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }

        if let Some(cs) = &self.coordinate_system {
            if fixture_name(cs).is_none() {
                return Err(SettingsError::invalid(
                    "coordinate_system",
                    format!("'{}' is not one of G54..G59", cs),
                ));
            }
        }

        Ok(())
    }
}

/// Default location of the options file (`<config dir>/mprkit/config.toml`)
pub fn default_config_path() -> SettingsResult<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| {
        ConfigError::UnsupportedPlatform("no configuration directory".to_string())
    })?;
    Ok(base.join("mprkit").join("config.toml"))
}
