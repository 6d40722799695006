//! Optional `DriverConfig`, a TOML bundle of the paths and alphas the CLI
//! needs to assemble a sensor instance. Library callers that construct the
//! facade directly never need this — it exists for the ambient CLI stack
//! (SPEC_FULL.md §1), mirroring the teacher's `doser_config::Config`.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub device: DevicePaths,
    pub smoothing: Smoothing,
    pub logging: Logging,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            device: DevicePaths::default(),
            smoothing: Smoothing::default(),
            logging: Logging::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DevicePaths {
    pub path: String,
    pub layout: Option<String>,
    pub profile: Option<String>,
}

impl Default for DevicePaths {
    fn default() -> Self {
        Self {
            path: "/dev/ttyUSB0".to_string(),
            layout: None,
            profile: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Smoothing {
    /// Cell exponential-average alpha, `(0, 1]`.
    pub alpha: f64,
    /// Pressure-aggregate exponential-average alpha, `(0, 1]`.
    pub pressure_alpha: f64,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            pressure_alpha: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub sample_log: Option<String>,
    pub debug_log: Option<String>,
}

pub fn load_toml(s: &str) -> Result<DriverConfig, toml::de::Error> {
    toml::from_str::<DriverConfig>(s)
}

impl DriverConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.smoothing.alpha > 0.0 && self.smoothing.alpha <= 1.0) {
            return Err("smoothing.alpha must be in (0.0, 1.0]".to_string());
        }
        if !(self.smoothing.pressure_alpha > 0.0 && self.smoothing.pressure_alpha <= 1.0) {
            return Err("smoothing.pressure_alpha must be in (0.0, 1.0]".to_string());
        }
        if self.device.path.is_empty() {
            return Err("device.path must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = DriverConfig::default();
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_alpha() {
        let toml = r#"
            [device]
            path = "/dev/ttyUSB0"
            [smoothing]
            alpha = 1.5
        "#;
        let cfg = load_toml(toml).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_full_bundle() {
        let toml = r#"
            [device]
            path = "/dev/ttyACM0"
            layout = "layout.txt"
            profile = "profile.csv"
            [smoothing]
            alpha = 0.2
            pressure_alpha = 0.1
            [logging]
            sample_log = "samples.csv"
            debug_log = "debug.csv"
        "#;
        let cfg = load_toml(toml).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.device.path, "/dev/ttyACM0");
        assert_eq!(cfg.smoothing.alpha, 0.2);
    }
}
