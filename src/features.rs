use serde::{Deserialize, Serialize};

pub const N_FEATURES: usize = 5;

/// Batch column names, in the order the forest was trained on.
pub const FEATURE_COLUMNS: [&str; N_FEATURES] = ["露点温度", "气温", "温度露点差", "相对湿度", "云量"];

pub const CLOUD_COVER_RANGE: (f64, f64) = (0.0, 8.0);

/// One set of readings. Values are passed through as given; range limits
/// belong to whatever collects them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub dewpoint_c: f64,
    pub temperature_c: f64,
    pub temp_dewpoint_diff_c: f64,
    pub relative_humidity_pct: f64,
    pub cloud_cover: f64,
}

impl FeatureRecord {
    pub fn build(
        dewpoint_c: f64,
        temperature_c: f64,
        temp_dewpoint_diff_c: f64,
        relative_humidity_pct: f64,
        cloud_cover: f64,
    ) -> Self {
        Self {
            dewpoint_c,
            temperature_c,
            temp_dewpoint_diff_c,
            relative_humidity_pct,
            cloud_cover,
        }
    }

    /// Inverse of `to_vector`; slot i must hold `FEATURE_COLUMNS[i]`.
    pub fn from_ordered(v: [f64; N_FEATURES]) -> Self {
        Self::build(v[0], v[1], v[2], v[3], v[4])
    }

    /// Model input. Both flows go through here, never through field order.
    pub fn to_vector(&self) -> [f64; N_FEATURES] {
        [
            self.dewpoint_c,
            self.temperature_c,
            self.temp_dewpoint_diff_c,
            self.relative_humidity_pct,
            self.cloud_cover,
        ]
    }
}
