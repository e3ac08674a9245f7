//! Single-record flow: one form submission in, one verdict out.
//!
//! Each submission runs builder, classifier and decision to completion before
//! anything is returned, so a caller sees either a full verdict or an error.
//! Nothing is remembered between submissions.

use crate::classifier::{predict_one, Classifier};
use crate::decision::{decide, Advisory, FrostLabel};
use crate::error::Result;
use crate::features::FeatureRecord;
use serde::{Deserialize, Serialize};

/// Form fields. Missing keys fall back to the page's initial values.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SingleInput {
    pub dewpoint_c: f64,
    pub temperature_c: f64,
    pub temp_dewpoint_diff_c: f64,
    pub relative_humidity_pct: f64,
    pub cloud_cover: f64,
}

impl Default for SingleInput {
    fn default() -> Self {
        Self {
            dewpoint_c: -5.0,
            temperature_c: 2.0,
            temp_dewpoint_diff_c: 7.0,
            relative_humidity_pct: 60.0,
            cloud_cover: 2.0,
        }
    }
}

impl SingleInput {
    pub fn record(&self) -> FeatureRecord {
        FeatureRecord::build(
            self.dewpoint_c,
            self.temperature_c,
            self.temp_dewpoint_diff_c,
            self.relative_humidity_pct,
            self.cloud_cover,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub frost_probability: f64,
    pub probability_text: String,
    pub label: FrostLabel,
    pub label_text: &'static str,
    pub display_color: &'static str,
    pub display_icon: &'static str,
    pub advisory: Advisory,
    pub advisory_message: &'static str,
}

pub fn submit(model: &dyn Classifier, input: &SingleInput) -> Result<Verdict> {
    let record = input.record();
    let p = predict_one(model, &record)?;
    let d = decide(p);
    Ok(Verdict {
        frost_probability: p,
        probability_text: format!("{:.2}%", p * 100.0),
        label: d.label,
        label_text: d.label.text(),
        display_color: d.display_color,
        display_icon: d.display_icon,
        advisory: d.advisory,
        advisory_message: d.advisory.message(),
    })
}
