use crate::error::{FrostError, Result};
use crate::features::FeatureRecord;

/// Index of the frost class in a two-class probability row. Fixed by how the
/// model was trained.
pub const FROST_CLASS: usize = 1;

/// A pre-fit binary classifier. Shared read-only across requests.
pub trait Classifier: Send + Sync {
    /// One probability row per input row, columns in the artifact's class order.
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;
}

/// Frost probability for each record, in input order, from a single
/// batched call.
pub fn predict_frost_probability(
    model: &dyn Classifier,
    records: &[FeatureRecord],
) -> Result<Vec<f64>> {
    let rows: Vec<Vec<f64>> = records.iter().map(|r| r.to_vector().to_vec()).collect();
    let probs = model.predict_proba(&rows)?;

    if probs.len() != records.len() {
        return Err(FrostError::Prediction(format!(
            "classifier returned {} rows for {} inputs",
            probs.len(),
            records.len()
        )));
    }

    probs
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let p = *row.get(FROST_CLASS).ok_or_else(|| {
                FrostError::Prediction(format!(
                    "row {}: expected at least 2 class probabilities, got {}",
                    i,
                    row.len()
                ))
            })?;
            if !(0.0..=1.0).contains(&p) {
                return Err(FrostError::Prediction(format!(
                    "row {}: probability {} outside [0, 1]",
                    i, p
                )));
            }
            Ok(p)
        })
        .collect()
}

pub fn predict_one(model: &dyn Classifier, record: &FeatureRecord) -> Result<f64> {
    let probs = predict_frost_probability(model, std::slice::from_ref(record))?;
    Ok(probs[0])
}
