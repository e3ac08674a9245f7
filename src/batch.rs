use crate::classifier::{predict_frost_probability, Classifier};
use crate::decision::{label_for, FrostLabel};
use crate::error::{FrostError, Result};
use crate::features::{FeatureRecord, FEATURE_COLUMNS, N_FEATURES};
use crate::table::{self, Table, TableFormat};
use serde::Serialize;

pub const PROBABILITY_COLUMN: &str = "有霜概率";
pub const LABEL_COLUMN: &str = "预测结果";
pub const EXPORT_FILE_NAME: &str = "预测结果.csv";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowPrediction {
    pub frost_probability: f64,
    pub label: FrostLabel,
}

/// Input table with the two prediction columns appended; one prediction
/// per input row, same order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub table: Table,
    pub predictions: Vec<RowPrediction>,
}

impl BatchResult {
    pub fn frost_count(&self) -> usize {
        self.predictions
            .iter()
            .filter(|p| p.label == FrostLabel::Frost)
            .count()
    }

    pub fn summary(&self) -> String {
        format!("成功预测 {} 条数据！", self.predictions.len())
    }

    pub fn export_csv(&self) -> Result<Vec<u8>> {
        table::to_csv_bytes(&self.table)
    }
}

/// Column positions of the features, in feature order. Fails naming every
/// missing column.
pub fn required_columns(table: &Table) -> Result<[usize; N_FEATURES]> {
    let mut idx = [0usize; N_FEATURES];
    let mut missing = Vec::new();
    for (slot, name) in idx.iter_mut().zip(FEATURE_COLUMNS) {
        match table.column_index(name) {
            Some(i) => *slot = i,
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(FrostError::ColumnMissing { missing });
    }
    Ok(idx)
}

pub fn extract_records(table: &Table, columns: &[usize; N_FEATURES]) -> Result<Vec<FeatureRecord>> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            let mut v = [0.0; N_FEATURES];
            for (k, &c) in columns.iter().enumerate() {
                let cell = row.get(c).map(|s| s.trim()).unwrap_or("");
                v[k] = cell.parse::<f64>().map_err(|_| {
                    FrostError::Prediction(format!(
                        "row {} column {}: '{}' is not a number",
                        r + 1,
                        FEATURE_COLUMNS[k],
                        cell
                    ))
                })?;
            }
            Ok(FeatureRecord::from_ordered(v))
        })
        .collect()
}

/// Validates, predicts in one batched call, then appends the probability
/// and label columns. Nothing is produced unless every step succeeds.
pub fn process_table(model: &dyn Classifier, mut table: Table) -> Result<BatchResult> {
    let columns = required_columns(&table)?;
    let records = extract_records(&table, &columns)?;
    let probs = if records.is_empty() {
        Vec::new()
    } else {
        predict_frost_probability(model, &records)?
    };

    let predictions: Vec<RowPrediction> = probs
        .iter()
        .map(|&p| RowPrediction {
            frost_probability: p,
            label: label_for(p),
        })
        .collect();

    table.push_column(PROBABILITY_COLUMN, probs.iter().map(|p| p.to_string()).collect());
    table.push_column(
        LABEL_COLUMN,
        predictions.iter().map(|p| p.label.text().to_string()).collect(),
    );

    Ok(BatchResult { table, predictions })
}

pub fn process_batch(model: &dyn Classifier, file_name: &str, bytes: &[u8]) -> Result<BatchResult> {
    let format = TableFormat::from_file_name(file_name)?;
    let table = table::parse(bytes, format)?;
    tracing::info!("parsed upload file={} rows={} cols={}", file_name, table.rows.len(), table.headers.len());
    process_table(model, table)
}
