use crate::batch::{BatchResult, RowPrediction};
use crate::decision::THRESHOLD;
use crate::features::{CLOUD_COVER_RANGE, FEATURE_COLUMNS};
use crate::single::SingleInput;
use serde::Serialize;

pub const PAGE_TITLE: &str = "西安机场霜预测系统";
pub const PAGE_SUBTITLE: &str = "基于随机森林算法 | 阈值标准：0.5";
pub const PAGE_CAPTION: &str = "技术支持：随机森林预测模型 v1.0";

// Everything the page needs to lay out both panels
#[derive(Debug, Serialize)]
pub struct FormInfo {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub caption: &'static str,
    pub threshold: f64,
    pub defaults: SingleInput,
    pub cloud_cover_range: [f64; 2],
    pub required_columns: [&'static str; 5],
}

impl Default for FormInfo {
    fn default() -> Self {
        Self {
            title: PAGE_TITLE,
            subtitle: PAGE_SUBTITLE,
            caption: PAGE_CAPTION,
            threshold: THRESHOLD,
            defaults: SingleInput::default(),
            cloud_cover_range: [CLOUD_COVER_RANGE.0, CLOUD_COVER_RANGE.1],
            required_columns: FEATURE_COLUMNS,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub model: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchOut {
    pub summary: String,
    pub row_count: usize,
    pub frost_count: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub predictions: Vec<RowPrediction>,
}

impl From<BatchResult> for BatchOut {
    fn from(res: BatchResult) -> Self {
        Self {
            summary: res.summary(),
            row_count: res.predictions.len(),
            frost_count: res.frost_count(),
            headers: res.table.headers,
            rows: res.table.rows,
            predictions: res.predictions,
        }
    }
}
