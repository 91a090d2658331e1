//! Backend response models.
//!
//! Every field defaults when absent so that callers work on fully populated
//! values and never re-check for missing data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetInfo {
    pub num_rows: u64,
    pub num_columns: u64,
    pub columns: Vec<String>,
    pub class_distribution: IndexMap<String, f64>,
    pub current_dataset: Option<String>,
}

/// One cell of a sample row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Flag(bool),
    Empty,
}

pub type SampleRow = IndexMap<String, Cell>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SampleData {
    pub sample: Vec<SampleRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatasetList {
    pub datasets: Vec<String>,
    pub current_dataset: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelList {
    pub models: Vec<String>,
    pub current_model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: f64,
}

pub const REPORT_ACCURACY: &str = "accuracy";
pub const REPORT_MACRO_AVG: &str = "macro avg";
pub const REPORT_WEIGHTED_AVG: &str = "weighted avg";

/// Per-class metrics plus the summary rows of a classification report.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "IndexMap<String, Value>")]
pub struct ClassificationReport {
    pub classes: IndexMap<String, ClassMetrics>,
    pub accuracy: Option<f64>,
    pub macro_avg: Option<ClassMetrics>,
    pub weighted_avg: Option<ClassMetrics>,
}

fn metrics(value: &Value) -> Option<ClassMetrics> {
    value
        .is_object()
        .then(|| serde_json::from_value(value.clone()).ok())
        .flatten()
}

impl From<IndexMap<String, Value>> for ClassificationReport {
    fn from(raw: IndexMap<String, Value>) -> Self {
        let mut report = ClassificationReport::default();
        for (key, value) in &raw {
            match key.as_str() {
                REPORT_ACCURACY => report.accuracy = value.as_f64(),
                REPORT_MACRO_AVG => report.macro_avg = metrics(value),
                REPORT_WEIGHTED_AVG => report.weighted_avg = metrics(value),
                _ => {
                    if let Some(m) = metrics(value) {
                        report.classes.insert(key.clone(), m);
                    }
                }
            }
        }
        report
    }
}

impl ClassificationReport {
    pub fn class_labels(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    /// Number of evaluated samples, taken from the macro average row.
    pub fn test_samples(&self) -> Option<f64> {
        self.macro_avg.as_ref().map(|m| m.support)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelPerformance {
    pub accuracy: f64,
    pub classification_report: ClassificationReport,
    pub model_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelScore {
    pub accuracy: f64,
    pub classification_report: ClassificationReport,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelComparison {
    pub model_comparison: IndexMap<String, ModelScore>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeatureImportance {
    pub feature_importance: IndexMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Prediction {
    pub prediction: String,
    pub probabilities: IndexMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadReceipt {
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SwitchDataset<'a> {
    pub dataset: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SwitchModel<'a> {
    pub model: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}
