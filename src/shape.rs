//! Normalization of correlation payloads.
//!
//! The backend has served correlation data in more than one layout. The
//! canonical layout carries `correlation_matrix` and `stab_correlations`;
//! older responses put the matrix and the target vector under arbitrary keys.
//! Layouts are tried in a fixed order and the winning one is recorded on the
//! resulting view so that a misclassified payload can be traced.
//!
//! Heuristic scanning walks the top-level keys in payload order and the first
//! match wins. Two payloads with the same entries in a different order can
//! therefore resolve to different candidates; every extra match is recorded as
//! ambiguous and logged.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::logging::{log_ambiguous_keys, log_layout, log_shape_error};
use crate::rank::rank_features;

pub const MATRIX_FIELD: &str = "correlation_matrix";
pub const VECTOR_FIELD: &str = "stab_correlations";

pub type CorrelationMatrix = IndexMap<String, IndexMap<String, f64>>;
pub type StabilityVector = IndexMap<String, f64>;
pub type FeatureList = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("unrecognized correlation payload: expected a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("unrecognized correlation payload: no feature list could be derived")]
    NoFeatures,
}

/// The distinguished label column and its categorical counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFeature {
    pub name: String,
    pub categorical: String,
}

impl Default for TargetFeature {
    fn default() -> Self {
        Self {
            name: "stab".to_string(),
            categorical: "stabf".to_string(),
        }
    }
}

impl TargetFeature {
    pub fn new(name: impl Into<String>, categorical: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            categorical: categorical.into(),
        }
    }

    /// True for columns that never appear in a feature list.
    pub fn excludes(&self, column: &str) -> bool {
        column == self.name || column == self.categorical
    }
}

/// Which parse path produced a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadLayout {
    /// `correlation_matrix` + `stab_correlations`; no scanning performed.
    Canonical,
    /// Keys located by structural scanning.
    Heuristic {
        matrix_key: Option<String>,
        vector_key: Option<String>,
        /// Keys that also matched a role but lost to an earlier key.
        ambiguous: Vec<String>,
    },
}

impl PayloadLayout {
    pub fn name(&self) -> &'static str {
        match self {
            PayloadLayout::Canonical => "canonical",
            PayloadLayout::Heuristic { .. } => "heuristic",
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, PayloadLayout::Heuristic { ambiguous, .. } if !ambiguous.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorSource {
    Payload,
    /// Read from the target's row of the matrix.
    MatrixRow,
}

/// Normalized correlation data, ready for ranking and rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalCorrelationView {
    matrix: CorrelationMatrix,
    vector: StabilityVector,
    features: FeatureList,
    ranked_features: FeatureList,
    target: String,
    layout: PayloadLayout,
    vector_source: VectorSource,
}

impl CanonicalCorrelationView {
    pub fn matrix(&self) -> &CorrelationMatrix {
        &self.matrix
    }

    pub fn vector(&self) -> &StabilityVector {
        &self.vector
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn ranked_features(&self) -> &[String] {
        &self.ranked_features
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn layout(&self) -> &PayloadLayout {
        &self.layout
    }

    pub fn vector_source(&self) -> VectorSource {
        self.vector_source
    }

    pub fn coefficient(&self, feature: &str) -> f64 {
        self.vector.get(feature).copied().unwrap_or(0.0)
    }

    /// Missing rows or columns read as 0.
    pub fn cell(&self, row: &str, col: &str) -> f64 {
        self.matrix
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(0.0)
    }

    /// Heatmap axis: the target first, then the features in payload order.
    pub fn heatmap_axis(&self) -> Vec<&str> {
        std::iter::once(self.target.as_str())
            .chain(self.features.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShapeNormalizer {
    target: TargetFeature,
}

impl ShapeNormalizer {
    pub fn new(target: TargetFeature) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &TargetFeature {
        &self.target
    }

    pub fn normalize(&self, payload: &Value) -> Result<CanonicalCorrelationView, ShapeError> {
        let Some(root) = payload.as_object() else {
            let kind = json_kind(payload);
            log_shape_error(&format!("payload is {}", kind), 0);
            return Err(ShapeError::NotAnObject(kind));
        };

        let (layout, matrix, vector) = match canonical_fields(root) {
            Some((matrix, vector)) => (PayloadLayout::Canonical, matrix, vector),
            None => scan_fields(root),
        };

        let from_payload: FeatureList = vector
            .keys()
            .filter(|k| !self.target.excludes(k))
            .cloned()
            .collect();

        let (vector, features, vector_source) = if !from_payload.is_empty() {
            (vector, from_payload, VectorSource::Payload)
        } else if let Some(row) = matrix.get(&self.target.name) {
            let features: FeatureList = row
                .keys()
                .filter(|k| !self.target.excludes(k))
                .cloned()
                .collect();
            let derived = features
                .iter()
                .map(|f| (f.clone(), row.get(f).copied().unwrap_or(0.0)))
                .collect();
            (derived, features, VectorSource::MatrixRow)
        } else {
            (vector, Vec::new(), VectorSource::Payload)
        };

        if features.is_empty() {
            log_shape_error("no feature list could be derived", root.len());
            return Err(ShapeError::NoFeatures);
        }

        match &layout {
            PayloadLayout::Canonical => {
                log_layout(layout.name(), Some(MATRIX_FIELD), Some(VECTOR_FIELD), features.len())
            }
            PayloadLayout::Heuristic {
                matrix_key,
                vector_key,
                ..
            } => log_layout(
                layout.name(),
                matrix_key.as_deref(),
                vector_key.as_deref(),
                features.len(),
            ),
        }

        let ranked_features = rank_features(&vector, &features);
        Ok(CanonicalCorrelationView {
            matrix,
            vector,
            features,
            ranked_features,
            target: self.target.name.clone(),
            layout,
            vector_source,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn canonical_fields(root: &Map<String, Value>) -> Option<(CorrelationMatrix, StabilityVector)> {
    let matrix = root.get(MATRIX_FIELD)?.as_object()?;
    let vector = root.get(VECTOR_FIELD)?.as_object()?;
    Some((to_matrix(matrix), to_vector(vector)))
}

fn first_value(value: &Value) -> Option<&Value> {
    value.as_object().and_then(|m| m.values().next())
}

fn is_matrix_candidate(value: &Value) -> bool {
    first_value(value)
        .and_then(Value::as_object)
        .map(|row| !row.is_empty())
        .unwrap_or(false)
}

fn is_vector_candidate(value: &Value) -> bool {
    first_value(value).map(Value::is_number).unwrap_or(false)
}

fn scan_fields(root: &Map<String, Value>) -> (PayloadLayout, CorrelationMatrix, StabilityVector) {
    let matrix_keys: Vec<&String> = root
        .iter()
        .filter(|(_, v)| is_matrix_candidate(v))
        .map(|(k, _)| k)
        .collect();
    let vector_keys: Vec<&String> = root
        .iter()
        .filter(|(_, v)| is_vector_candidate(v))
        .map(|(k, _)| k)
        .collect();

    let mut ambiguous = Vec::new();
    for (role, keys) in [("matrix", &matrix_keys), ("vector", &vector_keys)] {
        if keys.len() > 1 {
            let losers: Vec<String> = keys[1..].iter().map(|k| k.to_string()).collect();
            log_ambiguous_keys(role, keys[0], &losers);
            ambiguous.extend(losers);
        }
    }

    let matrix = matrix_keys
        .first()
        .and_then(|k| root.get(*k))
        .and_then(Value::as_object)
        .map(to_matrix)
        .unwrap_or_default();
    let vector = vector_keys
        .first()
        .and_then(|k| root.get(*k))
        .and_then(Value::as_object)
        .map(to_vector)
        .unwrap_or_default();

    let layout = PayloadLayout::Heuristic {
        matrix_key: matrix_keys.first().map(|k| k.to_string()),
        vector_key: vector_keys.first().map(|k| k.to_string()),
        ambiguous,
    };
    (layout, matrix, vector)
}

fn to_matrix(raw: &Map<String, Value>) -> CorrelationMatrix {
    raw.iter()
        .filter_map(|(row, cols)| cols.as_object().map(|cols| (row.clone(), to_vector(cols))))
        .collect()
}

fn to_vector(raw: &Map<String, Value>) -> StabilityVector {
    raw.iter()
        .map(|(k, v)| (k.clone(), v.as_f64().unwrap_or(0.0)))
        .collect()
}
