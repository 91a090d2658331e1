use crate::api::types::ModelComparison;

/// `random_forest` -> `Random Forest`
pub fn format_model_name(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accuracy and per-class F1 across models, one series per metric.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonChart {
    /// Backend model identifiers, payload order.
    pub model_keys: Vec<String>,
    pub models: Vec<String>,
    /// Percent, one entry per model.
    pub accuracy: Vec<f64>,
    /// (class label, f1-score in percent per model)
    pub f1_by_class: Vec<(String, Vec<f64>)>,
}

/// One row of the accuracy table.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyRow<'a> {
    pub key: &'a str,
    pub name: &'a str,
    pub accuracy: f64,
}

impl ComparisonChart {
    /// Class labels come from the first model's report; a model missing a
    /// class scores 0 for it.
    pub fn from_comparison(cmp: &ModelComparison) -> Self {
        let model_keys: Vec<String> = cmp.model_comparison.keys().cloned().collect();
        let models = model_keys.iter().map(|m| format_model_name(m)).collect();
        let accuracy = cmp
            .model_comparison
            .values()
            .map(|m| m.accuracy * 100.0)
            .collect();
        let labels: Vec<String> = cmp
            .model_comparison
            .values()
            .next()
            .map(|first| first.classification_report.classes.keys().cloned().collect())
            .unwrap_or_default();
        let f1_by_class = labels
            .into_iter()
            .map(|label| {
                let scores = cmp
                    .model_comparison
                    .values()
                    .map(|m| {
                        m.classification_report
                            .classes
                            .get(&label)
                            .map(|c| c.f1_score * 100.0)
                            .unwrap_or(0.0)
                    })
                    .collect();
                (label, scores)
            })
            .collect();
        Self {
            model_keys,
            models,
            accuracy,
            f1_by_class,
        }
    }

    /// Models by descending accuracy; equal scores keep payload order.
    pub fn accuracy_ranking(&self) -> Vec<AccuracyRow<'_>> {
        let mut rows: Vec<AccuracyRow<'_>> = self
            .model_keys
            .iter()
            .zip(&self.models)
            .zip(&self.accuracy)
            .map(|((key, name), accuracy)| AccuracyRow {
                key,
                name,
                accuracy: *accuracy,
            })
            .collect();
        rows.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
        rows
    }
}
