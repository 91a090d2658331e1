//! Plain-text rendering of every view.
//!
//! Each function returns the full text block for one panel; callers decide
//! where it goes. Bars are scaled to `BAR_WIDTH` cells.

use std::fmt::Write;

use crate::api::types::{Cell, DatasetList, ModelList, ModelPerformance, Prediction, SampleData};
use crate::dataset::DatasetSummary;
use crate::prediction::display_percentages;
use crate::rank::ImportanceRanking;
use crate::report::{format_model_name, ComparisonChart};
use crate::shape::CanonicalCorrelationView;
use crate::state::SlotSnapshot;

pub const BAR_WIDTH: usize = 30;

fn bar(magnitude: f64, scale: f64) -> String {
    let cells = if scale > 0.0 {
        ((magnitude.abs() / scale) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    "█".repeat(cells.min(BAR_WIDTH))
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(|l| l.chars().count()).max().unwrap_or(0)
}

/// "1. tau1  2. tau3  3. tau2"
pub fn badges<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .enumerate()
        .map(|(i, name)| format!("{}. {}", i + 1, name))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn correlations(view: &CanonicalCorrelationView, top: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Feature Correlations");
    let _ = writeln!(
        out,
        "Strongest with {}: {}",
        view.target(),
        badges(view.ranked_features().iter().take(top).map(String::as_str))
    );
    let _ = writeln!(out);

    let width = label_width(view.ranked_features().iter().map(String::as_str));
    for feature in view.ranked_features() {
        let value = view.coefficient(feature);
        let sign = if value >= 0.0 { '+' } else { '-' };
        let _ = writeln!(
            out,
            "{:<width$}  {:>7.3}  {}{}",
            feature,
            value,
            sign,
            bar(value, 1.0),
            width = width
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Correlation Matrix");
    out.push_str(&heatmap(view));
    out
}

/// Pairwise table over `[target, features...]`, two decimals per cell.
pub fn heatmap(view: &CanonicalCorrelationView) -> String {
    let axis = view.heatmap_axis();
    let row_width = label_width(axis.iter().copied());
    let col_width = label_width(axis.iter().copied()).max(5);

    let mut out = String::new();
    let _ = write!(out, "{:<w$}", "", w = row_width);
    for col in &axis {
        let _ = write!(out, "  {:>w$}", col, w = col_width);
    }
    let _ = writeln!(out);
    for row in &axis {
        let _ = write!(out, "{:<w$}", row, w = row_width);
        for col in &axis {
            let _ = write!(out, "  {:>w$.2}", view.cell(row, col), w = col_width);
        }
        let _ = writeln!(out);
    }
    out
}

pub fn importance(ranking: &ImportanceRanking, top: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Feature Importance");
    let _ = writeln!(
        out,
        "Top features: {}",
        badges(ranking.top(top).iter().map(|(name, _)| name.as_str()))
    );
    let _ = writeln!(out);
    let scale = ranking.ranked.first().map(|(_, v)| v.abs()).unwrap_or(0.0);
    let width = label_width(ranking.ranked.iter().map(|(n, _)| n.as_str()));
    for (name, value) in &ranking.ranked {
        let _ = writeln!(
            out,
            "{:<width$}  {:>7.4}  {}",
            name,
            value,
            bar(*value, scale),
            width = width
        );
    }
    out
}

pub fn performance(perf: &ModelPerformance) -> String {
    let mut out = String::new();
    let title = if perf.model_type.is_empty() {
        "Model Performance".to_string()
    } else {
        format!("{} Performance", format_model_name(&perf.model_type))
    };
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "Accuracy: {:.2}%", perf.accuracy * 100.0);
    if let Some(samples) = perf.classification_report.test_samples() {
        let _ = writeln!(out, "Based on {} test samples", samples);
    }
    let _ = writeln!(out);

    let report = &perf.classification_report;
    let summary_rows = [
        ("Macro Avg", report.macro_avg.as_ref()),
        ("Weighted Avg", report.weighted_avg.as_ref()),
    ];
    let width = label_width(
        report
            .classes
            .keys()
            .map(String::as_str)
            .chain(summary_rows.iter().filter(|(_, m)| m.is_some()).map(|(l, _)| *l)),
    )
    .max(5);
    let _ = writeln!(
        out,
        "{:<w$}  {:>9}  {:>9}  {:>9}  {:>9}",
        "class",
        "precision",
        "recall",
        "f1-score",
        "support",
        w = width
    );
    let rows = report
        .classes
        .iter()
        .map(|(label, m)| (label.as_str(), m))
        .chain(summary_rows.iter().filter_map(|(l, m)| m.map(|m| (*l, m))));
    for (label, m) in rows {
        let _ = writeln!(
            out,
            "{:<w$}  {:>9.3}  {:>9.3}  {:>9.3}  {:>9}",
            label,
            m.precision,
            m.recall,
            m.f1_score,
            m.support,
            w = width
        );
    }
    out
}

/// F1 table per class, then accuracy by rank with the active model marked.
pub fn comparison(chart: &ComparisonChart, current_model: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Model Comparison");
    let width = label_width(chart.models.iter().map(String::as_str)).max(5);
    let _ = write!(out, "{:<w$}  {:>9}", "model", "accuracy", w = width);
    for (label, _) in &chart.f1_by_class {
        let _ = write!(out, "  {:>12}", format!("f1 {}", label));
    }
    let _ = writeln!(out);
    for (i, model) in chart.models.iter().enumerate() {
        let _ = write!(out, "{:<w$}  {:>8.2}%", model, chart.accuracy[i], w = width);
        for (_, scores) in &chart.f1_by_class {
            let _ = write!(out, "  {:>11.2}%", scores.get(i).copied().unwrap_or(0.0));
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Accuracy Comparison");
    for (rank, row) in chart.accuracy_ranking().iter().enumerate() {
        let marker = if current_model == Some(row.key) {
            "  current model"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{}. {:<w$}  {:>6.2}%{}",
            rank + 1,
            row.name,
            row.accuracy,
            marker,
            w = width
        );
    }
    out
}

pub fn dataset_summary(summary: &DatasetSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dataset: {}", summary.name.as_deref().unwrap_or("(none selected)"));
    let _ = writeln!(out, "Rows: {}  Columns: {}", summary.rows, summary.columns);
    let _ = writeln!(
        out,
        "Features ({}): {}",
        summary.feature_columns.len(),
        summary.feature_columns.join(", ")
    );
    if !summary.classes.is_empty() {
        let _ = writeln!(out, "Class distribution ({} classes):", summary.classes.len());
        let width = label_width(summary.classes.iter().map(|c| c.label.as_str()));
        for class in &summary.classes {
            let _ = writeln!(
                out,
                "  {:<width$}  {:>8}  {:>6.2}%  {}",
                class.label,
                class.count,
                class.percent,
                bar(class.percent, 100.0),
                width = width
            );
        }
    }
    out
}

pub fn sample(data: &SampleData) -> String {
    let Some(first) = data.sample.first() else {
        return "No sample data available.\n".to_string();
    };
    let columns: Vec<&String> = first.keys().collect();
    let cell = |c: Option<&Cell>| match c {
        Some(Cell::Number(n)) => format!("{:.3}", n),
        Some(Cell::Text(s)) => s.clone(),
        Some(Cell::Flag(b)) => b.to_string(),
        Some(Cell::Empty) | None => String::new(),
    };
    let rows: Vec<Vec<String>> = data
        .sample
        .iter()
        .map(|row| columns.iter().map(|c| cell(row.get(*c))).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:>w$}", c, w = *w))
        .collect();
    let _ = writeln!(out, "{}", header.join("  "));
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:>w$}", v, w = *w))
            .collect();
        let _ = writeln!(out, "{}", line.join("  "));
    }
    out
}

pub fn models(list: &ModelList) -> String {
    let mut out = String::new();
    for model in &list.models {
        let marker = if list.current_model.as_deref() == Some(model.as_str()) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(out, "{} {} ({})", marker, format_model_name(model), model);
    }
    if list.models.is_empty() {
        let _ = writeln!(out, "No models available.");
    }
    out
}

pub fn datasets(list: &DatasetList) -> String {
    let mut out = String::new();
    for dataset in &list.datasets {
        let marker = if list.current_dataset.as_deref() == Some(dataset.as_str()) {
            '*'
        } else {
            ' '
        };
        let _ = writeln!(out, "{} {}", marker, dataset);
    }
    if list.datasets.is_empty() {
        let _ = writeln!(out, "No datasets available. Upload one with `gridlens dataset upload`.");
    }
    out
}

pub fn prediction(pred: &Prediction) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Prediction: {}", pred.prediction.to_uppercase());
    let shares = display_percentages(&pred.probabilities);
    let width = label_width(shares.iter().map(|(c, _)| c.as_str()));
    for (class, pct) in &shares {
        let _ = writeln!(
            out,
            "{:<width$}  {:>3}%  {}",
            class,
            pct,
            bar(*pct as f64, 100.0),
            width = width
        );
    }
    out
}

/// Renders a slot: its value when present, its error inline, or a loading line.
pub fn panel<T>(title: &str, slot: &SlotSnapshot<T>, body: impl Fn(&T) -> String) -> String {
    let mut out = String::new();
    if let Some(err) = &slot.error {
        let _ = writeln!(out, "{}: error: {}", title, err);
    }
    match &slot.value {
        Some(value) => out.push_str(&body(value)),
        None if slot.error.is_none() => {
            let _ = writeln!(out, "{}: loading...", title);
        }
        None => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{DatasetInfo, ModelComparison};
    use crate::shape::{ShapeNormalizer, TargetFeature};
    use indexmap::IndexMap;
    use serde_json::json;

    #[test]
    fn test_prediction_has_one_bar_per_class() {
        let pred: Prediction = serde_json::from_value(json!({
            "prediction": "stable",
            "probabilities": {"stable": 0.8, "unstable": 0.2}
        }))
        .unwrap();
        let text = prediction(&pred);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Prediction: STABLE");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("stable"));
        assert!(lines[1].contains(" 80%"));
        assert!(lines[2].starts_with("unstable"));
        assert!(lines[2].contains(" 20%"));
        assert_eq!(lines[1].matches('█').count(), 24);
        assert_eq!(lines[2].matches('█').count(), 6);
    }

    #[test]
    fn test_correlations_list_ranked_with_badges() {
        let view = ShapeNormalizer::default()
            .normalize(&json!({
                "correlation_matrix": {"stab": {"stab": 1.0, "x": 0.9, "y": -0.95}},
                "stab_correlations": {"x": 0.9, "y": -0.95, "z": 0.0}
            }))
            .unwrap();
        let text = correlations(&view, 3);
        assert!(text.contains("1. y  2. x  3. z"));
        let y = text.find("\ny ").unwrap();
        let x = text.find("\nx ").unwrap();
        assert!(y < x);
        assert!(text.contains("-0.950"));
    }

    #[test]
    fn test_heatmap_defaults_missing_cells() {
        let view = ShapeNormalizer::default()
            .normalize(&json!({"stab_correlations": {"a": 0.5}, "correlation_matrix": {}}))
            .unwrap();
        let text = heatmap(&view);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].trim_end().ends_with("0.00"));
    }

    #[test]
    fn test_sample_formats_numbers() {
        let data: SampleData = serde_json::from_value(json!({
            "sample": [{"tau1": 2.959060, "stabf": "unstable"}]
        }))
        .unwrap();
        let text = sample(&data);
        assert!(text.contains("2.959"));
        assert!(text.contains("unstable"));
        assert_eq!(sample(&SampleData::default()), "No sample data available.\n");
    }

    #[test]
    fn test_panel_shows_error_inline() {
        let slot: SlotSnapshot<u32> = SlotSnapshot {
            value: None,
            error: Some("Failed to fetch models".to_string()),
            pending: false,
        };
        assert_eq!(
            panel("Models", &slot, |v| v.to_string()),
            "Models: error: Failed to fetch models\n"
        );
    }

    #[test]
    fn test_importance_badges_and_bars() {
        let scores: IndexMap<String, f64> = [("g1", 0.05), ("tau1", 0.21), ("tau2", 0.19)]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        let text = importance(&ImportanceRanking::from_scores(&scores), 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Feature Importance");
        assert_eq!(lines[1], "Top features: 1. tau1  2. tau2");
        assert!(lines[3].starts_with("tau1"));
        assert_eq!(lines[3].matches('█').count(), BAR_WIDTH);
        assert!(lines[4].starts_with("tau2"));
        assert!(lines[5].starts_with("g1"));
        assert!(lines[5].contains("0.0500"));
    }

    fn performance_fixture(with_weighted: bool) -> ModelPerformance {
        let mut report = json!({
            "stable": {"precision": 0.9, "recall": 0.88, "f1-score": 0.89, "support": 724},
            "unstable": {"precision": 0.93, "recall": 0.95, "f1-score": 0.94, "support": 1276},
            "accuracy": 0.92,
            "macro avg": {"precision": 0.915, "recall": 0.915, "f1-score": 0.915, "support": 2000}
        });
        if with_weighted {
            report["weighted avg"] =
                json!({"precision": 0.92, "recall": 0.92, "f1-score": 0.92, "support": 2000});
        }
        serde_json::from_value(json!({
            "accuracy": 0.92,
            "model_type": "random_forest",
            "classification_report": report
        }))
        .unwrap()
    }

    #[test]
    fn test_performance_lists_classes_then_averages() {
        let text = performance(&performance_fixture(true));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Random Forest Performance");
        assert_eq!(lines[1], "Accuracy: 92.00%");
        assert_eq!(lines[2], "Based on 2000 test samples");
        assert!(lines[4].starts_with("class"));
        assert!(lines[5].starts_with("stable "));
        assert!(lines[6].starts_with("unstable "));
        assert!(lines[7].starts_with("Macro Avg "));
        assert!(lines[8].starts_with("Weighted Avg "));
        assert!(lines[8].contains("0.920"));
        assert!(lines[8].trim_end().ends_with("2000"));
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn test_performance_skips_missing_average_rows() {
        let text = performance(&performance_fixture(false));
        assert!(text.contains("Macro Avg"));
        assert!(!text.contains("Weighted Avg"));
    }

    #[test]
    fn test_comparison_ranks_accuracy_and_marks_current_model() {
        let cmp: ModelComparison = serde_json::from_value(json!({
            "model_comparison": {
                "logistic_regression": {
                    "accuracy": 0.81,
                    "classification_report": {
                        "stable": {"f1-score": 0.75},
                        "unstable": {"f1-score": 0.85}
                    }
                },
                "random_forest": {
                    "accuracy": 0.92,
                    "classification_report": {
                        "stable": {"f1-score": 0.89},
                        "unstable": {"f1-score": 0.94}
                    }
                }
            }
        }))
        .unwrap();
        let text = comparison(&ComparisonChart::from_comparison(&cmp), Some("random_forest"));
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].contains("f1 stable") && lines[1].contains("f1 unstable"));
        assert!(lines[2].starts_with("Logistic Regression"));
        assert!(lines[2].contains("81.00%"));
        assert!(lines[2].contains("75.00%"));
        assert!(lines[3].trim_end().ends_with("94.00%"));

        let ranked = text.split("Accuracy Comparison\n").nth(1).unwrap();
        let ranked: Vec<&str> = ranked.lines().collect();
        assert!(ranked[0].starts_with("1. Random Forest"));
        assert!(ranked[0].ends_with("92.00%  current model"));
        assert!(ranked[1].starts_with("2. Logistic Regression"));
        assert!(ranked[1].ends_with("81.00%"));

        let unmarked = comparison(&ComparisonChart::from_comparison(&cmp), None);
        assert!(!unmarked.contains("current model"));
    }

    #[test]
    fn test_dataset_summary_drops_target_columns() {
        let info: DatasetInfo = serde_json::from_value(json!({
            "num_rows": 10000,
            "num_columns": 5,
            "columns": ["tau1", "p1", "g1", "stab", "stabf"],
            "class_distribution": {"unstable": 6380, "stable": 3620},
            "current_dataset": "grid.csv"
        }))
        .unwrap();
        let text = dataset_summary(&DatasetSummary::from_info(&info, &TargetFeature::default()));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Dataset: grid.csv");
        assert_eq!(lines[1], "Rows: 10000  Columns: 5");
        assert_eq!(lines[2], "Features (3): tau1, p1, g1");
        assert_eq!(lines[3], "Class distribution (2 classes):");
        assert!(lines[4].contains("unstable") && lines[4].contains("63.80%"));
        assert!(lines[5].contains("stable") && lines[5].contains("36.20%"));

        let empty = dataset_summary(&DatasetSummary::from_info(
            &DatasetInfo::default(),
            &TargetFeature::default(),
        ));
        assert!(empty.starts_with("Dataset: (none selected)\n"));
        assert!(!empty.contains("Class distribution"));
    }

    #[test]
    fn test_models_mark_the_active_one() {
        let list = ModelList {
            models: vec!["random_forest".to_string(), "svm".to_string()],
            current_model: Some("svm".to_string()),
        };
        assert_eq!(models(&list), "  Random Forest (random_forest)\n* Svm (svm)\n");
        assert_eq!(models(&ModelList::default()), "No models available.\n");
    }

    #[test]
    fn test_datasets_mark_the_active_one() {
        let list = DatasetList {
            datasets: vec!["default.csv".to_string(), "grid.csv".to_string()],
            current_dataset: Some("default.csv".to_string()),
        };
        assert_eq!(datasets(&list), "* default.csv\n  grid.csv\n");
        assert!(datasets(&DatasetList::default()).starts_with("No datasets available."));
    }
}
