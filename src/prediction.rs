//! Prediction form: the twelve grid parameters sent to `/api/predict`.

use indexmap::IndexMap;
use serde::Serialize;

use crate::api::error::ClientError;
use crate::logging::{log_validation, Domain};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSection {
    pub title: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

const fn tau(name: &'static str, label: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        label,
        min: 0.1,
        max: 20.0,
        step: 0.1,
        default: 8.0,
    }
}

const fn gain(name: &'static str, label: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        label,
        min: 0.0,
        max: 1.0,
        step: 0.01,
        default: 0.5,
    }
}

const fn load(name: &'static str, label: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        label,
        min: 0.0,
        max: 1.0,
        step: 0.01,
        default: 0.1,
    }
}

const TIME_CONSTANTS: [ParamSpec; 4] = [
    tau("tau1", "τ₁"),
    tau("tau2", "τ₂"),
    tau("tau3", "τ₃"),
    tau("tau4", "τ₄"),
];
const GAIN_VALUES: [ParamSpec; 4] = [
    gain("p1", "p₁"),
    gain("p2", "p₂"),
    gain("p3", "p₃"),
    gain("p4", "p₄"),
];
const LOAD_PARAMETERS: [ParamSpec; 4] = [
    load("g1", "g₁"),
    load("g2", "g₂"),
    load("g3", "g₃"),
    load("g4", "g₄"),
];

pub const SECTIONS: [ParamSection; 3] = [
    ParamSection {
        title: "Time Constants",
        description: "Time constants of first order system",
        params: &TIME_CONSTANTS,
    },
    ParamSection {
        title: "Gain Values",
        description: "Gain parameters of the system",
        params: &GAIN_VALUES,
    },
    ParamSection {
        title: "Load Parameters",
        description: "Grid loading parameters",
        params: &LOAD_PARAMETERS,
    },
];

pub fn spec_for(name: &str) -> Option<&'static ParamSpec> {
    SECTIONS
        .iter()
        .flat_map(|s| s.params.iter())
        .find(|p| p.name == name)
}

/// Parameter values, serialized as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredictionInput {
    values: IndexMap<String, f64>,
}

impl Default for PredictionInput {
    fn default() -> Self {
        let values = SECTIONS
            .iter()
            .flat_map(|s| s.params.iter())
            .map(|p| (p.name.to_string(), p.default))
            .collect();
        Self { values }
    }
}

fn invalid(message: String) -> ClientError {
    log_validation(Domain::Predict, "parameter", &message);
    ClientError::Validation(message)
}

impl PredictionInput {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn values(&self) -> &IndexMap<String, f64> {
        &self.values
    }

    pub fn set(&mut self, name: &str, value: f64) -> Result<(), ClientError> {
        let spec =
            spec_for(name).ok_or_else(|| invalid(format!("Unknown parameter {:?}", name)))?;
        if !value.is_finite() || value < spec.min || value > spec.max {
            return Err(invalid(format!(
                "{} must be between {} and {}",
                spec.name, spec.min, spec.max
            )));
        }
        self.values.insert(spec.name.to_string(), value);
        Ok(())
    }

    /// Applies a `name=value` assignment.
    pub fn apply(&mut self, assignment: &str) -> Result<(), ClientError> {
        let (name, raw) = assignment
            .split_once('=')
            .ok_or_else(|| invalid(format!("Expected name=value, got {:?}", assignment)))?;
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| invalid(format!("{} is not a number: {:?}", name.trim(), raw.trim())))?;
        self.set(name.trim(), value)
    }
}

/// Whole-number percentages for each class, summing to 100.
///
/// Probabilities are scaled by their total and rounded with the largest
/// remainder method; leftover points go to the largest fractional parts, ties
/// to the earlier class.
pub fn display_percentages(probabilities: &IndexMap<String, f64>) -> Vec<(String, u32)> {
    let clean: Vec<f64> = probabilities
        .values()
        .map(|p| if p.is_finite() && *p > 0.0 { *p } else { 0.0 })
        .collect();
    let total: f64 = clean.iter().sum();
    if total <= 0.0 {
        return probabilities.keys().map(|k| (k.clone(), 0)).collect();
    }

    let scaled: Vec<f64> = clean.iter().map(|p| p / total * 100.0).collect();
    let mut shares: Vec<u32> = scaled.iter().map(|s| s.floor() as u32).collect();
    let assigned: u32 = shares.iter().sum();
    let mut order: Vec<usize> = (0..scaled.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = scaled[a] - scaled[a].floor();
        let fb = scaled[b] - scaled[b].floor();
        fb.total_cmp(&fa)
    });
    for &i in order.iter().take(100u32.saturating_sub(assigned) as usize) {
        shares[i] += 1;
    }

    probabilities.keys().cloned().zip(shares).collect()
}
