//! Statistical analysis over numeric series.
//!
//! The free functions are shared with the data-analysis workflow.

use crate::tools::registry::{tool_error, tool_success, Tool};
use crate::types::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Pairs at or above this absolute correlation are reported as strong.
pub const STRONG_CORRELATION: f64 = 0.7;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1). Undefined below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Least-squares line over x = 0..n.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

impl Trend {
    pub fn direction(&self) -> &'static str {
        if self.slope > 0.0 {
            "increasing"
        } else {
            "decreasing"
        }
    }
}

pub fn linear_trend(values: &[f64]) -> Option<Trend> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values)?;

    let (mut numerator, mut denominator) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    let slope = if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    };
    Some(Trend {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

/// Pearson correlation. `None` when either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let (mx, my) = (mean(xs)?, mean(ys)?);
    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

/// mean, median, std, min, max and quartiles of a series
pub fn descriptive(values: &[f64]) -> Value {
    json!({
        "mean": mean(values),
        "median": median(values),
        "std": sample_std(values),
        "min": min(values),
        "max": max(values),
        "quartiles": {
            "q1": quantile(values, 0.25),
            "q2": quantile(values, 0.5),
            "q3": quantile(values, 0.75),
        }
    })
}

fn numeric_series(data: &[Value]) -> std::result::Result<Vec<f64>, String> {
    data.iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64()
                .ok_or_else(|| format!("Element {} is not a number", i))
        })
        .collect()
}

fn numeric_rows(data: &[Value]) -> std::result::Result<Vec<Vec<f64>>, String> {
    let rows = data
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.as_array()
                .ok_or_else(|| format!("Row {} is not an array", i))
                .and_then(|cells| numeric_series(cells).map_err(|e| format!("Row {}: {}", i, e)))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let width = rows.first().map(Vec::len).unwrap_or(0);
    if width == 0 || rows.iter().any(|r| r.len() != width) {
        return Err("Rows must be non-empty and of equal length".to_string());
    }
    Ok(rows)
}

fn correlation(rows: &[Vec<f64>]) -> Value {
    let width = rows[0].len();
    let columns: Vec<Vec<f64>> = (0..width)
        .map(|c| rows.iter().map(|row| row[c]).collect())
        .collect();

    let mut matrix = Map::new();
    let mut strong = Vec::new();
    for (i, xs) in columns.iter().enumerate() {
        let mut column = Map::new();
        for (j, ys) in columns.iter().enumerate() {
            let r = if i == j && sample_std(xs).is_some_and(|s| s > 0.0) {
                Some(1.0)
            } else {
                pearson(xs, ys)
            };
            column.insert(j.to_string(), json!(r));
            if let Some(r) = r {
                if j > i && r.abs() >= STRONG_CORRELATION {
                    strong.push(json!({
                        "variable1": i,
                        "variable2": j,
                        "correlation": r,
                    }));
                }
            }
        }
        matrix.insert(i.to_string(), Value::Object(column));
    }

    json!({
        "correlation_matrix": matrix,
        "strong_correlations": strong,
    })
}

pub struct DataAnalysisTool;

impl DataAnalysisTool {
    pub fn new() -> Self {
        Self
    }

    fn analyze(&self, data: &[Value], analysis_type: &str) -> std::result::Result<Value, String> {
        if data.is_empty() {
            return Err("Data must not be empty".to_string());
        }
        match analysis_type {
            "descriptive" => Ok(descriptive(&numeric_series(data)?)),
            "trend" => {
                let values = numeric_series(data)?;
                let trend = linear_trend(&values).ok_or("Data must not be empty")?;
                Ok(json!({
                    "slope": trend.slope,
                    "intercept": trend.intercept,
                    "trend_direction": trend.direction(),
                }))
            }
            "correlation" => Ok(correlation(&numeric_rows(data)?)),
            other => Err(format!("Unknown analysis type: {}", other)),
        }
    }
}

impl Default for DataAnalysisTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for DataAnalysisTool {
    fn name(&self) -> &str {
        "data_analysis"
    }

    fn description(&self) -> &str {
        "Perform statistical analysis on data"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "data": {
                    "type": "array",
                    "description": "Numbers to analyze; for correlation, rows of numbers with one column per variable"
                },
                "analysis_type": {
                    "type": "string",
                    "description": "Type of analysis to perform",
                    "enum": ["descriptive", "correlation", "trend"]
                }
            },
            "required": ["data", "analysis_type"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let Some(data) = args.get("data").and_then(Value::as_array) else {
            return Ok(tool_error("Invalid parameters"));
        };
        let Some(analysis_type) = args.get("analysis_type").and_then(Value::as_str) else {
            return Ok(tool_error("Invalid parameters"));
        };

        debug!(analysis_type, points = data.len(), "Running data analysis");
        Ok(match self.analyze(data, analysis_type) {
            Ok(results) => tool_success(results),
            Err(e) => tool_error(e),
        })
    }
}
