//! Data analysis: validate, clean, compute statistics, derive insights and
//! render a report.

use crate::tools::data_analysis::{
    descriptive, linear_trend, max, mean, median, min, quantile, sample_std,
};
use crate::types::{AppError, Result};
use crate::workflows::base::{Workflow, WorkflowState};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

pub const WORKFLOW_ID: &str = "data_analysis";
pub const DESCRIPTION: &str = "A workflow for analyzing business data and generating insights.";

pub const REPORT_FORMATS: [&str; 3] = ["pdf", "html", "json"];

/// Coefficient of variation above which a series is called volatile
const HIGH_VARIABILITY: f64 = 0.5;
/// Coefficient of variation below which a series is called stable
const LOW_VARIABILITY: f64 = 0.1;

const STEPS: [(&str, &str); 5] = [
    ("data_validation", "Validate input data format and completeness"),
    ("data_preprocessing", "Clean and preprocess the data for analysis"),
    ("statistical_analysis", "Perform statistical analysis on the data"),
    ("insight_generation", "Generate business insights from the analysis"),
    ("report_generation", "Generate final analysis report"),
];

/// Keep finite numbers; numeric strings are parsed.
pub fn preprocess(data: &[Value]) -> Vec<f64> {
    data.iter()
        .filter_map(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|v| v.is_finite())
        .collect()
}

fn metric(values: &[f64], name: &str) -> Option<Value> {
    let value = match name {
        "mean" => json!(mean(values)),
        "median" => json!(median(values)),
        "std" => json!(sample_std(values)),
        "min" => json!(min(values)),
        "max" => json!(max(values)),
        "count" => json!(values.len()),
        "quartiles" => json!({
            "q1": quantile(values, 0.25),
            "q2": quantile(values, 0.5),
            "q3": quantile(values, 0.75),
        }),
        "trend" => match linear_trend(values) {
            Some(trend) => json!({
                "slope": trend.slope,
                "intercept": trend.intercept,
                "trend_direction": trend.direction(),
            }),
            None => Value::Null,
        },
        _ => return None,
    };
    Some(value)
}

/// Compute the requested metrics plus baseline statistics.
///
/// Unknown metric names are listed under `unsupported_metrics`.
pub fn analyze(values: &[f64], metrics: &[String]) -> Value {
    let mut computed = Map::new();
    let mut unsupported = Vec::new();
    for name in metrics {
        let key = name.trim().to_lowercase();
        match metric(values, &key) {
            Some(value) => {
                computed.insert(key, value);
            }
            None => unsupported.push(name.clone()),
        }
    }
    if !unsupported.is_empty() {
        warn!(?unsupported, "Unsupported metrics requested");
    }

    let mut statistics = descriptive(values);
    if let Some(stats) = statistics.as_object_mut() {
        stats.insert("count".to_string(), json!(values.len()));
    }

    json!({
        "metrics": computed,
        "statistics": statistics,
        "unsupported_metrics": unsupported,
    })
}

/// Plain-language observations about trend, dispersion and outliers.
pub fn generate_insights(values: &[f64]) -> Vec<String> {
    let mut insights = Vec::new();

    if values.len() >= 2 {
        if let Some(trend) = linear_trend(values) {
            let insight = if trend.slope > 0.0 {
                format!(
                    "Values are increasing by about {:.2} per period",
                    trend.slope
                )
            } else if trend.slope < 0.0 {
                format!(
                    "Values are decreasing by about {:.2} per period",
                    trend.slope.abs()
                )
            } else {
                "Values are flat across the period".to_string()
            };
            insights.push(insight);
        }
    }

    if let (Some(avg), Some(std)) = (mean(values), sample_std(values)) {
        if avg != 0.0 {
            let cv = std / avg.abs();
            let insight = if cv > HIGH_VARIABILITY {
                format!("High variability: standard deviation is {:.0}% of the mean", cv * 100.0)
            } else if cv < LOW_VARIABILITY {
                format!("Values are stable: standard deviation is {:.0}% of the mean", cv * 100.0)
            } else {
                format!("Moderate variability: standard deviation is {:.0}% of the mean", cv * 100.0)
            };
            insights.push(insight);
        }
    }

    if let (Some(q1), Some(q3)) = (quantile(values, 0.25), quantile(values, 0.75)) {
        let fence = 1.5 * (q3 - q1);
        let outliers = values
            .iter()
            .filter(|v| **v < q1 - fence || **v > q3 + fence)
            .count();
        if outliers > 0 {
            insights.push(format!(
                "{} value(s) fall outside 1.5x the interquartile range",
                outliers
            ));
        }
    }

    insights
}

fn render_html(analysis: &Value, insights: &[String]) -> String {
    let metric_rows = analysis["metrics"]
        .as_object()
        .map(|metrics| {
            metrics
                .iter()
                .map(|(name, value)| format!("<tr><td>{}</td><td>{}</td></tr>", name, value))
                .collect::<String>()
        })
        .unwrap_or_default();
    let insight_items = insights
        .iter()
        .map(|i| format!("<li>{}</li>", i))
        .collect::<String>();

    format!(
        "<html><body><h1>Data Analysis Report</h1><table>{}</table><h2>Insights</h2><ul>{}</ul></body></html>",
        metric_rows, insight_items
    )
}

/// Report in the requested format. `html` renders a document; `json` and
/// `pdf` carry structured content.
pub fn generate_report(analysis: &Value, insights: &[String], format: &str) -> Value {
    let content = match format {
        "html" => Value::String(render_html(analysis, insights)),
        _ => json!({
            "metrics": analysis["metrics"],
            "statistics": analysis["statistics"],
            "insights": insights,
        }),
    };
    json!({
        "format": format,
        "content": content,
        "generated_at": Utc::now().to_rfc3339(),
    })
}

/// Statistics over a numeric series
pub struct DataAnalysisWorkflow {
    state: WorkflowState,
}

impl DataAnalysisWorkflow {
    pub fn new(mut state: WorkflowState) -> Self {
        for (name, description) in STEPS {
            state.add_step(name, description);
        }
        Self { state }
    }

    fn run(&mut self, input: &Value) -> Result<Map<String, Value>> {
        self.state.begin_step(0);
        self.validate_input(input)?;
        self.state.complete_step(None);

        let raw = input["data"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        let metrics = crate::utils::json::string_list(input.get("metrics"));
        let format = input["report_format"].as_str().unwrap_or("json");

        self.state.begin_step(1);
        let values = preprocess(raw);
        if values.is_empty() {
            return Err(AppError::Workflow(
                "No numeric values left after preprocessing".to_string(),
            ));
        }
        debug!(kept = values.len(), dropped = raw.len() - values.len(), "Preprocessed data");
        self.state.complete_step(Some(json!({
            "preprocessed_records": values.len(),
            "dropped_records": raw.len() - values.len(),
        })));

        self.state.begin_step(2);
        let analysis = analyze(&values, &metrics);
        self.state
            .complete_step(Some(json!({ "analysis_results": analysis })));

        self.state.begin_step(3);
        let insights = generate_insights(&values);
        self.state.complete_step(Some(json!({ "insights": insights })));

        self.state.begin_step(4);
        let report = generate_report(&analysis, &insights, format);
        self.state.complete_step(Some(json!({ "report": report })));

        let mut results = Map::new();
        results.insert("analysis_results".to_string(), analysis);
        results.insert("insights".to_string(), json!(insights));
        results.insert("report".to_string(), report);
        results.insert("completed_at".to_string(), json!(Utc::now().to_rfc3339()));
        Ok(results)
    }
}

#[async_trait]
impl Workflow for DataAnalysisWorkflow {
    fn state(&self) -> &WorkflowState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut WorkflowState {
        &mut self.state
    }

    fn validate_input(&self, input: &Value) -> Result<()> {
        for field in ["data", "metrics", "report_format"] {
            if input.get(field).is_none() {
                return Err(AppError::InvalidInput(format!(
                    "Missing required field '{}'",
                    field
                )));
            }
        }
        if !input["data"].as_array().is_some_and(|d| !d.is_empty()) {
            return Err(AppError::InvalidInput("Data must be a non-empty list".into()));
        }
        if !input["metrics"].as_array().is_some_and(|m| !m.is_empty()) {
            return Err(AppError::InvalidInput(
                "Metrics must be a non-empty list".into(),
            ));
        }
        let format = input["report_format"].as_str().unwrap_or_default();
        if !REPORT_FORMATS.contains(&format) {
            return Err(AppError::InvalidInput(format!(
                "Invalid report format. Must be one of: {}",
                REPORT_FORMATS.join(", ")
            )));
        }
        Ok(())
    }

    async fn execute(&mut self, input: &Value) -> Result<Value> {
        self.state.pre_execute();
        match self.run(input) {
            Ok(results) => {
                self.state.results = results;
                self.state.post_execute();
                Ok(Value::Object(self.state.results.clone()))
            }
            Err(e) => {
                let step = self.state.current_step;
                self.state.handle_error(&e, Some(step));
                Err(e)
            }
        }
    }
}
