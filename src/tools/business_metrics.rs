use crate::tools::registry::{tool_error, tool_success, Tool};
use crate::types::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Read a numeric field. Missing or null fields take `default`.
fn number(data: &Map<String, Value>, key: &str, default: f64) -> std::result::Result<f64, String> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_f64()
            .ok_or_else(|| format!("Field '{}' must be a number", key)),
    }
}

/// Division that yields 0 for a zero denominator.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn financial(data: &Map<String, Value>) -> std::result::Result<Value, String> {
    let revenue = number(data, "revenue", 0.0)?;
    let expenses = number(data, "expenses", 0.0)?;
    let assets = number(data, "assets", 0.0)?;
    let liabilities = number(data, "liabilities", 0.0)?;

    Ok(json!({
        "gross_profit": revenue - expenses,
        "profit_margin": ratio(revenue - expenses, revenue),
        "roi": ratio(revenue - expenses, expenses),
        "current_ratio": ratio(assets, liabilities),
    }))
}

fn customer(data: &Map<String, Value>) -> std::result::Result<Value, String> {
    let total = number(data, "total_customers", 0.0)?;
    let new = number(data, "new_customers", 0.0)?;
    let churned = number(data, "churned_customers", 0.0)?;
    let revenue = number(data, "revenue", 0.0)?;

    Ok(json!({
        "customer_growth_rate": ratio(new, total),
        "churn_rate": ratio(churned, total),
        "customer_lifetime_value": ratio(revenue, total),
        "net_promoter_score": number(data, "nps_score", 0.0)?,
    }))
}

fn operational(data: &Map<String, Value>) -> std::result::Result<Value, String> {
    let total_orders = number(data, "total_orders", 0.0)?;
    let completed = number(data, "completed_orders", 0.0)?;
    let total_time = number(data, "total_time", 0.0)?;
    let resources_used = number(data, "resources_used", 0.0)?;
    let total_resources = number(data, "total_resources", 1.0)?;

    Ok(json!({
        "order_fulfillment_rate": ratio(completed, total_orders),
        "average_processing_time": ratio(total_time, completed),
        "resource_utilization": ratio(resources_used, total_resources),
        "quality_score": number(data, "quality_score", 0.0)?,
    }))
}

fn marketing(data: &Map<String, Value>) -> std::result::Result<Value, String> {
    let impressions = number(data, "impressions", 0.0)?;
    let clicks = number(data, "clicks", 0.0)?;
    let conversions = number(data, "conversions", 0.0)?;
    let revenue = number(data, "revenue", 0.0)?;

    Ok(json!({
        "click_through_rate": ratio(clicks, impressions),
        "conversion_rate": ratio(conversions, clicks),
        "cost_per_acquisition": ratio(number(data, "marketing_cost", 0.0)?, conversions),
        "return_on_ad_spend": ratio(revenue, number(data, "marketing_cost", 1.0)?),
    }))
}

pub struct BusinessMetricsTool;

impl BusinessMetricsTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BusinessMetricsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BusinessMetricsTool {
    fn name(&self) -> &str {
        "business_metrics"
    }

    fn description(&self) -> &str {
        "Calculate and analyze business performance metrics"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "metric_type": {
                    "type": "string",
                    "description": "Type of metric to calculate",
                    "enum": ["financial", "customer", "operational", "marketing"]
                },
                "data": {
                    "type": "object",
                    "description": "Data required for the metric calculation"
                }
            },
            "required": ["metric_type", "data"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let (Some(metric_type), Some(data)) = (
            args.get("metric_type").and_then(Value::as_str),
            args.get("data").and_then(Value::as_object),
        ) else {
            return Ok(tool_error("Invalid parameters"));
        };

        let results = match metric_type {
            "financial" => financial(data),
            "customer" => customer(data),
            "operational" => operational(data),
            "marketing" => marketing(data),
            other => Err(format!("Unknown metric type: {}", other)),
        };

        Ok(match results {
            Ok(results) => tool_success(results),
            Err(e) => tool_error(e),
        })
    }
}
