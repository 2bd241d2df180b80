//! Tools exposed via `callTool`
//!
//! Provides `run-analysis-report`, a sample report generator producing one
//! growth line per requested day.

use std::sync::Arc;

use rand::Rng;
use rust_mcp_sdk::{
    macros,
    schema::{ContentBlock, TextContent},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::AppError;
use crate::registry::{ToolDescriptor, ToolHandler};

pub const DEFAULT_REPORT_DAYS: u32 = 7;
pub const MAX_REPORT_DAYS: u32 = 365;

#[macros::mcp_tool(
    name = "run-analysis-report",
    description = "Generates a sample data analysis report with random growth metrics."
)]
#[derive(Debug, Default, Deserialize, Serialize, macros::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RunAnalysisReportTool {
    /// Number of days to analyze
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    #[serde(rename = "lastNDays")]
    pub last_n_days: u32,
    pub data: Vec<String>,
}

/// Resolves the requested window; an absent or zero day count falls back to the default.
pub fn report_days(params: &RunAnalysisReportTool) -> Result<u32, AppError> {
    let days = params
        .days
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_REPORT_DAYS);

    if days > MAX_REPORT_DAYS {
        return Err(AppError::invalid_params(format!(
            "days must be between 1 and {MAX_REPORT_DAYS}"
        )));
    }

    Ok(days)
}

pub fn build_report(days: u32, random: f64) -> AnalysisReport {
    let growth = random * f64::from(days);
    AnalysisReport {
        last_n_days: days,
        data: (1..=days)
            .map(|day| format!("Day {day} had {growth:.2} growth."))
            .collect(),
    }
}

pub struct AnalysisReportHandler;

impl ToolHandler for AnalysisReportHandler {
    fn call(&self, args: Map<String, Value>) -> Result<Vec<ContentBlock>, AppError> {
        let params: RunAnalysisReportTool = serde_json::from_value(Value::Object(args))
            .map_err(|err| AppError::invalid_params(err.to_string()))?;
        let days = report_days(&params)?;

        let random = rand::thread_rng().gen_range(0.0..100.0);
        let report = build_report(days, random);
        let text = serde_json::to_string(&report)
            .map_err(|err| AppError::internal(format!("report serialization failed: {err}")))?;

        Ok(vec![ContentBlock::from(TextContent::new(text, None, None))])
    }
}

pub fn analysis_report_tool() -> ToolDescriptor {
    let tool = RunAnalysisReportTool::tool();
    let input_schema =
        serde_json::to_value(&tool.input_schema).unwrap_or_else(|_| json!({ "type": "object" }));

    ToolDescriptor {
        name: tool.name,
        description: tool.description.unwrap_or_default(),
        input_schema,
        handler: Arc::new(AnalysisReportHandler),
    }
}
