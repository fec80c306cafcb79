//! Workflows
//!
//! A workflow is a fixed sequence of steps with observable state. Each
//! instance is built fresh from the [`WorkflowRegistry`] and executed once:
//!
//! ```ignore
//! let registry = WorkflowRegistry::with_builtin_workflows();
//! let mut workflow = registry.create("data_analysis", "Sales", "Q3 sales", &deps)?;
//! let results = workflow.execute(&json!({
//!     "data": [120, 135, 150],
//!     "metrics": ["mean", "trend"],
//!     "report_format": "json"
//! })).await?;
//! ```

pub mod base;
pub mod data_analysis;
pub mod problem_discovery;
pub mod registry;

pub use base::{StepStatus, Workflow, WorkflowState, WorkflowStatus, WorkflowStep};
pub use data_analysis::DataAnalysisWorkflow;
pub use problem_discovery::ProblemDiscoveryWorkflow;
pub use registry::{WorkflowDeps, WorkflowInfo, WorkflowRegistry};
