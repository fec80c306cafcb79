//! CLI module for Insight
//!
//! Command-line parsing and the non-server subcommands of the
//! `insight-server` binary. Uses clap for argument parsing and owo-colors for
//! colored terminal output.

pub mod output;

use crate::tools::ToolRegistry;
use crate::utils::toml_config::{ConfigError, InsightConfig};
use crate::workflows::WorkflowRegistry;
use clap::{Parser, Subcommand};
use output::Output;
use std::path::PathBuf;

/// Insight - multi-agent business consulting server
///
/// Coach and router agents that turn a business problem into a validated
/// solution plan, served over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "insight-server",
    version,
    about = "Insight - multi-agent business consulting server",
    long_about = "Coach and router agents that interview a user about a business problem,\n\
                  summarise it and produce a validated solution plan, served over HTTP.\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  insight-server                       # Start the server (requires insight.toml)\n    \
                  insight-server --config prod.toml    # Use a custom config file\n    \
                  insight-server config --validate     # Check cross-references and env vars\n    \
                  insight-server tools                 # List enabled tools"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "insight.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (the default)
    Serve,

    /// Show configuration information
    Config {
        /// Show the full configuration
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// List tools enabled by the configuration
    Tools,

    /// List registered workflows
    Workflows,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn output(&self) -> Output {
        if self.no_color {
            Output::no_color()
        } else {
            Output::new()
        }
    }
}

/// `config`: summarise, optionally validate, optionally dump the file
pub fn show_config(
    out: &Output,
    config: &InsightConfig,
    full: bool,
    validate: bool,
) -> Result<(), ConfigError> {
    out.header("Configuration");
    out.kv("server", &format!("{}:{}", config.server.host, config.server.port));
    out.kv("api prefix", &config.api.prefix);
    out.kv(
        "api key",
        config.api.api_key_env.as_deref().unwrap_or("(not required)"),
    );
    out.kv("providers", &config.providers.len().to_string());
    out.kv("models", &config.models.len().to_string());
    out.kv("agents", &config.agents.len().to_string());
    out.kv("coach topics", &config.coach.topics.join(", "));

    if validate {
        let warnings = config.validate_with_warnings()?;
        if warnings.is_empty() {
            out.success("Configuration is valid");
        } else {
            for warning in &warnings {
                out.warning(&warning.to_string());
            }
            out.success(&format!("Configuration is valid ({} warnings)", warnings.len()));
        }
    }

    if full {
        match toml::to_string_pretty(config) {
            Ok(text) => println!("\n{}", text),
            Err(e) => out.error(&format!("Could not render configuration: {}", e)),
        }
    }
    Ok(())
}

/// `tools`: table of enabled tools
pub fn list_tools(out: &Output, config: &InsightConfig) {
    let registry = ToolRegistry::with_config(config);
    out.header("Tools");
    out.table_header(&["NAME", "TIMEOUT"]);
    for name in registry.tool_names() {
        let timeout = format!("{}s", config.tool_timeout(&name).as_secs());
        out.table_row(&[&name, &timeout]);
    }
    let disabled: Vec<String> = crate::tools::BUILTIN_TOOLS
        .iter()
        .filter(|name| !registry.has_tool(name))
        .map(|name| name.to_string())
        .collect();
    if !disabled.is_empty() {
        out.hint(&format!("Disabled: {}", disabled.join(", ")));
    }
}

/// `workflows`: table of registered workflows
pub fn list_workflows(out: &Output) {
    let registry = WorkflowRegistry::with_builtin_workflows();
    out.header("Workflows");
    out.table_header(&["ID", "NAME"]);
    for (id, info) in registry.list() {
        out.table_row(&[&id, &info.name]);
        out.list_item(&info.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_server() {
        let cli = Cli::try_parse_from(["insight-server"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("insight.toml"));
    }

    #[test]
    fn test_config_validate_flag() {
        let cli =
            Cli::try_parse_from(["insight-server", "config", "--validate", "-c", "x.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                validate: true,
                full: false
            })
        ));
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn test_show_config_validates() {
        let out = Output::no_color();
        assert!(show_config(&out, &InsightConfig::default(), false, true).is_ok());
    }
}
