//! Command handlers.

use crate::config::{CliConfig, OutputFormat};
use awc_compiler::{CompiledWorkflow, WorkflowCompiler};
use awc_core::workflow::WorkflowSpec;
use console::style;
use std::path::{Path, PathBuf};
use tracing::debug;

const LOCK_EXTENSION: &str = "lock.yml";

/// Compile the workflow at `path` with the configured defaults.
pub fn compile_file(
    config: &CliConfig,
    path: &Path,
) -> Result<CompiledWorkflow, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), "Compiling workflow");
    let compiler = WorkflowCompiler::new(config.compiler_options());
    Ok(compiler.compile_str(&content)?)
}

/// Where a compiled document is written: the explicit path, else
/// `<stem>.lock.yml` in the configured output directory or next to the
/// source.
pub fn output_path(config: &CliConfig, input: &Path, explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workflow".to_string());
    let file_name = format!("{stem}.{LOCK_EXTENSION}");

    match &config.output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

/// Compile a workflow and write the document.
pub fn compile(
    config: &CliConfig,
    path: &Path,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let compiled = compile_file(config, path)?;
    let target = output_path(config, path, output);

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, &compiled.yaml)?;

    println!(
        "{} Compiled {} -> {}",
        style("✓").green(),
        style(path.display()).bold(),
        target.display()
    );
    println!("  Jobs: {}", compiled.graph.len());
    Ok(())
}

/// Validate a workflow by compiling it without writing anything.
pub fn validate(config: &CliConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let spec = WorkflowSpec::from_yaml(&content)?;
    let compiled = WorkflowCompiler::new(config.compiler_options()).compile(&spec)?;

    println!(
        "{} Workflow \"{}\" is valid",
        style("✓").green(),
        spec.name
    );
    println!("  Engine: {}", compiled.engine.id);
    println!("  Jobs: {}", compiled.graph.len());
    for name in compiled.job_order()? {
        println!("    - {}", name);
    }
    Ok(())
}

/// Print jobs in execution order.
pub fn order(config: &CliConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let compiled = compile_file(config, path)?;
    let order = compiled.job_order()?;
    println!("{}", format_list(config.output_format, &order)?);
    Ok(())
}

/// Print the agent's allowed-tools string.
pub fn permissions(config: &CliConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let compiled = compile_file(config, path)?;
    match config.output_format {
        OutputFormat::Text => println!("{}", compiled.allowed_tools()),
        format => println!("{}", format_list(format, &compiled.permissions.tokens)?),
    }
    Ok(())
}

/// Render a list of names in the requested format.
pub fn format_list(
    format: OutputFormat,
    items: &[String],
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        OutputFormat::Text => items.join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(items)?,
        OutputFormat::Yaml => serde_yaml::to_string(items)?.trim_end().to_string(),
    })
}

/// JSON schema of the workflow input format.
pub fn workflow_schema() -> Result<String, Box<dyn std::error::Error>> {
    let schema = schemars::schema_for!(WorkflowSpec);
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// Print the workflow schema.
pub fn schema() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", workflow_schema()?);
    Ok(())
}

/// Show configuration.
pub fn show_config(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Current configuration:");
    println!(
        "  output_dir: {}",
        config
            .output_dir
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| "(next to source)".to_string())
    );
    println!("  default_engine: {}", config.default_engine);
    println!("  runs_on: {}", config.runs_on);
    println!("  timeout_minutes: {}", config.timeout_minutes);
    println!("  output_format: {:?}", config.output_format);

    if let Ok(path) = CliConfig::config_path() {
        println!("\nConfig file: {}", path.display());
    }

    Ok(())
}

/// Set configuration.
pub fn set_config(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CliConfig::load().unwrap_or_default();
    config.set(key, value)?;
    config.save()?;

    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}
