//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::FormbridgeConfig;
use super::secret_string;
use crate::domain::{FormbridgeError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of environment overrides
const ENV_PREFIX: &str = "FORMBRIDGE_";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into FormbridgeConfig
/// 4. Applies environment variable overrides (FORMBRIDGE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a `Configuration` error if the file is missing or unreadable, a
/// referenced variable is unset, the TOML is malformed or validation fails.
///
/// # Examples
///
/// ```no_run
/// use formbridge::config::loader::load_config;
///
/// let config = load_config("formbridge.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<FormbridgeConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(FormbridgeError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        FormbridgeError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text with substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<FormbridgeConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: FormbridgeConfig = toml::from_str(&contents)
        .map_err(|e| FormbridgeError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    config.validate().map_err(|e| {
        FormbridgeError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| FormbridgeError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|m| m == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(FormbridgeError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the FORMBRIDGE_* prefix
///
/// Variables follow the pattern FORMBRIDGE_<SECTION>_<KEY>, for example
/// FORMBRIDGE_DATABASE_CONNECTION_STRING or FORMBRIDGE_PIPELINE_EXPORT_TABLE.
/// `lookup` resolves a variable name to its value.
fn apply_env_overrides(
    config: &mut FormbridgeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let var = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));

    // Application overrides
    if let Some(val) = var("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = var("APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_override("APPLICATION_DRY_RUN", &val)?;
    }

    // Database overrides
    if let Some(val) = var("DATABASE_CONNECTION_STRING") {
        config.database.connection_string = secret_string(val);
    }
    if let Some(val) = var("DATABASE_MAX_CONNECTIONS") {
        config.database.max_connections = parse_override("DATABASE_MAX_CONNECTIONS", &val)?;
    }
    if let Some(val) = var("DATABASE_SSL_MODE") {
        config.database.ssl_mode = val;
    }
    if let Some(val) = var("DATABASE_WORKFLOW_SCHEMA") {
        config.database.workflow_schema = val;
    }

    // Pipeline overrides
    if let Some(val) = var("PIPELINE_QUEUE_TABLE") {
        config.pipeline.queue_table = val;
    }
    if let Some(val) = var("PIPELINE_EXPORT_TABLE") {
        config.pipeline.export_table = val;
    }
    if let Some(val) = var("PIPELINE_MERGE_STRATEGY") {
        config.pipeline.merge_strategy = parse_override("PIPELINE_MERGE_STRATEGY", &val)?;
    }
    if let Some(val) = var("PIPELINE_STRICT_SAMPLE_SEQUENCE") {
        config.pipeline.strict_sample_sequence =
            parse_override("PIPELINE_STRICT_SAMPLE_SEQUENCE", &val)?;
    }

    // Intake overrides
    if let Some(val) = var("INTAKE_WINDOW_START") {
        config.intake.window_start = Some(val);
    }
    if let Some(val) = var("INTAKE_WINDOW_END") {
        config.intake.window_end = Some(val);
    }
    if let Some(val) = var("INTAKE_LOOKBACK_DAYS") {
        config.intake.lookback_days = Some(parse_override("INTAKE_LOOKBACK_DAYS", &val)?);
    }

    // Directory overrides
    if let Some(val) = var("REFERENCE_ROOT") {
        config.reference.root = PathBuf::from(val);
    }
    if let Some(val) = var("XML_EXPORT_ROOT") {
        config.xml_export.root = PathBuf::from(val);
    }

    // Logging overrides
    if let Some(val) = var("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = var("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        FormbridgeError::Configuration(format!("Invalid value for {ENV_PREFIX}{key}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::load::MergeStrategy;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[database]
connection_string = "postgresql://fb:pw@localhost:5432/erp"
"#;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("FB_LOADER_TEST_VAR", "test_value");
        let input = "password = \"${FB_LOADER_TEST_VAR}\"\n# ${FB_LOADER_UNSET_IN_COMMENT}";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(
            result,
            "password = \"test_value\"\n# ${FB_LOADER_UNSET_IN_COMMENT}\n"
        );
        std::env::remove_var("FB_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("FB_LOADER_MISSING_VAR");
        let result = substitute_env_vars("password = \"${FB_LOADER_MISSING_VAR}\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("nonexistent.toml").is_err());
    }

    #[test]
    fn test_minimal_config_takes_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.pipeline.export_table, "fourpl_datatrans_export");
        assert_eq!(config.pipeline.merge_strategy, MergeStrategy::Merge);
        assert!(config.pipeline.strict_sample_sequence);
        assert_eq!(config.intake.lookback_days, Some(30));
        assert_eq!(config.database.workflow_schema, "bpm");
    }

    #[test]
    fn test_load_config_from_file() {
        let toml_content = r#"
[application]
log_level = "debug"

[database]
connection_string = "postgresql://fb:pw@db:5432/erp"
max_connections = 4

[pipeline]
merge_strategy = "upsert"
strict_sample_sequence = false

[intake]
window_start = "2025-12-01 00:00:00"
window_end = "2025-12-17 00:00:00"

[jobs.aliases]
BpmDataUploadJob = "bpm-upload"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.pipeline.merge_strategy, MergeStrategy::Upsert);
        assert!(!config.pipeline.strict_sample_sequence);
        assert_eq!(config.jobs.aliases["BpmDataUploadJob"], "bpm-upload");
        assert!(config.intake.window_settings().unwrap().end.is_some());
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = parse_config(MINIMAL).unwrap();
        let vars: HashMap<&str, &str> = [
            ("FORMBRIDGE_PIPELINE_EXPORT_TABLE", "erp.export_lines"),
            ("FORMBRIDGE_PIPELINE_MERGE_STRATEGY", "upsert"),
            ("FORMBRIDGE_DATABASE_CONNECTION_STRING", "postgres://other/db"),
            ("FORMBRIDGE_INTAKE_LOOKBACK_DAYS", "7"),
        ]
        .into_iter()
        .collect();

        apply_env_overrides(&mut config, |name| vars.get(name).map(|v| v.to_string())).unwrap();

        assert_eq!(config.pipeline.export_table, "erp.export_lines");
        assert_eq!(config.pipeline.merge_strategy, MergeStrategy::Upsert);
        assert_eq!(
            config.database.connection_string.expose_secret().as_ref(),
            "postgres://other/db"
        );
        assert_eq!(config.intake.lookback_days, Some(7));
    }

    #[test]
    fn test_invalid_override_is_error() {
        let mut config = parse_config(MINIMAL).unwrap();
        let result = apply_env_overrides(&mut config, |name| {
            (name == "FORMBRIDGE_DATABASE_MAX_CONNECTIONS").then(|| "many".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let text = format!("{MINIMAL}\n[logging]\nlocal_rotation = \"weekly\"\n");
        assert!(parse_config(&text).is_err());
    }
}
