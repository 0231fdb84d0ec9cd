use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Checks `input` against the JSON Schema of module `module`.
///
/// Every violation is reported on its own line, prefixed with the location of
/// the offending value (`/` for the arguments object itself).
pub fn validate_input(module: &str, schema: &str, input: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(schema)
        .with_context(|| format!("Schema of module {module} is not valid JSON"))?;
    let validator = jsonschema::validator_for(&schema)
        .with_context(|| format!("Schema of module {module} could not be compiled"))?;

    let violations: Vec<String> = validator
        .iter_errors(input)
        .map(|e| {
            let location = e.instance_path.to_string();
            let location = if location.is_empty() { "/".to_string() } else { location };
            format!(" - {location}: {e}")
        })
        .collect();

    if !violations.is_empty() {
        bail!(
            "Invalid arguments for module {module}:\n{}",
            violations.join("\n")
        );
    }

    Ok(())
}
