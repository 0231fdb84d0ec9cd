#![cfg(unix)]

use anyhow::Result;
use serde_json::json;
use std::os::unix::fs::PermissionsExt;
use terraform_infra::modules::{self, ModuleType};

const FAKE_TERRAFORM: &str = r#"#!/bin/sh
echo "$@" >> calls.log
case "$1" in
  init)
    echo "Terraform has been successfully initialized!"
    ;;
  workspace)
    if [ "$2" = "list" ]; then
      printf '* default\n  staging\n'
    fi
    ;;
  output)
    echo '{"cluster_gateway_ip": {"sensitive": false, "type": "string", "value": "10.0.0.1"}}'
    ;;
  *)
    echo "unexpected command: $1" >&2
    exit 1
    ;;
esac
"#;

#[test]
fn terraform_output_runs_binary_in_project() -> Result<()> {
    let project = tempfile::tempdir()?;
    let binary = project.path().join("terraform");
    std::fs::write(&binary, FAKE_TERRAFORM)?;
    std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))?;

    let module = ModuleType::TerraformOutput.create();
    let inputs = json!({
        "project_path": project.path(),
        "binary_path": "terraform",
        "workspace": "staging",
        "backend_config": {"path": "state/terraform.tfstate"}
    });
    let result = modules::execute(module.as_ref(), &inputs.to_string());

    assert!(!result.failed, "{:?}", result.msg);
    assert_eq!(result.get("workspace"), Some(&json!("staging")));
    assert_eq!(
        result.get("outputs").unwrap()["cluster_gateway_ip"]["value"],
        json!("10.0.0.1")
    );

    let calls = std::fs::read_to_string(project.path().join("calls.log"))?;
    let calls: Vec<&str> = calls.lines().collect();
    assert_eq!(
        calls,
        [
            "init -input=false -reconfigure -backend-config path=state/terraform.tfstate",
            "workspace list -no-color",
            "workspace select staging -no-color",
            "output -no-color -json",
            "workspace select default -no-color",
        ]
    );

    Ok(())
}
