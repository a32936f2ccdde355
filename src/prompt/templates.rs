//! Generation prompts.
//!
//! One template per artifact. Cloud-specific wording comes from
//! [`CloudProvider`], so the templates never branch on the cloud.

use serde_json::Value;

use crate::models::CloudProvider;

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Terraform configuration for one cloud, from analysis metadata and the
/// user's survey answers.
pub fn terraform(cloud: CloudProvider, metadata: &Value, survey: &Value) -> String {
    let name = cloud.display_name();
    let provider = cloud.terraform_provider();
    let resources = cloud.example_resources();
    format!(
        "You are a senior DevOps engineer specializing in {name} infrastructure as code using Terraform.

Generate a complete, syntactically valid Terraform configuration (.tf) for {name} based on the metadata and survey below.

### Instructions
- Output only pure Terraform HCL, exactly as it would appear in a .tf file.
- Do not include markdown code fences, explanations or any non-HCL text.
- Include a `terraform` block and a `provider \"{provider}\"` block.
- Include the resources the workload needs (e.g. {resources}).
- Add variables and outputs where useful.
- Follow Terraform conventions for naming and indentation.
- Use realistic resource attributes inferred from the metadata and survey.

### Metadata
{metadata}

### Survey
{survey}

### Output
Generate only the Terraform configuration:
",
        metadata = pretty(metadata),
        survey = pretty(survey),
    )
}

/// Single monthly cost figure for a Terraform configuration.
pub fn cost(cloud: CloudProvider, terraform: &str, region: Option<&str>) -> String {
    let label = cloud.label();
    let region = region.unwrap_or(cloud.pricing_region());
    format!(
        "You are a cloud financial analyst specializing in {label} cost estimation from Terraform configurations.

- Read the Terraform configuration below and identify every {label} resource.
- Estimate the total monthly cost in USD using typical on-demand pricing in {region}.
- Include compute, storage, networking and data transfer.

### Output format
- Output exactly one number with two decimal places (e.g. 153.47).
- No currency symbols, units, markdown or explanations.

### Terraform configuration
{terraform}
"
    )
}

/// GitHub Actions workflow that plans on pull requests and applies on main.
pub fn actions(cloud: CloudProvider, terraform: &str, project_name: &str) -> String {
    let label = cloud.label();
    format!(
        "You are a DevOps expert. Analyze the Terraform code below and generate a production-ready GitHub Actions workflow YAML file for project '{project_name}'.

Requirements:
1. Optimized for the {label} cloud environment
2. Terraform init, plan and apply stages
3. Plan on pull requests, apply on merges to main
4. Environment variables and secrets configured through repository secrets
5. Error handling and failure notifications
6. Short-lived credentials (OIDC) instead of static keys

Terraform code:
```hcl
{terraform}
```

Output only the YAML file. Comment each step. The workflow must be usable as is.
"
    )
}

/// Shell script deploying the infrastructure with the cloud's own CLI.
pub fn cli_script(cloud: CloudProvider, request_id: &str, project_name: &str) -> String {
    let label = cloud.label();
    format!(
        "You are a cloud infrastructure expert. Generate a comprehensive set of CLI commands for deploying project '{project_name}' on {label}.

The commands should include:
1. Authentication and configuration
2. Resource creation (network, subnets, firewall rules, compute instances, storage)
3. Deployment steps
4. Verification commands
5. Cleanup commands (commented out)

Format the output as a shell script with clear comments and sections, following {label} conventions.

Request ID: {request_id}
Cloud Platform: {label}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terraform_prompt_uses_cloud_wording() {
        let prompt = terraform(
            CloudProvider::Azure,
            &json!({"services": [{"name": "api"}]}),
            &json!({"traffic": "low"}),
        );
        assert!(prompt.contains("Microsoft Azure"));
        assert!(prompt.contains("provider \"azurerm\""));
        assert!(prompt.contains("\"traffic\": \"low\""));
        assert!(prompt.contains("\"name\": \"api\""));
    }

    #[test]
    fn cost_prompt_region_defaults_per_cloud() {
        assert!(cost(CloudProvider::Gcp, "x", None).contains("us-central1"));
        assert!(cost(CloudProvider::Aws, "x", Some("eu-west-1")).contains("eu-west-1"));
    }

    #[test]
    fn actions_prompt_embeds_terraform() {
        let prompt = actions(CloudProvider::Aws, "resource \"aws_s3_bucket\" \"b\" {}", "shop");
        assert!(prompt.contains("```hcl\nresource \"aws_s3_bucket\""));
        assert!(prompt.contains("AWS cloud environment"));
        assert!(prompt.contains("'shop'"));
    }

    #[test]
    fn cli_prompt_carries_request_id() {
        let prompt = cli_script(CloudProvider::Gcp, "req-1", "app");
        assert!(prompt.contains("Request ID: req-1"));
        assert!(prompt.contains("Cloud Platform: GCP"));
    }
}
