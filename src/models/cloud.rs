//! Cloud targets and the provider-specific wording used in prompts.
//!
//! Everything that differs between AWS, Azure and GCP lives in the match
//! arms below so the prompt templates and handlers stay cloud-agnostic.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// A cloud a deployment can be generated for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CloudProvider {
    Aws,
    Azure,
    Gcp,
}

impl CloudProvider {
    /// Every supported cloud, in the order the survey sequencer visits them.
    pub const ALL: [CloudProvider; 3] = [CloudProvider::Aws, CloudProvider::Gcp, CloudProvider::Azure];

    /// Long name used in prompt headings.
    pub fn display_name(self) -> &'static str {
        match self {
            CloudProvider::Aws => "Amazon Web Services (AWS)",
            CloudProvider::Azure => "Microsoft Azure",
            CloudProvider::Gcp => "Google Cloud Platform (GCP)",
        }
    }

    /// Short upper-case label (`AWS`, `AZURE`, `GCP`).
    pub fn label(self) -> String {
        self.as_ref().to_uppercase()
    }

    /// Name of the Terraform provider block.
    pub fn terraform_provider(self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Azure => "azurerm",
            CloudProvider::Gcp => "google",
        }
    }

    /// Representative resources the Terraform prompt nudges towards.
    pub fn example_resources(self) -> &'static str {
        match self {
            CloudProvider::Aws => "EC2, S3, IAM, Lambda, VPC, ECS, CloudFront, etc.",
            CloudProvider::Azure => {
                "resource group, storage account, virtual network, compute instance, app service, etc."
            }
            CloudProvider::Gcp => "compute, storage, IAM, Cloud Run, VPC, etc.",
        }
    }

    /// Region whose on-demand pricing cost estimates are based on.
    pub fn pricing_region(self) -> &'static str {
        match self {
            CloudProvider::Aws => "us-east-1",
            CloudProvider::Azure => "eastus",
            CloudProvider::Gcp => "us-central1",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("AWS".parse::<CloudProvider>().unwrap(), CloudProvider::Aws);
        assert_eq!("Azure".parse::<CloudProvider>().unwrap(), CloudProvider::Azure);
        assert_eq!("gcp".parse::<CloudProvider>().unwrap(), CloudProvider::Gcp);
        assert!("oracle".parse::<CloudProvider>().is_err());
    }

    #[test]
    fn display_is_lowercase_key() {
        assert_eq!(CloudProvider::Gcp.to_string(), "gcp");
        assert_eq!(CloudProvider::Azure.label(), "AZURE");
    }

    #[test]
    fn terraform_provider_blocks() {
        assert_eq!(CloudProvider::Aws.terraform_provider(), "aws");
        assert_eq!(CloudProvider::Azure.terraform_provider(), "azurerm");
        assert_eq!(CloudProvider::Gcp.terraform_provider(), "google");
    }

    #[test]
    fn survey_order() {
        assert_eq!(
            CloudProvider::ALL,
            [CloudProvider::Aws, CloudProvider::Gcp, CloudProvider::Azure]
        );
    }
}
