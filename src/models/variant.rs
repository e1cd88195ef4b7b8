use crate::models::provider::{ExecutionProvider, VariantFlavor};
use crate::models::version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device a variant is built to run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceType {
    #[serde(rename = "CPU")]
    Cpu,
    #[serde(rename = "GPU")]
    Gpu,
    #[serde(rename = "NPU")]
    Npu,
    #[default]
    #[serde(other)]
    Invalid,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
            Self::Npu => "NPU",
            Self::Invalid => "Invalid",
        };
        f.pad(name)
    }
}

impl FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            "npu" => Ok(Self::Npu),
            _ => Err(format!("Unknown device type: {s}. Must be one of cpu, gpu, npu")),
        }
    }
}

/// Prompt formatting used by a model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    #[serde(default)]
    pub assistant: String,
    #[serde(default)]
    pub prompt: String,
}

/// Execution requirements of a variant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
    #[serde(default)]
    pub device_type: DeviceType,
    #[serde(default)]
    pub execution_provider: ExecutionProvider,
}

/// Model-specific parameters, passed through untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default)]
    pub parameters: Vec<serde_json::Value>,
}

/// One device/provider-specific entry of the remote catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelVariant {
    /// Unique id within a snapshot, `<name>` or `<name>:<version>`
    #[serde(rename = "name")]
    pub id: String,
    pub display_name: String,
    pub provider_type: String,
    pub uri: String,
    pub version: String,
    pub model_type: String,
    pub prompt_template: Option<PromptTemplate>,
    pub publisher: String,
    pub task: String,
    pub runtime: Runtime,
    pub file_size_mb: u64,
    pub model_settings: ModelSettings,
    /// Groups interchangeable variants across devices. May be empty.
    pub alias: String,
    pub supports_tool_calling: bool,
    pub license: String,
    pub license_description: String,
    pub parent_model_uri: String,
    pub max_output_tokens: Option<u64>,
    #[serde(rename = "minFLVersion")]
    pub min_fl_version: Option<String>,
    /// Execution provider to request on load instead of the nominal one.
    /// Derived locally, never part of the remote record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ep_override: Option<String>,
}

impl ModelVariant {
    #[must_use]
    pub const fn device_type(&self) -> DeviceType {
        self.runtime.device_type
    }

    #[must_use]
    pub const fn execution_provider(&self) -> &ExecutionProvider {
        &self.runtime.execution_provider
    }

    /// Integer version suffix of the id, `-1` when absent
    #[must_use]
    pub fn version_number(&self) -> i64 {
        version::version(&self.id)
    }

    /// Naming-convention class of this variant
    #[must_use]
    pub fn flavor(&self) -> VariantFlavor {
        VariantFlavor::from_id(&self.id)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::provider::ProviderKind;

    const CATALOG_ENTRY: &str = r#"{
        "name": "Phi-3.5-mini-instruct-generic-gpu:1",
        "displayName": "Phi-3.5-mini-instruct-generic-gpu",
        "providerType": "AzureFoundry",
        "uri": "azureml://registries/azureml/models/Phi-3.5-mini-instruct-generic-gpu/versions/1",
        "version": "1",
        "modelType": "ONNX",
        "promptTemplate": {"assistant": "<|assistant|> {Content}", "prompt": "<|user|> {Content}"},
        "publisher": "Microsoft",
        "task": "chat-completion",
        "runtime": {"deviceType": "GPU", "executionProvider": "WebGpuExecutionProvider"},
        "fileSizeMb": 2150,
        "modelSettings": {"parameters": []},
        "alias": "phi-3.5-mini",
        "supportsToolCalling": false,
        "license": "MIT",
        "licenseDescription": "License...",
        "parentModelUri": "azureml://registries/azureml/models/Phi-3.5-mini-instruct/versions/6",
        "maxOutputTokens": 1024,
        "minFLVersion": "1.0.0"
    }"#;

    #[test]
    fn test_deserialize_catalog_entry() {
        let variant: ModelVariant = serde_json::from_str(CATALOG_ENTRY).unwrap();
        assert_eq!(variant.id, "Phi-3.5-mini-instruct-generic-gpu:1");
        assert_eq!(variant.alias, "phi-3.5-mini");
        assert_eq!(variant.device_type(), DeviceType::Gpu);
        assert_eq!(variant.execution_provider().kind(), ProviderKind::WebGpu);
        assert_eq!(variant.execution_provider().name(), "WebGpuExecutionProvider");
        assert_eq!(variant.file_size_mb, 2150);
        assert_eq!(variant.max_output_tokens, Some(1024));
        assert_eq!(variant.min_fl_version.as_deref(), Some("1.0.0"));
        assert_eq!(variant.version_number(), 1);
        assert_eq!(variant.flavor(), VariantFlavor::GenericGpu);
        assert!(variant.ep_override.is_none());
    }

    #[test]
    fn test_unknown_device_type_is_invalid() {
        let runtime: Runtime =
            serde_json::from_str(r#"{"deviceType": "TPU", "executionProvider": "X"}"#).unwrap();
        assert_eq!(runtime.device_type, DeviceType::Invalid);
    }

    #[test]
    fn test_null_prompt_template() {
        let variant: ModelVariant =
            serde_json::from_str(r#"{"name": "m:1", "promptTemplate": null}"#).unwrap();
        assert!(variant.prompt_template.is_none());
    }

    #[test]
    fn test_ep_override_serialization() {
        let mut variant = ModelVariant {
            id: "m-generic-gpu:1".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&variant).unwrap();
        assert!(json.get("epOverride").is_none());

        variant.ep_override = Some("cuda".to_string());
        let json = serde_json::to_value(&variant).unwrap();
        assert_eq!(json["epOverride"], "cuda");
        assert_eq!(json["name"], "m-generic-gpu:1");
    }

    #[test]
    fn test_device_type_from_str() {
        assert_eq!("gpu".parse::<DeviceType>(), Ok(DeviceType::Gpu));
        assert_eq!("NPU".parse::<DeviceType>(), Ok(DeviceType::Npu));
        assert_eq!("Cpu".parse::<DeviceType>(), Ok(DeviceType::Cpu));
        assert!("tpu".parse::<DeviceType>().is_err());
    }
}
