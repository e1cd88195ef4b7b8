//! Execution-provider classification
//!
//! Raw provider names (`CUDAExecutionProvider`, `WebGpuExecutionProvider`, ...)
//! are mapped to a [`ProviderKind`] once, when a variant is deserialized, and
//! ids are mapped to a [`VariantFlavor`] by naming convention. Everything
//! downstream dispatches on those enums.

use crate::models::variant::ModelVariant;
use crate::models::version::strip_version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowercase token requested on load when a generic GPU variant should run on CUDA
pub const CUDA_EP_TOKEN: &str = "cuda";

/// Backend family of an execution provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderKind {
    Cpu,
    WebGpu,
    Cuda,
    Qnn,
    #[default]
    Other,
}

impl ProviderKind {
    /// Classify a raw provider name, case-insensitively
    #[must_use]
    pub fn classify(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("cuda") {
            Self::Cuda
        } else if name.contains("webgpu") {
            Self::WebGpu
        } else if name.contains("qnn") {
            Self::Qnn
        } else if name.contains("cpu") {
            Self::Cpu
        } else {
            Self::Other
        }
    }
}

/// Execution provider named by the catalog, with its classified kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ExecutionProvider {
    name: String,
    kind: ProviderKind,
}

impl ExecutionProvider {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ProviderKind::classify(&name);
        Self { name, kind }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ProviderKind {
        self.kind
    }

    #[must_use]
    pub const fn is_cuda(&self) -> bool {
        matches!(self.kind, ProviderKind::Cuda)
    }
}

impl From<String> for ExecutionProvider {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<ExecutionProvider> for String {
    fn from(provider: ExecutionProvider) -> Self {
        provider.name
    }
}

impl fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name)
    }
}

/// Variant class encoded in the id naming convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantFlavor {
    /// `*-generic-gpu`: runs on any GPU through a portable provider
    GenericGpu,
    /// `*-generic-cpu`
    GenericCpu,
    /// Built for one specific provider (CUDA, QNN, ...)
    Specific,
}

impl VariantFlavor {
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        let name = strip_version(id).to_ascii_lowercase();
        if name.contains("-generic-gpu") {
            Self::GenericGpu
        } else if name.contains("-generic-cpu") {
            Self::GenericCpu
        } else {
            Self::Specific
        }
    }
}

/// True if any variant in the snapshot runs on a CUDA-class provider
#[must_use]
pub fn has_cuda_variant(snapshot: &[ModelVariant]) -> bool {
    snapshot.iter().any(|v| v.execution_provider().is_cuda())
}

/// Set the EP override on every generic GPU variant of a freshly fetched snapshot.
///
/// With a CUDA-capable variant anywhere in the snapshot, generic GPU variants
/// are pointed at CUDA; otherwise their override is cleared.
#[must_use]
pub fn annotate(mut snapshot: Vec<ModelVariant>) -> Vec<ModelVariant> {
    let cuda = has_cuda_variant(&snapshot);
    for variant in snapshot
        .iter_mut()
        .filter(|v| v.flavor() == VariantFlavor::GenericGpu)
    {
        variant.ep_override = cuda.then(|| CUDA_EP_TOKEN.to_string());
    }
    snapshot
}
