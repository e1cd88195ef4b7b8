pub mod catalog;
pub mod download;
pub mod manager;
pub mod provider;
pub mod resolver;
pub mod variant;
pub mod version;

pub use catalog::{CatalogCache, CatalogSource, Snapshot};
pub use download::{DownloadEvent, DownloadFailure, DownloadOptions, ProgressDecoder};
pub use manager::Manager;
pub use provider::{ExecutionProvider, ProviderKind, VariantFlavor};
pub use resolver::Resolver;
pub use variant::{DeviceType, ModelVariant};
