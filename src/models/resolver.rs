//! Model reference resolution
//!
//! A reference is an exact id (`phi-4-generic-cpu:2`), an unversioned id
//! (`phi-4-generic-cpu`), or an alias (`phi-4`). Rules are tried in order
//! and the first match wins:
//!
//! 1. exact id, case-insensitive
//! 2. unversioned id: the `<reference>:N` variant with the highest `N`
//! 3. alias, optionally narrowed to one device type
//! 4. first alias candidate in snapshot order (the service ranks them)
//! 5. CPU fallback for generic GPU picks without an EP override, when enabled

use crate::error::{FoundryError, Result};
use crate::models::provider::VariantFlavor;
use crate::models::variant::{DeviceType, ModelVariant};
use crate::models::version::{self, strip_version, VERSION_SEPARATOR};

/// Maximum edit distance for a "did you mean" suggestion
const SUGGEST_MAX_DISTANCE: usize = 2;

/// Resolves references against a catalog snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolver {
    cpu_fallback: bool,
}

impl Resolver {
    #[must_use]
    pub const fn new(cpu_fallback: bool) -> Self {
        Self { cpu_fallback }
    }

    #[must_use]
    pub const fn cpu_fallback(&self) -> bool {
        self.cpu_fallback
    }

    /// Resolve `reference` to exactly one variant of `snapshot`
    pub fn resolve<'a>(
        &self,
        snapshot: &'a [ModelVariant],
        reference: &str,
        device: Option<DeviceType>,
    ) -> Result<&'a ModelVariant> {
        if reference.is_empty() {
            return Err(FoundryError::not_found(reference));
        }
        let lowered = reference.to_lowercase();

        if let Some(variant) = snapshot.iter().find(|v| v.id.to_lowercase() == lowered) {
            return Ok(variant);
        }

        if !version::has_version(reference) {
            if let Some(variant) = latest_with_prefix(snapshot, &lowered) {
                return Ok(variant);
            }
        }

        let candidates: Vec<&ModelVariant> = snapshot
            .iter()
            .filter(|v| !v.alias.is_empty() && v.alias.to_lowercase() == lowered)
            .filter(|v| device.map_or(true, |d| v.device_type() == d))
            .collect();

        let Some(&selected) = candidates.first() else {
            return Err(FoundryError::NotFound {
                reference: reference.to_string(),
                suggestion: suggest(snapshot, reference),
            });
        };

        if self.cpu_fallback
            && selected.flavor() == VariantFlavor::GenericGpu
            && selected.ep_override.is_none()
        {
            if let Some(&cpu) = candidates
                .iter()
                .find(|v| v.device_type() == DeviceType::Cpu)
            {
                tracing::warn!(
                    "No accelerated override for {}, falling back to {}",
                    selected.id,
                    cpu.id
                );
                return Ok(cpu);
            }
        }

        Ok(selected)
    }
}

/// Highest-versioned variant whose id starts with `<reference>:`.
/// Equal versions resolve to the last one seen.
fn latest_with_prefix<'a>(snapshot: &'a [ModelVariant], lowered: &str) -> Option<&'a ModelVariant> {
    let prefix = format!("{lowered}{VERSION_SEPARATOR}");
    snapshot
        .iter()
        .filter(|v| v.id.to_lowercase().starts_with(&prefix))
        .max_by_key(|v| v.version_number())
}

/// Closest alias or unversioned id within two edits of `reference`
#[must_use]
pub fn suggest(snapshot: &[ModelVariant], reference: &str) -> Option<String> {
    if reference.is_empty() {
        return None;
    }
    let lowered = reference.to_lowercase();

    snapshot
        .iter()
        .flat_map(|v| [v.alias.as_str(), strip_version(&v.id)])
        .filter(|name| !name.is_empty())
        .map(|name| (name, levenshtein_distance(&lowered, &name.to_lowercase())))
        .filter(|(_, dist)| *dist > 0 && *dist <= SUGGEST_MAX_DISTANCE)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name.to_string())
}

/// Calculate Levenshtein distance between two strings
#[allow(clippy::needless_range_loop)]
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    for i in 0..=len1 {
        matrix[i][0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for (i, c1) in s1.chars().enumerate() {
        for (j, c2) in s2.chars().enumerate() {
            let cost = usize::from(c1 != c2);
            matrix[i + 1][j + 1] = (matrix[i][j + 1] + 1)
                .min(matrix[i + 1][j] + 1)
                .min(matrix[i][j] + cost);
        }
    }

    matrix[len1][len2]
}
