//! Structure rules (ST).

use super::{join, ITEM_TYPES};
use crate::content::pack::PLATFORM_MODULES;
use crate::content::Artifact;
use crate::error::Result;
use crate::validate::context::ValidationContext;
use crate::validate::results::ValidationResult;
use crate::validate::validator::{Validator, ValidatorInfo};

/// ST114: an item's supported modules stay within its pack's.
pub struct ModulesWithinPack;

fn modules_outside_pack(item: &Artifact) -> Vec<String> {
    let Some(declared) = item.declared_modules() else {
        return Vec::new();
    };
    let allowed: Vec<String> = match item.pack_metadata() {
        Some(metadata) => metadata.supported_modules(),
        None => PLATFORM_MODULES.iter().map(|m| m.to_string()).collect(),
    };
    let mut outside: Vec<String> = declared.into_iter().filter(|m| !allowed.contains(m)).collect();
    outside.sort();
    outside.dedup();
    outside
}

impl Validator for ModulesWithinPack {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "ST114",
            description: "Ensure that all supported modules of a content item are a subset of its Content Pack's supported modules.",
            rationale: "Declaring supported modules that are not allowed by the Content Pack can lead to unsupported behavior.",
            error_message: "The following supported modules are defined for the item but not allowed by its pack: {0}. Please ensure the item's supportedModules are a subset of the pack's supportedModules.",
            related_field: "supportedModules",
            content_types: ITEM_TYPES,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        Ok(items
            .iter()
            .filter_map(|item| {
                let outside = modules_outside_pack(item);
                let quoted: Vec<String> = outside.iter().map(|m| format!("'{}'", m)).collect();
                (!quoted.is_empty()).then(|| self.result(item, &[&join(&quoted)]))
            })
            .collect())
    }
}
