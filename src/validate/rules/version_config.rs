//! Version config rule (VC).

use crate::content::version_config::violations;
use crate::content::{Artifact, ContentType, RelatedFileKind};
use crate::error::Result;
use crate::validate::context::ValidationContext;
use crate::validate::results::ValidationResult;
use crate::validate::validator::{Validator, ValidatorInfo};

/// VC100: platform bands of `version_config.json` are ordered and contiguous.
pub struct VersionConfigBands;

fn problems(item: &Artifact) -> Option<Vec<String>> {
    let file = item
        .related_file(RelatedFileKind::VersionConfig)
        .filter(|file| file.exist())?;
    let found = match file.json() {
        Some(value) => violations(value),
        None => vec!["version_config.json is not valid JSON".to_string()],
    };
    (!found.is_empty()).then_some(found)
}

impl Validator for VersionConfigBands {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "VC100",
            description: "Validate that the version config maps platform versions to contiguous content version bands.",
            rationale: "The marketplace picks the pack version to install from these bands.",
            error_message: "The version config is invalid: {0}.",
            related_field: "version_config.json",
            content_types: &[ContentType::Pack],
            related_files: &[RelatedFileKind::VersionConfig],
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
                let found = problems(item)?;
                let path = item.related_file(RelatedFileKind::VersionConfig)?.path();
                Some(self.result(item, &[&found.join("; ")]).with_path(path))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::content::artifact::test_support::artifact;
    use serde_json::json;
    use tempfile::TempDir;

    fn pack_with_config(temp: &TempDir, config: &str) -> Artifact {
        std::fs::write(temp.path().join("version_config.json"), config).unwrap();
        let mut pack = artifact(ContentType::Pack, "", json!({}));
        pack.path = temp.path().join("pack_metadata.json");
        pack.attach_related(Default::default());
        pack
    }

    #[test]
    fn contiguous_bands_pass() {
        let temp = TempDir::new().unwrap();
        let pack = pack_with_config(
            &temp,
            r#"{"8.0.0": {"to": "1.2.0"}, "8.1.0": {"from": "1.2.1"}}"#,
        );
        assert!(check(&VersionConfigBands, &[pack]).is_empty());
    }

    #[test]
    fn gap_is_reported_on_the_config_file() {
        let temp = TempDir::new().unwrap();
        let pack = pack_with_config(
            &temp,
            r#"{"8.0.0": {"to": "1.2.0"}, "8.1.0": {"from": "1.3.0"}}"#,
        );
        let results = check(&VersionConfigBands, &[pack]);
        assert_eq!(codes(&results), vec!["VC100"]);
        assert!(results[0].path.ends_with("version_config.json"));
        assert!(results[0].message.contains("'from' should be 1.2.1"));
    }

    #[test]
    fn malformed_json_is_reported() {
        let temp = TempDir::new().unwrap();
        let pack = pack_with_config(&temp, "{oops");
        let results = check(&VersionConfigBands, &[pack]);
        assert_eq!(
            results[0].message,
            "The version config is invalid: version_config.json is not valid JSON."
        );
    }

    #[test]
    fn missing_config_is_fine() {
        let temp = TempDir::new().unwrap();
        let mut pack = artifact(ContentType::Pack, "", json!({}));
        pack.path = temp.path().join("pack_metadata.json");
        pack.attach_related(Default::default());
        assert!(check(&VersionConfigBands, &[pack]).is_empty());
    }
}
