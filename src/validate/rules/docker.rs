//! Docker image rules (DO).
//!
//! These rules need registry lookups. Without a resolver on the run they
//! report nothing.

use crate::content::integration::{docker_image, script_type};
use crate::content::{Artifact, ContentType};
use crate::error::{PacklintError, Result};
use crate::format::docker::{split_image, update_docker_image, DockerResolver};
use crate::validate::context::ValidationContext;
use crate::validate::results::{FixResult, ValidationResult};
use crate::validate::validator::{Validator, ValidatorInfo};
use chrono::{Duration, Utc};
use tracing::debug;

/// How long a freshly pushed tag may lag behind the latest one.
const GRACE_DAYS: i64 = 3;

/// DO106: integrations and scripts use the latest tag of their image.
///
/// A tag pushed in the last three days is accepted even when a newer one
/// exists.
pub struct DockerTagIsLatest;

fn within_grace(resolver: &dyn DockerResolver, image: &str) -> bool {
    resolver
        .tag_updated(image)
        .is_some_and(|pushed| pushed > Utc::now() - Duration::days(GRACE_DAYS))
}

impl DockerTagIsLatest {
    fn check(&self, item: &Artifact, resolver: &dyn DockerResolver) -> Option<ValidationResult> {
        let image = docker_image(item)?;
        let (_, Some(tag)) = split_image(image) else {
            return Some(ValidationResult::new(
                self.code(),
                format!(
                    "Docker image {} format is invalid, cannot determine if it uses the latest tag",
                    image
                ),
                item,
            ));
        };
        let Some(latest) = resolver.resolve_latest(image) else {
            return Some(ValidationResult::new(
                self.code(),
                format!(
                    "The docker-image {} does not exist, hence could not validate its latest tag",
                    image
                ),
                item,
            ));
        };
        if tag == latest || within_grace(resolver, image) {
            return None;
        }
        Some(self.result(item, &[&image, &tag, &latest]))
    }
}

impl Validator for DockerTagIsLatest {
    fn info(&self) -> ValidatorInfo {
        ValidatorInfo {
            code: "DO106",
            description: "Validate that the given content-item uses the latest tag of a docker image.",
            rationale: "Older images miss security patches and dependency updates.",
            error_message: "docker image {0}'s tag {1} is not the latest tag, the latest tag is {2}",
            fix_message: Some("docker image {0} has been updated to {1}"),
            related_field: "Docker image",
            content_types: &[ContentType::Integration, ContentType::Script],
            auto_fixable: true,
            ..ValidatorInfo::BASE
        }
    }

    fn obtain_invalid_content_items(
        &self,
        items: &[&Artifact],
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationResult>> {
        let Some(resolver) = &ctx.run.docker else {
            debug!("DO106 skipped: no docker resolver");
            return Ok(Vec::new());
        };
        Ok(items
            .iter()
            .filter(|item| script_type(item) != Some("javascript"))
            .filter_map(|item| self.check(item, resolver.0.as_ref()))
            .collect())
    }

    fn fix(&self, item: &mut Artifact, ctx: &ValidationContext<'_>) -> Result<FixResult> {
        let unavailable = |message: String| PacklintError::FixUnavailable {
            code: self.code().to_string(),
            message,
        };
        let resolver = ctx
            .run
            .docker
            .as_ref()
            .ok_or_else(|| unavailable("no docker resolver".into()))?;
        let before = docker_image(item)
            .map(str::to_string)
            .ok_or_else(|| unavailable(format!("{} has no docker image", item.path.display())))?;
        match update_docker_image(item, resolver.0.as_ref()) {
            Some(after) => Ok(self.fix_result(item, &[&before, &after])),
            None => Ok(self.fix_result(item, &[&before, &before])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::content::artifact::test_support::artifact;
    use crate::format::docker::test_support::StaticResolver;
    use crate::format::SharedResolver;
    use crate::graph::ContentGraph;
    use serde_json::json;

    fn script(image: &str) -> Artifact {
        artifact(
            ContentType::Script,
            "Scripts/S/S.yml",
            json!({"name": "S", "type": "python", "dockerimage": image}),
        )
    }

    fn with_resolver(resolver: StaticResolver) -> crate::validate::context::RunContext {
        run_context().with_docker_resolver(SharedResolver::new(resolver))
    }

    #[test]
    fn stale_tag_fails_and_is_bumped() {
        let run = with_resolver(StaticResolver::with("demisto/python3", "3.10.13.9"));
        let mut item = script("demisto/python3:3.10.1.1");

        let results = check_with(&DockerTagIsLatest, std::slice::from_ref(&item), &run);
        assert_eq!(codes(&results), vec!["DO106"]);
        assert!(results[0].message.contains("the latest tag is 3.10.13.9"));

        let graph = ContentGraph::default();
        let ctx = ValidationContext::new(&run, &graph, &[]);
        let fixed = DockerTagIsLatest.fix(&mut item, &ctx).unwrap();
        assert_eq!(item.data["dockerimage"], "demisto/python3:3.10.13.9");
        assert!(fixed.message.ends_with("updated to demisto/python3:3.10.13.9"));
        assert!(check_with(&DockerTagIsLatest, &[item], &run).is_empty());
    }

    #[test]
    fn recently_pushed_tag_is_accepted() {
        let resolver = StaticResolver::with("demisto/python3", "3.10.13.9")
            .pushed("demisto/python3:3.10.13.8", Utc::now() - Duration::hours(5));
        let run = with_resolver(resolver);
        assert!(check_with(&DockerTagIsLatest, &[script("demisto/python3:3.10.13.8")], &run).is_empty());
    }

    #[test]
    fn unknown_image_and_missing_tag_are_reported() {
        let run = with_resolver(StaticResolver::with("demisto/python3", "3.10.13.9"));
        let results = check_with(
            &DockerTagIsLatest,
            &[script("demisto/gone:1.0"), script("demisto/python3")],
            &run,
        );
        assert_eq!(results.len(), 2);
        assert!(results[0].message.contains("does not exist"));
        assert!(results[1].message.contains("format is invalid"));
        assert!(!results[0].fix_available);
    }

    #[test]
    fn javascript_and_offline_runs_are_skipped() {
        let run = with_resolver(StaticResolver::with("demisto/python3", "3.10.13.9"));
        let mut js = script("demisto/python3:1.0");
        js.data["type"] = json!("javascript");
        assert!(check_with(&DockerTagIsLatest, &[js], &run).is_empty());
        assert!(check(&DockerTagIsLatest, &[script("demisto/python3:1.0")]).is_empty());
    }
}
