//! Built-in validators.
//!
//! Rules are grouped by the theme prefix of their codes:
//!
//! | Module | Prefix |
//! |---|---|
//! | [`basic`] | BA |
//! | [`backward`] | BC |
//! | [`description`] | DS |
//! | [`docker`] | DO |
//! | [`incident_field`] | IF |
//! | [`integration_params`] | IN |
//! | [`playbook`] | PB |
//! | [`autonomous`] | AS |
//! | [`graph`] | GR |
//! | [`readme`] | RM |
//! | [`release_notes`] | RN |
//! | [`structure`] | ST |
//! | [`version_config`] | VC |

pub mod autonomous;
pub mod backward;
pub mod basic;
pub mod description;
pub mod docker;
pub mod graph;
pub mod incident_field;
pub mod integration_params;
pub mod playbook;
pub mod readme;
pub mod release_notes;
pub mod structure;
pub mod version_config;

use super::validator::{AllFilesMode, ListFilesMode, Validator};
use crate::content::{Artifact, ContentType};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Every built-in validator, graph rules registered in both execution modes.
pub fn builtins() -> Vec<Box<dyn Validator>> {
    vec![
        Box::new(basic::VersionIsDefault),
        Box::new(basic::IdEqualsName),
        Box::new(basic::UnknownMarketplaceTags),
        Box::new(basic::MalformedMarketplaceTags),
        Box::new(basic::FromVersionSufficient),
        Box::new(basic::NoTrailingSpaces),
        Box::new(basic::NoCopyrightInCode),
        Box::new(basic::NoInternalTerms),
        Box::new(basic::ContextPathDepth),
        Box::new(backward::IdUnchanged),
        Box::new(backward::SubtypeUnchanged),
        Box::new(backward::CommandsKept),
        Box::new(backward::FromVersionUnchanged),
        Box::new(backward::MapperKeysKept),
        Box::new(backward::OutputsKept),
        Box::new(backward::SupportedModulesNotAdded),
        Box::new(description::DescriptionFileTerms),
        Box::new(description::DescriptionsEndWithDot),
        Box::new(docker::DockerTagIsLatest),
        Box::new(incident_field::RequiredFieldRules),
        Box::new(incident_field::IndicatorFieldFromVersion),
        Box::new(integration_params::HiddenParams),
        Box::new(playbook::NoRolename),
        Box::new(playbook::ConditionsHandled),
        Box::new(playbook::BranchesReachable),
        Box::new(playbook::NoOrphanTasks),
        Box::new(playbook::DeprecatedDescription),
        Box::new(playbook::NoDeleteContextAll),
        Box::new(playbook::NoPinnedInstance),
        Box::new(playbook::TaskIdsAreUuids),
        Box::new(playbook::TaskIdMatchesInnerId),
        Box::new(playbook::DeclaredInputsUsed),
        Box::new(playbook::UsedInputsDeclared),
        Box::new(playbook::ConditionHasOnlyDefault),
        Box::new(playbook::SilentPlaybookPrefix),
        Box::new(playbook::SilentPlaybookHasNoReadme),
        Box::new(playbook::AutonomousHeaderSequence),
        Box::new(playbook::SilentTriggerPrefix),
        Box::new(playbook::ValueReferencesNotated),
        Box::new(AllFilesMode(autonomous::ManagedDependencies)),
        Box::new(ListFilesMode(autonomous::ManagedDependencies)),
        Box::new(AllFilesMode(autonomous::AutonomousDependencies)),
        Box::new(ListFilesMode(autonomous::AutonomousDependencies)),
        Box::new(autonomous::AutonomousQuietMode),
        Box::new(autonomous::SilentPairing),
        Box::new(AllFilesMode(graph::MarketplaceContainment)),
        Box::new(ListFilesMode(graph::MarketplaceContainment)),
        Box::new(AllFilesMode(graph::UnknownContent)),
        Box::new(ListFilesMode(graph::UnknownContent)),
        Box::new(AllFilesMode(graph::DuplicateDisplayNames)),
        Box::new(ListFilesMode(graph::DuplicateDisplayNames)),
        Box::new(AllFilesMode(graph::DeprecatedUsage)),
        Box::new(ListFilesMode(graph::DeprecatedUsage)),
        Box::new(AllFilesMode(graph::ModuleCompatibility)),
        Box::new(ListFilesMode(graph::ModuleCompatibility)),
        Box::new(readme::EmptySections),
        Box::new(readme::PackReadmeRequired),
        Box::new(readme::ReadmeTerms),
        Box::new(readme::ImagePaths),
        Box::new(readme::CommandsDocumented),
        Box::new(readme::OutputsMatch),
        Box::new(readme::NoCopyrightInReadme),
        Box::new(readme::NoPlaceholders),
        Box::new(release_notes::FilledOut),
        Box::new(release_notes::SingleAddedNote),
        Box::new(release_notes::NoteExists),
        Box::new(release_notes::ItemMentioned),
        Box::new(release_notes::NewPackHasNoNotes),
        Box::new(release_notes::DockerEntryMatches),
        Box::new(release_notes::BreakingChangeJson),
        Box::new(release_notes::KnownHeaders),
        Box::new(release_notes::HasFirstLevelHeader),
        Box::new(release_notes::NoEmptyHeaders),
        Box::new(structure::ModulesWithinPack),
        Box::new(version_config::VersionConfigBands),
    ]
}

/// Types that carry `version: -1`, an id and a name.
pub(crate) const ITEM_TYPES: &[ContentType] = &[
    ContentType::Integration,
    ContentType::Script,
    ContentType::Playbook,
    ContentType::TestPlaybook,
    ContentType::Classifier,
    ContentType::Mapper,
    ContentType::Dashboard,
    ContentType::IncidentField,
    ContentType::IncidentType,
    ContentType::IndicatorField,
    ContentType::IndicatorType,
    ContentType::Layout,
    ContentType::XDRCTemplate,
    ContentType::GenericField,
    ContentType::GenericType,
    ContentType::GenericModule,
    ContentType::GenericDefinition,
    ContentType::Trigger,
    ContentType::Widget,
    ContentType::Wizard,
    ContentType::Job,
    ContentType::List,
    ContentType::Report,
];

/// Words that must not appear standalone in customer-facing text.
const INTERNAL_TERMS: &[&str] = &["demisto", "test-module", "long-running-execution"];

/// Substrings in which `demisto` is acceptable.
const ALLOWED_TERM_CONTEXTS: &[&str] = &[
    "/demisto/",
    "devdemisto",
    "demistodev",
    "@demisto",
    "-demisto",
    "demisto bot",
];

static TERM_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    INTERNAL_TERMS
        .iter()
        .map(|term| {
            let pattern = format!(r"(?i)(^|[^\w-]){}([^\w-]|$)", regex::escape(term));
            (*term, Regex::new(&pattern).expect("valid term regex"))
        })
        .collect()
});

static COPYRIGHT_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(BSD|MIT|Copyright|proprietary)\b").expect("valid copyright regex")
});

/// Internal terms found in `text`, in [`INTERNAL_TERMS`] order.
pub(crate) fn internal_terms(text: &str) -> Vec<&'static str> {
    let mut masked = text.to_ascii_lowercase();
    for allowed in ALLOWED_TERM_CONTEXTS {
        masked = masked.replace(allowed, &" ".repeat(allowed.len()));
    }
    TERM_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(&masked))
        .map(|(term, _)| *term)
        .collect()
}

/// 1-based numbers of lines containing copyright words.
pub(crate) fn copyright_lines(text: &str) -> Vec<usize> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| COPYRIGHT_WORDS.is_match(line))
        .map(|(index, _)| index + 1)
        .collect()
}

/// The item in `items` at `path`.
pub(crate) fn item_at<'a>(items: &[&'a Artifact], path: &Path) -> Option<&'a Artifact> {
    items.iter().copied().find(|item| item.path == path)
}

pub(crate) fn join<T: AsRef<str>>(values: &[T]) -> String {
    values
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::content::Artifact;
    use crate::graph::ContentGraph;
    use crate::validate::context::{ExecutionMode, RunContext, ValidationContext};
    use crate::validate::results::{FixResult, ValidationResult};
    use crate::validate::validator::Validator;

    pub fn run_context() -> RunContext {
        RunContext::new("/content", ExecutionMode::AllFiles)
    }

    /// Run `validator` over every item, without applicability filtering.
    pub fn check(validator: &dyn Validator, items: &[Artifact]) -> Vec<ValidationResult> {
        check_with(validator, items, &run_context())
    }

    pub fn check_with(
        validator: &dyn Validator,
        items: &[Artifact],
        run: &RunContext,
    ) -> Vec<ValidationResult> {
        let graph = ContentGraph::build(items);
        let ctx = ValidationContext::new(run, &graph, items);
        let refs: Vec<&Artifact> = items.iter().collect();
        validator
            .obtain_invalid_content_items(&refs, &ctx)
            .expect("validator runs")
    }

    /// Run `validator` over the first item only, with the rest as context.
    pub fn check_first(validator: &dyn Validator, items: &[Artifact]) -> Vec<ValidationResult> {
        let run = run_context();
        let graph = ContentGraph::build(items);
        let ctx = ValidationContext::new(&run, &graph, items);
        validator
            .obtain_invalid_content_items(&[&items[0]], &ctx)
            .expect("validator runs")
    }

    pub fn fix(validator: &dyn Validator, item: &mut Artifact) -> FixResult {
        let run = run_context();
        let selected = vec![item.clone()];
        let graph = ContentGraph::build(&selected);
        let ctx = ValidationContext::new(&run, &graph, &selected);
        validator.fix(item, &ctx).expect("fix applies")
    }

    pub fn codes(results: &[ValidationResult]) -> Vec<&str> {
        results.iter().map(|r| r.code.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::content::artifact::test_support::artifact;
    use crate::content::version::is_lower;
    use crate::content::GitStatus;
    use crate::format::docker::test_support::StaticResolver;
    use crate::format::SharedResolver;
    use crate::graph::test_support::{item, pack, script};
    use crate::graph::ContentGraph;
    use crate::validate::context::ValidationContext;
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn internal_terms_honour_allowed_contexts() {
        assert_eq!(internal_terms("Configure the Demisto server."), vec!["demisto"]);
        assert!(internal_terms("Pull docker.io/demisto/python3 first.").is_empty());
        assert!(internal_terms("Contact devdemisto@example.com or @demisto.").is_empty());
        assert!(internal_terms("The Demisto Bot replies.").is_empty());
        assert!(internal_terms("demistobot is one word").is_empty());
    }

    #[test]
    fn internal_command_tokens_are_found() {
        assert_eq!(
            internal_terms("Run test-module, then long-running-execution."),
            vec!["test-module", "long-running-execution"]
        );
        assert!(internal_terms("my-test-module-runner").is_empty());
    }

    #[test]
    fn copyright_lines_are_one_based() {
        let code = "import x\n# Copyright 2020\nsubmit()\n# MIT licensed\n";
        assert_eq!(copyright_lines(code), vec![2, 4]);
    }

    #[test]
    fn builtins_register_both_modes_of_graph_rules() {
        let builtins = builtins();
        let gr103 = builtins.iter().filter(|v| v.code() == "GR103").count();
        assert_eq!(gr103, 2);
    }

    /// A failing item, the items selected alongside it and the files its fix rewrites.
    struct FixCase {
        target: Artifact,
        others: Vec<Artifact>,
        files: Vec<PathBuf>,
        _dir: Option<TempDir>,
    }

    impl FixCase {
        fn of(target: Artifact) -> Self {
            FixCase { target, others: Vec::new(), files: Vec::new(), _dir: None }
        }
    }

    fn changed(mut current: Artifact, old_data: Value) -> Artifact {
        let mut old = current.clone();
        old.data = old_data;
        current.git_status = Some(GitStatus::Modified);
        current.old_base = Some(Box::new(old));
        current
    }

    fn playbook(data: Value) -> Artifact {
        artifact(ContentType::Playbook, "Playbooks/p.yml", data)
    }

    fn failing_case(code: &str) -> FixCase {
        match code {
            "AS102" => {
                let meta = pack("Auto", json!({"managed": true, "source": "autonomous"}));
                FixCase::of(item(
                    "Auto",
                    &meta,
                    ContentType::Playbook,
                    "Playbooks/p.yml",
                    json!({
                        "id": "p", "name": "p", "starttaskid": "t1",
                        "tasks": {
                            "t1": {"type": "start", "nexttasks": {"#none#": ["t2"]}},
                            "t2": {"type": "regular", "displayLabel": "", "quietmode": null}
                        }
                    }),
                ))
            }
            "BC100" => FixCase::of(changed(
                artifact(
                    ContentType::Integration,
                    "Integrations/I/I.yml",
                    json!({"commonfields": {"id": "New"}, "name": "I"}),
                ),
                json!({"commonfields": {"id": "Old"}, "name": "I"}),
            )),
            "BC101" => FixCase::of(changed(
                artifact(
                    ContentType::Integration,
                    "Integrations/I/I.yml",
                    json!({"name": "I", "script": {"subtype": "python2"}}),
                ),
                json!({"name": "I", "script": {"subtype": "python3"}}),
            )),
            "BA100" => FixCase::of(artifact(
                ContentType::Wizard,
                "Wizards/w.json",
                json!({"id": "w", "name": "w", "version": 3, "fromVersion": "6.8.0"}),
            )),
            "BA101" => FixCase::of(artifact(
                ContentType::Wizard,
                "Wizards/w.json",
                json!({"id": "should_fix", "name": "Right", "version": -1, "fromVersion": "6.8.0"}),
            )),
            "BA106" => FixCase::of(artifact(
                ContentType::Integration,
                "Integrations/F/F.yml",
                json!({"commonfields": {"id": "F"}, "name": "F", "fromversion": "5.4.9", "script": {"feed": true}}),
            )),
            "BA113" => FixCase::of(artifact(
                ContentType::Script,
                "Scripts/s/s.yml",
                json!({"commonfields": {"id": "s "}, "name": "s"}),
            )),
            "DS108" => FixCase::of(artifact(
                ContentType::Script,
                "Scripts/s/s.yml",
                json!({"comment": "Does things", "outputs": [{"contextPath": "S.Out", "description": "Output "}]}),
            )),
            "DO106" => FixCase::of(artifact(
                ContentType::Script,
                "Scripts/S/S.yml",
                json!({"name": "S", "type": "python", "dockerimage": "demisto/python3:3.10.1.1"}),
            )),
            "IF112" => FixCase::of(artifact(
                ContentType::IndicatorField,
                "IndicatorFields/g.json",
                json!({"type": "grid", "fromVersion": "5.4.9"}),
            )),
            "IN124" => {
                let mut integration = artifact(
                    ContentType::Integration,
                    "Integrations/Foo/Foo.yml",
                    json!({"commonfields": {"id": "Foo"}, "configuration": [
                        {"name": "url", "type": 0, "hidden": true},
                        {"name": "proxy", "type": 8, "hidden": false}
                    ]}),
                );
                integration.git_status = Some(GitStatus::Modified);
                FixCase::of(integration)
            }
            "PB100" => FixCase::of(playbook(json!({"id": "p", "name": "p", "rolename": ["Admin"]}))),
            "PB106" => FixCase::of(playbook(json!({"tasks": {
                "1": {"scriptarguments": {"using": {"simple": "VirusTotal_instance_1"}, "ip": {"simple": "1.1.1.1"}}}
            }}))),
            "PB108" => FixCase::of(playbook(json!({"tasks": {
                "1": {"taskid": "1", "task": {"id": "1"}}
            }}))),
            "PB121" => FixCase::of(playbook(json!({
                "id": "p", "name": "p", "starttaskid": "1",
                "tasks": {"1": {
                    "type": "regular",
                    "task": {"name": "Lookup"},
                    "scriptarguments": {"ip": {"simple": "inputs.IP,8.8.8.8"}}
                }}
            }))),
            "RN111" => {
                let dir = TempDir::new().unwrap();
                let path = dir.path().join("1_0_1.md");
                let text = "#### Scripts\n\n##### S\n\n- Fixed.\n";
                std::fs::write(&path, text).unwrap();

                let meta = pack("A", json!({"currentVersion": "1.0.1"}));
                let mut note = item("A", &meta, ContentType::ReleaseNote, "ReleaseNotes/1_0_1.md", json!(text));
                note.git_status = Some(GitStatus::Added);
                note.path = path.clone();
                let mut bumped = script("A", &meta, "S", json!({"dockerimage": "demisto/py:2.0"}));
                bumped.old_base = Some(Box::new(script("A", &meta, "S", json!({"dockerimage": "demisto/py:1.0"}))));
                bumped.git_status = Some(GitStatus::Modified);
                FixCase { target: bumped, others: vec![note], files: vec![path], _dir: Some(dir) }
            }
            other => panic!("no failing fixture for auto-fixable rule {}", other),
        }
    }

    fn written_state(target: &Artifact, files: &[PathBuf]) -> Vec<String> {
        let mut state = vec![codec::dump(&target.data, target.format).unwrap()];
        state.extend(files.iter().map(|path| std::fs::read_to_string(path).unwrap()));
        state
    }

    #[test]
    fn fixes_settle_after_one_pass_and_never_widen_an_item() {
        let run = test_support::run_context().with_docker_resolver(SharedResolver::new(
            StaticResolver::with("demisto/python3", "3.10.13.9"),
        ));
        let fixable: Vec<_> = builtins().into_iter().filter(|v| v.info().auto_fixable).collect();
        assert!(fixable.len() >= 16);

        for validator in &fixable {
            let code = validator.code();
            let case = failing_case(code);
            let mut selected = vec![case.target.clone()];
            selected.extend(case.others.iter().cloned());
            let graph = ContentGraph::build(&selected);
            let ctx = ValidationContext::new(&run, &graph, &selected);

            let found = validator.obtain_invalid_content_items(&[&selected[0]], &ctx).unwrap();
            assert!(found.iter().any(|r| r.code == code), "{} fixture passes validation", code);

            let mut fixed = case.target.clone();
            validator
                .fix(&mut fixed, &ctx)
                .unwrap_or_else(|err| panic!("{} fix failed: {}", code, err));
            let once = written_state(&fixed, &case.files);

            let mut again = fixed.clone();
            if validator.fix(&mut again, &ctx).is_err() {
                again = fixed.clone();
            }
            assert_eq!(written_state(&again, &case.files), once, "{} changed on a second fix", code);

            assert!(
                !is_lower(&again.fromversion(), &case.target.fromversion()),
                "{} lowered fromversion",
                code
            );
            let allowed = case.target.marketplaces();
            assert!(
                again.marketplaces().iter().all(|m| allowed.contains(m)),
                "{} broadened marketplaces",
                code
            );
        }
    }
}
