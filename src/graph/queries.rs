//! Named queries over the content graph.
//!
//! Every query returns its results sorted by the source node's
//! `(content_type, object_id, path)` so reports are stable between runs.
//! Queries that take `paths` restrict the *source* items to those paths;
//! `None` means every item.

use super::{ContentGraph, EdgeKind, GraphNode, NodeKind};
use crate::content::pack::PLATFORM_MODULES;
use crate::content::{ContentType, Marketplace};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::PathBuf;

/// An item whose display name collides with other items of the same type.
#[derive(Debug, Clone)]
pub struct DuplicateName<'g> {
    pub node: &'g GraphNode,
    pub duplicates: Vec<&'g GraphNode>,
}

/// A playbook and the dependencies that fall outside its allowed set.
#[derive(Debug, Clone)]
pub struct DependencyViolation<'g> {
    pub playbook: &'g GraphNode,
    pub invalid: Vec<&'g GraphNode>,
}

/// A usage edge whose target is not available in every source marketplace.
#[derive(Debug, Clone)]
pub struct MarketplaceViolation<'g> {
    pub source: &'g GraphNode,
    pub target: &'g GraphNode,
    pub missing: Vec<Marketplace>,
}

/// An item whose modules are not all supported by the items it uses.
#[derive(Debug, Clone)]
pub struct ModuleMismatch<'g> {
    pub source: &'g GraphNode,
    /// Each offending dependency with the modules it lacks.
    pub missing: Vec<(&'g GraphNode, Vec<String>)>,
}

/// A usage edge with its declaring field.
#[derive(Debug, Clone)]
pub struct Usage<'g> {
    pub source: &'g GraphNode,
    pub target: &'g GraphNode,
    pub field: String,
}

impl ContentGraph {
    fn sources(&self, paths: Option<&[PathBuf]>) -> Vec<NodeIndex> {
        let mut sources: Vec<NodeIndex> = match paths {
            Some(paths) => paths
                .iter()
                .filter_map(|p| self.index_for_path(p))
                .collect(),
            None => self.item_indices().collect(),
        };
        sources.sort_by(|a, b| self.node(*a).sort_key().cmp(&self.node(*b).sort_key()));
        sources.dedup();
        sources
    }

    /// Items whose display name is shared with another item of the same type
    /// targeting an overlapping marketplace.
    pub fn duplicate_display_names(
        &self,
        content_type: Option<ContentType>,
        paths: Option<&[PathBuf]>,
    ) -> Vec<DuplicateName<'_>> {
        let mut groups: BTreeMap<(ContentType, String), Vec<NodeIndex>> = BTreeMap::new();
        for index in self.item_indices() {
            let node = self.node(index);
            let Some(ct) = node.content_type else { continue };
            if ct == ContentType::Pack || node.display_name.is_empty() {
                continue;
            }
            if content_type.is_some_and(|wanted| wanted != ct) {
                continue;
            }
            groups
                .entry((ct, node.display_name.clone()))
                .or_default()
                .push(index);
        }

        let mut results = Vec::new();
        for index in self.sources(paths) {
            let node = self.node(index);
            let Some(ct) = node.content_type else { continue };
            let Some(group) = groups.get(&(ct, node.display_name.clone())) else {
                continue;
            };
            let mut duplicates: Vec<&GraphNode> = group
                .iter()
                .filter(|&&other| other != index)
                .map(|&other| self.node(other))
                .filter(|other| other.marketplaces.iter().any(|m| node.marketplaces.contains(m)))
                .collect();
            if duplicates.is_empty() {
                continue;
            }
            duplicates.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
            results.push(DuplicateName { node, duplicates });
        }
        results
    }

    /// Playbooks in autonomous packs depending on items that are neither in a
    /// core pack nor in an autonomous pack.
    pub fn find_autonomous_playbooks_with_invalid_dependencies(
        &self,
        paths: Option<&[PathBuf]>,
        core_packs: &[String],
    ) -> Vec<DependencyViolation<'_>> {
        self.playbooks_with_invalid_dependencies(
            paths,
            core_packs,
            |node| node.pack_autonomous,
        )
    }

    /// Playbooks in managed packs depending on items that are neither in a
    /// core pack nor in a managed pack.
    pub fn find_managed_playbooks_with_invalid_dependencies(
        &self,
        paths: Option<&[PathBuf]>,
        core_packs: &[String],
    ) -> Vec<DependencyViolation<'_>> {
        self.playbooks_with_invalid_dependencies(paths, core_packs, |node| node.pack_managed)
    }

    fn playbooks_with_invalid_dependencies(
        &self,
        paths: Option<&[PathBuf]>,
        core_packs: &[String],
        in_scope: fn(&GraphNode) -> bool,
    ) -> Vec<DependencyViolation<'_>> {
        let allowed = |node: &GraphNode| {
            node.pack
                .as_ref()
                .is_some_and(|pack| core_packs.iter().any(|core| core == pack))
                || in_scope(node)
        };

        let mut results = Vec::new();
        for start in self.sources(paths) {
            let playbook = self.node(start);
            if playbook.content_type != Some(ContentType::Playbook) || !in_scope(playbook) {
                continue;
            }

            let mut invalid: Vec<&GraphNode> = Vec::new();
            let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
            let mut queue = VecDeque::from([start]);

            while let Some(current) = queue.pop_front() {
                for (target, edge) in self.outgoing(current) {
                    if !edge.kind.is_usage() || !visited.insert(target) {
                        continue;
                    }
                    let node = self.node(target);
                    match node.kind {
                        NodeKind::Item => {
                            if allowed(node) {
                                queue.push_back(target);
                            } else {
                                invalid.push(node);
                            }
                        }
                        NodeKind::Command => {
                            let providers = self.command_providers(target);
                            if !providers.is_empty()
                                && !providers.iter().any(|&p| allowed(self.node(p)))
                            {
                                invalid.push(node);
                            }
                        }
                        NodeKind::Unknown | NodeKind::Image => {}
                    }
                }
            }

            if !invalid.is_empty() {
                invalid.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
                results.push(DependencyViolation { playbook, invalid });
            }
        }
        results
    }

    /// Usage edges whose target lacks some of the source's marketplaces.
    ///
    /// Targets in core packs are exempt.
    pub fn uses_items_not_in_marketplace(
        &self,
        paths: Option<&[PathBuf]>,
        core_packs: &[String],
    ) -> Vec<MarketplaceViolation<'_>> {
        let mut results = Vec::new();
        for index in self.sources(paths) {
            let source = self.node(index);
            for (target_index, edge) in self.outgoing(index) {
                if !edge.kind.is_usage() {
                    continue;
                }
                let target = self.node(target_index);
                let available: Vec<Marketplace> = match target.kind {
                    NodeKind::Item => {
                        if target
                            .pack
                            .as_ref()
                            .is_some_and(|p| core_packs.iter().any(|c| c == p))
                        {
                            continue;
                        }
                        target.marketplaces.clone()
                    }
                    NodeKind::Command => {
                        let providers = self.command_providers(target_index);
                        if providers.is_empty() {
                            continue;
                        }
                        providers
                            .iter()
                            .flat_map(|&p| self.node(p).marketplaces.clone())
                            .collect()
                    }
                    NodeKind::Unknown | NodeKind::Image => continue,
                };
                let missing: Vec<Marketplace> = source
                    .marketplaces
                    .iter()
                    .filter(|m| !available.contains(m))
                    .copied()
                    .collect();
                if !missing.is_empty() {
                    results.push(MarketplaceViolation {
                        source,
                        target,
                        missing,
                    });
                }
            }
        }
        results
    }

    /// Items using content that declares fewer modules than they run in.
    ///
    /// Deprecated items and test playbooks are skipped, as are targets that
    /// declare no modules.
    pub fn module_mismatches(&self, paths: Option<&[PathBuf]>) -> Vec<ModuleMismatch<'_>> {
        let mut results = Vec::new();
        for index in self.sources(paths) {
            let source = self.node(index);
            if source.deprecated || source.content_type == Some(ContentType::TestPlaybook) {
                continue;
            }
            let modules: Vec<String> = source.supported_modules.clone().unwrap_or_else(|| {
                PLATFORM_MODULES.iter().map(|m| m.to_string()).collect()
            });
            let mut missing: Vec<(&GraphNode, Vec<String>)> = Vec::new();
            for (target_index, edge) in self.outgoing(index) {
                let target = self.node(target_index);
                if !edge.kind.is_usage() || !target.is_item() {
                    continue;
                }
                let Some(available) = &target.supported_modules else {
                    continue;
                };
                let lacking: Vec<String> = modules
                    .iter()
                    .filter(|m| !available.contains(m))
                    .cloned()
                    .collect();
                if !lacking.is_empty() && !missing.iter().any(|(seen, _)| std::ptr::eq(*seen, target)) {
                    missing.push((target, lacking));
                }
            }
            if !missing.is_empty() {
                results.push(ModuleMismatch { source, missing });
            }
        }
        results
    }

    /// Usage edges pointing at unknown content or commands nothing provides.
    pub fn unknown_content_usages(&self, paths: Option<&[PathBuf]>) -> Vec<Usage<'_>> {
        self.usages(paths, |graph, index| {
            let node = graph.node(index);
            node.kind == NodeKind::Unknown
                || (node.kind == NodeKind::Command && graph.command_providers(index).is_empty())
        })
    }

    /// Usage edges from non-deprecated items to deprecated items.
    pub fn deprecated_usages(&self, paths: Option<&[PathBuf]>) -> Vec<Usage<'_>> {
        self.usages(paths, |graph, index| {
            let node = graph.node(index);
            match node.kind {
                NodeKind::Item => node.deprecated,
                NodeKind::Command => {
                    let providers = graph.command_providers(index);
                    !providers.is_empty() && providers.iter().all(|&p| graph.node(p).deprecated)
                }
                _ => false,
            }
        })
    }

    fn usages(
        &self,
        paths: Option<&[PathBuf]>,
        matches: fn(&ContentGraph, NodeIndex) -> bool,
    ) -> Vec<Usage<'_>> {
        let mut results = Vec::new();
        for index in self.sources(paths) {
            let source = self.node(index);
            if source.deprecated {
                continue;
            }
            for (target, edge) in self.outgoing(index) {
                if edge.kind.is_usage() && matches(self, target) {
                    results.push(Usage {
                        source,
                        target: self.node(target),
                        field: edge.field.clone(),
                    });
                }
            }
        }
        results
    }

    /// Whether an edge of `kind` leaves the node at `index`.
    pub fn has_edge_kind(&self, index: NodeIndex, kind: EdgeKind) -> bool {
        self.outgoing(index).iter().any(|(_, e)| e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use serde_json::json;

    fn core() -> Vec<String> {
        vec!["Base".to_string()]
    }

    #[test]
    fn autonomous_dependency_outside_core_is_invalid() {
        let auto = pack("Auto", json!({"managed": true, "source": "autonomous"}));
        let other = pack("Other", json!({}));
        let base = pack("Base", json!({}));
        let items = vec![
            pack_item("Auto", &auto),
            pack_item("Other", &other),
            pack_item("Base", &base),
            playbook_using("Auto", &auto, "AutoPB", "Helper"),
            script("Other", &other, "Helper", json!({})),
            playbook_using("Auto", &auto, "AutoPB2", "BaseScript"),
            script("Base", &base, "BaseScript", json!({})),
        ];
        let graph = ContentGraph::build(&items);

        let violations = graph.find_autonomous_playbooks_with_invalid_dependencies(None, &core());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].playbook.object_id, "AutoPB");
        assert_eq!(violations[0].invalid[0].object_id, "Helper");
    }

    #[test]
    fn autonomous_query_respects_path_filter() {
        let auto = pack("Auto", json!({"managed": true, "source": "autonomous"}));
        let other = pack("Other", json!({}));
        let items = vec![
            playbook_using("Auto", &auto, "AutoPB", "Helper"),
            script("Other", &other, "Helper", json!({})),
        ];
        let graph = ContentGraph::build(&items);

        let unrelated = vec![PathBuf::from("/content/Packs/Other/Scripts/Helper/Helper.yml")];
        assert!(graph
            .find_autonomous_playbooks_with_invalid_dependencies(Some(&unrelated), &core())
            .is_empty());
    }

    #[test]
    fn managed_query_allows_other_managed_packs() {
        let managed = pack("M", json!({"managed": true}));
        let managed2 = pack("M2", json!({"managed": true}));
        let items = vec![
            playbook_using("M", &managed, "MPB", "Helper"),
            script("M2", &managed2, "Helper", json!({})),
        ];
        let graph = ContentGraph::build(&items);
        assert!(graph
            .find_managed_playbooks_with_invalid_dependencies(None, &core())
            .is_empty());
    }

    #[test]
    fn marketplace_gap_is_reported() {
        let a = pack("A", json!({}));
        let items = vec![
            playbook_using("A", &a, "PB", "S"),
            script("A", &a, "S", json!({"marketplaces": ["xsoar"]})),
        ];
        let graph = ContentGraph::build(&items);

        let violations = graph.uses_items_not_in_marketplace(None, &core());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].missing, vec![Marketplace::MarketplaceV2]);
    }

    #[test]
    fn duplicate_display_names_need_overlapping_marketplaces() {
        let a = pack("A", json!({}));
        let items = vec![
            script("A", &a, "S1", json!({"name": "Same", "marketplaces": ["xsoar"]})),
            script("A", &a, "S2", json!({"name": "Same", "marketplaces": ["xsoar"]})),
            script("A", &a, "S3", json!({"name": "Same", "marketplaces": ["xpanse"]})),
        ];
        let graph = ContentGraph::build(&items);

        let dups = graph.duplicate_display_names(Some(ContentType::Script), None);
        let ids: Vec<_> = dups.iter().map(|d| d.node.object_id.as_str()).collect();
        assert_eq!(ids, vec!["S1", "S2"]);
        assert_eq!(dups[0].duplicates.len(), 1);
    }

    #[test]
    fn unknown_and_deprecated_usages() {
        let a = pack("A", json!({}));
        let items = vec![
            playbook_using("A", &a, "PB1", "Missing"),
            playbook_using("A", &a, "PB2", "Old"),
            script("A", &a, "Old", json!({"deprecated": true})),
        ];
        let graph = ContentGraph::build(&items);

        let unknown = graph.unknown_content_usages(None);
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].source.object_id, "PB1");

        let deprecated = graph.deprecated_usages(None);
        assert_eq!(deprecated.len(), 1);
        assert_eq!(deprecated[0].target.object_id, "Old");
    }

    #[test]
    fn results_are_sorted() {
        let a = pack("A", json!({}));
        let items = vec![
            playbook_using("A", &a, "Zed", "Missing"),
            playbook_using("A", &a, "Alpha", "Missing"),
        ];
        let graph = ContentGraph::build(&items);
        let ids: Vec<_> = graph
            .unknown_content_usages(None)
            .iter()
            .map(|u| u.source.object_id.clone())
            .collect();
        assert_eq!(ids, vec!["Alpha", "Zed"]);
    }

    #[test]
    fn module_mismatches_compare_against_declaring_targets() {
        let narrow = pack("Narrow", json!({"supportedModules": ["C1"]}));
        let open = pack("Open", json!({}));
        let mut scoped = playbook_using("Open", &open, "Scoped", "Helper");
        scoped.data["supportedModules"] = json!(["C1"]);
        let items = vec![
            script("Narrow", &narrow, "Helper", json!({})),
            playbook_using("Open", &open, "Everywhere", "Helper"),
            scoped,
            playbook_using("Open", &open, "Loose", "Unrestricted"),
            script("Open", &open, "Unrestricted", json!({})),
        ];
        let graph = ContentGraph::build(&items);

        let mismatches = graph.module_mismatches(None);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].source.object_id, "Everywhere");
        let (target, lacking) = &mismatches[0].missing[0];
        assert_eq!(target.object_id, "Helper");
        assert!(!lacking.contains(&"C1".to_string()));
        assert_eq!(lacking.len(), PLATFORM_MODULES.len() - 1);
    }
}
