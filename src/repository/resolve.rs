use std::ops::ControlFlow;
use tracing::{debug, warn};

use super::AddressRepository;
use crate::error::Result;
use crate::index::IndexStub;
use crate::levels::{can_be_parent, check_structure};
use crate::matching::{registry_links, SearchContext, REJECT_COST};
use crate::models::{
    AddrLevel, ItemRole, ParsedAddressHierarchy, ParsedAddressItem, RepositoryNode, ROOT_ID,
};

/// Returned by [`AddressRepository::add`] when the first area item cannot
/// start an address
pub const NOT_ADMISSIBLE: i64 = -1;

impl AddressRepository {
    /// Resolve `hierarchy` without changing the repository. Stops at the first
    /// item with no match; every resolved item gets its `resolved_node` set.
    /// Returns the number of resolved items.
    pub fn search(&mut self, hierarchy: &mut ParsedAddressHierarchy) -> Result<usize> {
        self.resolve(hierarchy, false)?;
        Ok(hierarchy
            .items
            .iter()
            .filter(|it| it.resolved_node.is_some())
            .count())
    }

    /// Resolve `hierarchy`, creating the nodes that do not exist yet.
    /// Returns the number of created nodes, or [`NOT_ADMISSIBLE`] without
    /// touching the repository.
    pub fn add(&mut self, hierarchy: &mut ParsedAddressHierarchy) -> Result<i64> {
        self.resolve(hierarchy, true)
    }

    fn resolve(&mut self, hierarchy: &mut ParsedAddressHierarchy, write: bool) -> Result<i64> {
        hierarchy.clear_resolution();

        let mut area_path = Vec::new();
        let (mut plot, mut house, mut room) = (None, None, None);
        for (i, item) in hierarchy.items.iter().enumerate() {
            match item.role() {
                ItemRole::Area => area_path.push(i),
                ItemRole::Plot => {
                    plot.get_or_insert(i);
                }
                ItemRole::House => {
                    house.get_or_insert(i);
                }
                ItemRole::Room => {
                    room.get_or_insert(i);
                }
            }
        }

        let Some(&first) = area_path.first() else {
            return Ok(0);
        };
        if !hierarchy.items[first].level.is_admissible_root() {
            debug!(
                "Address starts at {}, not a top level: {}",
                hierarchy.items[first].level, hierarchy
            );
            return Ok(NOT_ADMISSIBLE);
        }
        for issue in check_structure(hierarchy) {
            debug!(
                "Items {} and {} cannot nest: {}",
                issue.parent_index, issue.child_index, hierarchy
            );
        }

        // Broadest first, the nearest ancestor is the last element
        let mut ancestors: Vec<RepositoryNode> = Vec::new();
        let mut created: i64 = 0;
        let mut changed = false;

        for &i in &area_path {
            let item = &hierarchy.items[i];
            let ctx = self.scorer.build_search_context(item, &self.types);
            let found = match self.best_candidate(&ctx, &ancestors) {
                Some(stub) => match self.objects.get(stub.id, &self.types)? {
                    Some(node) => Some((stub, node)),
                    None => {
                        warn!("Candidate index refers to missing node {}", stub.id);
                        None
                    }
                },
                None => None,
            };

            let (node, linked) = match found {
                Some((stub, mut node)) => {
                    if write {
                        let corrected = self.scorer.correct(
                            &ctx,
                            item,
                            &mut node,
                            &stub,
                            ancestors.last(),
                        );
                        if corrected {
                            self.objects.add(node.id, &node, &mut self.types)?;
                            self.dirty = true;
                            changed = true;
                        }
                        if self.register_keys(&ctx, &node) {
                            changed = true;
                        }
                    }
                    debug!("Matched '{}' to {}", item, node);
                    let linked = nests_under(&node, ancestors.last());
                    (node, linked)
                }
                None if !write => {
                    debug!("No match for '{}'", item);
                    return Ok(created);
                }
                None => {
                    let (node, linked) = self.create_area_node(&ctx, item, ancestors.last())?;
                    created += 1;
                    changed = true;
                    (node, linked)
                }
            };

            hierarchy.items[i].resolved_node = Some(node.id);
            if linked {
                ancestors.push(node);
            }
        }

        if !ancestors.is_empty() {
            for i in [plot, house, room].into_iter().flatten() {
                let item = &hierarchy.items[i];
                let Some(parent) = ancestors.last() else {
                    break;
                };
                let (parent_id, parent_level) = (parent.id, parent.level);

                let keys = self.scorer.leaf_search_keys(item);
                if keys.is_empty() {
                    debug!("No leaf keys for '{}'", item);
                    break;
                }
                let hit = self
                    .cache
                    .get_or_load(parent_id, &self.partitions)?
                    .find_first(&keys);

                let (node, linked) = match hit {
                    Some(id) => match self.objects.get(id, &self.types)? {
                        Some(node) => {
                            if write {
                                let partition =
                                    self.cache.get_or_load(parent_id, &self.partitions)?;
                                let mut inserted = false;
                                for key in &keys {
                                    inserted |= partition.insert(key, id);
                                }
                                if inserted {
                                    self.dirty = true;
                                }
                            }
                            debug!("Matched '{}' to {}", item, node);
                            let linked = node
                                .level
                                .zip(parent_level)
                                .is_some_and(|(cl, pl)| can_be_parent(cl, pl));
                            (node, linked)
                        }
                        None => {
                            warn!("Partition {} refers to missing node {}", parent_id, id);
                            break;
                        }
                    },
                    None if !write => {
                        debug!("No match for '{}' under {}", item, parent_id);
                        break;
                    }
                    None => {
                        let level = leaf_level(item);
                        let id = self.objects.max_key()? + 1;
                        let mut node = RepositoryNode::new(id, item.spelling(), level);
                        let linked = parent_level.is_some_and(|pl| can_be_parent(level, pl));
                        if linked {
                            node.parent_ids.push(parent_id);
                        } else {
                            warn!("Created {} unlinked: cannot nest under {}", node, parent_id);
                        }
                        self.objects.add(id, &node, &mut self.types)?;
                        let partition = self.cache.get_or_load(parent_id, &self.partitions)?;
                        for key in &keys {
                            partition.insert(key, id);
                        }
                        debug!("Created {}", node);
                        self.dirty = true;
                        created += 1;
                        changed = true;
                        (node, linked)
                    }
                };

                hierarchy.items[i].resolved_node = Some(node.id);
                if linked {
                    ancestors.push(node);
                }
            }
        }

        if changed {
            self.link_chain(&ancestors)?;
        }
        Ok(created)
    }

    /// Cheapest acceptable stub over all search keys, stopping at an exact match
    fn best_candidate(
        &self,
        ctx: &SearchContext,
        ancestors: &[RepositoryNode],
    ) -> Option<IndexStub> {
        let hint1 = ancestors.last();
        let hint2 = ancestors.len().checked_sub(2).map(|i| &ancestors[i]);

        let scan = ctx
            .keys
            .iter()
            .flat_map(|key| self.index.find(key).iter())
            .try_fold(None::<(u32, &IndexStub)>, |best, stub| {
                let cost = self.scorer.score(ctx, stub, hint1, hint2);
                let best = match best {
                    Some((c, _)) if c <= cost => best,
                    _ if cost < REJECT_COST => Some((cost, stub)),
                    _ => best,
                };
                match best {
                    Some((0, _)) => ControlFlow::Break(best),
                    _ => ControlFlow::Continue(best),
                }
            });
        let (ControlFlow::Break(best) | ControlFlow::Continue(best)) = scan;
        best.map(|(_, stub)| stub.clone())
    }

    fn create_area_node(
        &mut self,
        ctx: &SearchContext,
        item: &ParsedAddressItem,
        parent: Option<&RepositoryNode>,
    ) -> Result<(RepositoryNode, bool)> {
        let id = self.objects.max_key()? + 1;
        let mut node = RepositoryNode::new(id, item.spelling(), item.level);
        node.types = ctx.types.clone();
        node.registry_links = registry_links(item);

        let linked = match parent {
            Some(p) => {
                let ok = p.level.is_some_and(|pl| can_be_parent(item.level, pl));
                if ok {
                    node.parent_ids.push(p.id);
                } else {
                    warn!("Created {} unlinked: cannot nest under {}", node, p);
                }
                ok
            }
            None => true,
        };

        self.objects.add(id, &node, &mut self.types)?;
        self.register_keys(ctx, &node);
        self.dirty = true;
        debug!("Created {}", node);
        Ok((node, linked))
    }

    /// Index `node` under the context keys; true when the index changed
    fn register_keys(&mut self, ctx: &SearchContext, node: &RepositoryNode) -> bool {
        let stub = IndexStub {
            id: node.id,
            level: node.level,
            type_ids: node
                .types
                .iter()
                .filter_map(|t| self.types.find(t))
                .collect(),
            parents: node.parent_ids.clone(),
        };
        let mut changed = false;
        for key in &ctx.keys {
            changed |= self.index.add(key, stub.clone());
        }
        if changed {
            self.dirty = true;
        }
        changed
    }

    /// Persist the root edge and every missing parent edge along the chain
    fn link_chain(&mut self, chain: &[RepositoryNode]) -> Result<()> {
        self.dirty = true;
        self.objects.flush()?;

        let mut edges_changed = false;
        if let Some(top) = chain.first() {
            edges_changed |= self.add_edge(ROOT_ID, top.id)?;
        }
        for pair in chain.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            match (parent.level, child.level) {
                (Some(pl), Some(cl)) if can_be_parent(cl, pl) => {
                    edges_changed |= self.add_edge(parent.id, child.id)?;
                }
                _ => warn!("Skipped edge {} -> {}: levels cannot nest", parent, child),
            }
        }
        if edges_changed {
            self.children.flush()?;
        }
        Ok(())
    }

    fn add_edge(&mut self, parent_id: u64, child_id: u64) -> Result<bool> {
        let mut child_ids = self.children.get(parent_id)?.unwrap_or_default();
        if child_ids.contains(&child_id) {
            return Ok(false);
        }
        child_ids.push(child_id);
        self.children.add(parent_id, &child_ids)?;
        Ok(true)
    }
}

/// Whether `node` extends the chain below `parent`, the same test a freshly
/// created node passes
fn nests_under(node: &RepositoryNode, parent: Option<&RepositoryNode>) -> bool {
    match parent {
        Some(p) => matches!((node.level, p.level), (Some(cl), Some(pl)) if can_be_parent(cl, pl)),
        None => true,
    }
}

/// Level of a node created for a plot, house or room item
fn leaf_level(item: &ParsedAddressItem) -> AddrLevel {
    match item.role() {
        ItemRole::Plot => AddrLevel::Plot,
        ItemRole::Room => AddrLevel::Apartment,
        ItemRole::House | ItemRole::Area => AddrLevel::Building,
    }
}
