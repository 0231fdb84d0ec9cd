use crate::inventory::group_map::GroupMap;
use indexmap::IndexSet;
use log::{debug, trace};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    hosts: Vec<String>,
}

impl Group {
    pub fn new(name: &str) -> Self {
        Group {
            name: name.to_string(),
            hosts: Vec::new(),
        }
    }

    pub fn add_host(&mut self, host_name: &str) {
        let name = host_name.to_string();
        if !self.hosts.contains(&name) {
            self.hosts.push(name);
        }
    }

    pub fn get_hosts(&self) -> &[String] {
        &self.hosts
    }
}

/// Computes every group a host belongs to, given the groups it was directly
/// assigned to and a parent -> children membership map.
///
/// The walk is breadth-first: each round collects the parents that list any
/// group of the current frontier as a child, drops the ones already in the
/// result, and continues with whatever is left. A group is never expanded
/// twice, so cycles and self references in `group_map` terminate after at
/// most one round per distinct group.
///
/// The returned set iterates in discovery order: seed groups first, then each
/// round's parents in the order they appear in `group_map`.
///
/// # Example
/// ```rust
/// use terraform_infra::{expand_groups, GroupMap};
///
/// let map: GroupMap = [("b", vec!["a"]), ("d", vec!["b", "c"])].into_iter().collect();
/// let groups = expand_groups(["a"], &map);
/// assert_eq!(groups.into_iter().collect::<Vec<_>>(), ["a", "b", "d"]);
/// ```
pub fn expand_groups<I, S>(seed_groups: I, group_map: &GroupMap) -> IndexSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut expanded: IndexSet<String> = seed_groups.into_iter().map(Into::into).collect();
    let mut frontier: IndexSet<String> = expanded.clone();
    let mut rounds = 0;

    while !frontier.is_empty() {
        rounds += 1;
        let mut discovered: IndexSet<String> = IndexSet::new();

        for (parent, children) in group_map.iter() {
            if expanded.contains(parent) || discovered.contains(parent) {
                continue;
            }
            if children.iter().any(|child| frontier.contains(child)) {
                trace!("Group '{parent}' inherits members of {frontier:?}");
                discovered.insert(parent.clone());
            }
        }

        expanded.extend(discovered.iter().cloned());
        frontier = discovered;
    }

    debug!(
        "Expanded to {} group(s) in {rounds} round(s): {expanded:?}",
        expanded.len()
    );
    expanded
}
