use crate::inventory::group::expand_groups;
use crate::inventory::group_map::GroupMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    groups: Vec<String>,
}

impl Host {
    pub fn new(name: &str) -> Self {
        Host {
            name: name.to_string(),
            groups: Vec::new(),
        }
    }

    pub fn add_group(&mut self, group: &str) {
        let group_name = group.to_string();
        if !self.groups.contains(&group_name) {
            self.groups.push(group_name);
        }
    }

    pub fn get_groups(&self) -> &[String] {
        &self.groups
    }

    pub fn populate_ancestors(&mut self, ancestors: Vec<String>) {
        for ancestor_name in &ancestors {
            self.add_group(ancestor_name);
        }
    }

    /// Adds every group inherited through `group_map` to this host.
    pub fn expand_groups(&mut self, group_map: &GroupMap) {
        let expanded = expand_groups(self.groups.iter().cloned(), group_map);
        self.populate_ancestors(expanded.into_iter().collect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_group_keeps_insertion_order() {
        let mut host = Host::new("node-0");
        host.add_group("gpu");
        host.add_group("compute");
        host.add_group("gpu");
        assert_eq!(host.get_groups(), ["gpu", "compute"]);
    }

    #[test]
    fn test_expand_groups_adds_inherited_groups() {
        let map: GroupMap = [
            ("compute", vec!["gpu", "cpu"]),
            ("cluster", vec!["compute", "login"]),
            ("storage", vec!["nfs"]),
        ]
        .into_iter()
        .collect();

        let mut host = Host::new("node-0");
        host.add_group("gpu");
        host.expand_groups(&map);

        assert_eq!(host.get_groups(), ["gpu", "compute", "cluster"]);
    }

    #[test]
    fn test_expand_groups_without_seed_groups() {
        let map: GroupMap = [("compute", vec!["gpu"])].into_iter().collect();
        let mut host = Host::new("node-0");
        host.expand_groups(&map);
        assert!(host.get_groups().is_empty());
    }
}
