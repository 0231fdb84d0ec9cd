use crate::inventory::group::Group;
use crate::inventory::group_map::{json_type_name, GroupMap};
use crate::inventory::host::Host;
use crate::terraform::TerraformOutputs;
use anyhow::{anyhow, bail, Result};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

pub const ALL_GROUP: &str = "all";
pub const UNGROUPED_GROUP: &str = "ungrouped";

#[derive(Debug, Serialize)]
struct HostGroup {
    hosts: IndexMap<String, HostVars>,
}

#[derive(Debug, Serialize)]
struct HostVars {}

/// Collects provisioned hosts with their directly assigned groups and turns
/// them into a group -> hosts inventory, inherited groups included.
#[derive(Clone, Debug, Default)]
pub struct InventoryBuilder {
    group_map: GroupMap,
    hosts: IndexMap<String, Host>,
}

impl InventoryBuilder {
    pub fn new(group_map: GroupMap) -> Self {
        InventoryBuilder {
            group_map,
            hosts: IndexMap::new(),
        }
    }

    /// Registers `name` with `seed_groups`. Adding a host twice merges its groups.
    pub fn add_host<I, S>(&mut self, name: &str, seed_groups: I) -> &mut Host
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let host = self
            .hosts
            .entry(name.to_string())
            .or_insert_with(|| Host::new(name));
        for group in seed_groups {
            host.add_group(group.as_ref());
        }
        host
    }

    /// Reads hosts from the Terraform output named `key`, whose value maps each
    /// host name to an object with an optional `groups` list.
    pub fn from_terraform_outputs(
        outputs: &TerraformOutputs,
        key: &str,
        group_map: GroupMap,
    ) -> Result<Self> {
        let output = outputs
            .get(key)
            .ok_or_else(|| anyhow!("Terraform output '{key}' not found"))?;

        let Value::Object(hosts) = &output.value else {
            bail!(
                "Terraform output '{key}' should be an object of hosts, got: {}",
                json_type_name(&output.value)
            );
        };

        let mut builder = InventoryBuilder::new(group_map);
        for (host_name, host_data) in hosts {
            let groups = match host_data.get("groups") {
                Some(Value::Array(groups)) => groups
                    .iter()
                    .map(|group| {
                        group.as_str().map(str::to_string).ok_or_else(|| {
                            anyhow!(
                                "Group of host '{host_name}' should be a string, got: {}",
                                json_type_name(group)
                            )
                        })
                    })
                    .collect::<Result<Vec<String>>>()?,
                Some(Value::Null) | None => Vec::new(),
                Some(other) => bail!(
                    "Groups of host '{host_name}' should be a list, got: {}",
                    json_type_name(other)
                ),
            };
            debug!("Host '{host_name}' assigned to {groups:?}");
            builder.add_host(host_name, groups);
        }

        if builder.hosts.is_empty() {
            warn!("Terraform output '{key}' does not contain any hosts");
        }

        Ok(builder)
    }

    /// Groups in first-seen order, starting with `all`. Hosts without any
    /// group are placed in `ungrouped`.
    pub fn build(&self) -> IndexMap<String, Group> {
        let mut groups: IndexMap<String, Group> = IndexMap::new();
        groups.insert(ALL_GROUP.to_string(), Group::new(ALL_GROUP));

        for host in self.hosts.values() {
            let mut host = host.clone();
            host.expand_groups(&self.group_map);

            groups
                .entry(ALL_GROUP.to_string())
                .or_insert_with(|| Group::new(ALL_GROUP))
                .add_host(&host.name);

            if host.get_groups().is_empty() {
                groups
                    .entry(UNGROUPED_GROUP.to_string())
                    .or_insert_with(|| Group::new(UNGROUPED_GROUP))
                    .add_host(&host.name);
                continue;
            }

            for group_name in host.get_groups() {
                groups
                    .entry(group_name.clone())
                    .or_insert_with(|| Group::new(group_name))
                    .add_host(&host.name);
            }
        }

        groups
    }

    /// Renders the inventory as YAML: `group: { hosts: { host: {} } }`.
    pub fn to_yaml(&self) -> Result<String> {
        let inventory: IndexMap<String, HostGroup> = self
            .build()
            .into_iter()
            .map(|(name, group)| {
                let hosts = group
                    .get_hosts()
                    .iter()
                    .map(|host| (host.clone(), HostVars {}))
                    .collect();
                (name, HostGroup { hosts })
            })
            .collect();

        Ok(serde_yaml::to_string(&inventory)?)
    }
}
