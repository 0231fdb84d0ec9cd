use crate::inventory::group::expand_groups;
use crate::inventory::group_map::{json_type_name, GroupMap};
use anyhow::{anyhow, bail, Result};
use indexmap::IndexMap;
use serde_json::Value;

pub type FilterFn = fn(&[Value]) -> Result<Value>;

/// Filters exposed to templating, by name.
pub fn filters() -> IndexMap<&'static str, FilterFn> {
    let mut filters: IndexMap<&'static str, FilterFn> = IndexMap::new();
    filters.insert(
        "terraform_infra_expand_groups",
        terraform_infra_expand_groups,
    );
    filters
}

pub fn apply(name: &str, args: &[Value]) -> Result<Value> {
    let filter = filters()
        .get(name)
        .copied()
        .ok_or_else(|| anyhow!("Filter {name} not supported"))?;
    filter(args)
}

/// `existing_groups | terraform_infra_expand_groups(groups_map)`
///
/// Returns the unique groups of a host: the existing ones plus every parent
/// group reachable through `groups_map`.
pub fn terraform_infra_expand_groups(args: &[Value]) -> Result<Value> {
    let [existing_groups, groups_map] = args else {
        bail!(
            "terraform_infra_expand_groups expects 2 arguments, got {}",
            args.len()
        );
    };

    let Value::Array(existing_groups) = existing_groups else {
        bail!(
            "Existing groups should be a list, got: {}",
            json_type_name(existing_groups)
        );
    };
    let seed = existing_groups
        .iter()
        .map(|group| {
            group.as_str().map(str::to_string).ok_or_else(|| {
                anyhow!("Group name should be a string, got: {}", json_type_name(group))
            })
        })
        .collect::<Result<Vec<String>>>()?;

    let group_map = GroupMap::from_json_value(groups_map)?;

    Ok(Value::Array(
        expand_groups(seed, &group_map)
            .into_iter()
            .map(Value::String)
            .collect(),
    ))
}
