use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Static parent -> children membership map.
///
/// A host in any of the listed child groups is also a member of the parent
/// group. Entry order is preserved so expansion results are reproducible.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupMap {
    entries: IndexMap<String, Vec<String>>,
}

impl GroupMap {
    pub fn new() -> Self {
        GroupMap {
            entries: IndexMap::new(),
        }
    }

    /// Adds `children` under `parent`, appending to any children already listed.
    pub fn insert<P, I, S>(&mut self, parent: P, children: I)
    where
        P: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry(parent.into())
            .or_default()
            .extend(children.into_iter().map(Into::into));
    }

    pub fn get(&self, parent: &str) -> Option<&[String]> {
        self.entries.get(parent).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a YAML mapping of `parent: [child, ...]`. A null value is an empty child list.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let parsed: Option<IndexMap<String, Option<Vec<String>>>> =
            serde_yaml::from_str(content).context("Group map is not a mapping of group lists")?;

        Ok(parsed
            .unwrap_or_default()
            .into_iter()
            .map(|(parent, children)| (parent, children.unwrap_or_default()))
            .collect())
    }

    pub fn from_json_value(value: &Value) -> Result<Self> {
        let Value::Object(object) = value else {
            bail!("Group map should be an object, got: {}", json_type_name(value));
        };

        let mut map = GroupMap::new();
        for (parent, children) in object {
            match children {
                Value::Array(items) => {
                    let mut names = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::String(name) => names.push(name.clone()),
                            other => bail!(
                                "Child of group '{parent}' should be a string, got: {}",
                                json_type_name(other)
                            ),
                        }
                    }
                    map.insert(parent.clone(), names);
                }
                Value::Null => map.insert(parent.clone(), Vec::<String>::new()),
                other => bail!(
                    "Children of group '{parent}' should be a list, got: {}",
                    json_type_name(other)
                ),
            }
        }

        Ok(map)
    }

    /// Loads a group map file; `.json` files are read as JSON, everything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Loading group map from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read group map file {}", path.display()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let value: Value = serde_json::from_str(&content)
                    .with_context(|| format!("Invalid JSON in {}", path.display()))?;
                Self::from_json_value(&value)
            }
            _ => Self::from_yaml_str(&content)
                .with_context(|| format!("Invalid group map in {}", path.display())),
        }
    }
}

impl<P, C> FromIterator<(P, C)> for GroupMap
where
    P: Into<String>,
    C: IntoIterator,
    C::Item: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (P, C)>>(iter: T) -> Self {
        let mut map = GroupMap::new();
        for (parent, children) in iter {
            map.insert(parent, children);
        }
        map
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Bool",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}
