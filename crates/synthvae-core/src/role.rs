use std::fmt;

use serde::{Deserialize, Serialize};

/// How a column is treated by transforms and comparators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Categorical,
    Temporal,
    Continuous,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Categorical => f.write_str("categorical"),
            ColumnRole::Temporal => f.write_str("temporal"),
            ColumnRole::Continuous => f.write_str("continuous"),
        }
    }
}

/// Ordered column → role lookup, resolved once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleTable {
    entries: Vec<(String, ColumnRole)>,
}

impl RoleTable {
    /// Resolve roles for `all`: categorical wins over temporal, anything
    /// unlisted is continuous.
    pub fn new(all: &[String], categorical: &[String], temporal: &[String]) -> Self {
        let entries = all
            .iter()
            .map(|name| {
                let role = if categorical.contains(name) {
                    ColumnRole::Categorical
                } else if temporal.contains(name) {
                    ColumnRole::Temporal
                } else {
                    ColumnRole::Continuous
                };
                (name.clone(), role)
            })
            .collect();
        Self { entries }
    }

    pub fn from_entries(entries: Vec<(String, ColumnRole)>) -> Self {
        Self { entries }
    }

    /// Role of `column`; columns outside the table are continuous.
    pub fn role(&self, column: &str) -> ColumnRole {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, role)| *role)
            .unwrap_or(ColumnRole::Continuous)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnRole)> {
        self.entries.iter().map(|(name, role)| (name.as_str(), *role))
    }

    pub fn columns(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn columns_with_role(&self, role: ColumnRole) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, candidate)| *candidate == role)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn roles_default_to_continuous() {
        let roles = RoleTable::new(
            &names(&["age", "gender", "admittime"]),
            &names(&["gender"]),
            &names(&["admittime"]),
        );
        assert_eq!(roles.role("age"), ColumnRole::Continuous);
        assert_eq!(roles.role("gender"), ColumnRole::Categorical);
        assert_eq!(roles.role("admittime"), ColumnRole::Temporal);
        assert_eq!(roles.role("unknown"), ColumnRole::Continuous);
        assert_eq!(roles.columns_with_role(ColumnRole::Temporal), names(&["admittime"]));
    }

    #[test]
    fn iteration_preserves_configured_order() {
        let roles = RoleTable::new(&names(&["b", "a"]), &[], &[]);
        let order: Vec<&str> = roles.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["b", "a"]);
    }
}
