// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Query call input and output.
//!
//! A [`QueryInput`] holds one filter fragment per entity; the transport ORs the
//! fragments together into a single remote query so a whole batch costs one
//! round-trip. The [`Display`](std::fmt::Display) form is a SOQL-like rendering
//! used for debug logging.

use super::record::{scalar_text, values_match, RemoteRecord};
use crate::entity::{EntityId, EntityStore};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
}

/// Composable boolean filter tree over remote field predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Compare {
        field: String,
        op: Operator,
        value: Value,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Compare {
            field: field.into(),
            op: Operator::Eq,
            value: value.into(),
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Compare {
            field: field.into(),
            op: Operator::Ne,
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Evaluate the filter against a record, resolving dotted field paths.
    pub fn matches(&self, record: &RemoteRecord) -> bool {
        match self {
            Filter::And(filters) => filters.iter().all(|f| f.matches(record)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(record)),
            Filter::Compare { field, op, value } => {
                let actual = record.get_path(field).unwrap_or(&Value::Null);
                let equal = values_match(actual, value);
                match op {
                    Operator::Eq => equal,
                    Operator::Ne => !equal,
                }
            }
            Filter::In { field, values } => {
                let actual = record.get_path(field).unwrap_or(&Value::Null);
                values.iter().any(|v| values_match(actual, v))
            }
        }
    }
}

fn quote(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) | Value::Number(_) => scalar_text(value).unwrap_or_default(),
        other => {
            let text = scalar_text(other).unwrap_or_else(|| other.to_string());
            format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = |f: &mut fmt::Formatter<'_>, filters: &[Filter], joiner: &str| {
            let parts: Vec<String> = filters.iter().map(ToString::to_string).collect();
            write!(f, "({})", parts.join(joiner))
        };
        match self {
            Filter::And(filters) => group(f, filters, " AND "),
            Filter::Or(filters) => group(f, filters, " OR "),
            Filter::Compare { field, op, value } => {
                let op = match op {
                    Operator::Eq => "=",
                    Operator::Ne => "!=",
                };
                write!(f, "{} {} {}", field, op, quote(value))
            }
            Filter::In { field, values } => {
                let values: Vec<String> = values.iter().map(quote).collect();
                write!(f, "{} IN ({})", field, values.join(", "))
            }
        }
    }
}

/// Query call input: source object, selected columns, and per-entity filters.
#[derive(Debug, Clone, Default)]
pub struct QueryInput {
    pub from: String,
    columns: Vec<String>,
    fragments: EntityStore<Filter>,
}

impl QueryInput {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Default::default()
        }
    }

    /// Add a column unless it is already selected (case-insensitive).
    pub fn select(&mut self, column: impl Into<String>) -> bool {
        let column = column.into();
        if self.has_column(&column) {
            return false;
        }
        self.columns.push(column);
        true
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(column))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Attach an entity's filter fragment, AND-ing with any existing one.
    pub fn add_fragment(&mut self, entity: EntityId, filter: Filter) {
        let combined = match self.fragments.remove(entity) {
            Some(Filter::And(mut existing)) => {
                existing.push(filter);
                Filter::And(existing)
            }
            Some(existing) => Filter::And(vec![existing, filter]),
            None => filter,
        };
        self.fragments.insert(entity, combined);
    }

    pub fn fragment(&self, entity: EntityId) -> Option<&Filter> {
        self.fragments.get(entity)
    }

    /// Number of entities that contributed a filter fragment.
    pub fn count(&self) -> usize {
        self.fragments.len()
    }

    /// The batch filter: every entity fragment OR-ed together.
    pub fn filter(&self) -> Option<Filter> {
        match self.fragments.len() {
            0 => None,
            1 => self.fragments.iter().next().map(|(_, f)| f.clone()),
            _ => Some(Filter::Or(
                self.fragments.iter().map(|(_, f)| f.clone()).collect(),
            )),
        }
    }
}

impl fmt::Display for QueryInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {} FROM {}", self.columns.join(", "), self.from)?;
        if let Some(filter) = self.filter() {
            write!(f, " WHERE {}", filter)?;
        }
        Ok(())
    }
}

/// Ordered records returned by a query; positions are stable row indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput(pub Vec<RemoteRecord>);

impl QueryOutput {
    pub fn get(&self, row: usize) -> Option<&RemoteRecord> {
        self.0.get(row)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &RemoteRecord)> {
        self.0.iter().enumerate()
    }

    pub fn records(&self) -> &[RemoteRecord] {
        &self.0
    }
}

impl fmt::Display for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} record(s)", self.0.len())?;
        for (row, record) in self.iter() {
            write!(f, "\n  [{}] {}", row, Value::Object(record.0.clone()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RemoteRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_select_deduplicates_case_insensitively() {
        let mut input = QueryInput::new("Account");
        assert!(input.select("Id"));
        assert!(input.select("Name"));
        assert!(!input.select("name"));
        assert_eq!(input.columns(), &["Id".to_string(), "Name".to_string()]);
    }

    #[test]
    fn test_display_renders_or_of_fragments() {
        let mut input = QueryInput::new("Account");
        input.select("Id");
        input.add_fragment(EntityId(1), Filter::is_in("Name", ["O'Hara"]));
        input.add_fragment(EntityId(2), Filter::eq("Ext__c", 42));

        assert_eq!(
            input.to_string(),
            "SELECT Id FROM Account WHERE (Name IN ('O\\'Hara') OR Ext__c = 42)"
        );
    }

    #[test]
    fn test_add_fragment_ands_repeated_fragments() {
        let mut input = QueryInput::new("Contact");
        input.add_fragment(EntityId(1), Filter::eq("Email", "a@x"));
        input.add_fragment(EntityId(1), Filter::ne("AccountId", ""));
        assert_eq!(input.count(), 1);
        assert!(matches!(input.fragment(EntityId(1)), Some(Filter::And(parts)) if parts.len() == 2));
    }

    #[test]
    fn test_empty_input_has_no_filter() {
        let input = QueryInput::new("Account");
        assert_eq!(input.count(), 0);
        assert!(input.filter().is_none());
        assert_eq!(input.to_string(), "SELECT  FROM Account");
    }

    #[test]
    fn test_filter_matches_nested_and_case_insensitive() {
        let contact = record(json!({"Email": "ADA@example.com", "AccountId": "001", "Account": {"Name": "AE"}}));

        assert!(Filter::eq("Email", "ada@example.com").matches(&contact));
        assert!(Filter::ne("AccountId", "").matches(&contact));
        assert!(Filter::is_in("Account.Name", ["x", "ae"]).matches(&contact));
        assert!(!Filter::and(vec![
            Filter::eq("Email", "ada@example.com"),
            Filter::eq("Account.Name", "other"),
        ])
        .matches(&contact));
        assert!(Filter::or(vec![
            Filter::eq("Email", "nobody"),
            Filter::eq("Account.Name", "ae"),
        ])
        .matches(&contact));
    }

    #[test]
    fn test_ne_empty_rejects_missing_field() {
        let orphan = record(json!({"Email": "a@x"}));
        assert!(!Filter::ne("AccountId", "").matches(&orphan));
    }
}
