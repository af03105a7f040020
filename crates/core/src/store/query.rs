use std::cmp::Ordering;

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// The field equals the value.
    Eq,
    /// The field is an array holding the value.
    Contains,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub value: Value,
    pub kind: Match,
}

impl Condition {
    fn matches(&self, content: &Map<String, Value>) -> bool {
        let Some(actual) = content.get(&self.field) else {
            return false;
        };
        match self.kind {
            Match::Eq => values_equal(actual, &self.value),
            Match::Contains => actual
                .as_array()
                .is_some_and(|items| items.iter().any(|item| values_equal(item, &self.value))),
        }
    }
}

/// Conjunction of top-level field conditions.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, field: String, value: Value, kind: Match) -> Self {
        self.conditions.retain(|existing| existing.field != field);
        self.conditions.push(Condition { field, value, kind });
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field.into(), value.into(), Match::Eq)
    }

    /// Add a condition only when a value is present.
    pub fn eq_opt<V: Into<Value>>(self, field: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    pub fn contains(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field.into(), value.into(), Match::Contains)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, content: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|condition| condition.matches(content))
    }

    /// The filter as a JSON object, for `@>` containment queries.
    pub fn as_containment(&self) -> Value {
        let object: Map<String, Value> = self
            .conditions
            .iter()
            .map(|condition| {
                let value = match condition.kind {
                    Match::Eq => condition.value.clone(),
                    Match::Contains => Value::Array(vec![condition.value.clone()]),
                };
                (condition.field.clone(), value)
            })
            .collect();
        Value::Object(object)
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// A top-level content field.
    Field(String),
    CreatedAt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub descending: bool,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Sort {
            key: SortKey::Field(field.into()),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Sort {
            key: SortKey::Field(field.into()),
            descending: true,
        }
    }

    pub fn newest_first() -> Self {
        Sort {
            key: SortKey::CreatedAt,
            descending: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Query {
            filter,
            ..Default::default()
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Ordering used for sorting on a content field. Missing values sort first,
/// then null, booleans, numbers, strings; arrays and objects compare equal.
pub fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// A foreign-key relationship from a child collection to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildLink {
    pub collection: &'static str,
    pub foreign_key: &'static str,
}

impl ChildLink {
    pub const fn new(collection: &'static str, foreign_key: &'static str) -> Self {
        ChildLink {
            collection,
            foreign_key,
        }
    }
}
