//! Watched query model and the query-execution seam.
//!
//! A [`Query`] is the registry key of the watch subsystem, so it is compared
//! and hashed by value: two structurally identical queries share one entry.

mod executor;


use std::fmt;

use bytes::Bytes;
pub use executor::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderField {
    Key,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderBy {
    pub field: OrderField,
    pub desc: bool,
}

/// Continuous query: a key pattern plus result shaping
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    /// Glob-style key pattern (`*` any run, `?` one character)
    pub key_regex: String,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(key_regex: impl Into<String>) -> Self {
        Self {
            key_regex: key_regex.into(),
            order_by: None,
            limit: None,
        }
    }

    pub fn order_by(
        mut self,
        field: OrderField,
        desc: bool,
    ) -> Self {
        self.order_by = Some(OrderBy { field, desc });
        self
    }

    pub fn limit(
        mut self,
        limit: usize,
    ) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `true` when the pattern names exactly one key
    pub fn is_exact_key(&self) -> bool {
        !self.key_regex.contains(['*', '?'])
    }
}

impl fmt::Display for Query {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "SELECT $key, $value WHERE $key like '{}'", self.key_regex)?;
        if let Some(order) = &self.order_by {
            let field = match order.field {
                OrderField::Key => "$key",
                OrderField::Value => "$value",
            };
            let direction = if order.desc { "DESC" } else { "ASC" };
            write!(f, " ORDER BY {field} {direction}")?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}

/// Rows matched by a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub rows: Vec<(String, Bytes)>,
}

impl QueryResult {
    /// Applies the query's ordering and limit in place.
    pub fn shape(
        &mut self,
        query: &Query,
    ) {
        match query.order_by {
            Some(OrderBy {
                field: OrderField::Value,
                desc,
            }) => {
                self.rows.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                if desc {
                    self.rows.reverse();
                }
            }
            Some(OrderBy {
                field: OrderField::Key,
                desc,
            }) => {
                self.rows.sort_by(|a, b| a.0.cmp(&b.0));
                if desc {
                    self.rows.reverse();
                }
            }
            // stable output for clients even without ORDER BY
            None => self.rows.sort_by(|a, b| a.0.cmp(&b.0)),
        }

        if let Some(limit) = query.limit {
            self.rows.truncate(limit);
        }
    }

    /// Merges per-shard results, then re-applies ordering and limit.
    pub fn merge(
        query: &Query,
        parts: impl IntoIterator<Item = QueryResult>,
    ) -> QueryResult {
        let mut merged = QueryResult {
            rows: parts.into_iter().flat_map(|part| part.rows).collect(),
        };
        merged.shape(query);
        merged
    }
}
