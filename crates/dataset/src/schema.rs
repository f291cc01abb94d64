//! Column contracts for the four tables. Header names are the wire
//! contract for uploaded overrides: a missing required column fails the
//! load up front instead of surfacing as a confusing aggregation error.

use crate::csv::Record;
use insights_core::{InsightsError, InsightsResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub table: &'static str,
    pub required: &'static [&'static str],
}

pub const INFLUENCERS: TableSchema = TableSchema {
    table: "influencers",
    required: &[
        "id",
        "name",
        "category",
        "gender",
        "follower_count",
        "platform",
        "influencer_type",
    ],
};

pub const POSTS: TableSchema = TableSchema {
    table: "posts",
    required: &[
        "influencer_id",
        "platform",
        "date",
        "url",
        "caption",
        "reach",
        "likes",
        "comments",
    ],
};

pub const TRACKING: TableSchema = TableSchema {
    table: "tracking_data",
    required: &[
        "influencer_id",
        "source",
        "campaign",
        "user_id",
        "product",
        "date",
        "orders",
        "revenue",
        "group",
    ],
};

pub const PAYOUTS: TableSchema = TableSchema {
    table: "payouts",
    required: &["influencer_id", "basis", "rate", "orders", "total_payout"],
};

/// A header bound against a schema. Unrecognized extra columns are kept in
/// the index map and ignored by the loader.
#[derive(Debug)]
pub struct BoundHeader {
    table: &'static str,
    indices: HashMap<String, usize>,
}

impl TableSchema {
    pub fn bind(&self, header: &[String]) -> InsightsResult<BoundHeader> {
        let indices: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();

        let missing: Vec<&str> = self
            .required
            .iter()
            .copied()
            .filter(|col| !indices.contains_key(*col))
            .collect();
        if !missing.is_empty() {
            return Err(InsightsError::Schema(format!(
                "table {:?} is missing required column(s): {}",
                self.table,
                missing.join(", ")
            )));
        }

        Ok(BoundHeader {
            table: self.table,
            indices,
        })
    }
}

impl BoundHeader {
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Raw cell text for a required column. Records shorter than the
    /// header are reported as parse errors, not panics.
    pub fn cell<'a>(&self, record: &'a Record, column: &str) -> InsightsResult<&'a str> {
        let index = *self.indices.get(column).ok_or_else(|| {
            InsightsError::Schema(format!(
                "table {:?} has no column {column:?}",
                self.table
            ))
        })?;
        record.fields.get(index).map(String::as_str).ok_or_else(|| {
            InsightsError::Parse(format!(
                "{} line {}: row has {} field(s), column {column:?} is missing",
                self.table,
                record.line,
                record.fields.len()
            ))
        })
    }

    /// Parse a required cell via `FromStr`, tagging errors with table,
    /// line and column.
    pub fn parse_cell<T>(&self, record: &Record, column: &str) -> InsightsResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.cell(record, column)?;
        raw.trim().parse::<T>().map_err(|e| {
            InsightsError::Parse(format!(
                "{} line {}, column {column:?}: invalid value {raw:?} ({e})",
                self.table, record.line
            ))
        })
    }
}
