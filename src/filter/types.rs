use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::FilterError;
use crate::schema::{Column, TypedValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    #[default]
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive substring match, text columns only
    Contains,
    In,
    Null,
    NotNull,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Contains => "contains",
            FilterOp::In => "in",
            FilterOp::Null => "null",
            FilterOp::NotNull => "notnull",
        }
    }

    /// Operators that ignore their value
    pub fn is_unary(&self) -> bool {
        matches!(self, FilterOp::Null | FilterOp::NotNull)
    }
}

impl FromStr for FilterOp {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "eq" => FilterOp::Eq,
            "ne" | "neq" => FilterOp::Ne,
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "contains" | "ilike" => FilterOp::Contains,
            "in" => FilterOp::In,
            "null" => FilterOp::Null,
            "notnull" => FilterOp::NotNull,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user supplied predicate, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredicateData {
    pub column: String,
    #[serde(default)]
    pub op: FilterOp,
    #[serde(default)]
    pub value: Value,
}

/// Filter request as it arrives over the wire (JSON body or query string).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    #[serde(default, rename = "where")]
    pub where_clause: Vec<PredicateData>,
    pub sort: Option<String>,
    pub dir: Option<SortDirection>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FilterData {
    /// Build from decoded query string pairs.
    ///
    /// `sort`, `dir`, `limit` and `offset` are reserved; any other key is a
    /// predicate, written `column` (equality) or `column.op`. Blank values are
    /// skipped, the way an untouched form field means "no filter".
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut data = FilterData::default();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "sort" => {
                    if !value.trim().is_empty() {
                        data.sort = Some(value.trim().to_string());
                    }
                }
                "dir" => {
                    if !value.trim().is_empty() {
                        data.dir = Some(value.parse()?);
                    }
                }
                "limit" => {
                    let limit = value
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| FilterError::InvalidLimit(value.to_string()))?;
                    data.limit = Some(limit);
                }
                "offset" => {
                    let offset = value
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| FilterError::InvalidOffset(value.to_string()))?;
                    data.offset = Some(offset);
                }
                _ => {
                    let (column, op) = match key.split_once('.') {
                        Some((column, op)) => (column, op.parse::<FilterOp>()?),
                        None => (key, FilterOp::Eq),
                    };
                    if value.trim().is_empty() && !op.is_unary() {
                        continue;
                    }
                    data.where_clause.push(PredicateData {
                        column: column.to_string(),
                        op,
                        value: Value::String(value.to_string()),
                    });
                }
            }
        }
        Ok(data)
    }
}

/// A validated predicate: the column comes from the allow-list and the
/// values are already coerced to its type.
#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: &'static Column,
    pub operator: FilterOp,
    pub values: Vec<TypedValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(FilterError::InvalidOperatorData(format!(
                "sort direction must be asc or desc, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: &'static Column,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<TypedValue>,
}
