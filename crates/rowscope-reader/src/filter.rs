//! Row filters.
//!
//! [`FilterExpr`] names columns; [`Filter::compile`] resolves them against a
//! dataset's metadata so evaluation in the scan loop is index based.

use crate::error::{ReadError, Result};
use regex::Regex;
use rowscope_model::{DatasetMetadata, Value, ValueKey};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A pure test over one positional row.
///
/// Implementations must not depend on the order rows are presented in.
pub trait RowPredicate {
    fn matches(&self, row: &[Value]) -> bool;
}

impl<F> RowPredicate for F
where
    F: Fn(&[Value]) -> bool,
{
    fn matches(&self, row: &[Value]) -> bool {
        self(row)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connector {
    And,
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOp {
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterExpr {
    Cmp {
        column: String,
        op: CmpOp,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    NotIn {
        column: String,
        values: Vec<Value>,
    },
    Text {
        column: String,
        op: TextOp,
        pattern: String,
        #[serde(default)]
        case_insensitive: bool,
    },
    Regex {
        column: String,
        pattern: String,
    },
    IsNull {
        column: String,
    },
    IsNotNull {
        column: String,
    },
    /// True when every child matches (vacuously true when empty).
    And {
        exprs: Vec<FilterExpr>,
    },
    /// True when any child matches (false when empty).
    Or {
        exprs: Vec<FilterExpr>,
    },
    Not {
        expr: Box<FilterExpr>,
    },
}

impl FilterExpr {
    pub fn cmp(column: impl Into<String>, op: CmpOp, value: impl Into<Value>) -> Self {
        FilterExpr::Cmp {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn and(self, other: FilterExpr) -> Self {
        match self {
            FilterExpr::And { mut exprs } => {
                exprs.push(other);
                FilterExpr::And { exprs }
            }
            this => FilterExpr::And {
                exprs: vec![this, other],
            },
        }
    }

    pub fn or(self, other: FilterExpr) -> Self {
        match self {
            FilterExpr::Or { mut exprs } => {
                exprs.push(other);
                FilterExpr::Or { exprs }
            }
            this => FilterExpr::Or {
                exprs: vec![this, other],
            },
        }
    }

    /// Combine a flat condition list with the connectors between them,
    /// left to right: `c0 k0 c1 k1 c2` is `((c0 k0 c1) k1 c2)`.
    ///
    /// Missing connectors default to [`Connector::And`]; extra ones are ignored.
    pub fn from_conditions(
        conditions: impl IntoIterator<Item = FilterExpr>,
        connectors: &[Connector],
    ) -> Option<Self> {
        let mut conditions = conditions.into_iter();
        let mut expr = conditions.next()?;
        for (idx, next) in conditions.enumerate() {
            expr = match connectors.get(idx).copied().unwrap_or(Connector::And) {
                Connector::And => expr.and(next),
                Connector::Or => expr.or(next),
            };
        }
        Some(expr)
    }
}

#[derive(Debug)]
enum Compiled {
    Cmp {
        col: usize,
        op: CmpOp,
        value: Value,
    },
    In {
        col: usize,
        keys: HashSet<ValueKey>,
        negate: bool,
    },
    Text {
        col: usize,
        op: TextOp,
        pattern: String,
        case_insensitive: bool,
    },
    Regex {
        col: usize,
        re: Regex,
    },
    IsNull {
        col: usize,
    },
    IsNotNull {
        col: usize,
    },
    And(Vec<Compiled>),
    Or(Vec<Compiled>),
    Not(Box<Compiled>),
}

/// A [`FilterExpr`] bound to concrete column positions.
#[derive(Debug)]
pub struct Filter {
    root: Compiled,
}

impl Filter {
    /// Resolve every referenced column and compile patterns.
    ///
    /// Unknown columns are reported together as [`ReadError::ColumnsNotFound`].
    pub fn compile(expr: &FilterExpr, metadata: &DatasetMetadata) -> Result<Self> {
        let mut missing = Vec::new();
        let root = compile(expr, metadata, &mut missing)?;
        if !missing.is_empty() {
            return Err(ReadError::ColumnsNotFound(missing));
        }
        Ok(Self { root })
    }
}

impl RowPredicate for Filter {
    fn matches(&self, row: &[Value]) -> bool {
        eval(&self.root, row)
    }
}

fn compile(
    expr: &FilterExpr,
    metadata: &DatasetMetadata,
    missing: &mut Vec<String>,
) -> Result<Compiled> {
    let mut column = |name: &str| match metadata.column_index(name) {
        Some(idx) => idx,
        None => {
            if !missing.iter().any(|m| m == name) {
                missing.push(name.to_owned());
            }
            usize::MAX
        }
    };

    Ok(match expr {
        FilterExpr::Cmp {
            column: name,
            op,
            value,
        } => Compiled::Cmp {
            col: column(name),
            op: *op,
            value: value.clone(),
        },
        FilterExpr::In {
            column: name,
            values,
        }
        | FilterExpr::NotIn {
            column: name,
            values,
        } => Compiled::In {
            col: column(name),
            keys: values.iter().map(Value::key).collect(),
            negate: matches!(expr, FilterExpr::NotIn { .. }),
        },
        FilterExpr::Text {
            column: name,
            op,
            pattern,
            case_insensitive,
        } => Compiled::Text {
            col: column(name),
            op: *op,
            pattern: if *case_insensitive {
                pattern.to_lowercase()
            } else {
                pattern.clone()
            },
            case_insensitive: *case_insensitive,
        },
        FilterExpr::Regex {
            column: name,
            pattern,
        } => {
            let col = column(name);
            let re = Regex::new(pattern).map_err(|err| {
                ReadError::InvalidFilter(format!("bad pattern {pattern:?}: {err}"))
            })?;
            Compiled::Regex { col, re }
        }
        FilterExpr::IsNull { column: name } => Compiled::IsNull { col: column(name) },
        FilterExpr::IsNotNull { column: name } => Compiled::IsNotNull { col: column(name) },
        FilterExpr::And { exprs } => Compiled::And(
            exprs
                .iter()
                .map(|e| compile(e, metadata, missing))
                .collect::<Result<_>>()?,
        ),
        FilterExpr::Or { exprs } => Compiled::Or(
            exprs
                .iter()
                .map(|e| compile(e, metadata, missing))
                .collect::<Result<_>>()?,
        ),
        FilterExpr::Not { expr } => Compiled::Not(Box::new(compile(expr, metadata, missing)?)),
    })
}

fn cell(row: &[Value], col: usize) -> &Value {
    row.get(col).unwrap_or(&Value::Null)
}

fn eval(expr: &Compiled, row: &[Value]) -> bool {
    match expr {
        Compiled::Cmp { col, op, value } => compare(cell(row, *col), *op, value),
        Compiled::In { col, keys, negate } => keys.contains(&cell(row, *col).key()) != *negate,
        Compiled::Text {
            col,
            op,
            pattern,
            case_insensitive,
        } => {
            let Some(text) = cell(row, *col).as_str() else {
                return false;
            };
            let lowered;
            let text = if *case_insensitive {
                lowered = text.to_lowercase();
                lowered.as_str()
            } else {
                text
            };
            match op {
                TextOp::Contains => text.contains(pattern.as_str()),
                TextOp::StartsWith => text.starts_with(pattern.as_str()),
                TextOp::EndsWith => text.ends_with(pattern.as_str()),
            }
        }
        Compiled::Regex { col, re } => cell(row, *col).as_str().is_some_and(|s| re.is_match(s)),
        Compiled::IsNull { col } => cell(row, *col).is_null(),
        Compiled::IsNotNull { col } => !cell(row, *col).is_null(),
        Compiled::And(exprs) => exprs.iter().all(|e| eval(e, row)),
        Compiled::Or(exprs) => exprs.iter().any(|e| eval(e, row)),
        Compiled::Not(inner) => !eval(inner, row),
    }
}

/// Nulls and mismatched types only satisfy `Ne` (or `Eq` against a null literal).
fn compare(cell: &Value, op: CmpOp, value: &Value) -> bool {
    match op {
        CmpOp::Eq => cell.key() == value.key(),
        CmpOp::Ne => cell.key() != value.key(),
        _ => {
            let ordering = match (cell, value) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            };
            match (ordering, op) {
                (Some(Ordering::Less), CmpOp::Lt | CmpOp::Lte) => true,
                (Some(Ordering::Greater), CmpOp::Gt | CmpOp::Gte) => true,
                (Some(Ordering::Equal), CmpOp::Lte | CmpOp::Gte) => true,
                _ => false,
            }
        }
    }
}
