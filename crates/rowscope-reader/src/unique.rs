use rowscope_model::{ColumnUniqueValues, UniqueValues, Value, ValueKey};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Default)]
struct ColumnAccumulator {
    name: String,
    values: Vec<Value>,
    seen: HashSet<ValueKey>,
    counts: BTreeMap<String, u64>,
}

/// Accumulates distinct values (and optionally counts) for a fixed set of
/// columns.
///
/// Rows are fed positionally: slot `i` of each observed row belongs to the
/// `i`-th tracked column.
#[derive(Debug)]
pub struct UniqueValueAggregator {
    columns: Vec<ColumnAccumulator>,
    limit: usize,
    add_count: bool,
}

impl UniqueValueAggregator {
    /// `limit == 0` keeps every distinct value.
    pub fn new(columns: Vec<String>, limit: usize, add_count: bool) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|name| ColumnAccumulator {
                    name,
                    ..ColumnAccumulator::default()
                })
                .collect(),
            limit,
            add_count,
        }
    }

    pub fn observe(&mut self, row: &[Value]) {
        let limit = self.limit;
        for (acc, value) in self.columns.iter_mut().zip(row) {
            if (limit == 0 || acc.values.len() < limit) && acc.seen.insert(value.key()) {
                acc.values.push(value.clone());
            }
            if self.add_count {
                *acc.counts.entry(value.count_key()).or_insert(0) += 1;
            }
        }
    }

    /// Every tracked column holds `limit` values, so further rows cannot change them.
    pub fn is_saturated(&self) -> bool {
        self.limit > 0 && self.columns.iter().all(|c| c.values.len() >= self.limit)
    }

    pub fn finish(self, sort: bool) -> UniqueValues {
        UniqueValues::new(
            self.columns
                .into_iter()
                .map(|mut acc| {
                    if sort {
                        acc.values.sort_by(Value::ascending_cmp);
                    }
                    (
                        acc.name,
                        ColumnUniqueValues {
                            values: acc.values,
                            counts: acc.counts,
                        },
                    )
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_bounds_values_but_not_counts() {
        let mut agg = UniqueValueAggregator::new(vec!["A".to_owned()], 2, true);
        for v in [1.0, 2.0, 3.0, 1.0] {
            agg.observe(&[Value::Number(v)]);
        }
        assert!(agg.is_saturated());
        let result = agg.finish(false);
        let col = result.get("A").unwrap();
        assert_eq!(col.values, vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(col.counts.get("1"), Some(&2));
        assert_eq!(col.counts.get("3"), Some(&1));
    }

    #[test]
    fn nulls_are_distinct_and_counted_as_null() {
        let mut agg = UniqueValueAggregator::new(vec!["A".to_owned()], 0, true);
        agg.observe(&[Value::Null]);
        agg.observe(&[Value::Null]);
        agg.observe(&[Value::from("x")]);
        assert!(!agg.is_saturated());
        let result = agg.finish(true);
        let col = result.get("a").unwrap();
        assert_eq!(col.values, vec![Value::from("x"), Value::Null]);
        assert_eq!(col.counts.get("null"), Some(&2));
    }
}
