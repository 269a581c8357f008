//! Argument validation shared by the sink factory and the tabular/database
//! sinks.

use std::collections::HashSet;

use arrow::array::{Array, ArrayRef};

use crate::error::{Result, SinkError};
use crate::value::Args;

/// Constant columns captured at sink creation and merged into every batch.
///
/// Names are non-empty and unique, and every value has length 1.
#[derive(Debug, Clone, Default)]
pub struct ExtraColumns {
    columns: Vec<(String, ArrayRef)>,
}

impl ExtraColumns {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArrayRef)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }
}

/// Require every argument to carry a non-empty, unique name.
///
/// Returns the arguments as `(name, value)` pairs in call order.
pub fn named_values(args: Args) -> Result<Vec<(String, ArrayRef)>> {
    let mut values = Vec::with_capacity(args.len());
    for (position, arg) in args.into_iter().enumerate() {
        match arg.name {
            Some(name) if !name.is_empty() => values.push((name, arg.value)),
            _ => return Err(SinkError::UnnamedArgument { position }),
        }
    }

    let duplicates = duplicated_names(values.iter().map(|(name, _)| name.as_str()));
    if !duplicates.is_empty() {
        return Err(SinkError::DuplicateArgumentName(duplicates));
    }

    Ok(values)
}

/// Validate the extra columns given to the factory.
pub fn extra_columns(args: Args) -> Result<ExtraColumns> {
    let columns = named_values(args)?;

    let non_scalar: Vec<(String, usize)> = columns
        .iter()
        .filter(|(_, value)| value.len() != 1)
        .map(|(name, value)| (name.clone(), value.len()))
        .collect();
    if !non_scalar.is_empty() {
        return Err(SinkError::NonScalarExtraColumn(non_scalar));
    }

    Ok(ExtraColumns { columns })
}

/// Validate the arguments of a data-call against the sink's extra columns.
///
/// Checks naming, rejects names that shadow an extra column, and checks that
/// every value can be recycled to the common (maximum) length. Returns the
/// values in call order together with that length.
pub fn batch_values(
    args: Args,
    extra: &ExtraColumns,
) -> Result<(Vec<(String, ArrayRef)>, usize)> {
    let values = named_values(args)?;

    let shadowed: Vec<String> = values
        .iter()
        .filter(|(name, _)| extra.contains(name))
        .map(|(name, _)| name.clone())
        .collect();
    if !shadowed.is_empty() {
        return Err(SinkError::DuplicateArgumentName(shadowed));
    }

    let rows = common_length(&values)?;
    Ok((values, rows))
}

/// The recycled length of a set of values: the maximum length, which every
/// other length must divide exactly.
pub fn common_length(values: &[(String, ArrayRef)]) -> Result<usize> {
    let rows = values.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    if rows == 0 {
        return Ok(0);
    }

    let compatible = values
        .iter()
        .all(|(_, v)| v.len() != 0 && rows % v.len() == 0);
    if compatible {
        Ok(rows)
    } else {
        Err(SinkError::IncompatibleLengths(
            values
                .iter()
                .map(|(name, v)| (name.clone(), v.len()))
                .collect(),
        ))
    }
}

/// Names that occur more than once, each listed once in first-seen order.
fn duplicated_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    for name in names {
        if !seen.insert(name) && !duplicates.iter().any(|d| d == name) {
            duplicates.push(name.to_string());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    #[test]
    fn test_named_values_keeps_call_order() {
        let values = named_values(args![b = 1, a = 2]).unwrap();
        let names: Vec<&str> = values.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_unnamed_argument_rejected_with_position() {
        let err = named_values(args![a = 1, 2]).unwrap_err();
        assert!(matches!(err, SinkError::UnnamedArgument { position: 1 }));
    }

    #[test]
    fn test_empty_name_counts_as_unnamed() {
        let err = named_values(Args::new().named("", 1)).unwrap_err();
        assert!(matches!(err, SinkError::UnnamedArgument { position: 0 }));
    }

    #[test]
    fn test_duplicates_listed_once_each() {
        let err = named_values(args![a = 1, b = 2, a = 3, b = 4, a = 5, c = 6]).unwrap_err();
        match err {
            SinkError::DuplicateArgumentName(names) => assert_eq!(names, vec!["a", "b"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extra_columns_accept_scalars() {
        let extra = extra_columns(args![run = 1, label = "baseline"]).unwrap();
        assert_eq!(extra.len(), 2);
        assert_eq!(extra.names().collect::<Vec<_>>(), vec!["run", "label"]);
    }

    #[test]
    fn test_extra_columns_reject_every_non_scalar() {
        let err =
            extra_columns(args![run = 1, seeds = vec![1, 2, 3], empty = Vec::<f64>::new()])
                .unwrap_err();
        match err {
            SinkError::NonScalarExtraColumn(entries) => assert_eq!(
                entries,
                vec![("seeds".to_string(), 3), ("empty".to_string(), 0)]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extra_columns_reject_unnamed() {
        let err = extra_columns(args![1]).unwrap_err();
        assert!(matches!(err, SinkError::UnnamedArgument { .. }));
    }

    #[test]
    fn test_recycling_scalar_against_vector() {
        let (_, rows) =
            batch_values(args![a = 1, b = vec![1, 2, 3, 4, 5]], &ExtraColumns::default()).unwrap();
        assert_eq!(rows, 5);
    }

    #[test]
    fn test_recycling_requires_exact_multiple() {
        let err = batch_values(args![a = vec![1, 2], b = vec![1, 2, 3, 4, 5]], &ExtraColumns::default())
            .unwrap_err();
        match err {
            SinkError::IncompatibleLengths(entries) => assert_eq!(
                entries,
                vec![("a".to_string(), 2), ("b".to_string(), 5)]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_recycling_divisor_lengths() {
        let (_, rows) = batch_values(
            args![a = vec![1, 2], b = vec![1, 2, 3, 4, 5, 6], c = 0.5],
            &ExtraColumns::default(),
        )
        .unwrap();
        assert_eq!(rows, 6);
    }

    #[test]
    fn test_empty_value_cannot_recycle() {
        let err = batch_values(args![a = Vec::<i64>::new(), b = 1], &ExtraColumns::default())
            .unwrap_err();
        assert!(matches!(err, SinkError::IncompatibleLengths(_)));
    }

    #[test]
    fn test_all_empty_values_give_zero_rows() {
        let (_, rows) = batch_values(
            args![a = Vec::<i64>::new(), b = Vec::<f64>::new()],
            &ExtraColumns::default(),
        )
        .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_batch_name_shadowing_extra_column() {
        let extra = extra_columns(args![run = 1]).unwrap();
        let err = batch_values(args![x = 1, run = 2], &extra).unwrap_err();
        match err {
            SinkError::DuplicateArgumentName(names) => assert_eq!(names, vec!["run"]),
            other => panic!("unexpected error: {other}"),
        }
    }
}
