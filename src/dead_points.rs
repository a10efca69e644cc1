//! The record of points discarded from the live population.

use std::sync::Arc;

use arrow::{
    array::{ArrayRef, Float64Array},
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use itertools::Itertools;

/// One discarded point.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadPoint {
    pub log_l: f64,
    /// Prior mass assigned to the point.
    pub weight: f64,
    pub position: Vec<f64>,
}

/// Append-only buffer used while the run is in progress.
#[derive(Debug, Default)]
pub(crate) struct DeadPointBuilder {
    log_l: Vec<f64>,
    weight: Vec<f64>,
    positions: Vec<Vec<f64>>,
}

impl DeadPointBuilder {
    pub(crate) fn with_capacity(dim: usize, capacity: usize) -> Self {
        DeadPointBuilder {
            log_l: Vec::with_capacity(capacity),
            weight: Vec::with_capacity(capacity),
            positions: (0..dim).map(|_| Vec::with_capacity(capacity)).collect(),
        }
    }

    pub(crate) fn push(&mut self, log_l: f64, weight: f64, position: &[f64]) {
        assert_eq!(position.len(), self.positions.len());
        self.log_l.push(log_l);
        self.weight.push(weight);
        self.positions
            .iter_mut()
            .zip(position)
            .for_each(|(column, &value)| column.push(value));
    }

    pub(crate) fn len(&self) -> usize {
        self.log_l.len()
    }

    pub(crate) fn finalize(self, names: Vec<String>) -> DeadPoints {
        assert_eq!(names.len(), self.positions.len());
        DeadPoints {
            names,
            log_l: self.log_l,
            weight: self.weight,
            columns: self.positions,
        }
    }
}

/// The frozen dead points of a finished run.
///
/// Rows are in the order the points were discarded: first the main loop in
/// nondecreasing `log_l`, then the surviving live points that share the
/// remaining prior mass.
#[derive(Debug, Clone)]
pub struct DeadPoints {
    names: Vec<String>,
    log_l: Vec<f64>,
    weight: Vec<f64>,
    columns: Vec<Vec<f64>>,
}

impl DeadPoints {
    pub fn len(&self) -> usize {
        self.log_l.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_l.is_empty()
    }

    pub fn parameter_names(&self) -> &[String] {
        &self.names
    }

    pub fn log_l(&self) -> &[f64] {
        &self.log_l
    }

    pub fn weight(&self) -> &[f64] {
        &self.weight
    }

    /// Values of one parameter across all dead points.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(&self.columns[idx])
    }

    pub(crate) fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    pub fn row(&self, index: usize) -> Option<DeadPoint> {
        let log_l = *self.log_l.get(index)?;
        Some(DeadPoint {
            log_l,
            weight: self.weight[index],
            position: self.columns.iter().map(|col| col[index]).collect(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = DeadPoint> + '_ {
        (0..self.len()).filter_map(|idx| self.row(idx))
    }

    /// The recorded point with the highest log-likelihood.
    pub fn max_likelihood(&self) -> Option<DeadPoint> {
        let idx = self
            .log_l
            .iter()
            .copied()
            .position_max_by(|a, b| a.total_cmp(b))?;
        self.row(idx)
    }

    /// Export as an Arrow record batch with columns `log_l`, `weight` and
    /// one column per parameter.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let mut fields = vec![
            Field::new("log_l", DataType::Float64, false),
            Field::new("weight", DataType::Float64, false),
        ];
        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(Float64Array::from(self.log_l.clone())),
            Arc::new(Float64Array::from(self.weight.clone())),
        ];
        for (name, column) in self.columns() {
            fields.push(Field::new(name, DataType::Float64, false));
            arrays.push(Arc::new(Float64Array::from(column.to_vec())));
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use pretty_assertions::assert_eq;

    fn dead_points() -> DeadPoints {
        let mut builder = DeadPointBuilder::with_capacity(2, 3);
        builder.push(-4., 0.5, &[1., 10.]);
        builder.push(-1., 0.25, &[2., 20.]);
        builder.push(-2., 0.25, &[3., 30.]);
        assert_eq!(builder.len(), 3);
        builder.finalize(vec!["a".to_string(), "b".to_string()])
    }

    #[test]
    fn columns_are_keyed_by_name() {
        let dead = dead_points();
        assert_eq!(dead.len(), 3);
        assert_eq!(dead.column("b"), Some(&[10., 20., 30.][..]));
        assert_eq!(dead.column("c"), None);
        assert_eq!(
            dead.row(1),
            Some(DeadPoint {
                log_l: -1.,
                weight: 0.25,
                position: vec![2., 20.],
            })
        );
        assert_eq!(dead.row(3), None);
        assert_eq!(dead.iter().count(), 3);
    }

    #[test]
    fn max_likelihood_point() {
        let best = dead_points().max_likelihood().unwrap();
        assert_eq!(best.log_l, -1.);
        assert_eq!(best.position, vec![2., 20.]);
    }

    #[test]
    fn record_batch_layout() {
        let batch = dead_points().to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 4);
        let names = batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["log_l", "weight", "a", "b"]);
        let weight = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(weight.len(), 3);
        assert_eq!(weight.value(0), 0.5);
    }
}
