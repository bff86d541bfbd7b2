//! Aligned sample table: one predictand and a pool of predictor columns
//! keyed by water year.

use crate::core::predictor::{PredictorId, PredictorSet};
use crate::error::{NotEvaluable, Result, SearchError};
use crate::utils::linalg::Matrix;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Water year of a date: October through December belong to the next year.
pub fn water_year(date: NaiveDate) -> i32 {
    if date.month() >= 10 {
        date.year() + 1
    } else {
        date.year()
    }
}

/// How rows with missing predictor values are treated when building a
/// design matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Keep only rows where every selected predictor is observed.
    CompleteRows,
    /// Keep rows where at least one selected predictor is observed; the
    /// regression handles the remaining NaNs itself.
    AnyObserved,
}

/// Training matrix for one predictor set.
#[derive(Debug, Clone)]
pub struct Design {
    /// Water year of each retained row.
    pub years: Vec<i32>,
    /// One column per predictor, in set order.
    pub x: Matrix,
    /// Predictand value of each retained row.
    pub y: Vec<f64>,
}

impl Design {
    pub fn n_samples(&self) -> usize {
        self.y.len()
    }

    /// Subset of rows, in the given order (indices may repeat).
    pub fn select_rows(&self, indices: &[usize]) -> Design {
        Design {
            years: indices.iter().map(|&i| self.years[i]).collect(),
            x: self.x.select_rows(indices),
            y: indices.iter().map(|&i| self.y[i]).collect(),
        }
    }
}

/// Predictand plus predictor pool, aligned on a shared sample index.
#[derive(Debug, Clone)]
pub struct Dataset {
    years: Vec<i32>,
    predictand: Vec<f64>,
    predictor_ids: Vec<PredictorId>,
    columns: Vec<Vec<f64>>,
    index: HashMap<PredictorId, usize>,
}

impl Dataset {
    /// Build a dataset from aligned columns.
    ///
    /// Every column must have one value per year. Rows whose predictand is
    /// missing are dropped. Predictor values may be NaN.
    pub fn new(
        years: Vec<i32>,
        predictand: Vec<f64>,
        predictors: Vec<(PredictorId, Vec<f64>)>,
    ) -> Result<Self> {
        if years.is_empty() || predictand.is_empty() {
            return Err(SearchError::EmptyData);
        }
        if years.len() != predictand.len() {
            return Err(SearchError::DimensionMismatch {
                expected: years.len(),
                got: predictand.len(),
            });
        }
        if predictors.is_empty() {
            return Err(SearchError::EmptyPredictorPool);
        }

        let mut seen_years = HashSet::with_capacity(years.len());
        for &year in &years {
            if !seen_years.insert(year) {
                return Err(SearchError::DuplicateSample(year));
            }
        }

        let mut index = HashMap::with_capacity(predictors.len());
        for (i, (id, values)) in predictors.iter().enumerate() {
            if values.len() != years.len() {
                return Err(SearchError::DimensionMismatch {
                    expected: years.len(),
                    got: values.len(),
                });
            }
            if index.insert(id.clone(), i).is_some() {
                return Err(SearchError::DuplicatePredictor(id.to_string()));
            }
        }

        let keep: Vec<usize> = (0..years.len())
            .filter(|&i| predictand[i].is_finite())
            .collect();
        if keep.is_empty() {
            return Err(SearchError::EmptyData);
        }

        let dropped = years.len() - keep.len();
        if dropped > 0 {
            tracing::debug!(dropped, "dropped samples with missing predictand");
        }

        let (predictor_ids, columns): (Vec<PredictorId>, Vec<Vec<f64>>) = predictors
            .into_iter()
            .map(|(id, values)| (id, keep.iter().map(|&i| values[i]).collect()))
            .unzip();

        Ok(Self {
            years: keep.iter().map(|&i| years[i]).collect(),
            predictand: keep.iter().map(|&i| predictand[i]).collect(),
            predictor_ids,
            columns,
            index,
        })
    }

    /// Build a dataset from `(year, value)` series. Predictors are aligned
    /// onto the predictand's years; years a predictor lacks become NaN.
    pub fn from_year_series(
        predictand: &[(i32, f64)],
        predictors: Vec<(PredictorId, Vec<(i32, f64)>)>,
    ) -> Result<Self> {
        let years: Vec<i32> = predictand.iter().map(|(y, _)| *y).collect();
        let values: Vec<f64> = predictand.iter().map(|(_, v)| *v).collect();

        let mut aligned = Vec::with_capacity(predictors.len());
        for (id, series) in predictors {
            let mut by_year = BTreeMap::new();
            for (year, value) in series {
                if by_year.insert(year, value).is_some() {
                    return Err(SearchError::DuplicateSample(year));
                }
            }
            let column = years
                .iter()
                .map(|y| by_year.get(y).copied().unwrap_or(f64::NAN))
                .collect();
            aligned.push((id, column));
        }

        Self::new(years, values, aligned)
    }

    /// Build a dataset from dated series, keyed by [`water_year`].
    pub fn from_dated_series(
        predictand: &[(NaiveDate, f64)],
        predictors: Vec<(PredictorId, Vec<(NaiveDate, f64)>)>,
    ) -> Result<Self> {
        let to_years = |series: &[(NaiveDate, f64)]| -> Vec<(i32, f64)> {
            series.iter().map(|(d, v)| (water_year(*d), *v)).collect()
        };
        let predictors = predictors
            .into_iter()
            .map(|(id, series)| (id, to_years(&series)))
            .collect();
        Self::from_year_series(&to_years(predictand), predictors)
    }

    pub fn n_samples(&self) -> usize {
        self.years.len()
    }

    pub fn n_predictors(&self) -> usize {
        self.predictor_ids.len()
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn predictand(&self) -> &[f64] {
        &self.predictand
    }

    pub fn predictor_ids(&self) -> &[PredictorId] {
        &self.predictor_ids
    }

    pub fn contains(&self, id: &PredictorId) -> bool {
        self.index.contains_key(id)
    }

    /// Column of one predictor.
    pub fn column(&self, id: &PredictorId) -> Option<&[f64]> {
        self.index.get(id).map(|&i| self.columns[i].as_slice())
    }

    /// The whole pool as a set.
    pub fn all_predictors(&self) -> PredictorSet {
        self.predictor_ids.iter().collect()
    }

    /// Drop predictors with more missing values than half the predictand
    /// length. Returns the ids that were removed.
    pub fn drop_sparse_predictors(&mut self) -> Vec<PredictorId> {
        let limit = self.predictand.len() as f64 / 2.0;
        let mut dropped = Vec::new();
        let mut kept_ids = Vec::with_capacity(self.predictor_ids.len());
        let mut kept_columns = Vec::with_capacity(self.columns.len());

        for (id, column) in self.predictor_ids.drain(..).zip(self.columns.drain(..)) {
            let missing = column.iter().filter(|v| !v.is_finite()).count();
            if missing as f64 > limit {
                tracing::info!(predictor = %id, missing, "dropping sparse predictor");
                dropped.push(id);
            } else {
                kept_ids.push(id);
                kept_columns.push(column);
            }
        }

        self.predictor_ids = kept_ids;
        self.columns = kept_columns;
        self.index = self
            .predictor_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        dropped
    }

    /// Replace the predictand by its natural log.
    pub fn log_transform_predictand(&mut self) -> Result<()> {
        if let Some(i) = self.predictand.iter().position(|v| *v <= 0.0) {
            return Err(SearchError::NonPositivePredictand {
                year: self.years[i],
            });
        }
        for v in &mut self.predictand {
            *v = v.ln();
        }
        Ok(())
    }

    /// Training matrix for `set` under the given missing-value policy.
    pub fn design(
        &self,
        set: &PredictorSet,
        policy: MissingPolicy,
    ) -> std::result::Result<Design, NotEvaluable> {
        if set.is_empty() {
            return Err(NotEvaluable::EmptyPredictorSet);
        }
        let columns: Vec<&[f64]> = set
            .iter()
            .map(|id| self.column(id).ok_or(NotEvaluable::UnknownPredictor))
            .collect::<std::result::Result<_, _>>()?;

        let keep: Vec<usize> = (0..self.n_samples())
            .filter(|&i| match policy {
                MissingPolicy::CompleteRows => columns.iter().all(|c| c[i].is_finite()),
                MissingPolicy::AnyObserved => columns.iter().any(|c| c[i].is_finite()),
            })
            .collect();
        if keep.is_empty() {
            return Err(NotEvaluable::NoOverlap);
        }

        let mut x = Matrix::zeros(keep.len(), columns.len());
        for (r, &i) in keep.iter().enumerate() {
            for (c, column) in columns.iter().enumerate() {
                let v = column[i];
                x.set(r, c, if v.is_finite() { v } else { f64::NAN });
            }
        }

        Ok(Design {
            years: keep.iter().map(|&i| self.years[i]).collect(),
            x,
            y: keep.iter().map(|&i| self.predictand[i]).collect(),
        })
    }
}
