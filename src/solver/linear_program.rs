// Mixed-integer linear program handed to a MILP backend
// Built by the reformulation step; backends only ever see this shape.

use crate::domain::{solver_service::Result, SolutionStatus, VariableType};

/// One column of the program
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub variable_type: VariableType,
    pub lower: f64,
    pub upper: f64,
}

/// Sparse row `lower <= Σ coeff * column <= upper`
#[derive(Debug, Clone)]
pub struct Row {
    pub terms: Vec<(usize, f64)>,
    pub lower: f64,
    pub upper: f64,
}

/// Affine combination of columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Affine {
    pub constant: f64,
    pub terms: Vec<(usize, f64)>,
}

impl Affine {
    pub fn constant(value: f64) -> Self {
        Self {
            constant: value,
            terms: Vec::new(),
        }
    }

    pub fn column(index: usize) -> Self {
        Self {
            constant: 0.0,
            terms: vec![(index, 1.0)],
        }
    }

    pub fn add_scaled(&mut self, other: &Affine, factor: f64) {
        self.constant += other.constant * factor;
        for &(column, coeff) in &other.terms {
            self.terms.push((column, coeff * factor));
        }
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(column, coeff)| coeff * values.get(column).copied().unwrap_or(0.0))
                .sum::<f64>()
    }

    /// Merge duplicate columns and drop zero coefficients
    pub fn compact(mut self) -> Self {
        self.terms.sort_by_key(|&(column, _)| column);
        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(self.terms.len());
        for (column, coeff) in self.terms {
            match merged.last_mut() {
                Some((last, total)) if *last == column => *total += coeff,
                _ => merged.push((column, coeff)),
            }
        }
        merged.retain(|&(_, coeff)| coeff != 0.0);
        self.terms = merged;
        self
    }
}

/// Maximization MILP: columns, rows and a linear objective
#[derive(Debug, Clone, Default)]
pub struct LinearProgram {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub objective: Vec<(usize, f64)>,
}

impl LinearProgram {
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        variable_type: VariableType,
        lower: f64,
        upper: f64,
    ) -> usize {
        self.columns.push(Column {
            name: name.into(),
            variable_type,
            lower,
            upper,
        });
        self.columns.len() - 1
    }

    /// Add `lower <= affine <= upper`, moving the affine constant into the bounds
    pub fn add_affine_row(&mut self, affine: &Affine, lower: f64, upper: f64) {
        let affine = affine.clone().compact();
        self.rows.push(Row {
            terms: affine.terms,
            lower: lower - affine.constant,
            upper: upper - affine.constant,
        });
    }

    pub fn num_binary_columns(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.variable_type == VariableType::Binary)
            .count()
    }

    pub fn num_integer_columns(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.variable_type != VariableType::Continuous)
            .count()
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .map(|&(column, coeff)| coeff * values.get(column).copied().unwrap_or(0.0))
            .sum()
    }

    /// Whether `values` satisfies every bound and row within `tolerance`
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.columns.len() {
            return false;
        }
        let columns_ok = self.columns.iter().zip(values).all(|(column, &value)| {
            value >= column.lower - tolerance
                && value <= column.upper + tolerance
                && (column.variable_type == VariableType::Continuous
                    || (value - value.round()).abs() <= tolerance)
        });
        columns_ok
            && self.rows.iter().all(|row| {
                let activity: f64 = row.terms.iter().map(|&(c, coeff)| coeff * values[c]).sum();
                activity >= row.lower - tolerance && activity <= row.upper + tolerance
            })
    }
}

/// Result of one MILP solve
#[derive(Debug, Clone)]
pub struct MilpOutcome {
    pub status: SolutionStatus,
    /// One value per column; empty when no point was found
    pub values: Vec<f64>,
}

impl MilpOutcome {
    pub fn without_values(status: SolutionStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
        }
    }
}

/// Tolerance used to accept a time-limited point as an incumbent
pub(crate) const INCUMBENT_TOLERANCE: f64 = 1e-6;

/// General-purpose MILP solving procedure
pub trait MilpBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Maximize `program.objective` within `time_limit` seconds.
    ///
    /// `warm_start` holds one value per column of a point believed feasible.
    /// It is a hint only: a backend may drop it, and an infeasible hint must
    /// not change the result.
    fn maximize(
        &self,
        program: &LinearProgram,
        time_limit: Option<f64>,
        warm_start: Option<&[f64]>,
    ) -> Result<MilpOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_merges_and_drops_zeros() {
        let affine = Affine {
            constant: 1.0,
            terms: vec![(2, 1.0), (0, 3.0), (2, -1.0), (0, 1.0)],
        }
        .compact();
        assert_eq!(affine.terms, vec![(0, 4.0)]);
    }

    #[test]
    fn affine_rows_absorb_constants() {
        let mut program = LinearProgram::default();
        let x = program.add_column("x", VariableType::Integer, 0.0, 5.0);
        let affine = Affine {
            constant: 2.0,
            terms: vec![(x, 1.0)],
        };
        program.add_affine_row(&affine, f64::NEG_INFINITY, 6.0);
        assert_eq!(program.rows[0].upper, 4.0);
        assert_eq!(program.rows[0].lower, f64::NEG_INFINITY);
        assert_eq!(program.num_integer_columns(), 1);
        assert_eq!(program.num_binary_columns(), 0);

        assert!(program.is_satisfied(&[4.0], 1e-9));
        assert!(!program.is_satisfied(&[5.0], 1e-9));
        assert!(!program.is_satisfied(&[2.5], 1e-9));
    }

    #[test]
    fn add_scaled_accumulates() {
        let mut total = Affine::constant(1.0);
        total.add_scaled(&Affine::column(3), 2.5);
        total.add_scaled(&Affine::constant(4.0), 0.5);
        assert_eq!(total.constant, 3.0);
        assert_eq!(total.evaluate(&[0.0, 0.0, 0.0, 2.0]), 8.0);
    }
}
