// Algebraic expressions over model variables
// Expressions keep their tree shape so solver adapters can see products;
// `to_polynomial` gives the expanded form when only the terms matter.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Handle to a variable owned by a [`Model`](super::models::Model)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Expression tree built from constants, variables, sums and products
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(f64),
    Variable(VarId),
    Sum(Vec<Expr>),
    Product(Vec<Expr>),
    Scaled(f64, Box<Expr>),
}

impl Expr {
    pub fn zero() -> Self {
        Expr::Constant(0.0)
    }

    pub fn constant(value: f64) -> Self {
        Expr::Constant(value)
    }

    pub fn var(id: VarId) -> Self {
        Expr::Variable(id)
    }

    /// Multiply by a scalar, folding constants and nested scalings
    pub fn scale(self, factor: f64) -> Self {
        if factor == 1.0 {
            return self;
        }
        match self {
            Expr::Constant(c) => Expr::Constant(c * factor),
            Expr::Scaled(inner_factor, inner) => Expr::Scaled(inner_factor * factor, inner),
            other => Expr::Scaled(factor, Box::new(other)),
        }
    }

    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Constant(_) => true,
            Expr::Variable(_) => false,
            Expr::Sum(terms) | Expr::Product(terms) => terms.iter().all(Expr::is_constant),
            Expr::Scaled(_, inner) => inner.is_constant(),
        }
    }

    /// Evaluate with `values[id.index()]` as the value of each variable
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        match self {
            Expr::Constant(c) => *c,
            Expr::Variable(id) => values.get(id.index()).copied().unwrap_or(f64::NAN),
            Expr::Sum(terms) => terms.iter().map(|t| t.evaluate(values)).sum(),
            Expr::Product(factors) => factors.iter().map(|t| t.evaluate(values)).product(),
            Expr::Scaled(factor, inner) => factor * inner.evaluate(values),
        }
    }

    /// Collect every variable referenced by the expression
    pub fn variables(&self) -> BTreeSet<VarId> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<VarId>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Variable(id) => {
                out.insert(*id);
            }
            Expr::Sum(terms) | Expr::Product(terms) => {
                for term in terms {
                    term.collect_variables(out);
                }
            }
            Expr::Scaled(_, inner) => inner.collect_variables(out),
        }
    }

    /// Replace variables for which `lookup` returns an expression
    pub fn substitute<F>(&self, lookup: &F) -> Expr
    where
        F: Fn(VarId) -> Option<Expr>,
    {
        match self {
            Expr::Constant(c) => Expr::Constant(*c),
            Expr::Variable(id) => lookup(*id).unwrap_or(Expr::Variable(*id)),
            Expr::Sum(terms) => terms.iter().map(|t| t.substitute(lookup)).sum(),
            Expr::Product(factors) => factors
                .iter()
                .map(|t| t.substitute(lookup))
                .fold(Expr::Constant(1.0), |acc, f| acc * f),
            Expr::Scaled(factor, inner) => inner.substitute(lookup).scale(*factor),
        }
    }

    /// Split into a scalar and the multiplicative factors of the expression
    ///
    /// Constant factors are folded into the scalar, so an empty factor list
    /// means the expression is constant.
    pub fn factors(&self) -> (f64, Vec<Expr>) {
        let mut scalar = 1.0;
        let mut factors = Vec::new();
        self.collect_factors(&mut scalar, &mut factors);
        (scalar, factors)
    }

    fn collect_factors(&self, scalar: &mut f64, out: &mut Vec<Expr>) {
        match self {
            Expr::Product(factors) => {
                for factor in factors {
                    factor.collect_factors(scalar, out);
                }
            }
            Expr::Scaled(factor, inner) => {
                *scalar *= factor;
                inner.collect_factors(scalar, out);
            }
            other if other.is_constant() => *scalar *= other.evaluate(&[]),
            other => out.push(other.clone()),
        }
    }

    /// Fully expand into a sum of monomials
    pub fn to_polynomial(&self) -> Polynomial {
        match self {
            Expr::Constant(c) => Polynomial::constant(*c),
            Expr::Variable(id) => Polynomial::variable(*id),
            Expr::Sum(terms) => terms
                .iter()
                .fold(Polynomial::constant(0.0), |acc, t| acc.add(&t.to_polynomial())),
            Expr::Product(factors) => factors
                .iter()
                .fold(Polynomial::constant(1.0), |acc, t| acc.mul(&t.to_polynomial())),
            Expr::Scaled(factor, inner) => inner.to_polynomial().scale(*factor),
        }
    }
}

impl From<VarId> for Expr {
    fn from(id: VarId) -> Self {
        Expr::Variable(id)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Constant(value)
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Constant(a), Expr::Constant(b)) => Expr::Constant(a + b),
            (Expr::Constant(c), other) | (other, Expr::Constant(c)) if c == 0.0 => other,
            (Expr::Sum(mut left), Expr::Sum(right)) => {
                left.extend(right);
                Expr::Sum(left)
            }
            (Expr::Sum(mut left), other) => {
                left.push(other);
                Expr::Sum(left)
            }
            (other, Expr::Sum(mut right)) => {
                right.insert(0, other);
                Expr::Sum(right)
            }
            (left, right) => Expr::Sum(vec![left, right]),
        }
    }
}

impl Add<f64> for Expr {
    type Output = Expr;

    fn add(self, rhs: f64) -> Expr {
        self + Expr::Constant(rhs)
    }
}

impl Add<Expr> for f64 {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Constant(self) + rhs
    }
}

impl Add<VarId> for Expr {
    type Output = Expr;

    fn add(self, rhs: VarId) -> Expr {
        self + Expr::Variable(rhs)
    }
}

impl AddAssign for Expr {
    fn add_assign(&mut self, rhs: Expr) {
        let lhs = std::mem::replace(self, Expr::zero());
        *self = lhs + rhs;
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        self + rhs.scale(-1.0)
    }
}

impl Sub<f64> for Expr {
    type Output = Expr;

    fn sub(self, rhs: f64) -> Expr {
        self + Expr::Constant(-rhs)
    }
}

impl Sub<Expr> for f64 {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Constant(self) - rhs
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        self.scale(-1.0)
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Constant(a), Expr::Constant(b)) => Expr::Constant(a * b),
            (Expr::Constant(c), other) | (other, Expr::Constant(c)) => other.scale(c),
            (Expr::Product(mut left), Expr::Product(right)) => {
                left.extend(right);
                Expr::Product(left)
            }
            (Expr::Product(mut left), other) => {
                left.push(other);
                Expr::Product(left)
            }
            (other, Expr::Product(mut right)) => {
                right.insert(0, other);
                Expr::Product(right)
            }
            (left, right) => Expr::Product(vec![left, right]),
        }
    }
}

impl Mul<f64> for Expr {
    type Output = Expr;

    fn mul(self, rhs: f64) -> Expr {
        self.scale(rhs)
    }
}

impl Mul<Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        rhs.scale(self)
    }
}

impl Mul<VarId> for f64 {
    type Output = Expr;

    fn mul(self, rhs: VarId) -> Expr {
        Expr::Variable(rhs).scale(self)
    }
}

impl Div<f64> for Expr {
    type Output = Expr;

    fn div(self, rhs: f64) -> Expr {
        self.scale(1.0 / rhs)
    }
}

impl std::iter::Sum for Expr {
    fn sum<I: Iterator<Item = Expr>>(iter: I) -> Expr {
        iter.fold(Expr::zero(), |acc, e| acc + e)
    }
}

/// Product of variables; repeated ids encode powers
pub type Monomial = Vec<VarId>;

/// Expanded sum of monomials plus a constant term
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polynomial {
    pub constant: f64,
    pub terms: BTreeMap<Monomial, f64>,
}

impl Polynomial {
    pub fn constant(value: f64) -> Self {
        Self {
            constant: value,
            terms: BTreeMap::new(),
        }
    }

    pub fn variable(id: VarId) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(vec![id], 1.0);
        Self {
            constant: 0.0,
            terms,
        }
    }

    pub fn degree(&self) -> usize {
        self.terms.keys().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let mut result = self.clone();
        result.constant += other.constant;
        for (monomial, coeff) in &other.terms {
            result.add_term(monomial.clone(), *coeff);
        }
        result
    }

    pub fn scale(&self, factor: f64) -> Polynomial {
        let mut result = Polynomial::constant(self.constant * factor);
        for (monomial, coeff) in &self.terms {
            result.add_term(monomial.clone(), coeff * factor);
        }
        result
    }

    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        let mut result = Polynomial::constant(self.constant * other.constant);
        for (monomial, coeff) in &self.terms {
            result.add_term(monomial.clone(), coeff * other.constant);
        }
        for (monomial, coeff) in &other.terms {
            result.add_term(monomial.clone(), coeff * self.constant);
        }
        for (left, left_coeff) in &self.terms {
            for (right, right_coeff) in &other.terms {
                let mut monomial = left.clone();
                monomial.extend_from_slice(right);
                monomial.sort();
                result.add_term(monomial, left_coeff * right_coeff);
            }
        }
        result
    }

    fn add_term(&mut self, monomial: Monomial, coeff: f64) {
        if coeff == 0.0 {
            return;
        }
        let entry = self.terms.entry(monomial).or_insert(0.0);
        *entry += coeff;
        if *entry == 0.0 {
            // Exact cancellation only; tiny leftovers are kept as real terms
            self.terms.retain(|_, c| *c != 0.0);
        }
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|(monomial, coeff)| {
                    coeff
                        * monomial
                            .iter()
                            .map(|id| values.get(id.index()).copied().unwrap_or(f64::NAN))
                            .product::<f64>()
                })
                .sum::<f64>()
    }
}
