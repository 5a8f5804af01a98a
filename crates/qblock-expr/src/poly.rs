//! Multilinear polynomials over binary variables.
//!
//! A [`Polynomial`] maps monomials (sorted, duplicate-free sets of variable
//! labels) to real coefficients. Because every variable is binary,
//! `x * x = x`, so a monomial never repeats a label and the degree of a product
//! is the size of the label union.
//!
//! Arithmetic never drops a monomial whose coefficient became zero. A variable
//! that was touched by an expression stays visible to the compiler, which is
//! what keeps `0 * x` meaningful.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{ExprError, ExprResult};

/// Upper bound on term pairs visited by one [`Polynomial::checked_mul`].
pub const MAX_PRODUCT_TERMS: usize = 1 << 22;

/// A product of distinct binary variables. The empty monomial is the constant.
pub type Monomial = Vec<String>;

/// Multilinear polynomial with `f64` coefficients.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polynomial {
    terms: BTreeMap<Monomial, f64>,
}

impl Polynomial {
    /// The zero polynomial (no terms).
    pub fn zero() -> Self {
        Self::default()
    }

    /// A constant polynomial.
    pub fn constant(value: f64) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(Vec::new(), value);
        Self { terms }
    }

    /// A single binary variable.
    pub fn variable(label: impl Into<String>) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(vec![label.into()], 1.0);
        Self { terms }
    }

    /// A spin variable lowered to the binary domain: `s = 2b - 1`.
    pub fn spin(label: impl Into<String>) -> Self {
        Self::variable(label) * Self::constant(2.0) - Self::constant(1.0)
    }

    /// Iterate over `(monomial, coefficient)` pairs in label order.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, f64)> {
        self.terms.iter().map(|(m, c)| (m, *c))
    }

    /// Number of stored monomials, zero-coefficient ones included.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the polynomial has no terms at all.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Coefficient of a monomial, given in any order.
    pub fn coefficient(&self, labels: &[&str]) -> Option<f64> {
        let mut key: Monomial = labels.iter().map(|s| (*s).to_string()).collect();
        key.sort();
        key.dedup();
        self.terms.get(&key).copied()
    }

    /// Constant term (zero if absent).
    pub fn constant_term(&self) -> f64 {
        self.terms.get(&Vec::new()).copied().unwrap_or(0.0)
    }

    /// The value of the polynomial if it references no variables.
    pub fn as_constant(&self) -> Option<f64> {
        if self.terms.keys().all(Vec::is_empty) {
            Some(self.constant_term())
        } else {
            None
        }
    }

    /// Highest monomial size.
    pub fn degree(&self) -> usize {
        self.terms.keys().map(Vec::len).max().unwrap_or(0)
    }

    /// All variable labels referenced by any monomial, sorted.
    pub fn variables(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .terms
            .keys()
            .flatten()
            .map(String::as_str)
            .collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Whether every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        self.terms.values().all(|c| c.is_finite())
    }

    /// Multiply every coefficient by `factor`.
    pub fn scale(mut self, factor: f64) -> Self {
        for coeff in self.terms.values_mut() {
            *coeff *= factor;
        }
        self
    }

    /// Product that fails instead of growing without bound.
    ///
    /// Errors as soon as a monomial would hold more than `max_degree` labels,
    /// or up front if the term count product exceeds [`MAX_PRODUCT_TERMS`].
    pub fn checked_mul(&self, rhs: &Polynomial, max_degree: usize) -> ExprResult<Polynomial> {
        let pairs = self.len().saturating_mul(rhs.len());
        if pairs > MAX_PRODUCT_TERMS {
            return Err(ExprError::ProductTooLarge {
                terms: pairs,
                max: MAX_PRODUCT_TERMS,
            });
        }

        let mut product = Polynomial::zero();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &rhs.terms {
                let monomial = merge_monomials(m1, m2);
                if monomial.len() > max_degree {
                    return Err(ExprError::DegreeTooHigh {
                        degree: monomial.len(),
                        max: max_degree,
                    });
                }
                product.accumulate(monomial, c1 * c2);
            }
        }
        Ok(product)
    }

    /// Raise to a non-negative integer power with the limits of
    /// [`checked_mul`](Self::checked_mul) applied at every step.
    pub fn checked_pow(&self, exponent: u32, max_degree: usize) -> ExprResult<Polynomial> {
        let mut result = Self::constant(1.0);
        for _ in 0..exponent {
            result = result.checked_mul(self, max_degree)?;
        }
        Ok(result)
    }

    /// Evaluate under a full binary assignment. Unassigned labels count as 0.
    pub fn evaluate(&self, assignment: &BTreeMap<String, bool>) -> f64 {
        self.terms
            .iter()
            .filter(|(monomial, _)| {
                monomial
                    .iter()
                    .all(|label| assignment.get(label).copied().unwrap_or(false))
            })
            .map(|(_, coeff)| coeff)
            .sum()
    }

    fn accumulate(&mut self, monomial: Monomial, coeff: f64) {
        *self.terms.entry(monomial).or_insert(0.0) += coeff;
    }
}

/// Sorted union of two sorted, duplicate-free label lists.
fn merge_monomials(a: &[String], b: &[String]) -> Monomial {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                merged.push(a[i].clone());
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                merged.push(b[j].clone());
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                merged.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    merged.extend_from_slice(&a[i..]);
    merged.extend_from_slice(&b[j..]);
    merged
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(mut self, rhs: Polynomial) -> Polynomial {
        for (monomial, coeff) in rhs.terms {
            self.accumulate(monomial, coeff);
        }
        self
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: Polynomial) -> Polynomial {
        self + (-rhs)
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let mut product = Polynomial::zero();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &rhs.terms {
                product.accumulate(merge_monomials(m1, m2), c1 * c2);
            }
        }
        product
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Polynomial) -> Polynomial {
        &self * &rhs
    }
}

impl std::iter::Sum for Polynomial {
    fn sum<I: Iterator<Item = Polynomial>>(iter: I) -> Self {
        iter.fold(Polynomial::zero(), Add::add)
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, (monomial, coeff)) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            if monomial.is_empty() {
                write!(f, "{coeff}")?;
            } else {
                write!(f, "{coeff}*{}", monomial.join("*"))?;
            }
        }
        Ok(())
    }
}
