//! Restricted expression language for QUBO model descriptions.
//!
//! Constraint and objective strings submitted by clients are parsed into a
//! typed tree and evaluated only against declared symbols. There is no path
//! to a general-purpose evaluator: the grammar is identifiers, array
//! subscripts, numeric literals, `+ - * / **` and parentheses.
//!
//! Parsing stops at [`MAX_DEPTH`] nested levels. During evaluation a product
//! fails once a term would hold more than [`MAX_DEGREE`] variables or the
//! product would visit more than [`MAX_PRODUCT_TERMS`] term pairs.
//!
//! | Construct | Example | Result |
//! |-----------|---------|--------|
//! | Binary variable | `x0` | `x0` |
//! | Spin variable | `s` | `2*s - 1` (binary domain) |
//! | Array element | `q[3]` | `q[3]` |
//! | Power of a variable term | `(x0 + x1 - 1) ** 2` | expanded, `x*x = x` |
//! | Constant arithmetic | `2 ** -1` | `0.5` |
//!
//! # Example
//!
//! ```rust
//! use qblock_expr::{Symbol, SymbolTable, evaluate_str};
//!
//! let mut symbols = SymbolTable::new();
//! symbols.insert("x0", Symbol::Binary("x0".into()));
//! symbols.insert("x1", Symbol::Binary("x1".into()));
//!
//! let penalty = evaluate_str("(x0 + x1 - 1) ** 2", &symbols).unwrap();
//! assert_eq!(penalty.coefficient(&["x0", "x1"]), Some(2.0));
//! assert_eq!(penalty.coefficient(&["x0"]), Some(-1.0));
//! assert_eq!(penalty.constant_term(), 1.0);
//! ```

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;
mod poly;

pub use ast::{BinOp, Expression};
pub use error::{ExprError, ExprResult};
pub use eval::{MAX_DEGREE, MAX_EXPONENT, Symbol, SymbolTable, evaluate, evaluate_str};
pub use parser::{MAX_DEPTH, parse};
pub use poly::{MAX_PRODUCT_TERMS, Monomial, Polynomial};
