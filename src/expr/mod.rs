//! Algebraic values for the MNA system.
//!
//! Every matrix entry, source value and result is an [`Expr`]: a rational
//! function of the Laplace variable `s` with complex coefficients. Constant
//! kinds of analysis (DC, phasor) substitute `s` before stamping so their
//! entries stay degree zero and solve like plain complex numbers.

mod poly;
mod rational;

pub use poly::Poly;
pub use rational::Expr;

pub use num_complex::Complex64;
