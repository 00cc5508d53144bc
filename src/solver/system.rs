//! MNA system matrices and their assembly.
//!
//! The system is built from four blocks and two right-hand-side vectors:
//! ```text
//! [ G   B ] [ v ]   [ Is ]
//! [ C   D ] [ j ] = [ Es ]
//! ```

use std::fmt;

use tracing::{debug, trace};

use crate::circuit::{NodeName, Netlist};
use crate::error::Result;
use crate::expr::Expr;

use super::allocator::UnknownAllocator;
use super::kind::AnalysisKind;

/// A dense matrix of expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    /// Row-major entries
    data: Vec<Expr>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Expr::zero(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Get matrix element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> &Expr {
        &self.data[row * self.cols + col]
    }

    /// Set matrix element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: Expr) {
        self.data[row * self.cols + col] = value;
    }

    /// Add to matrix element at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: &Expr) {
        let entry = &mut self.data[row * self.cols + col];
        *entry = &*entry + value;
    }

    pub fn row(&self, row: usize) -> &[Expr] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// True when the matrix equals its transpose.
    pub fn is_symmetric(&self) -> bool {
        self.rows == self.cols
            && (0..self.rows).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            write!(f, "[")?;
            for (j, entry) in self.row(i).iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", entry)?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

/// The G, B, C and D blocks with the Is and Es vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemMatrices {
    pub g: Matrix,
    pub b: Matrix,
    pub c: Matrix,
    pub d: Matrix,
    pub is: Vec<Expr>,
    pub es: Vec<Expr>,
}

impl SystemMatrices {
    /// Zero blocks for `nn` node and `nb` branch unknowns.
    pub fn zeros(nn: usize, nb: usize) -> Self {
        Self {
            g: Matrix::zeros(nn, nn),
            b: Matrix::zeros(nn, nb),
            c: Matrix::zeros(nb, nn),
            d: Matrix::zeros(nb, nb),
            is: vec![Expr::zero(); nn],
            es: vec![Expr::zero(); nb],
        }
    }

    /// Aggregate `A = [[G, B], [C, D]]` and `Z = [Is; Es]`.
    pub fn aggregate(&self) -> (Matrix, Vec<Expr>) {
        let nn = self.g.rows();
        let nb = self.d.rows();
        let mut a = Matrix::zeros(nn + nb, nn + nb);
        for i in 0..nn {
            for j in 0..nn {
                a.set(i, j, self.g.get(i, j).clone());
            }
            for j in 0..nb {
                a.set(i, nn + j, self.b.get(i, j).clone());
            }
        }
        for i in 0..nb {
            for j in 0..nn {
                a.set(nn + i, j, self.c.get(i, j).clone());
            }
            for j in 0..nb {
                a.set(nn + i, nn + j, self.d.get(i, j).clone());
            }
        }
        let z = self.is.iter().chain(self.es.iter()).cloned().collect();
        (a, z)
    }
}

/// Mutable state handed to each component while stamping.
///
/// Node indices are `None` for ground; writes to a ground row or column are
/// dropped.
pub struct StampContext<'a> {
    netlist: &'a Netlist,
    allocator: &'a UnknownAllocator,
    kind: AnalysisKind,
    system: SystemMatrices,
}

impl<'a> StampContext<'a> {
    pub fn new(netlist: &'a Netlist, allocator: &'a UnknownAllocator, kind: AnalysisKind) -> Self {
        Self {
            netlist,
            allocator,
            kind,
            system: SystemMatrices::zeros(allocator.num_nodes(), allocator.num_branches()),
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn netlist(&self) -> &'a Netlist {
        self.netlist
    }

    pub fn node_index(&self, node: &NodeName) -> Result<Option<usize>> {
        self.allocator.node_index(node)
    }

    pub fn branch_index(&self, name: &str) -> Result<usize> {
        self.allocator.branch_index(name)
    }

    pub fn into_system(self) -> SystemMatrices {
        self.system
    }

    /// `G[row, col] += value`
    pub fn add_g(&mut self, row: Option<usize>, col: Option<usize>, value: &Expr) {
        if let (Some(i), Some(j)) = (row, col) {
            self.system.g.add(i, j, value);
        }
    }

    /// `B[row, m] += value`
    pub fn add_b(&mut self, row: Option<usize>, m: usize, value: &Expr) {
        if let Some(i) = row {
            self.system.b.add(i, m, value);
        }
    }

    /// `B[row, m] = value`
    pub fn set_b(&mut self, row: Option<usize>, m: usize, value: Expr) {
        if let Some(i) = row {
            self.system.b.set(i, m, value);
        }
    }

    /// `C[m, col] += value`
    pub fn add_c(&mut self, m: usize, col: Option<usize>, value: &Expr) {
        if let Some(j) = col {
            self.system.c.add(m, j, value);
        }
    }

    /// `C[m, col] = value`
    pub fn set_c(&mut self, m: usize, col: Option<usize>, value: Expr) {
        if let Some(j) = col {
            self.system.c.set(m, j, value);
        }
    }

    /// `D[m1, m2] += value`
    pub fn add_d(&mut self, m1: usize, m2: usize, value: &Expr) {
        self.system.d.add(m1, m2, value);
    }

    /// `Is[row] += value`
    pub fn add_is(&mut self, row: Option<usize>, value: &Expr) {
        if let Some(i) = row {
            self.system.is[i] = &self.system.is[i] + value;
        }
    }

    /// `Es[m] += value`
    pub fn add_es(&mut self, m: usize, value: &Expr) {
        self.system.es[m] = &self.system.es[m] + value;
    }

    /// Stamp an admittance `y` between two nodes.
    ///   G[n1,n1] += y
    ///   G[n2,n2] += y
    ///   G[n1,n2] -= y
    ///   G[n2,n1] -= y
    pub fn stamp_admittance(&mut self, n1: Option<usize>, n2: Option<usize>, y: &Expr) {
        let neg = -y;
        self.add_g(n1, n1, y);
        self.add_g(n2, n2, y);
        self.add_g(n1, n2, &neg);
        self.add_g(n2, n1, &neg);
    }

    /// Stamp the incidence of branch `m` running from `n1` to `n2`: its
    /// current leaves `n1` and enters `n2`, and its constraint row reads
    /// `V[n1] - V[n2]`.
    pub fn stamp_incidence(&mut self, n1: Option<usize>, n2: Option<usize>, m: usize) {
        let one = Expr::one();
        let minus_one = -&one;
        self.add_b(n1, m, &one);
        self.add_c(m, n1, &one);
        self.add_b(n2, m, &minus_one);
        self.add_c(m, n2, &minus_one);
    }
}

/// The assembled system for one analysis kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub kind: AnalysisKind,
    pub system: SystemMatrices,
    /// Aggregate system matrix
    pub a: Matrix,
    /// Aggregate right-hand side
    pub z: Vec<Expr>,
}

/// Stamp every component of the netlist, in order, into a fresh system.
pub fn assemble(netlist: &Netlist, allocator: &UnknownAllocator, kind: AnalysisKind) -> Result<Assembled> {
    let mut ctx = StampContext::new(netlist, allocator, kind);
    for component in netlist.components() {
        trace!(component = component.name(), "stamping");
        component.stamp(&mut ctx)?;
    }
    let system = ctx.into_system();
    let (a, z) = system.aggregate();
    debug!(size = a.rows(), %kind, "assembled MNA system");
    Ok(Assembled { kind, system, a, z })
}
