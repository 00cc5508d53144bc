//! Summing-point primitives for block-diagram style signal flow.
//!
//! A summing point forces its output node to a signed sum of its input node
//! potentials. Node order is `in1, in2, out[, in3]`.

use std::fmt;

/// Signs of the summing-point inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummingSigns {
    /// `out = in1 + in2`
    Pp,
    /// `out = in1 - in2`
    Pm,
    /// `out = in1 + in2 + in3`
    Ppp,
    /// `out = in1 - in2 - in3`
    Pmm,
    /// `out = in1 + in2 - in3`
    Ppm,
}

impl SummingSigns {
    /// Parse the suffix of an `SP` type tag, e.g. `"pm"`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "pp" => Some(SummingSigns::Pp),
            "pm" => Some(SummingSigns::Pm),
            "ppp" => Some(SummingSigns::Ppp),
            "pmm" => Some(SummingSigns::Pmm),
            "ppm" => Some(SummingSigns::Ppm),
            _ => None,
        }
    }

    /// Signs of the inputs, in input order.
    pub fn signs(&self) -> &'static [f64] {
        match self {
            SummingSigns::Pp => &[1.0, 1.0],
            SummingSigns::Pm => &[1.0, -1.0],
            SummingSigns::Ppp => &[1.0, 1.0, 1.0],
            SummingSigns::Pmm => &[1.0, -1.0, -1.0],
            SummingSigns::Ppm => &[1.0, 1.0, -1.0],
        }
    }

    /// Number of nodes, output included.
    pub fn node_count(&self) -> usize {
        self.signs().len() + 1
    }

    /// Positions in the node list of the inputs, matching [`Self::signs`].
    pub fn input_positions(&self) -> &'static [usize] {
        match self.signs().len() {
            2 => &[0, 1],
            _ => &[0, 1, 3],
        }
    }

    /// Position of the output in the node list.
    pub const OUTPUT: usize = 2;
}

impl fmt::Display for SummingSigns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self {
            SummingSigns::Pp => "pp",
            SummingSigns::Pm => "pm",
            SummingSigns::Ppp => "ppp",
            SummingSigns::Pmm => "pmm",
            SummingSigns::Ppm => "ppm",
        };
        write!(f, "SP{}", suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_parsing() {
        assert_eq!(SummingSigns::from_suffix("ppm"), Some(SummingSigns::Ppm));
        assert_eq!(SummingSigns::from_suffix("mp"), None);
        assert_eq!(SummingSigns::Pmm.to_string(), "SPpmm");
    }

    #[test]
    fn test_inputs_skip_output_node() {
        let signs = SummingSigns::Ppm;
        assert_eq!(signs.node_count(), 4);
        assert_eq!(signs.input_positions(), &[0, 1, 3]);
        assert!(!signs.input_positions().contains(&SummingSigns::OUTPUT));
        assert_eq!(SummingSigns::Pm.input_positions().len(), SummingSigns::Pm.signs().len());
    }
}
