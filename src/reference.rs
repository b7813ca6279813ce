use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::utils::MyHash;

/// Handle to a node of the diagram.
///
/// The sign encodes a complemented edge: `-r` denotes the negation of the
/// function rooted at `r`. Index 0 is never a valid node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ref(i32);

impl Ref {
    /// Positive reference to the node at `index`.
    pub const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(&self) -> bool {
        self.0 < 0
    }

    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// The same node without the complement mark.
    pub const fn regular(self) -> Self {
        Self(self.0.abs())
    }

    /// Return the index of the referenced node.
    pub const fn index(self) -> usize {
        self.0.unsigned_abs() as usize
    }

    /// Interleaved encoding `2 * index + negated`, dense and non-negative.
    pub const fn unsigned(self) -> u32 {
        (self.0.unsigned_abs() << 1) + (self.0 < 0) as u32
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            if self.is_negated() { "~" } else { "" },
            self.index()
        )
    }
}

impl MyHash for Ref {
    fn hash(&self) -> u64 {
        self.unsigned() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation() {
        let r = Ref::positive(5);
        assert!(!r.is_negated());
        assert!((-r).is_negated());
        assert_eq!(-(-r), r);
        assert_eq!((-r).index(), 5);
        assert_eq!((-r).regular(), r);
    }

    #[test]
    fn test_unsigned_is_injective() {
        assert_eq!(Ref::positive(3).unsigned(), 6);
        assert_eq!((-Ref::positive(3)).unsigned(), 7);
        assert_eq!(Ref::positive(3).to_string(), "@3");
        assert_eq!((-Ref::positive(3)).to_string(), "~@3");
    }
}
