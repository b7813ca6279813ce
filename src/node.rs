use crate::reference::Ref;
use crate::utils::{pairing3, MyHash};

/// Decision node: `variable ? high : low`.
///
/// The terminal node has `variable == 0`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Node {
    pub variable: u32,
    pub low: Ref,
    pub high: Ref,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            variable: 0,
            low: Ref::positive(1),
            high: Ref::positive(1),
        }
    }
}

impl Node {
    pub fn is_terminal(&self) -> bool {
        self.variable == 0
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        pairing3(
            self.variable as u64,
            self.low.unsigned() as u64,
            self.high.unsigned() as u64,
        )
    }
}
