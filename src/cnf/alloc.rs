//! Fresh SAT variables.
//!
//! The transformation asks an [`Allocator`] for a new variable each time it needs one.
//! The default one is a [`VarAllocator`], counting from 1. Keeping the same [`VarAllocator`]
//! across several transformations puts all of them on the same variable namespace.

use log::trace;

use crate::NodeId;

/// What the variable is allocated for. Only meant for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocContext<'a> {
    /// The variable standing for the constant true.
    ConstTrue,
    /// A primary input.
    Input(&'a str),
    /// An and gate.
    And(NodeId),
    /// The positive copy of an output whose literal is negative.
    Output(&'a str),
}

/// Source of fresh SAT variables.
///
/// Each call must return a positive variable never returned before. Any closure
/// `FnMut(AllocContext) -> i64` is an allocator.
pub trait Allocator {
    fn alloc(&mut self, context: AllocContext<'_>) -> i64;
}

impl<F> Allocator for F
where
    F: FnMut(AllocContext<'_>) -> i64,
{
    fn alloc(&mut self, context: AllocContext<'_>) -> i64 {
        self(context)
    }
}

/// Counter based allocator: returns `1, 2, 3...` (or starts at any positive variable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarAllocator {
    next: i64,
}

impl Default for VarAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl VarAllocator {
    pub fn new() -> Self {
        VarAllocator { next: 1 }
    }

    /// The first variable returned will be `first`.
    pub fn starting_at(first: i64) -> Self {
        if first < 1 {
            panic!("SAT variables are positive, cannot start allocating at {}", first)
        }
        VarAllocator { next: first }
    }

    /// The last variable returned, `first - 1` if none.
    pub fn last(&self) -> i64 {
        self.next - 1
    }
}

impl Allocator for VarAllocator {
    fn alloc(&mut self, context: AllocContext<'_>) -> i64 {
        let var = self.next;
        self.next += 1;
        trace!("fresh variable {} for {:?}", var, context);
        var
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    #[test]
    fn var_allocator_test() {
        let mut alloc = VarAllocator::new();
        assert_eq!(alloc.last(), 0);
        assert_eq!(alloc.alloc(AllocContext::ConstTrue), 1);
        assert_eq!(alloc.alloc(AllocContext::Input("x")), 2);
        assert_eq!(alloc.alloc(AllocContext::And(7)), 3);
        assert_eq!(alloc.last(), 3);

        let mut alloc = VarAllocator::starting_at(10);
        assert_eq!(alloc.alloc(AllocContext::Output("o")), 10);
        assert_eq!(alloc.alloc(AllocContext::Output("o")), 11);
    }

    #[test]
    #[should_panic]
    fn var_allocator_invalid_start_test() {
        let _ = VarAllocator::starting_at(0);
    }

    #[test]
    fn closure_allocator_test() {
        let mut seen = Vec::new();
        let mut next: i64 = 100;
        let mut fresh = |context: AllocContext<'_>| {
            seen.push(format!("{:?}", context));
            next += 2;
            next
        };

        let alloc: &mut dyn Allocator = &mut fresh;
        assert_eq!(alloc.alloc(AllocContext::Input("a")), 102);
        assert_eq!(alloc.alloc(AllocContext::And(3)), 104);
        assert_eq!(seen, vec!["Input(\"a\")".to_string(), "And(3)".to_string()]);
    }
}
