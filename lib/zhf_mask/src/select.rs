//! Branch-free selection.
//!
//! Every data-dependent decision in the masking engine and in the transition
//! validator goes through [`select`], so the same code describes both the
//! native computation and its arithmetic-circuit counterpart: both arms are
//! always computed and the condition only picks one of them.

use subtle::{Choice, ConditionallySelectable};

/// Returns `when_true` if `cond` is set, `when_false` otherwise.
pub fn select<T: ConditionallySelectable>(cond: Choice, when_true: &T, when_false: &T) -> T {
    T::conditional_select(when_false, when_true, cond)
}

/// Picks `items[index]` by walking the whole array. An out of range index
/// yields `T::default()`.
pub fn switch<T: ConditionallySelectable + Default>(items: &[T], index: usize) -> T {
    items
        .iter()
        .enumerate()
        .fold(T::default(), |acc, (i, item)| {
            select(choice(i == index), item, &acc)
        })
}

pub fn choice(value: bool) -> Choice {
    Choice::from(value as u8)
}

/// Conjunction of all the checks, every one of them evaluated.
pub fn all(checks: impl IntoIterator<Item = Choice>) -> Choice {
    checks.into_iter().fold(Choice::from(1), |acc, check| acc & check)
}
