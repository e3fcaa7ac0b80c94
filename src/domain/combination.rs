//! Enumeration of the concrete ways a requirement can be satisfied.
//!
//! A [`Combination`] is one ordered tuple of courses. Leaves enumerate their
//! `k`-subsets with [`KSubsets`]; AND nodes take the cartesian [`product`] of
//! their children's combinations, and OR nodes [`chain`] them.
//!
//! Enumeration cost grows as `C(n, k)`. [`binomial`] and friends compute the
//! counts without enumerating, so callers can refuse oversized nodes first.

use crate::domain::Atom;

/// One concrete selection of courses satisfying a requirement.
pub type Combination = Vec<Atom>;

/// Iterator over the `k`-subsets of a slice, in lexicographic order of
/// position.
///
/// `KSubsets::new(&[a, b, c], 2)` yields `[a, b]`, `[a, c]`, `[b, c]`. A
/// subset size of zero yields exactly one empty subset; a subset size larger
/// than the slice yields nothing.
#[derive(Debug, Clone)]
pub struct KSubsets<'a, T> {
    items: &'a [T],
    indices: Vec<usize>,
    done: bool,
}

impl<'a, T> KSubsets<'a, T> {
    /// Creates an iterator over the `k`-subsets of `items`.
    #[must_use]
    pub fn new(items: &'a [T], k: usize) -> Self {
        Self {
            items,
            indices: (0..k).collect(),
            done: k > items.len(),
        }
    }

    fn advance(&mut self) {
        let n = self.items.len();
        let k = self.indices.len();

        // rightmost position that can still move right
        let Some(i) = (0..k).rev().find(|&i| self.indices[i] != i + n - k) else {
            self.done = true;
            return;
        };

        self.indices[i] += 1;
        for j in i + 1..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
    }
}

impl<T: Clone> Iterator for KSubsets<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let subset = self.indices.iter().map(|&i| self.items[i].clone()).collect();
        self.advance();
        Some(subset)
    }
}

/// Cartesian product of several combination sequences.
///
/// Each output tuple takes one combination from every sequence, in sequence
/// order, and concatenates them. The first sequence varies slowest. The
/// product of no sequences is a single empty combination.
#[must_use]
pub fn product(sequences: Vec<Vec<Combination>>) -> Vec<Combination> {
    sequences
        .into_iter()
        .fold(vec![Combination::new()], |acc, sequence| {
            let mut next = Vec::with_capacity(acc.len().saturating_mul(sequence.len()));
            for prefix in &acc {
                for combination in &sequence {
                    let mut merged = Vec::with_capacity(prefix.len() + combination.len());
                    merged.extend_from_slice(prefix);
                    merged.extend_from_slice(combination);
                    next.push(merged);
                }
            }
            next
        })
}

/// Concatenation of several combination sequences, without merging.
#[must_use]
pub fn chain(sequences: Vec<Vec<Combination>>) -> Vec<Combination> {
    sequences.into_iter().flatten().collect()
}

/// `C(n, k)`, saturating at `usize::MAX`.
#[must_use]
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        // exact at every step: result * (n - i) is divisible by (i + 1)
        result = result * (n - i) as u128 / (i + 1) as u128;
        if result > usize::MAX as u128 {
            return usize::MAX;
        }
    }
    usize::try_from(result).unwrap_or(usize::MAX)
}

/// Number of combinations of an AND node, given its children's counts.
#[must_use]
pub fn product_count(counts: impl IntoIterator<Item = usize>) -> usize {
    counts.into_iter().fold(1, usize::saturating_mul)
}

/// Number of combinations of an OR node, given its children's counts.
#[must_use]
pub fn chain_count(counts: impl IntoIterator<Item = usize>) -> usize {
    counts.into_iter().fold(0, usize::saturating_add)
}
