//! The six permutations of (subject, predicate, object)

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One physical sort order of the triples
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permutation {
    Pso,
    Pos,
    Spo,
    Sop,
    Osp,
    Ops,
}

impl Permutation {
    /// All permutations, in the order `PerPermutation` stores them
    pub const ALL: [Permutation; 6] = [
        Permutation::Pso,
        Permutation::Pos,
        Permutation::Spo,
        Permutation::Sop,
        Permutation::Osp,
        Permutation::Ops,
    ];

    /// Positions (0 = subject, 1 = predicate, 2 = object) of the columns
    /// in this permutation's sort order
    pub const fn key_order(self) -> [usize; 3] {
        match self {
            Permutation::Pso => [1, 0, 2],
            Permutation::Pos => [1, 2, 0],
            Permutation::Spo => [0, 1, 2],
            Permutation::Sop => [0, 2, 1],
            Permutation::Osp => [2, 0, 1],
            Permutation::Ops => [2, 1, 0],
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Permutation::Pso => "PSO",
            Permutation::Pos => "POS",
            Permutation::Spo => "SPO",
            Permutation::Sop => "SOP",
            Permutation::Osp => "OSP",
            Permutation::Ops => "OPS",
        }
    }

    /// Slot in `ALL`
    pub const fn index(self) -> usize {
        self as usize
    }

    /// File name suffix of this permutation's index file
    pub fn file_suffix(self) -> String {
        self.name().to_ascii_lowercase()
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Permutation {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permutation::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| StoreError::Parse(format!("Unknown permutation: {}", s)))
    }
}

/// One value per permutation, stored in a fixed array
///
/// Every "do this for all six permutations" step goes through
/// `for_each_permutation` (or `map`/`from_fn`) so no permutation can be
/// skipped by a hand-written call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerPermutation<T>([T; 6]);

impl<T> PerPermutation<T> {
    pub fn from_fn(mut f: impl FnMut(Permutation) -> T) -> Self {
        Self(std::array::from_fn(|i| f(Permutation::ALL[i])))
    }

    /// Like `from_fn`, stopping at the first error
    pub fn try_from_fn<E>(
        mut f: impl FnMut(Permutation) -> std::result::Result<T, E>,
    ) -> std::result::Result<Self, E> {
        let values = Permutation::ALL
            .into_iter()
            .map(&mut f)
            .collect::<std::result::Result<Vec<T>, E>>()?;
        match <[T; 6]>::try_from(values) {
            Ok(array) => Ok(Self(array)),
            Err(_) => unreachable!("exactly one value per permutation"),
        }
    }

    pub fn for_each_permutation(&self, mut f: impl FnMut(Permutation, &T)) {
        for (permutation, value) in Permutation::ALL.into_iter().zip(&self.0) {
            f(permutation, value);
        }
    }

    pub fn for_each_permutation_mut(&mut self, mut f: impl FnMut(Permutation, &mut T)) {
        for (permutation, value) in Permutation::ALL.into_iter().zip(&mut self.0) {
            f(permutation, value);
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Permutation, T) -> U) -> PerPermutation<U> {
        let mut permutations = Permutation::ALL.into_iter();
        PerPermutation(self.0.map(|value| match permutations.next() {
            Some(permutation) => f(permutation, value),
            None => unreachable!("exactly one value per permutation"),
        }))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Permutation, &T)> {
        Permutation::ALL.into_iter().zip(self.0.iter())
    }

    pub fn into_inner(self) -> [T; 6] {
        self.0
    }
}

impl<T> IntoIterator for PerPermutation<T> {
    type Item = (Permutation, T);
    type IntoIter = std::iter::Zip<std::array::IntoIter<Permutation, 6>, std::array::IntoIter<T, 6>>;

    fn into_iter(self) -> Self::IntoIter {
        Permutation::ALL.into_iter().zip(self.0)
    }
}

impl<T: Default> Default for PerPermutation<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Permutation> for PerPermutation<T> {
    type Output = T;

    fn index(&self, permutation: Permutation) -> &T {
        &self.0[permutation.index()]
    }
}

impl<T> IndexMut<Permutation> for PerPermutation<T> {
    fn index_mut(&mut self, permutation: Permutation) -> &mut T {
        &mut self.0[permutation.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, permutation) in Permutation::ALL.into_iter().enumerate() {
            assert_eq!(permutation.index(), i);
        }
    }

    #[test]
    fn test_key_orders_are_distinct_permutations() {
        let mut orders: Vec<[usize; 3]> = Permutation::ALL.iter().map(|p| p.key_order()).collect();
        for order in &orders {
            let mut sorted = *order;
            sorted.sort();
            assert_eq!(sorted, [0, 1, 2]);
        }
        orders.sort();
        orders.dedup();
        assert_eq!(orders.len(), 6);
    }

    #[test]
    fn test_parse_permutation() {
        assert_eq!("pso".parse::<Permutation>().unwrap(), Permutation::Pso);
        assert_eq!("OPS".parse::<Permutation>().unwrap(), Permutation::Ops);
        assert!("xyz".parse::<Permutation>().is_err());
    }

    #[test]
    fn test_per_permutation_visits_every_slot() {
        let mut values = PerPermutation::from_fn(|p| p.index());
        let mut seen = Vec::new();
        values.for_each_permutation_mut(|p, v| {
            *v += 10;
            seen.push(p);
        });
        assert_eq!(seen, Permutation::ALL.to_vec());
        assert_eq!(values[Permutation::Osp], 14);

        let names = values.map(|p, _| p.name());
        assert_eq!(names[Permutation::Pos], "POS");
    }

    #[test]
    fn test_try_from_fn_stops_at_error() {
        let result: Result<PerPermutation<u8>, &str> = PerPermutation::try_from_fn(|p| {
            if p == Permutation::Sop {
                Err("boom")
            } else {
                Ok(0)
            }
        });
        assert_eq!(result.unwrap_err(), "boom");
    }
}
