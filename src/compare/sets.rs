//! Set difference between desired and observed identifier collections

use std::collections::BTreeSet;

/// Elements to add and to remove to move observed onto desired
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetDifference<T: Ord> {
    pub to_add: BTreeSet<T>,
    pub to_remove: BTreeSet<T>,
}

impl<T: Ord> Default for SetDifference<T> {
    fn default() -> Self {
        Self {
            to_add: BTreeSet::new(),
            to_remove: BTreeSet::new(),
        }
    }
}

impl<T: Ord> SetDifference<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// `to_add = desired - observed`, `to_remove = observed - desired`
///
/// Duplicates collapse and input order is irrelevant.
pub fn difference<'a, T, D, O>(desired: D, observed: O) -> SetDifference<T>
where
    T: Ord + Clone + 'a,
    D: IntoIterator<Item = &'a T>,
    O: IntoIterator<Item = &'a T>,
{
    let desired: BTreeSet<&T> = desired.into_iter().collect();
    let observed: BTreeSet<&T> = observed.into_iter().collect();

    SetDifference {
        to_add: desired.difference(&observed).map(|v| (*v).clone()).collect(),
        to_remove: observed.difference(&desired).map(|v| (*v).clone()).collect(),
    }
}

/// Same elements regardless of order and duplicates
pub fn same_elements<T: Ord>(a: &[T], b: &[T]) -> bool {
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}
