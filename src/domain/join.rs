//! Inner join on the date key.

use crate::domain::dataset::{sort_by_date, DateKeyed};
use crate::domain::error::SentimergeError;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::str::FromStr;

/// Resolution for right-hand rows sharing a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// First occurrence in date-sorted (then source) order wins.
    #[default]
    KeepFirst,
    KeepLast,
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" | "keep_first" => Ok(Self::KeepFirst),
            "last" | "keep_last" => Ok(Self::KeepLast),
            "reject" | "error" => Ok(Self::Reject),
            other => Err(format!(
                "unknown duplicate policy '{other}' (expected first, last or reject)"
            )),
        }
    }
}

/// A left row paired with its matching right row.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined<L, R> {
    pub left: L,
    pub right: R,
}

impl<L: DateKeyed, R> DateKeyed for Joined<L, R> {
    fn date_key(&self) -> NaiveDate {
        self.left.date_key()
    }
}

/// Builds a date → right-row index, resolving duplicates per `policy`.
pub fn index_by_date<R: DateKeyed>(
    right: &[R],
    policy: DuplicatePolicy,
) -> Result<HashMap<NaiveDate, &R>, SentimergeError> {
    let mut index: HashMap<NaiveDate, &R> = HashMap::with_capacity(right.len());
    for row in right {
        match index.entry(row.date_key()) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(mut slot) => match policy {
                DuplicatePolicy::KeepFirst => {}
                DuplicatePolicy::KeepLast => {
                    slot.insert(row);
                }
                DuplicatePolicy::Reject => {
                    return Err(SentimergeError::DuplicateDate { date: row.date_key() });
                }
            },
        }
    }
    Ok(index)
}

/// Relational inner join on the date key.
///
/// Both sides are sorted by date first. Every left row whose date exists on
/// the right is paired with that right row, so duplicate left dates each get a
/// copy. Left rows with no match are dropped; an empty intersection is an
/// empty result.
pub fn inner_join<L, R>(
    left: &[L],
    right: &[R],
    policy: DuplicatePolicy,
) -> Result<Vec<Joined<L, R>>, SentimergeError>
where
    L: DateKeyed + Clone,
    R: DateKeyed + Clone,
{
    let mut right_sorted = right.to_vec();
    sort_by_date(&mut right_sorted);
    let index = index_by_date(&right_sorted, policy)?;

    let mut left_sorted = left.to_vec();
    sort_by_date(&mut left_sorted);

    Ok(left_sorted
        .into_iter()
        .filter_map(|l| {
            index.get(&l.date_key()).map(|r| Joined {
                left: l,
                right: (*r).clone(),
            })
        })
        .collect())
}
