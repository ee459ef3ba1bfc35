//! Tags
//!
//! Normalized tag sets used for product and selector matching.

use std::cmp::Ordering;

use smallvec::SmallVec;

/// Lower-case and trim a tag (or any selector string) for comparison.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A sorted, de-duplicated set of normalized tags.
///
/// Every tag is passed through [`normalize`] on the way in, so `" Sale "` and `"sale"` are the
/// same tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: SmallVec<[String; 5]>,
}

impl TagSet {
    /// Create an empty tag set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tags: SmallVec::with_capacity(0),
        }
    }

    /// Create a tag set from string slices.
    pub fn from_strs(tags: &[&str]) -> Self {
        tags.iter().copied().collect()
    }

    /// Check if this set shares at least one tag with `other`.
    pub fn intersects(&self, other: &Self) -> bool {
        // Both sides are sorted, so walk them together.
        let mut left = self.tags.iter();
        let mut right = other.tags.iter();
        let mut left_tag = left.next();
        let mut right_tag = right.next();

        while let (Some(left_ref), Some(right_ref)) = (left_tag, right_tag) {
            match left_ref.cmp(right_ref) {
                Ordering::Equal => return true,
                Ordering::Less => left_tag = left.next(),
                Ordering::Greater => right_tag = right.next(),
            }
        }

        false
    }

    /// Check if the set contains `tag` (after normalization).
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.binary_search(&normalize(tag)).is_ok()
    }

    /// Add a tag, keeping the set sorted.
    pub fn add(&mut self, tag: &str) {
        let tag = normalize(tag);

        if let Err(pos) = self.tags.binary_search(&tag) {
            self.tags.insert(pos, tag);
        }
    }

    /// Iterate the normalized tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags: SmallVec<[String; 5]> =
            iter.into_iter().map(|tag| normalize(tag.as_ref())).collect();

        tags.sort();
        tags.dedup();

        Self { tags }
    }
}
