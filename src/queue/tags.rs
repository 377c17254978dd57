//! # Closed set of delayed-work tags.
//!
//! [`TagSet`] is supplied once when the engine is built and never changes afterwards,
//! so it is shared without synchronization.

use std::collections::BTreeSet;

use super::Tag;

/// The tags an engine accepts for delayed work.
///
/// # Example
/// ```
/// use flexqueue::TagSet;
///
/// let tags = TagSet::from([1, 2]);
/// assert!(tags.contains(1));
/// assert!(!tags.contains(5));
/// assert_eq!(tags.others(Some(1)).collect::<Vec<_>>(), vec![2]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: BTreeSet<Tag>,
}

impl TagSet {
    /// Creates a tag set from any iterator of tags (duplicates are collapsed).
    pub fn new(tags: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    /// Returns true if `tag` is accepted.
    #[inline]
    pub fn contains(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Iterates tags in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tags.iter().copied()
    }

    /// Iterates every tag except `exclude` (all tags when `exclude` is `None`).
    pub fn others(&self, exclude: Option<Tag>) -> impl Iterator<Item = Tag> + '_ {
        self.iter().filter(move |t| Some(*t) != exclude)
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// True if no delayed work can ever be submitted.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<const N: usize> From<[Tag; N]> for TagSet {
    fn from(tags: [Tag; N]) -> Self {
        Self::new(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse() {
        let tags = TagSet::new([3, 1, 3, 2]);
        assert_eq!(tags.len(), 3);
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn others_without_exclusion_yields_all() {
        let tags = TagSet::from([1, 2]);
        assert_eq!(tags.others(None).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(tags.others(Some(9)).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn empty_set() {
        let tags = TagSet::default();
        assert!(tags.is_empty());
        assert!(!tags.contains(0));
    }
}
