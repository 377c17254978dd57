//! # Stop-mode policy.
//!
//! [`StopMode`] is chosen once when the engine is built:
//!
//! ```text
//! Automatic: after every regular item
//!   ├─► untagged work or a stop request still queued? → keep running
//!   ├─► any tag ≠ completed.tag with pending items?   → keep running
//!   └─► otherwise                                     → Stopped, on_stopped(start_id)
//!
//! Manual: never checked; the owner ends the engine through
//!   request_stop (ordered drain) or stop_self (direct).
//! ```
//!
//! ## Rules
//! - The completed item's own tag never blocks the automatic stop. A handler that
//!   reschedules itself under the same tag is not kept alive by that retry alone;
//!   self-retrying handlers that must survive should use [`StopMode::Manual`].
//! - The check is skipped while the engine is draining.

use crate::queue::{Tag, TagSet};

/// When the engine decides to stop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopMode {
    /// Stop on its own once no other-tag delayed work and no immediate work remain (default).
    #[default]
    Automatic,
    /// Stay alive until the owner requests a stop.
    Manual,
}

/// What the stop check needs to know about pending work.
pub(crate) trait PendingView {
    fn has_tag(&self, tag: Tag) -> bool;
    fn has_untagged(&self) -> bool;
}

/// Automatic-mode decision after an item with tag `completed` returned.
pub(crate) fn safe_to_stop(tags: &TagSet, completed: Option<Tag>, pending: &(impl PendingView + ?Sized)) -> bool {
    if pending.has_untagged() {
        return false;
    }
    tags.others(completed).all(|t| !pending.has_tag(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct Fake {
        tags: HashSet<Tag>,
        untagged: bool,
    }

    impl PendingView for Fake {
        fn has_tag(&self, tag: Tag) -> bool {
            self.tags.contains(&tag)
        }
        fn has_untagged(&self) -> bool {
            self.untagged
        }
    }

    #[test]
    fn empty_queue_is_safe() {
        assert!(safe_to_stop(&TagSet::from([1, 2]), None, &Fake::default()));
    }

    #[test]
    fn other_tag_pending_blocks() {
        let pending = Fake {
            tags: HashSet::from([2]),
            ..Fake::default()
        };
        let tags = TagSet::from([1, 2]);
        assert!(!safe_to_stop(&tags, None, &pending));
        assert!(!safe_to_stop(&tags, Some(1), &pending));
    }

    #[test]
    fn own_tag_does_not_block() {
        let pending = Fake {
            tags: HashSet::from([2]),
            ..Fake::default()
        };
        assert!(safe_to_stop(&TagSet::from([1, 2]), Some(2), &pending));
    }

    #[test]
    fn queued_immediate_work_blocks() {
        let pending = Fake {
            untagged: true,
            ..Fake::default()
        };
        assert!(!safe_to_stop(&TagSet::from([1]), Some(1), &pending));
    }

    #[test]
    fn default_mode_is_automatic() {
        assert_eq!(StopMode::default(), StopMode::Automatic);
    }
}
