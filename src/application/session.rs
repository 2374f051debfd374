// Navigation session - stale fetch suppression and last-known-good views
//
// Each navigation issues a tag for the fetch it starts. When the fetch lands
// it is applied only if its tag still matches the current leaf; results from
// a leaf the user already left are dropped.
use crate::application::view::LeafViewModel;
use crate::domain::keys::LeafKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTag {
    leaf: LeafKey,
}

#[derive(Debug, Default)]
pub struct NavigationSession {
    current: Option<LeafKey>,
    last_good: Option<LeafViewModel>,
}

impl NavigationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to a leaf and get the tag for the fetch this navigation starts.
    pub fn navigate(&mut self, leaf: LeafKey) -> FetchTag {
        self.current = Some(leaf.clone());
        FetchTag { leaf }
    }

    pub fn is_current(&self, tag: &FetchTag) -> bool {
        self.current.as_ref() == Some(&tag.leaf)
    }

    /// Apply a completed fetch. Returns false (and keeps state untouched)
    /// when the user has navigated away since the tag was issued.
    pub fn complete(&mut self, tag: &FetchTag, view: LeafViewModel) -> bool {
        if !self.is_current(tag) {
            tracing::debug!(leaf = %tag.leaf, "dropping stale fetch result");
            return false;
        }
        self.last_good = Some(view);
        true
    }

    /// Most recent successfully rendered view, shown when a fetch fails.
    pub fn last_good(&self) -> Option<&LeafViewModel> {
        self.last_good.as_ref()
    }
}
