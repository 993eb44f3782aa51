//! Per-page pipeline states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one page's classification run.
///
/// ```text
/// Loaded → Classified → Resolved → Pruned → Attributed → Merged → Emitted
///    ↓                                          ↓            ↓
///    └──────────────────────────────────────► Rejected ◄──────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssayState {
    /// Page source parsed into a tree.
    Loaded,
    /// Detector bank has run; candidates partitioned by domain ownership.
    Classified,
    /// Precedence rules applied.
    Resolved,
    /// Duplicates collapsed and ancestors pruned.
    Pruned,
    /// Geometry looked up for every surviving path.
    Attributed,
    /// Candidates joined with geometry.
    Merged,
    /// Terminal: elements emitted.
    Emitted,
    /// Terminal: page rejected.
    Rejected,
}

impl AssayState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Emitted | Self::Rejected)
    }

    /// The state that follows on success, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Loaded => Some(Self::Classified),
            Self::Classified => Some(Self::Resolved),
            Self::Resolved => Some(Self::Pruned),
            Self::Pruned => Some(Self::Attributed),
            Self::Attributed => Some(Self::Merged),
            Self::Merged => Some(Self::Emitted),
            Self::Emitted | Self::Rejected => None,
        }
    }
}

impl fmt::Display for AssayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loaded => "loaded",
            Self::Classified => "classified",
            Self::Resolved => "resolved",
            Self::Pruned => "pruned",
            Self::Attributed => "attributed",
            Self::Merged => "merged",
            Self::Emitted => "emitted",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_chain_reaches_emitted() {
        let mut state = AssayState::Loaded;
        let mut steps = 0;
        while let Some(next) = state.next() {
            state = next;
            steps += 1;
        }
        assert_eq!(state, AssayState::Emitted);
        assert_eq!(steps, 6);
        assert!(state.is_terminal());
        assert!(AssayState::Rejected.next().is_none());
    }
}
