//! Per-node invalidation flags recorded by scene tree mutations.

use bitflags::bitflags;

bitflags! {
    /// What changed on a scene node since the flags were last drained.
    ///
    /// A renderer uses these to skip work: a relocated marker only needs
    /// its geometry refreshed, while a row whose child list changed must be
    /// re-walked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Invalidation: u8 {
        /// No changes
        const NONE      = 0b0000_0000;

        /// Node is new and has never been laid out.
        const LAYOUT    = 0b0000_0001;

        /// Children were added or removed.
        const CHILDREN  = 0b0000_0010;

        /// Position or size assigned by a layout pass changed.
        const GEOMETRY  = 0b0000_0100;
    }
}

impl Default for Invalidation {
    fn default() -> Self {
        Self::NONE
    }
}
