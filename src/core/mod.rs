//! This module constitutes the headless, backend-agnostic editing engine of
//! notemark. It owns the markup tokenizer, the document/cursor model, and the
//! layout pass that turns tokens into positioned geometry for whatever
//! frontend embeds it. Nothing in here touches a window, a font file, or the
//! OS clipboard; those arrive as collaborator traits.

pub mod clipboard;
pub mod document;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod markup;
pub mod metrics;
pub mod persistence;
pub mod utf8;
