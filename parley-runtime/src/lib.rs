//! Parley Runtime
//!
//! Terminal front end for parley-core: parses what the user types into session
//! commands and folds the session's event stream into a renderable chat view.

pub mod command;
pub mod view;

pub use command::Command;
pub use view::ChatView;

// Re-export core types for convenience
pub use parley_core;
