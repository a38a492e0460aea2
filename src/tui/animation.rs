//! TUI art for the success screen.

/// Large checkmark ASCII art for success screens.
pub(crate) const SUCCESS_CHECKMARK: &[&str] = &["    ██╗", "   ██╔╝", "  ██╔╝ ", "  ╚═╝  "];
