//! Mixin lifecycle and capability tracking.

use std::fmt;

/// The two method slots a host can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Register a plugin
    Use,
    /// Replay deferred handlers
    Run,
}

impl MethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Use => "use",
            MethodKind::Run => "run",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install status of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixinState {
    /// No mixin behavior attached
    Uninstalled,
    /// At least one slot holds an installed mixin behavior
    Installed,
}

impl MixinState {
    /// Check if installed.
    pub fn is_installed(&self) -> bool {
        matches!(self, MixinState::Installed)
    }
}

/// Which of `use` / `run` a host exposes, installed or custom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub has_use: bool,
    pub has_run: bool,
}

impl Capabilities {
    /// Both methods present. Hosts that fail this check get decorated by `run`.
    pub fn is_extensible(&self) -> bool {
        self.has_use && self.has_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensible_needs_both() {
        let none = Capabilities::default();
        let use_only = Capabilities {
            has_use: true,
            has_run: false,
        };
        let both = Capabilities {
            has_use: true,
            has_run: true,
        };

        assert!(!none.is_extensible());
        assert!(!use_only.is_extensible());
        assert!(both.is_extensible());
    }

    #[test]
    fn test_method_names() {
        assert_eq!(MethodKind::Use.to_string(), "use");
        assert_eq!(MethodKind::Run.as_str(), "run");
        assert!(MixinState::Installed.is_installed());
        assert!(!MixinState::Uninstalled.is_installed());
    }
}
