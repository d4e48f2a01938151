//! Privilege level of the current process
//!
//! The executor only checks; re-invoking with elevation is the CLI's job.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Elevated,
    Unprivileged,
}

impl Privilege {
    /// Effective UID 0 counts as elevated
    pub fn current() -> Self {
        if nix::unistd::geteuid().is_root() {
            Privilege::Elevated
        } else {
            Privilege::Unprivileged
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self, Privilege::Elevated)
    }
}
