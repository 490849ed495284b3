//! Capability gate for sensitive primitives.
//!
//! Every capability-bearing builtin passes through a single chokepoint,
//! `SecurityGate::security_prompt`, before doing anything. The gate either
//! consults its allow-list, asks the operator when stdin is a terminal, or
//! denies outright in non-interactive runs.
//!
//! The only capability currently requested by the runtime is
//! [`Capability::PyApiAccess`].

use std::{
    fmt,
    io::{self, IsTerminal, Write as _},
};

/// A single permission grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Permission to hand code to the host-language bridge.
    PyApiAccess,
    /// Custom capability identified by a string tag, for host extensions.
    Custom(String),
}

impl Capability {
    /// The stable tag used in allow-lists and prompts.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::PyApiAccess => "pyapi_access",
            Self::Custom(tag) => tag,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when an operation is denied by the gate.
#[derive(Debug, Clone)]
pub struct PermissionDenied {
    /// The capability that was required.
    pub capability: String,
}

impl fmt::Display for PermissionDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "capability '{}' was denied", self.capability)
    }
}

impl std::error::Error for PermissionDenied {}

/// The gate's decision procedure for capabilities not on the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackMode {
    /// Deny without asking. The right mode for non-interactive runs.
    Deny,
    /// Ask the operator on the terminal, denying when stdin is not a tty.
    Prompt,
}

/// The capability gate.
///
/// The allow-list is fixed once the gate is built; capabilities cannot be
/// escalated during execution. An empty allow-list with `Deny` fallback is
/// the most restrictive profile and the default.
#[derive(Debug, Clone)]
pub struct SecurityGate {
    allowed: Vec<Capability>,
    fallback: FallbackMode,
}

impl SecurityGate {
    /// A gate that denies every capability not on the allow-list.
    #[must_use]
    pub fn deny_by_default(allowed: Vec<Capability>) -> Self {
        Self {
            allowed,
            fallback: FallbackMode::Deny,
        }
    }

    /// A gate that denies everything.
    #[must_use]
    pub fn deny_all() -> Self {
        Self::deny_by_default(Vec::new())
    }

    /// A gate that asks the operator when stdin is a terminal and denies
    /// otherwise. This is what the CLI installs.
    #[must_use]
    pub fn interactive(allowed: Vec<Capability>) -> Self {
        Self {
            allowed,
            fallback: FallbackMode::Prompt,
        }
    }

    /// Returns `true` if the capability is on the allow-list.
    #[must_use]
    pub fn allows(&self, capability: &Capability) -> bool {
        self.allowed.contains(capability)
    }

    /// The single interception point invoked before sensitive primitives.
    ///
    /// Returns `Ok(())` when the capability is allowed, `Err` otherwise.
    pub fn security_prompt(&self, capability: &Capability) -> Result<(), PermissionDenied> {
        if self.allows(capability) {
            return Ok(());
        }
        if self.fallback == FallbackMode::Prompt && io::stdin().is_terminal() {
            if ask_operator(capability) {
                return Ok(());
            }
        }
        Err(PermissionDenied {
            capability: capability.tag().to_owned(),
        })
    }
}

impl Default for SecurityGate {
    fn default() -> Self {
        Self::deny_all()
    }
}

/// Asks the operator to grant a capability for the current run.
fn ask_operator(capability: &Capability) -> bool {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "radon: script requests capability '{capability}'. Allow? [y/N] ");
    let _ = stderr.flush();
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}
