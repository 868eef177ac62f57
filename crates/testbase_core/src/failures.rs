//! Failure-category registry.
//!
//! Unit-of-work failures are tagged with a stable [`FailureCategoryId`] instead of being matched on the runtime
//! type of whatever raised them. Each category belongs to exactly one [`FailureFamily`], which decides whether the
//! retrying runner may try again.
//!
//! ## Notes
//! - Spellings are the exception class names raised by the hardware toolchain, so a traceback line such as
//!   `spinnman.exceptions.SpinnmanTimeoutException: timed out` can be mapped back onto a category.
//! - Anything not listed here is unclassified and always fatal.
//!
//! ## Examples
//! ```rust
//! use testbase_core::failures::{self, FailureCategoryId, FailureFamily};
//!
//! assert_eq!(failures::from_str("PacmanValueError"), Some(FailureCategoryId::Value));
//! assert_eq!(FailureCategoryId::Value.family(), FailureFamily::ResourceAllocation);
//! ```

/// How the runner treats a failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureFamily {
    /// Hardware or job-allocation communication failure; retried up to the attempt limit.
    TransientInfrastructure,
    /// Partitioning or valuation failure from the resource-allocation layer; never retried.
    ResourceAllocation,
}

/// Stable identifier for a known failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureCategoryId {
    /// The allocation server destroyed the job while it was in use.
    JobDestroyed,
    /// Any failure talking to the board (timeouts, I/O, unexpected responses).
    Communication,
    /// The graph could not be partitioned onto the machine.
    Partition,
    /// A resource-allocation value was out of range.
    Value,
}

/// Metadata entry for a failure category.
#[derive(Debug, Clone, Copy)]
pub struct FailureCategoryInfo {
    pub id: FailureCategoryId,
    /// Exception class name used by the toolchain.
    pub canonical: &'static str,
    /// Subclass names that map onto the same category.
    pub aliases: &'static [&'static str],
    pub family: FailureFamily,
    pub description: &'static str,
}

/// Class-name prefix shared by every communication exception the toolchain raises.
pub const COMMUNICATION_PREFIX: &str = "Spinnman";

/// Registry of known failure categories.
pub const FAILURE_CATEGORIES: &[FailureCategoryInfo] = &[
    FailureCategoryInfo {
        id: FailureCategoryId::JobDestroyed,
        canonical: "JobDestroyedError",
        aliases: &[],
        family: FailureFamily::TransientInfrastructure,
        description: "The allocated job was destroyed by the allocation server.",
    },
    FailureCategoryInfo {
        id: FailureCategoryId::Communication,
        canonical: "SpinnmanException",
        aliases: &[
            "SpinnmanIOException",
            "SpinnmanTimeoutException",
            "SpinnmanEOFException",
            "SpinnmanInvalidPacketException",
            "SpinnmanInvalidParameterException",
            "SpinnmanUnexpectedResponseCodeException",
            "SpinnmanGenericProcessException",
            "SpinnmanGroupedProcessException",
        ],
        family: FailureFamily::TransientInfrastructure,
        description: "Communication with the board failed.",
    },
    FailureCategoryInfo {
        id: FailureCategoryId::Partition,
        canonical: "PacmanPartitionException",
        aliases: &[],
        family: FailureFamily::ResourceAllocation,
        description: "The application graph could not be partitioned.",
    },
    FailureCategoryInfo {
        id: FailureCategoryId::Value,
        canonical: "PacmanValueError",
        aliases: &[],
        family: FailureFamily::ResourceAllocation,
        description: "A resource-allocation value was invalid.",
    },
];

impl FailureCategoryId {
    /// Return the family this category belongs to.
    pub fn family(self) -> FailureFamily {
        info_for(self).family
    }

    /// Whether the runner may retry a failure of this category.
    pub fn is_retryable(self) -> bool {
        self.family() == FailureFamily::TransientInfrastructure
    }
}

impl std::fmt::Display for FailureCategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(as_str(*self))
    }
}

/// Resolve an exception class name to its category.
///
/// Accepts bare names (`PacmanValueError`) and dotted names (`pacman.exceptions.PacmanValueError`). Unlisted
/// communication subclasses are recognised by their [`COMMUNICATION_PREFIX`].
pub fn from_str(name: &str) -> Option<FailureCategoryId> {
    let class = class_name(name);
    if class.is_empty() {
        return None;
    }
    if let Some(info) = FAILURE_CATEGORIES
        .iter()
        .find(|c| c.canonical == class || c.aliases.contains(&class))
    {
        return Some(info.id);
    }
    if class.starts_with(COMMUNICATION_PREFIX) && (class.ends_with("Exception") || class.ends_with("Error")) {
        return Some(FailureCategoryId::Communication);
    }
    None
}

/// Strip the module path from an exception name: `spinnman.exceptions.SpinnmanIOException` -> `SpinnmanIOException`.
pub fn class_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name).trim()
}

/// Whether `name` spells a whole category rather than one of its subclasses.
pub fn is_canonical(name: &str) -> bool {
    from_str(name).is_some_and(|id| as_str(id) == class_name(name))
}

/// Return the canonical spelling for a category.
pub fn as_str(id: FailureCategoryId) -> &'static str {
    info_for(id).canonical
}

/// Return the metadata entry for a category.
pub fn info_for(id: FailureCategoryId) -> &'static FailureCategoryInfo {
    // Rows are laid out in variant order (checked by `registry_rows_follow_variant_order`).
    &FAILURE_CATEGORIES[id as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_rows_follow_variant_order() {
        let ids = [
            FailureCategoryId::JobDestroyed,
            FailureCategoryId::Communication,
            FailureCategoryId::Partition,
            FailureCategoryId::Value,
        ];
        assert_eq!(FAILURE_CATEGORIES.len(), ids.len());
        for (index, id) in ids.into_iter().enumerate() {
            assert_eq!(FAILURE_CATEGORIES[index].id, id);
            assert_eq!(info_for(id).id, id);
        }
    }

    #[test]
    fn canonical_spellings_round_trip() {
        for info in FAILURE_CATEGORIES {
            assert_eq!(from_str(info.canonical), Some(info.id));
            assert_eq!(as_str(info.id), info.canonical);
        }
    }

    #[test]
    fn dotted_names_resolve_by_class() {
        assert_eq!(
            from_str("spalloc.job.JobDestroyedError"),
            Some(FailureCategoryId::JobDestroyed)
        );
        assert_eq!(
            from_str("pacman.exceptions.PacmanPartitionException"),
            Some(FailureCategoryId::Partition)
        );
    }

    #[test]
    fn unknown_communication_subclass_uses_prefix() {
        assert_eq!(
            from_str("SpinnmanSomethingNewException"),
            Some(FailureCategoryId::Communication)
        );
        assert_eq!(from_str("SpinnmanHelper"), None);
    }

    #[test]
    fn canonical_versus_subclass_names() {
        assert!(is_canonical("SpinnmanException"));
        assert!(is_canonical("spinnman.exceptions.SpinnmanException"));
        assert!(!is_canonical("SpinnmanTimeoutException"));
        assert!(!is_canonical("SpinnmanSomethingNewException"));
        assert!(!is_canonical("ValueError"));
        assert_eq!(class_name("spinnman.exceptions.SpinnmanIOException"), "SpinnmanIOException");
        assert_eq!(class_name("KeyError"), "KeyError");
    }

    #[test]
    fn unlisted_names_are_unclassified() {
        assert_eq!(from_str("ValueError"), None);
        assert_eq!(from_str("AssertionError"), None);
        assert_eq!(from_str(""), None);
    }

    #[test]
    fn families() {
        assert!(FailureCategoryId::JobDestroyed.is_retryable());
        assert!(FailureCategoryId::Communication.is_retryable());
        assert!(!FailureCategoryId::Partition.is_retryable());
        assert!(!FailureCategoryId::Value.is_retryable());
    }
}
