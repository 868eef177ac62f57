//! Categorised unit-of-work failures and the caller's known-broken set.

use std::collections::BTreeSet;

use testbase_core::failures::{self, FailureCategoryId, FailureFamily};
use thiserror::Error;

/// A failure raised by a unit of work.
///
/// `category` is `None` for anything outside the registry; such failures are never caught by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{exception}: {message}")]
pub struct Failure {
    pub category: Option<FailureCategoryId>,
    /// Exception class name as reported by the unit of work.
    pub exception: String,
    pub message: String,
}

impl Failure {
    /// Build a failure from an exception class name, resolving its category through the registry.
    pub fn new(exception: impl Into<String>, message: impl Into<String>) -> Self {
        let exception = exception.into();
        Self {
            category: failures::from_str(&exception),
            exception,
            message: message.into(),
        }
    }

    /// Build a failure of a known category, named by its canonical spelling.
    pub fn categorized(category: FailureCategoryId, message: impl Into<String>) -> Self {
        Self {
            category: Some(category),
            exception: failures::as_str(category).to_string(),
            message: message.into(),
        }
    }

    /// Build a failure the runner must never catch.
    pub fn unclassified(exception: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: None,
            exception: exception.into(),
            message: message.into(),
        }
    }

    /// Family of the failure, `None` when unclassified.
    pub fn family(&self) -> Option<FailureFamily> {
        self.category.map(FailureCategoryId::family)
    }
}

/// Failures a caller declares as known broken; they become soft skips instead of failures.
///
/// A category covers every exception that resolves to it. A subclass name added with [`insert_name`]
/// covers only exceptions of that exact class.
///
/// [`insert_name`]: SkipSet::insert_name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipSet {
    categories: BTreeSet<FailureCategoryId>,
    classes: BTreeSet<String>,
}

impl SkipSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cover a whole category.
    pub fn insert(&mut self, category: FailureCategoryId) -> bool {
        self.categories.insert(category)
    }

    /// Cover the exception named `name`: its whole category for a canonical name, otherwise that class alone.
    ///
    /// Returns the category `name` resolves to, or `None` (and leaves the set unchanged) if it is not registered.
    pub fn insert_name(&mut self, name: &str) -> Option<FailureCategoryId> {
        let category = failures::from_str(name)?;
        if failures::is_canonical(name) {
            self.categories.insert(category);
        } else {
            self.classes.insert(failures::class_name(name).to_string());
        }
        Some(category)
    }

    /// Whether `failure` is covered by a listed category or class.
    pub fn matches(&self, failure: &Failure) -> bool {
        failure.category.is_some_and(|c| {
            self.categories.contains(&c) || self.classes.contains(failures::class_name(&failure.exception))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.classes.is_empty()
    }
}

impl FromIterator<FailureCategoryId> for SkipSet {
    fn from_iter<T: IntoIterator<Item = FailureCategoryId>>(iter: T) -> Self {
        Self {
            categories: iter.into_iter().collect(),
            classes: BTreeSet::new(),
        }
    }
}
