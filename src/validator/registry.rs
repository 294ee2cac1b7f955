use super::store::ErrorStore;
use crate::models::Course;
use crate::pipeline::UrlNameIndex;
use std::fmt;
use std::sync::Arc;

/// A cross-object check run once per validation run.
///
/// Validators only append to the store; they must not depend on what
/// other validators in the same tier have reported.
pub trait Validator: Send + Sync {
    /// Stable name, used in logs
    fn name(&self) -> &'static str;

    fn validate(&self, course: &Course, store: &mut ErrorStore, url_names: &UrlNameIndex);
}

/// Adapter so plain functions and closures can be registered
struct FnValidator<F> {
    name: &'static str,
    f: F,
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Course, &mut ErrorStore, &UrlNameIndex) + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn validate(&self, course: &Course, store: &mut ErrorStore, url_names: &UrlNameIndex) {
        (self.f)(course, store, url_names)
    }
}

/// Append-only, ordered list of validators
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: Vec<Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<V: Validator + 'static>(&mut self, validator: V) -> &mut Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn register_fn<F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        F: Fn(&Course, &mut ErrorStore, &UrlNameIndex) + Send + Sync + 'static,
    {
        self.register(FnValidator { name, f })
    }

    /// Registered validators at the time of the call, in registration order
    pub fn validators(&self) -> Vec<Arc<dyn Validator>> {
        self.validators.clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// The two validator tiers
#[derive(Debug, Clone, Default)]
pub struct Registries {
    /// Cheap checks, always run at stage 7
    pub standard: ValidatorRegistry,
    /// Expensive checks (file system scans), run last at stage 8
    pub extended: ValidatorRegistry,
}

impl Registries {
    /// Empty tiers
    pub fn new() -> Self {
        Self::default()
    }

    /// Tiers populated with every built-in validator
    pub fn builtin() -> Self {
        let mut registries = Self::new();

        registries
            .standard
            .register(super::global::DuplicateUrlNames)
            .register(super::global::DuplicateDiscussionIds)
            .register(super::global::StartDates)
            .register(super::global::EmptyContainers);

        registries
            .extended
            .register(super::long::StaticLinks)
            .register(super::long::UnreferencedFiles);

        registries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentNode, Diagnostic, DiagnosticCode};
    use std::collections::BTreeMap;

    fn course() -> Course {
        Course::new("/c", ContentNode::new("course", BTreeMap::new(), "course.xml"))
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = ValidatorRegistry::new();
        registry
            .register_fn("first", |_, store, _| {
                store.add(Diagnostic::new(DiagnosticCode::UnknownTag, "first"))
            })
            .register_fn("second", |_, store, _| {
                store.add(Diagnostic::new(DiagnosticCode::UnknownTag, "second"))
            });

        assert_eq!(registry.names(), vec!["first", "second"]);

        let course = course();
        let index = UrlNameIndex::build(&course);
        let mut store = ErrorStore::default();
        for validator in registry.validators() {
            validator.validate(&course, &mut store, &index);
        }
        let messages: Vec<_> = store.all().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_snapshot_ignores_later_registrations() {
        let mut registry = ValidatorRegistry::new();
        registry.register_fn("one", |_, _, _| {});
        let snapshot = registry.validators();
        registry.register_fn("two", |_, _, _| {});

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_builtin_tiers() {
        let registries = Registries::builtin();
        assert_eq!(
            registries.standard.names(),
            vec![
                "duplicate-url-names",
                "duplicate-discussion-ids",
                "start-dates",
                "empty-containers"
            ]
        );
        assert_eq!(
            registries.extended.names(),
            vec!["static-links", "unreferenced-files"]
        );
    }
}
