//! Include/exclude selection of services by category and title.

use std::collections::HashSet;

use crate::service::Descriptor;

/// Selects services from user-supplied category and title values.
///
/// Values are compared after dropping everything but ASCII alphanumerics and
/// upper-casing, so `scr.im`, `SCRIM` and `Scr-Im` all name the same service.
/// A value starting with `:` excludes instead of includes.
///
/// ```
/// use handle_avail::filter::SelectionFilter;
/// use handle_avail::service::Descriptor;
///
/// let filter = SelectionFilter::new(["tech"], [":github"]).unwrap();
/// assert!(filter.matches(&Descriptor::new("tech", "Pastebin")));
/// assert!(!filter.matches(&Descriptor::new("tech", "GitHub")));
/// assert!(!filter.matches(&Descriptor::new("blog", "WordPress")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionFilter {
    included_categories: HashSet<String>,
    excluded_categories: HashSet<String>,
    included_services: HashSet<String>,
    excluded_services: HashSet<String>,
}

impl SelectionFilter {
    /// Build a filter, or `None` when no values were given.
    pub fn new<C, S>(categories: C, services: S) -> Option<Self>
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let mut filter = Self::default();
        for value in categories {
            sort_value(
                value.as_ref(),
                &mut filter.excluded_categories,
                &mut filter.included_categories,
            );
        }
        for value in services {
            sort_value(
                value.as_ref(),
                &mut filter.excluded_services,
                &mut filter.included_services,
            );
        }
        if filter == Self::default() {
            None
        } else {
            Some(filter)
        }
    }

    /// Whether the service described by `descriptor` is selected.
    #[must_use]
    pub fn matches(&self, descriptor: &Descriptor) -> bool {
        let category = sanitize(&descriptor.category);
        let service = sanitize(&descriptor.title);

        if self.excluded_categories.contains(&category) || self.excluded_services.contains(&service) {
            return false;
        }
        if !self.included_categories.is_empty() && !self.included_categories.contains(&category) {
            return false;
        }
        self.included_services.is_empty() || self.included_services.contains(&service)
    }
}

fn sort_value(value: &str, excludes: &mut HashSet<String>, includes: &mut HashSet<String>) {
    let value = value.trim();
    let sanitized = sanitize(value);
    if sanitized.is_empty() {
        return;
    }
    if value.starts_with(':') {
        excludes.insert(sanitized);
    } else {
        includes.insert(sanitized);
    }
}

/// Strip non-alphanumerics and upper-case.
///
/// ```
/// use handle_avail::filter::sanitize;
/// assert_eq!(sanitize(" scr.im "), "SCRIM");
/// ```
#[must_use]
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
