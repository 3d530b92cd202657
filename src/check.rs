//! Orchestration of a check run: resolve services, check them one at a time,
//! notify observers, and build the report.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::filter::SelectionFilter;
use crate::http::{Client, Transport};
use crate::registry::{Registry, RegistryError, registry};
use crate::report::{CheckResult, Report};
use crate::service::Descriptor;

/// Predicate over service descriptors.
pub type Filter = Box<dyn Fn(&Descriptor) -> bool + Send + Sync>;

/// Options for a check run.
///
/// ```
/// use std::time::Duration;
/// use handle_avail::check::CheckOptions;
///
/// let options = CheckOptions::new()
///     .filter(|d| d.category == "tech")
///     .timeout(Duration::from_secs(5));
/// assert_eq!(options.timeout_value(), Some(Duration::from_secs(5)));
/// ```
#[derive(Default)]
pub struct CheckOptions {
    filter: Option<Filter>,
    timeout: Option<Duration>,
}

impl fmt::Debug for CheckOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckOptions")
            .field("filter", &self.filter.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CheckOptions {
    /// No filter, no per-request timeout beyond the client default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only check services whose descriptor satisfies `filter`.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Descriptor) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Only check services selected by `selection`; `None` selects everything.
    #[must_use]
    pub fn selection(mut self, selection: Option<SelectionFilter>) -> Self {
        self.filter = selection.map(|s| Box::new(move |d: &Descriptor| s.matches(d)) as Filter);
        self
    }

    /// Bound each service's request.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured per-request timeout.
    #[must_use]
    pub fn timeout_value(&self) -> Option<Duration> {
        self.timeout
    }

    fn filter_fn(&self) -> Option<&dyn Fn(&Descriptor) -> bool> {
        self.filter
            .as_deref()
            .map(|f| f as &dyn Fn(&Descriptor) -> bool)
    }
}

/// Progress notifications, emitted in this order for every run:
/// one `CheckStarted`, then `Checking`/`Result` pairs in service order,
/// then one `ReportCompleted`.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// Services are resolved and checking begins.
    CheckStarted {
        /// Normalised name.
        name: &'a str,
        /// Every service about to be checked, in order.
        services: &'a [Descriptor],
    },
    /// A service is about to be checked.
    Checking {
        /// The service.
        descriptor: &'a Descriptor,
        /// Normalised name.
        name: &'a str,
    },
    /// A service has been checked.
    Result(&'a CheckResult),
    /// All services have been checked.
    ReportCompleted(&'a Report),
}

/// Receives [`Event`]s during a run.
pub trait Observer {
    /// Handle one event.
    fn notify(&mut self, event: Event<'_>);
}

impl<F: FnMut(Event<'_>)> Observer for F {
    fn notify(&mut self, event: Event<'_>) {
        self(event);
    }
}

/// Failures that stop a run before any report exists.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CheckError {
    /// The name is empty once trimmed.
    #[error("name cannot be empty")]
    EmptyName,
    /// The filter left no services to check.
    #[error("No services found")]
    NoServices,
    /// Services could not be loaded.
    #[error("failed to load services: {0}")]
    Registry(#[from] RegistryError),
}

/// Trim and lower-case a name.
///
/// ```
/// use handle_avail::check::normalize_name;
/// assert_eq!(normalize_name("  NeoCortex "), "neocortex");
/// ```
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Runs checks for names against the services of a registry.
#[derive(Clone, Copy)]
pub struct Checker<'a> {
    registry: &'a Registry,
    transport: &'a dyn Transport,
}

impl fmt::Debug for Checker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checker")
            .field("registry", self.registry)
            .finish_non_exhaustive()
    }
}

impl<'a> Checker<'a> {
    /// Check services from `registry` through `transport`.
    #[must_use]
    pub fn new(registry: &'a Registry, transport: &'a dyn Transport) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Check `name` on every selected service, strictly one after another.
    ///
    /// Individual service failures are recorded in their result and never
    /// abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::EmptyName`] for a blank name,
    /// [`CheckError::NoServices`] if the filter selects nothing, and
    /// [`CheckError::Registry`] if services cannot be loaded. Nothing is
    /// contacted in any of these cases.
    pub fn check(
        &self,
        name: &str,
        options: &CheckOptions,
        observer: &mut dyn Observer,
    ) -> Result<Report, CheckError> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err(CheckError::EmptyName);
        }
        debug!(%name, ?options, "checking name");

        let services = self.registry.get(options.filter_fn())?;
        if services.is_empty() {
            return Err(CheckError::NoServices);
        }

        let descriptors: Vec<Descriptor> =
            services.iter().map(|s| s.descriptor().clone()).collect();
        observer.notify(Event::CheckStarted {
            name: &name,
            services: &descriptors,
        });

        let mut results = Vec::with_capacity(services.len());
        for service in &services {
            let descriptor = service.descriptor();
            debug!(%name, service = %descriptor.title, category = %descriptor.category, "checking service");
            observer.notify(Event::Checking {
                descriptor,
                name: &name,
            });

            let result = match service.check(self.transport, &name, options.timeout) {
                Ok(availability) => {
                    debug!(%name, service = %descriptor.title, %availability, "check succeeded");
                    CheckResult::passed(descriptor.clone(), name.as_str(), availability)
                }
                Err(e) => {
                    debug!(%name, service = %descriptor.title, error = %e, "check failed");
                    CheckResult::failed(descriptor.clone(), name.as_str(), e)
                }
            };
            observer.notify(Event::Result(&result));
            results.push(result);
        }

        let report = Report::new(name, results);
        info!(
            name = %report.name(),
            total = report.stats().total,
            available = report.stats().available,
            failed = report.stats().failed,
            unique = ?report.unique(),
            "report generated"
        );
        observer.notify(Event::ReportCompleted(&report));
        Ok(report)
    }

    /// Descriptors of the services `filter` selects, in check order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if services cannot be loaded.
    pub fn list(
        &self,
        filter: Option<&dyn Fn(&Descriptor) -> bool>,
    ) -> Result<Vec<Descriptor>, RegistryError> {
        Ok(self
            .registry
            .get(filter)?
            .iter()
            .map(|s| s.descriptor().clone())
            .collect())
    }
}

/// Check `name` on the built-in services over the network.
///
/// # Errors
///
/// See [`Checker::check`].
///
/// # Example
///
/// ```no_run
/// use handle_avail::check::{CheckOptions, check_name};
///
/// let options = CheckOptions::new().filter(|d| d.category == "tech");
/// match check_name("my-handle", &options) {
///     Ok(report) if report.unique() == Some(true) => println!("go grab it!"),
///     Ok(report) => println!("{:?}", report.stats()),
///     Err(e) => eprintln!("error: {e}"),
/// }
/// ```
pub fn check_name(name: &str, options: &CheckOptions) -> Result<Report, CheckError> {
    let client = Client::new();
    Checker::new(registry(), &client).check(name, options, &mut |_: Event<'_>| {})
}

/// Descriptors of the built-in services `filter` selects.
///
/// # Errors
///
/// Returns [`RegistryError`] if services cannot be loaded.
pub fn list_services(
    filter: Option<&dyn Fn(&Descriptor) -> bool>,
) -> Result<Vec<Descriptor>, RegistryError> {
    Ok(registry()
        .get(filter)?
        .iter()
        .map(|s| s.descriptor().clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::http::{HttpRequest, HttpResponse, TransportError};
    use crate::service::testing::MockTransport;
    use crate::service::{Service, ServiceError};

    #[derive(Debug)]
    struct Stub(Descriptor);

    impl Service for Stub {
        fn descriptor(&self) -> &Descriptor {
            &self.0
        }

        fn request(&self, name: &str) -> HttpRequest {
            HttpRequest::head(format!("https://{}.example/{name}", self.0.title))
        }
    }

    fn registry_of(services: &'static [(&'static str, &'static str)]) -> Registry {
        Registry::new(move || {
            Ok(services
                .iter()
                .map(|&(c, t)| Arc::new(Stub(Descriptor::new(c, t))) as Arc<dyn Service>)
                .collect())
        })
    }

    /// Flattened form of an [`Event`] for assertions.
    #[derive(Debug, PartialEq)]
    enum Seen {
        Started(String, Vec<String>),
        Checking(String),
        Result(String, Option<bool>, bool),
        Completed(usize),
    }

    fn record(events: &mut Vec<Seen>) -> impl FnMut(Event<'_>) + '_ {
        move |event: Event<'_>| {
            events.push(match event {
                Event::CheckStarted { name, services } => Seen::Started(
                    name.to_owned(),
                    services.iter().map(|d| d.title.clone()).collect(),
                ),
                Event::Checking { descriptor, .. } => Seen::Checking(descriptor.title.clone()),
                Event::Result(r) => Seen::Result(
                    r.descriptor().title.clone(),
                    r.available(),
                    r.error().is_some(),
                ),
                Event::ReportCompleted(report) => Seen::Completed(report.results().len()),
            });
        }
    }

    #[test]
    fn single_service_available() {
        let registry = registry_of(&[("tech", "GitHub")]);
        let transport = MockTransport::status(404);
        let report = Checker::new(&registry, &transport)
            .check("zz9xQ7", &CheckOptions::new(), &mut |_: Event<'_>| {})
            .unwrap();
        assert_eq!(report.name(), "zz9xq7");
        assert_eq!(report.stats().available, 1);
        assert_eq!(report.unique(), Some(true));
    }

    #[test]
    fn notifications_follow_registry_order() {
        let registry = registry_of(&[("tech", "b"), ("blog", "z"), ("tech", "a")]);
        let transport = MockTransport::replying([
            Ok(HttpResponse::new(404)),
            Err(TransportError::TimedOut),
            Ok(HttpResponse::new(200)),
        ]);
        let mut events = Vec::new();
        let report = Checker::new(&registry, &transport)
            .check(" Frank ", &CheckOptions::new(), &mut record(&mut events))
            .unwrap();

        assert_eq!(
            events,
            [
                Seen::Started("frank".into(), vec!["z".into(), "a".into(), "b".into()]),
                Seen::Checking("z".into()),
                Seen::Result("z".into(), Some(true), false),
                Seen::Checking("a".into()),
                Seen::Result("a".into(), None, true),
                Seen::Checking("b".into()),
                Seen::Result("b".into(), Some(false), false),
                Seen::Completed(3),
            ]
        );
        assert_eq!(report.stats().failed, 1);
        assert_eq!(report.unique(), None);

        let urls: Vec<String> = transport.sent.lock().unwrap().iter().map(|r| r.url.clone()).collect();
        assert_eq!(
            urls,
            ["https://z.example/frank", "https://a.example/frank", "https://b.example/frank"]
        );
    }

    #[test]
    fn rejected_status_is_captured_per_result() {
        let registry = registry_of(&[("tech", "GitHub"), ("tech", "Pastebin")]);
        let transport =
            MockTransport::replying([Ok(HttpResponse::new(500)), Ok(HttpResponse::new(404))]);
        let report = Checker::new(&registry, &transport)
            .check("frank", &CheckOptions::new(), &mut |_: Event<'_>| {})
            .unwrap();
        assert!(matches!(
            report.results()[0].error(),
            Some(ServiceError::Rejected { code: 500, .. })
        ));
        assert_eq!(report.results()[1].available(), Some(true));
        assert_eq!(report.stats().total, 2);
    }

    #[test]
    fn timeout_is_passed_to_each_request() {
        let registry = registry_of(&[("tech", "GitHub")]);
        let transport = MockTransport::status(404);
        let options = CheckOptions::new().timeout(Duration::from_millis(250));
        Checker::new(&registry, &transport)
            .check("frank", &options, &mut |_: Event<'_>| {})
            .unwrap();
        assert_eq!(
            transport.last_request().timeout,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn blank_name_fails_before_any_request() {
        let registry = registry_of(&[("tech", "GitHub")]);
        let transport = MockTransport::status(404);
        let mut events = Vec::new();
        let err = Checker::new(&registry, &transport)
            .check(" \t ", &CheckOptions::new(), &mut record(&mut events))
            .unwrap_err();
        assert!(matches!(err, CheckError::EmptyName));
        assert!(events.is_empty());
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_selection_fails_with_no_services() {
        let registry = registry_of(&[("tech", "GitHub")]);
        let transport = MockTransport::status(404);
        let options = CheckOptions::new().filter(|d| d.category == "blog");
        let mut events = Vec::new();
        let err = Checker::new(&registry, &transport)
            .check("frank", &options, &mut record(&mut events))
            .unwrap_err();
        assert!(matches!(err, CheckError::NoServices));
        assert_eq!(err.to_string(), "No services found");
        assert!(events.is_empty());
    }

    #[test]
    fn registry_failure_aborts_run() {
        let registry = Registry::new(|| {
            Err(RegistryError::Malformed {
                category: "tech".into(),
                reason: "broken".into(),
            })
        });
        let transport = MockTransport::status(404);
        let err = Checker::new(&registry, &transport)
            .check("frank", &CheckOptions::new(), &mut |_: Event<'_>| {})
            .unwrap_err();
        assert!(matches!(err, CheckError::Registry(_)));
    }

    #[test]
    fn selection_filter_is_applied() {
        let registry = Registry::builtin();
        let transport = MockTransport::replying([Ok(HttpResponse::new(404))]);
        let options = CheckOptions::new().selection(SelectionFilter::new(["tech"], ["github"]));
        let report = Checker::new(&registry, &transport)
            .check("frank", &options, &mut |_: Event<'_>| {})
            .unwrap();
        assert_eq!(report.results().len(), 1);
        assert_eq!(report.results()[0].descriptor().title, "GitHub");
        assert_eq!(report.results()[0].available(), Some(true));
    }

    #[test]
    fn unknown_outcome_is_not_unique() {
        let registry = Registry::builtin();
        let transport = MockTransport::replying([Ok(HttpResponse::new(200))]);
        let options = CheckOptions::new().filter(|d| d.title == "Xbox");
        let report = Checker::new(&registry, &transport)
            .check("frank", &options, &mut |_: Event<'_>| {})
            .unwrap();
        let result = &report.results()[0];
        assert!(result.error().is_none());
        assert_eq!(result.available(), None);
        assert_eq!(report.stats().unavailable, 1);
        assert_eq!(report.unique(), Some(false));
    }

    #[test]
    fn list_preserves_order() {
        let registry = Registry::builtin();
        let transport = MockTransport::default();
        let blog = |d: &Descriptor| d.category == "blog";
        let titles: Vec<String> = Checker::new(&registry, &transport)
            .list(Some(&blog))
            .unwrap()
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(titles, ["LiveJournal", "WordPress"]);
    }

    #[test]
    fn check_error_is_send_sync() {
        fn assert_normal<T: Sized + Send + Sync>() {}
        assert_normal::<CheckError>();
        assert_normal::<CheckOptions>();
    }
}
