//! Prometheus counters for the registry server

use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};

const NAMESPACE: &str = "indicator_registry";

/// Registry-owned metric handles. Cloning shares the underlying metrics.
#[derive(Clone)]
pub struct RegistryMetrics {
    registry: Registry,
    pub registrations_total: IntCounter,
    pub registration_errors_total: IntCounter,
    pub status_updates_total: IntCounter,
    pub documents_expired_total: IntCounter,
    pub registered_documents: IntGauge,
}

impl RegistryMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some(NAMESPACE.to_string()), None)?;

        let registrations_total = IntCounter::with_opts(Opts::new(
            "registrations_total",
            "Documents accepted by the register endpoint",
        ))?;
        let registration_errors_total = IntCounter::with_opts(Opts::new(
            "registration_errors_total",
            "Documents rejected by the register endpoint",
        ))?;
        let status_updates_total = IntCounter::with_opts(Opts::new(
            "status_updates_total",
            "Indicator statuses recorded",
        ))?;
        let documents_expired_total = IntCounter::with_opts(Opts::new(
            "documents_expired_total",
            "Documents removed after their TTL elapsed",
        ))?;
        let registered_documents = IntGauge::with_opts(Opts::new(
            "registered_documents",
            "Documents currently held by the registry",
        ))?;

        registry.register(Box::new(registrations_total.clone()))?;
        registry.register(Box::new(registration_errors_total.clone()))?;
        registry.register(Box::new(status_updates_total.clone()))?;
        registry.register(Box::new(documents_expired_total.clone()))?;
        registry.register(Box::new(registered_documents.clone()))?;

        Ok(Self {
            registry,
            registrations_total,
            registration_errors_total,
            status_updates_total,
            documents_expired_total,
            registered_documents,
        })
    }

    /// Text exposition of every metric
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for RegistryMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryMetrics")
            .field("registrations_total", &self.registrations_total.get())
            .field("registration_errors_total", &self.registration_errors_total.get())
            .field("status_updates_total", &self.status_updates_total.get())
            .field("documents_expired_total", &self.documents_expired_total.get())
            .field("registered_documents", &self.registered_documents.get())
            .finish()
    }
}
