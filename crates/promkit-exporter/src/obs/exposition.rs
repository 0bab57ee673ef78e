//! The exposition registry: every instrument the facade creates is registered
//! here, and the `/metrics` handler and the error reporter both read the text
//! it renders.

use prometheus::core::Collector;
use prometheus::{Encoder, Registry, TextEncoder};

use promkit_core::error::{MetricsError, Result};

/// Anything that can produce the current exposition text.
pub trait ExpositionSource: Send + Sync {
    fn exposition_text(&self) -> Result<String>;
}

/// Cheap to clone; clones share one backend registry.
#[derive(Clone)]
pub struct ExpositionRegistry {
    registry: Registry,
}

impl Default for ExpositionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpositionRegistry {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    pub fn register(&self, collector: Box<dyn Collector>) -> prometheus::Result<()> {
        self.registry.register(collector)
    }

    /// Encode all registered families in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let families = self.registry.gather();
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buf)
            .map_err(|e| MetricsError::Internal(format!("encode metrics failed: {e}")))?;
        String::from_utf8(buf)
            .map_err(|e| MetricsError::Internal(format!("metrics text is not utf-8: {e}")))
    }

    /// `Content-Type` of [`ExpositionRegistry::render`].
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

impl ExpositionSource for ExpositionRegistry {
    fn exposition_text(&self) -> Result<String> {
        self.render()
    }
}
