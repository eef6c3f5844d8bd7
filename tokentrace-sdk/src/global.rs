//! Process-wide default exporter.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::sinks::LogSink;
use crate::{SdkError, SyncExporter, UsageExporter};

static DEFAULT_EXPORTER: RwLock<Option<Arc<dyn UsageExporter>>> = parking_lot::const_rwlock(None);

/// Return the default exporter, installing a log exporter on first access.
///
/// The first access also starts the global [`ExportRuntime`](crate::ExportRuntime)
/// and fails if it cannot be started.
///
/// Replace the default during single-threaded startup. A call to
/// [`set_default_exporter`] that races with the very first access may leave
/// the racing caller holding the lazily created log exporter.
pub fn default_exporter() -> Result<Arc<dyn UsageExporter>, SdkError> {
    if let Some(exporter) = DEFAULT_EXPORTER.read().as_ref() {
        return Ok(exporter.clone());
    }

    let mut slot = DEFAULT_EXPORTER.write();
    if let Some(exporter) = slot.as_ref() {
        return Ok(exporter.clone());
    }

    let exporter: Arc<dyn UsageExporter> = Arc::new(SyncExporter::new(LogSink::default())?);
    *slot = Some(exporter.clone());
    Ok(exporter)
}

/// Replace the default exporter used by trackers with no exporter of their own.
pub fn set_default_exporter(exporter: Arc<dyn UsageExporter>) {
    *DEFAULT_EXPORTER.write() = Some(exporter);
}
