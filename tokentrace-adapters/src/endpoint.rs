//! Base URL selection shared by the Google REST backends.

/// Pick the REST base URL: an explicit endpoint, then the emulator host, then
/// `default`.
#[cfg_attr(not(any(feature = "firestore", feature = "pubsub")), allow(dead_code))]
pub(crate) fn resolve_endpoint(
    explicit: Option<String>,
    emulator_host: Option<String>,
    default: &str,
) -> String {
    if let Some(endpoint) = explicit {
        return endpoint.trim_end_matches('/').to_string();
    }
    match emulator_host {
        Some(host) if !host.trim().is_empty() => format!("http://{}", host.trim()),
        _ => default.to_string(),
    }
}
