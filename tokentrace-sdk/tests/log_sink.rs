//! The log sink goes through whatever global `tracing` subscriber is
//! installed, so it is tested in its own binary.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use tokentrace_sdk::sinks::LOG_TARGET;
use tokentrace_sdk::{
    AuthMethod, ExportRuntime, LogSink, MethodName, SyncExporter, UsageExporter, UsageRecord,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

#[derive(Debug, Clone)]
struct Captured {
    level: Level,
    channel: Option<String>,
    message: String,
}

#[derive(Clone, Default)]
struct CaptureLayer {
    events: Arc<Mutex<Vec<Captured>>>,
}

#[derive(Default)]
struct Fields {
    message: Option<String>,
    channel: Option<String>,
}

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{value:?}")),
            "channel" => self.channel = Some(format!("{value:?}")),
            _ => {}
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != LOG_TARGET {
            return;
        }
        let mut fields = Fields::default();
        event.record(&mut fields);
        self.events.lock().unwrap().push(Captured {
            level: *event.metadata().level(),
            channel: fields.channel,
            message: fields.message.unwrap_or_default(),
        });
    }
}

fn capture() -> &'static CaptureLayer {
    static LAYER: OnceLock<CaptureLayer> = OnceLock::new();
    LAYER.get_or_init(|| {
        let layer = CaptureLayer::default();
        tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layer.clone()))
            .expect("global subscriber already set");
        layer
    })
}

fn events_on(channel: &str) -> Vec<Captured> {
    capture()
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.channel.as_deref() == Some(channel))
        .cloned()
        .collect()
}

#[test]
fn background_export_logs_one_info_event() {
    let _ = capture();
    let runtime = ExportRuntime::start().unwrap();
    let exporter = SyncExporter::with_runtime(LogSink::default(), runtime.clone());

    let record = UsageRecord::builder(
        "gemini-2.5-flash",
        MethodName::GenerateContent,
        AuthMethod::ApiKey,
    )
    .input_tokens(10)
    .output_tokens(20)
    .build()
    .unwrap();
    exporter.export(record.clone());

    assert!(runtime.wait_idle(Duration::from_secs(2)));
    let events = events_on("tokentrace");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].level, Level::INFO);

    let parsed: UsageRecord = serde_json::from_str(&events[0].message).unwrap();
    assert_eq!(parsed.model_name, "gemini-2.5-flash");
    assert_eq!(parsed.method_name, MethodName::GenerateContent);
    assert_eq!(parsed.authentication_method, AuthMethod::ApiKey);
    assert_eq!(parsed.input_tokens, 10);
    assert_eq!(parsed.output_tokens, 20);
    assert_eq!(parsed.agent_name, None);
    assert_eq!(parsed.thinking_tokens, None);
    assert_eq!(parsed.images_generated, 0);
    assert_eq!(parsed.videos_generated, 0);
    assert_eq!(parsed, record);
    runtime.shutdown();
}

#[tokio::test]
async fn awaited_export_logs_on_named_channel() {
    let _ = capture();
    let sink = LogSink::new("billing");
    let record = UsageRecord::builder("imagen-4", MethodName::GenerateImages, AuthMethod::ApiKey)
        .input_tokens(0)
        .output_tokens(0)
        .images_generated(4)
        .build()
        .unwrap();

    tokentrace_sdk::ExportSink::export(&sink, &record).await;

    let events = events_on("billing");
    assert_eq!(events.len(), 1);
    let parsed: UsageRecord = serde_json::from_str(&events[0].message).unwrap();
    assert_eq!(parsed.images_generated, 4);
}
