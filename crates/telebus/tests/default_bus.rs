use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use telebus::{scoped_default, telemetry, TelemetryBus, Topic};

#[derive(Debug, Serialize, Deserialize)]
struct CacheStats {
    hits: u32,
    misses: u32,
}

struct CacheFlushed;

impl Topic for CacheFlushed {
    const NAME: &'static str = "cache:flushed";
    type Payload = CacheStats;
}

// One test per binary: the default bus is shared by the whole process.
#[test]
fn unrelated_components_meet_on_the_default_bus() {
    let isolated: TelemetryBus = TelemetryBus::new();
    let _scope = scoped_default(isolated.clone());

    let total_hits = Arc::new(AtomicU32::new(0));
    let counter = total_hits.clone();
    let unsubscribe = telemetry().on_topic::<CacheFlushed, _>(move |ev| {
        if let Some(stats) = &ev.payload {
            counter.fetch_add(stats.hits, Ordering::SeqCst);
        }
    });

    let emitted = telemetry()
        .emit_topic::<CacheFlushed>(&CacheStats { hits: 3, misses: 1 })
        .unwrap();
    assert_eq!(emitted, 1);
    assert_eq!(total_hits.load(Ordering::SeqCst), 3);
    assert_eq!(isolated.listener_count(CacheFlushed::NAME), 1);

    unsubscribe.unsubscribe();
    assert!(isolated.is_empty());

    drop(_scope);
    assert_eq!(telemetry().listener_count(CacheFlushed::NAME), 0);
}
