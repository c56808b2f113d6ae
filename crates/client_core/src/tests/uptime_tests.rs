use super::*;

#[test]
fn elapsed_is_rendered_zero_padded() {
    assert_eq!(format_elapsed(0), "00:00:00");
    assert_eq!(format_elapsed(59_999), "00:00:59");
    assert_eq!(format_elapsed(60_000), "00:01:00");
    assert_eq!(format_elapsed(3_661_000), "01:01:01");
}

#[test]
fn hours_keep_counting_past_twenty_four() {
    // 25h 1m 1s: no day roll-over.
    assert_eq!(format_elapsed(90_061_000), "25:01:01");
}

#[tokio::test]
async fn first_activation_stores_the_epoch_once() {
    let store = Arc::new(InMemorySessionStore::default());
    assert!(store.load_epoch().is_none());

    let tracker = UptimeTracker::new(store.clone());
    tracker.start(|_| {}).await;
    let stored = store.load_epoch().expect("epoch captured on first start");

    tracker.stop().await;
    tracker.start(|_| {}).await;
    assert_eq!(store.load_epoch(), Some(stored));
    tracker.stop().await;
}

#[tokio::test]
async fn reactivation_reuses_the_session_anchor() {
    let store = Arc::new(InMemorySessionStore::default());
    store.store_epoch(Utc::now().timestamp_millis() - 7_200_000);

    let tracker = UptimeTracker::new(store);
    tracker.start(|_| {}).await;
    let display = tracker.elapsed_display().await.expect("anchor loaded");
    assert!(display.starts_with("02:00"), "got {display}");

    tracker.stop().await;
    tracker.start(|_| {}).await;
    let display = tracker.elapsed_display().await.expect("anchor loaded");
    assert!(display.starts_with("02:00"), "got {display}");
    tracker.stop().await;
}

#[tokio::test(start_paused = true)]
async fn ticker_fires_once_per_second_and_stops_cleanly() {
    let store = Arc::new(InMemorySessionStore::default());
    let tracker = UptimeTracker::new(store);
    let ticks = Arc::new(std::sync::Mutex::new(Vec::new()));

    let sink = Arc::clone(&ticks);
    tracker
        .start(move |display| {
            if let Ok(mut guard) = sink.lock() {
                guard.push(display);
            }
        })
        .await;
    // A second start while running must not double the tick rate.
    tracker.start(|_| {}).await;
    assert!(tracker.is_running().await);

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    let seen = ticks.lock().expect("lock").len();
    assert!((3..=4).contains(&seen), "got {seen} ticks");

    tracker.stop().await;
    assert!(!tracker.is_running().await);
    let after_stop = ticks.lock().expect("lock").len();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(ticks.lock().expect("lock").len(), after_stop);
}
