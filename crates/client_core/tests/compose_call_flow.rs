use std::sync::{Arc, Mutex};

use client_core::{call_providers, CallSetupTracker};
use shared::{domain::SessionKey, protocol::RealmCallSettings};
use tokio::sync::oneshot;

fn zoom_realm() -> RealmCallSettings {
    serde_json::from_value(serde_json::json!({
        "video_chat_provider": 5,
        "available_video_chat_providers": {
            "disabled": { "name": "None", "id": 0 },
            "jitsi_meet": { "name": "Jitsi Meet", "id": 1 },
            "zoom_server_to_server": { "name": "Zoom Server to Server", "id": 5 }
        }
    }))
    .expect("realm settings")
}

#[tokio::test]
async fn closing_compose_box_discards_oauth_and_link_request() {
    let realm = zoom_realm();
    let provider = call_providers::current_oauth_call_provider(&realm).expect("zoom needs oauth");
    assert!(call_providers::show_video_chat_button(&realm));
    assert!(call_providers::show_audio_chat_button(&realm));

    let tracker = CallSetupTracker::new();
    let compose = SessionKey::from("compose");
    let edit = SessionKey::from("edit-42");
    let inserted = Arc::new(Mutex::new(Vec::<String>::new()));

    for key in [&compose, &edit] {
        let inserted = Arc::clone(&inserted);
        let label = key.to_string();
        tracker
            .register_provider_callback(
                provider,
                key,
                Box::new(move || inserted.lock().expect("inserted lock").push(label)),
            )
            .await;
    }

    let (link_tx, link_rx) = oneshot::channel::<String>();
    let pending_link = tokio::spawn({
        let tracker = tracker.clone();
        let compose = compose.clone();
        async move {
            tracker
                .run_tracked(&compose, async move { link_rx.await.expect("link sent") })
                .await
        }
    });
    while tracker.tracked_requests(&compose).await.is_empty() {
        tokio::task::yield_now().await;
    }

    tracker.abandon(&compose).await;
    link_tx
        .send("https://zoom.example/j/123".into())
        .expect("receiver alive");

    assert_eq!(pending_link.await.expect("task joins"), None);
    assert!(!tracker.complete_provider_callback(provider, &compose).await);
    assert!(tracker.complete_provider_callback(provider, &edit).await);
    assert_eq!(*inserted.lock().expect("inserted lock"), vec!["edit-42".to_string()]);

    let link = tracker
        .run_tracked(&edit, async { "https://zoom.example/j/456".to_string() })
        .await;
    assert_eq!(link.as_deref(), Some("https://zoom.example/j/456"));
    assert_eq!(tracker.ignored_len().await, 0);
}
