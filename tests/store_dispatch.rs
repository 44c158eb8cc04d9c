mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use incident_desk::model::IncidentStatus;
use incident_desk::store::creators;
use incident_desk::store::middleware::from_fn;
use incident_desk::store::{
    ActionEnvelope, AppState, AutoDismissMiddleware, MiddlewareError, Notifier, RawAction, Store, StoreError,
    Subscriber, UiAction, ValidationError,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Barrier;

use common::incident;

fn counting_subscriber(seen: Arc<Mutex<Vec<Arc<AppState>>>>) -> Subscriber {
    Arc::new(move |state: &Arc<AppState>| seen.lock().push(Arc::clone(state)))
}

#[tokio::test]
async fn subscribers_see_each_new_state_exactly_once() {
    let store = Store::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    store.subscribe(counting_subscriber(seen.clone()));

    let added = incident(1, "Fuga de agua", IncidentStatus::Pending);
    let returned = store
        .dispatch(creators::add_incident(added.clone()))
        .unwrap()
        .await
        .unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert!(Arc::ptr_eq(&seen[0], &returned));
    assert_eq!(store.get_state().incidents, vec![added]);
}

#[tokio::test]
async fn action_without_type_fails_before_any_middleware() {
    let store = Store::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    store.apply_middleware(from_fn("counter", move |_store, _envelope| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }
    }));
    let notified = Arc::new(Mutex::new(Vec::new()));
    store.subscribe(counting_subscriber(notified.clone()));
    let before = store.get_state();

    let raw: RawAction = serde_json::from_value(json!({"payload": true})).unwrap();
    let result = store.dispatch(raw);

    assert!(matches!(
        result,
        Err(StoreError::Validation(ValidationError::MissingType))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(notified.lock().is_empty());
    assert!(Arc::ptr_eq(&before, &store.get_state()));
}

#[tokio::test]
async fn unknown_action_type_is_rejected() {
    let store = Store::default();
    let result = store.dispatch(RawAction::new("incidents/explode", Value::Null));
    assert!(matches!(
        result,
        Err(StoreError::Validation(ValidationError::UnknownType { .. }))
    ));
}

#[tokio::test]
async fn middlewares_run_concurrently() {
    let store = Store::default();
    let barrier = Arc::new(Barrier::new(2));
    for name in ["left", "right"] {
        let barrier = barrier.clone();
        store.apply_middleware(from_fn(name, move |_store, _envelope| {
            let barrier = barrier.clone();
            async move {
                // Sequential execution would never release the barrier.
                barrier.wait().await;
                Ok(())
            }
        }));
    }

    let dispatch = store.dispatch(UiAction::ToggleMenu).unwrap();
    let state = tokio::time::timeout(Duration::from_secs(2), dispatch)
        .await
        .expect("middlewares were serialized")
        .unwrap();
    assert!(state.ui.menu_open);
}

#[tokio::test]
async fn reducer_waits_for_every_middleware() {
    let store = Store::default();
    store.apply_middleware(from_fn("slow", |store: Store, _envelope| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        // Still the pre-dispatch state while a middleware is pending.
        assert!(!store.get_state().ui.dark_mode);
        Ok(())
    }));

    let state = store
        .dispatch(creators::toggle_dark_mode())
        .unwrap()
        .await
        .unwrap();
    assert!(state.ui.dark_mode);
}

#[tokio::test]
async fn middleware_failure_is_reported_after_the_update() {
    let store = Store::default();
    store.apply_middleware(from_fn("audit", |_store, _envelope| async {
        Err(MiddlewareError::new("audit sink unavailable"))
    }));
    let notified = Arc::new(Mutex::new(Vec::new()));
    store.subscribe(counting_subscriber(notified.clone()));

    let err = store
        .dispatch(creators::set_filter_status(IncidentStatus::Resolved.as_str()))
        .unwrap()
        .await
        .unwrap_err();

    let StoreError::Middleware { failures, .. } = err else {
        panic!("expected middleware error");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].middleware, "audit");
    assert!(failures[0].message.contains("audit sink unavailable"));

    assert_eq!(store.get_state().ui.filter_status, "resuelto");
    assert_eq!(notified.lock().len(), 1);
}

#[tokio::test]
async fn panicking_middleware_does_not_poison_the_store() {
    let store = Store::default();
    store.apply_middleware(from_fn("boom", |_store, envelope: ActionEnvelope| async move {
        if envelope.sequence_id > 0 {
            panic!("middleware exploded");
        }
        Ok(())
    }));

    let err = store
        .dispatch(UiAction::ToggleMenu)
        .unwrap()
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Middleware { .. }));
    assert!(store.get_state().ui.menu_open);
}

#[tokio::test]
async fn panicking_subscriber_does_not_block_others() {
    let store = Store::default();
    store.subscribe(Arc::new(|_state: &Arc<AppState>| panic!("bad subscriber")));
    let notified = Arc::new(Mutex::new(Vec::new()));
    store.subscribe(counting_subscriber(notified.clone()));

    store
        .dispatch(UiAction::ToggleMenu)
        .unwrap()
        .await
        .unwrap();

    assert_eq!(notified.lock().len(), 1);
}

#[tokio::test]
async fn duplicate_subscription_is_ignored_and_unsubscribe_stops_delivery() {
    let store = Store::default();
    let notified = Arc::new(Mutex::new(Vec::new()));
    let subscriber = counting_subscriber(notified.clone());

    let subscription = store.subscribe(subscriber.clone());
    store.subscribe(subscriber.clone());
    assert_eq!(store.subscriber_count(), 1);

    store.dispatch(UiAction::ToggleMenu).unwrap().await.unwrap();
    assert_eq!(notified.lock().len(), 1);

    assert!(subscription.unsubscribe());
    assert!(!store.unsubscribe(&subscriber));
    store.dispatch(UiAction::ToggleMenu).unwrap().await.unwrap();
    assert_eq!(notified.lock().len(), 1);
}

#[tokio::test]
async fn raw_actions_dispatch_like_typed_ones() {
    let store = Store::default();
    store
        .dispatch(RawAction::new("ui/setDarkMode", json!(true)))
        .unwrap()
        .await
        .unwrap();
    assert!(store.get_state().ui.dark_mode);
}

#[tokio::test(start_paused = true)]
async fn notifications_dismiss_themselves_after_their_duration() {
    let store = Store::default();
    store.apply_middleware(Arc::new(AutoDismissMiddleware));
    let notifier = Notifier::new();

    store
        .dispatch(notifier.success("Incidente creado"))
        .unwrap()
        .await
        .unwrap();
    store
        .dispatch(notifier.error("Sin conexión"))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(store.get_state().notifications.len(), 2);

    tokio::time::sleep(Duration::from_millis(3_100)).await;
    let remaining: Vec<u64> = store
        .get_state()
        .notifications
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(remaining, vec![2]);

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert!(store.get_state().notifications.is_empty());
}
