use std::sync::Arc;
use std::time::Duration;

use sigmux::{
    BusError, BusObject, Converter, DeliveryPolicy, DispatchError, Dispatcher, Event, EventKind,
    IntRepr, LocalBus, ObjectPath, RawEvent, Registration, RoutingKey, SignalValue, Value,
    ValueType,
};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

const IFACE: &str = "com.example.Device";

#[derive(Debug, PartialEq)]
enum State {
    Idle,
    Busy,
    Failed,
}

impl SignalValue for State {
    fn value_type() -> ValueType {
        ValueType::Enum {
            name: "State",
            repr: IntRepr::U32,
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value.as_unsigned()? {
            0 => Some(State::Idle),
            1 => Some(State::Busy),
            2 => Some(State::Failed),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Uint32(self as u32)
    }
}

fn setup() -> (Arc<LocalBus>, Arc<Dispatcher>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let bus = Arc::new(LocalBus::new(32));
    let dispatcher = Dispatcher::builder(bus.clone()).build();
    (bus, dispatcher)
}

fn path(p: &str) -> ObjectPath {
    ObjectPath::new(p).unwrap()
}

fn key(p: &str, member: &str) -> RoutingKey {
    RoutingKey::parse(p, &format!("{IFACE}.{member}")).unwrap()
}

fn signal(p: &str, member: &str, body: Vec<Value>) -> RawEvent {
    RawEvent::parse(p, &format!("{IFACE}.{member}"), body).unwrap()
}

async fn next_delivery_problem(rx: &mut broadcast::Receiver<Event>) -> Event {
    timeout(Duration::from_secs(2), async {
        loop {
            let ev = rx.recv().await.unwrap();
            if ev.is_delivery_problem() {
                return ev;
            }
        }
    })
    .await
    .expect("no delivery problem reported")
}

async fn wait_for(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
    timeout(Duration::from_secs(2), async {
        loop {
            let ev = rx.recv().await.unwrap();
            if ev.kind == kind {
                return ev;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no {kind:?} event"))
}

async fn recv<T>(rx: &mut mpsc::Receiver<T>) -> Option<T> {
    timeout(Duration::from_secs(2), rx.recv()).await.ok().flatten()
}

#[tokio::test]
async fn two_queues_share_one_match_rule() {
    let (bus, dispatcher) = setup();
    let (tx_a, mut rx_a) = mpsc::channel::<bool>(4);
    let (tx_b, mut rx_b) = mpsc::channel::<bool>(4);

    for tx in [tx_a, tx_b] {
        dispatcher
            .subscribe(&path("/dev/0"), IFACE, "Ready", ValueType::Bool, tx, None)
            .await
            .unwrap();
    }
    assert_eq!(bus.add_match_calls(), 1);
    assert_eq!(dispatcher.subscriber_count(&key("/dev/0", "Ready")).await, 2);

    assert!(bus.emit(signal("/dev/0", "Ready", vec![Value::Bool(true)])).await.unwrap());
    assert_eq!(recv(&mut rx_a).await, Some(true));
    assert_eq!(recv(&mut rx_b).await, Some(true));

    // exactly once each
    assert!(rx_a.try_recv().is_err());
    assert!(rx_b.try_recv().is_err());
}

#[tokio::test]
async fn resubscribing_the_same_queue_is_a_noop() {
    let (bus, dispatcher) = setup();
    let (tx, mut rx) = mpsc::channel::<bool>(4);
    let p = path("/dev/0");

    let first = dispatcher
        .subscribe(&p, IFACE, "Ready", ValueType::Bool, tx.clone(), None)
        .await
        .unwrap();
    let second = dispatcher
        .subscribe(&p, IFACE, "Ready", ValueType::Bool, tx, None)
        .await
        .unwrap();
    assert_eq!(second, Registration::AlreadyPresent(first.sink()));
    assert_eq!(bus.add_match_calls(), 1);

    bus.emit(signal("/dev/0", "Ready", vec![Value::Bool(false)])).await.unwrap();
    assert_eq!(recv(&mut rx).await, Some(false));
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn enum_queue_from_uint32_payload() {
    let (bus, dispatcher) = setup();
    let obj = BusObject::new(dispatcher, path("/jobs/1"));
    let (tx, mut rx) = mpsc::channel::<State>(4);

    obj.uint_signal(IFACE, "StateChanged", tx).await.unwrap();
    bus.emit(signal("/jobs/1", "StateChanged", vec![Value::Uint32(2)])).await.unwrap();
    assert_eq!(recv(&mut rx).await, Some(State::Failed));
}

#[tokio::test]
async fn payload_values_are_delivered_in_order() {
    let (bus, dispatcher) = setup();
    let (tx, mut rx) = mpsc::channel::<u64>(8);

    // uint32 on the wire, widened to u64
    dispatcher
        .subscribe(&path("/dev/0"), IFACE, "Counters", ValueType::Uint32, tx, None)
        .await
        .unwrap();
    let body = vec![Value::Uint32(3), Value::Uint32(1), Value::Uint32(2)];
    bus.emit(signal("/dev/0", "Counters", body)).await.unwrap();

    for expected in [3u64, 1, 2] {
        assert_eq!(recv(&mut rx).await, Some(expected));
    }
}

#[tokio::test]
async fn incompatible_type_rejected_before_any_remote_call() {
    let (bus, dispatcher) = setup();
    let (tx, _rx) = mpsc::channel::<bool>(1);

    let err = dispatcher
        .subscribe(&path("/dev/0"), IFACE, "Name", ValueType::Str, tx, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::TypeIncompatible { .. }));
    assert_eq!(bus.add_match_calls(), 0);
    assert!(dispatcher.keys().await.is_empty());
    assert!(!dispatcher.is_running().await);
}

#[tokio::test]
async fn incompatible_type_leaves_existing_subscribers_untouched() {
    let (bus, dispatcher) = setup();
    let (tx_name, _rx_name) = mpsc::channel::<String>(1);
    let (tx_flag, _rx_flag) = mpsc::channel::<bool>(1);
    let p = path("/dev/0");

    dispatcher
        .subscribe(&p, IFACE, "Name", ValueType::Str, tx_name, None)
        .await
        .unwrap();
    let err = dispatcher
        .subscribe(&p, IFACE, "Name", ValueType::Str, tx_flag, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::TypeIncompatible { .. }));
    assert_eq!(dispatcher.subscriber_count(&key("/dev/0", "Name")).await, 1);
    assert_eq!(dispatcher.keys().await, vec![key("/dev/0", "Name")]);
    assert_eq!(bus.add_match_calls(), 1);
}

#[tokio::test]
async fn enum_declared_as_wire_type_fails_at_subscribe() {
    let (bus, dispatcher) = setup();
    let (tx, _rx) = mpsc::channel::<State>(1);

    let err = dispatcher
        .subscribe(&path("/jobs/1"), IFACE, "StateChanged", State::value_type(), tx, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::TypeIncompatible { .. }));
    assert_eq!(bus.add_match_calls(), 0);
    assert!(dispatcher.keys().await.is_empty());
}

#[tokio::test]
async fn converter_with_wrong_signature_is_rejected() {
    let (bus, dispatcher) = setup();
    let (tx, _rx) = mpsc::channel::<bool>(1);
    let to_string = Converter::new(|v: u32| v.to_string());

    let err = dispatcher
        .subscribe(&path("/dev/0"), IFACE, "State", ValueType::Uint32, tx, Some(to_string))
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "converter_signature_mismatch");
    assert_eq!(bus.add_match_calls(), 0);
    assert!(dispatcher.keys().await.is_empty());
}

#[tokio::test]
async fn custom_converter_is_applied() {
    let (bus, dispatcher) = setup();
    let (tx, mut rx) = mpsc::channel::<bool>(4);
    let connected = Converter::new(|state: u32| state >= 70);

    dispatcher
        .subscribe(&path("/dev/0"), IFACE, "State", ValueType::Uint32, tx, Some(connected))
        .await
        .unwrap();
    let body = vec![Value::Uint32(20), Value::Uint32(70)];
    bus.emit(signal("/dev/0", "State", body)).await.unwrap();

    assert_eq!(recv(&mut rx).await, Some(false));
    assert_eq!(recv(&mut rx).await, Some(true));
}

#[tokio::test]
async fn rejected_match_rule_installs_nothing() {
    let (bus, dispatcher) = setup();
    bus.reject_add_match_for(&key("/dev/0", "Ready"));
    let (tx, _rx) = mpsc::channel::<bool>(1);

    let err = dispatcher
        .subscribe(&path("/dev/0"), IFACE, "Ready", ValueType::Bool, tx.clone(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::RegistrationFailed { source: BusError::Rejected { .. }, .. }
    ));
    assert!(dispatcher.keys().await.is_empty());

    // other keys are unaffected
    dispatcher
        .subscribe(&path("/dev/1"), IFACE, "Ready", ValueType::Bool, tx, None)
        .await
        .unwrap();
    assert_eq!(dispatcher.keys().await, vec![key("/dev/1", "Ready")]);
}

#[tokio::test]
async fn invalid_names_are_rejected() {
    let (bus, dispatcher) = setup();
    let (tx, _rx) = mpsc::channel::<bool>(1);

    let err = dispatcher
        .subscribe(&path("/dev/0"), "noperiod", "Ready", ValueType::Bool, tx, None)
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "invalid_member");
    assert!(ObjectPath::new("dev/0").is_err());
    assert_eq!(bus.add_match_calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_subscribes_issue_one_rule_per_key() {
    const KEYS: usize = 6;
    const TASKS: usize = 48;

    let (bus, dispatcher) = setup();
    let mut receivers = Vec::new();
    let mut handles = Vec::new();
    for i in 0..TASKS {
        let (tx, rx) = mpsc::channel::<bool>(1);
        receivers.push(rx);
        let dispatcher = Arc::clone(&dispatcher);
        handles.push(tokio::spawn(async move {
            let p = path(&format!("/dev/{}", i % KEYS));
            dispatcher
                .subscribe(&p, IFACE, "Ready", ValueType::Bool, tx, None)
                .await
        }));
    }
    for h in handles {
        assert!(matches!(h.await.unwrap(), Ok(Registration::Added(_))));
    }

    assert_eq!(bus.add_match_calls(), KEYS);
    assert_eq!(dispatcher.keys().await.len(), KEYS);
    for k in dispatcher.keys().await {
        assert_eq!(dispatcher.subscriber_count(&k).await, TASKS / KEYS);
    }
}

#[tokio::test]
async fn unsubscribing_last_queue_withdraws_rule() {
    let (bus, dispatcher) = setup();
    let (tx, _rx) = mpsc::channel::<bool>(1);
    let p = path("/dev/0");

    dispatcher
        .subscribe(&p, IFACE, "Ready", ValueType::Bool, tx.clone(), None)
        .await
        .unwrap();
    assert!(dispatcher.unsubscribe(&p, IFACE, "Ready", &tx).await.unwrap());
    assert!(!dispatcher.unsubscribe(&p, IFACE, "Ready", &tx).await.unwrap());

    assert_eq!(bus.remove_match_calls(), 1);
    assert!(bus.active_rules().is_empty());
    assert!(dispatcher.keys().await.is_empty());
    assert!(!bus.emit(signal("/dev/0", "Ready", vec![Value::Bool(true)])).await.unwrap());
}

#[tokio::test]
async fn dropped_receiver_is_pruned() {
    let (bus, dispatcher) = setup();
    let mut events = dispatcher.events();
    let (tx_gone, rx_gone) = mpsc::channel::<bool>(1);
    let (tx_live, mut rx_live) = mpsc::channel::<bool>(4);
    let p = path("/dev/0");

    for tx in [tx_gone, tx_live] {
        dispatcher
            .subscribe(&p, IFACE, "Ready", ValueType::Bool, tx, None)
            .await
            .unwrap();
    }
    drop(rx_gone);

    bus.emit(signal("/dev/0", "Ready", vec![Value::Bool(true)])).await.unwrap();
    assert_eq!(recv(&mut rx_live).await, Some(true));

    let ev = wait_for(&mut events, EventKind::SubscriberRemoved).await;
    assert_eq!(ev.reason.as_deref(), Some("receiver_dropped"));
    assert_eq!(dispatcher.subscriber_count(&key("/dev/0", "Ready")).await, 1);
    assert_eq!(bus.remove_match_calls(), 0);
}

#[tokio::test]
async fn full_queue_drops_under_drop_policy() {
    let bus = Arc::new(LocalBus::new(8));
    let dispatcher = Dispatcher::builder(bus.clone())
        .with_delivery(DeliveryPolicy::DropWhenFull)
        .build();
    let mut events = dispatcher.events();
    let (tx, mut rx) = mpsc::channel::<bool>(1);

    dispatcher
        .subscribe(&path("/dev/0"), IFACE, "Ready", ValueType::Bool, tx, None)
        .await
        .unwrap();
    let body = vec![Value::Bool(true), Value::Bool(false), Value::Bool(false)];
    bus.emit(signal("/dev/0", "Ready", body)).await.unwrap();

    for _ in 0..2 {
        let ev = wait_for(&mut events, EventKind::DeliveryDropped).await;
        assert_eq!(ev.reason.as_deref(), Some("delivery_full"));
    }
    assert_eq!(recv(&mut rx).await, Some(true));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn wire_drift_is_reported_and_worker_continues() {
    let (bus, dispatcher) = setup();
    let mut events = dispatcher.events();
    let (tx, mut rx) = mpsc::channel::<bool>(4);

    dispatcher
        .subscribe(&path("/dev/0"), IFACE, "Ready", ValueType::Bool, tx, None)
        .await
        .unwrap();
    bus.emit(signal("/dev/0", "Ready", vec![Value::Str("yes".into())]))
        .await
        .unwrap();

    let ev = next_delivery_problem(&mut events).await;
    assert_eq!(ev.kind, EventKind::DeliveryFailed);
    assert_eq!(ev.key.as_deref(), Some("/dev/0:com.example.Device.Ready"));

    bus.emit(signal("/dev/0", "Ready", vec![Value::Bool(true)])).await.unwrap();
    assert_eq!(recv(&mut rx).await, Some(true));
}

#[tokio::test]
async fn panicking_converter_only_affects_its_value() {
    let (bus, dispatcher) = setup();
    let mut events = dispatcher.events();
    let (tx, mut rx) = mpsc::channel::<bool>(4);
    let picky = Converter::new(|v: u32| {
        assert!(v != 13, "unlucky");
        v > 0
    });

    dispatcher
        .subscribe(&path("/dev/0"), IFACE, "State", ValueType::Uint32, tx, Some(picky))
        .await
        .unwrap();
    let body = vec![Value::Uint32(13), Value::Uint32(1)];
    bus.emit(signal("/dev/0", "State", body)).await.unwrap();

    let ev = wait_for(&mut events, EventKind::DeliveryFailed).await;
    assert!(ev.reason.as_deref().unwrap_or_default().contains("unlucky"));
    assert_eq!(recv(&mut rx).await, Some(true));
}

#[tokio::test]
async fn signals_without_subscribers_are_ignored() {
    let (bus, dispatcher) = setup();
    let (tx, mut rx) = mpsc::channel::<bool>(4);

    dispatcher
        .subscribe(&path("/dev/0"), IFACE, "Ready", ValueType::Bool, tx, None)
        .await
        .unwrap();
    bus.inject(signal("/dev/9", "Ready", vec![Value::Bool(false)])).await.unwrap();
    bus.emit(signal("/dev/0", "Ready", vec![Value::Bool(true)])).await.unwrap();

    assert_eq!(recv(&mut rx).await, Some(true));
}

#[tokio::test]
async fn worker_starts_once() {
    let (_bus, dispatcher) = setup();
    let mut events = dispatcher.events();

    for member in ["Ready", "Gone", "Moved"] {
        let (tx, _rx) = mpsc::channel::<bool>(1);
        dispatcher
            .subscribe(&path("/dev/0"), IFACE, member, ValueType::Bool, tx, None)
            .await
            .unwrap();
    }
    wait_for(&mut events, EventKind::WorkerStarted).await;
    assert!(dispatcher.is_running().await);

    dispatcher.shutdown().await;
    let mut started = 0;
    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::WorkerStarted {
            started += 1;
        }
    }
    assert_eq!(started, 0);
}

#[tokio::test]
async fn closing_the_connection_stops_the_worker() {
    let (bus, dispatcher) = setup();
    let mut events = dispatcher.events();
    let (tx, _rx) = mpsc::channel::<bool>(1);

    dispatcher
        .subscribe(&path("/dev/0"), IFACE, "Ready", ValueType::Bool, tx.clone(), None)
        .await
        .unwrap();
    bus.close();

    let ev = wait_for(&mut events, EventKind::WorkerStopped).await;
    assert_eq!(ev.reason.as_deref(), Some("connection_closed"));
    timeout(Duration::from_secs(2), async {
        while dispatcher.is_running().await {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    let err = dispatcher
        .subscribe(&path("/dev/1"), IFACE, "Ready", ValueType::Bool, tx, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Closed));
}

#[tokio::test]
async fn shutdown_rejects_new_subscriptions() {
    let (bus, dispatcher) = setup();
    let (tx, _rx) = mpsc::channel::<bool>(1);

    dispatcher
        .subscribe(&path("/dev/0"), IFACE, "Ready", ValueType::Bool, tx.clone(), None)
        .await
        .unwrap();
    dispatcher.shutdown().await;
    assert!(!dispatcher.is_running().await);

    let err = dispatcher
        .subscribe(&path("/dev/0"), IFACE, "Other", ValueType::Bool, tx, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Closed));
    assert_eq!(bus.add_match_calls(), 1);
}

#[tokio::test]
async fn second_dispatcher_cannot_take_the_feed() {
    let (bus, first) = setup();
    let second = Dispatcher::builder(bus.clone()).build();
    let (tx, _rx) = mpsc::channel::<bool>(1);

    first
        .subscribe(&path("/dev/0"), IFACE, "Ready", ValueType::Bool, tx.clone(), None)
        .await
        .unwrap();
    let err = second
        .subscribe(&path("/dev/0"), IFACE, "Ready", ValueType::Bool, tx, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::RegistrationFailed { source: BusError::FeedTaken, .. }
    ));
}
