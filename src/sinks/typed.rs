use std::any::Any;
use std::marker::PhantomData;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};

use crate::convert::{ConversionStrategy, SignalValue};
use crate::error::{ConvertError, DeliveryError};
use crate::policies::DeliveryPolicy;
use crate::sinks::{Sink, SinkId};
use crate::wire::{Value, ValueType};

/// Subscriber feeding an `mpsc::Sender<T>`.
pub struct TypedSink<T: SignalValue> {
    id: SinkId,
    tx: mpsc::Sender<T>,
    strategy: ConversionStrategy,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SignalValue> TypedSink<T> {
    /// Creates a sink with a fresh id.
    pub fn new(tx: mpsc::Sender<T>, strategy: ConversionStrategy) -> Self {
        Self {
            id: SinkId::next(),
            tx,
            strategy,
            _marker: PhantomData,
        }
    }

    /// True if `sink` is a `TypedSink<T>` feeding the same channel as `tx`.
    pub fn feeds(sink: &dyn Sink, tx: &mpsc::Sender<T>) -> bool {
        sink.as_any()
            .downcast_ref::<TypedSink<T>>()
            .is_some_and(|s| s.tx.same_channel(tx))
    }

    fn convert(&self, value: Value) -> Result<T, ConvertError> {
        let converted = self.strategy.apply(value)?;
        let actual = converted.value_type();
        T::from_value(converted).ok_or_else(|| ConvertError::Decode {
            target: T::value_type(),
            actual,
        })
    }
}

#[async_trait]
impl<T: SignalValue> Sink for TypedSink<T> {
    fn id(&self) -> SinkId {
        self.id
    }

    fn declared(&self) -> ValueType {
        T::value_type()
    }

    fn strategy(&self) -> &ConversionStrategy {
        &self.strategy
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn same_target(&self, other: &dyn Sink) -> bool {
        Self::feeds(other, &self.tx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn deliver(&self, value: Value, policy: DeliveryPolicy) -> Result<(), DeliveryError> {
        let item = self.convert(value)?;

        match policy.normalized() {
            DeliveryPolicy::Block => self.tx.send(item).await.map_err(|_| DeliveryError::Closed),
            DeliveryPolicy::DropWhenFull => self.tx.try_send(item).map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Full,
                TrySendError::Closed(_) => DeliveryError::Closed,
            }),
            DeliveryPolicy::Timeout(d) => self.tx.send_timeout(item, d).await.map_err(|e| match e {
                SendTimeoutError::Timeout(_) => DeliveryError::Timeout,
                SendTimeoutError::Closed(_) => DeliveryError::Closed,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::reconcile;
    use std::time::Duration;

    fn bool_sink(cap: usize) -> (TypedSink<bool>, mpsc::Receiver<bool>) {
        let (tx, rx) = mpsc::channel(cap);
        let strategy = reconcile(&ValueType::Bool, &ValueType::Bool, None).unwrap();
        (TypedSink::new(tx, strategy), rx)
    }

    #[tokio::test]
    async fn test_deliver_identity() {
        let (sink, mut rx) = bool_sink(1);
        sink.deliver(Value::Bool(true), DeliveryPolicy::Block).await.unwrap();
        assert_eq!(rx.recv().await, Some(true));
    }

    #[tokio::test]
    async fn test_drop_when_full() {
        let (sink, _rx) = bool_sink(1);
        sink.deliver(Value::Bool(true), DeliveryPolicy::DropWhenFull).await.unwrap();
        let err = sink
            .deliver(Value::Bool(false), DeliveryPolicy::DropWhenFull)
            .await
            .unwrap_err();
        assert_eq!(err, DeliveryError::Full);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_when_full() {
        let (sink, _rx) = bool_sink(1);
        let policy = DeliveryPolicy::Timeout(Duration::from_millis(50));
        sink.deliver(Value::Bool(true), policy).await.unwrap();
        let err = sink.deliver(Value::Bool(true), policy).await.unwrap_err();
        assert_eq!(err, DeliveryError::Timeout);
    }

    #[tokio::test]
    async fn test_closed_receiver() {
        let (sink, rx) = bool_sink(1);
        drop(rx);
        assert!(sink.is_closed());
        let err = sink.deliver(Value::Bool(true), DeliveryPolicy::Block).await.unwrap_err();
        assert_eq!(err, DeliveryError::Closed);
    }

    #[tokio::test]
    async fn test_drift_is_a_conversion_error() {
        let (sink, _rx) = bool_sink(1);
        let err = sink
            .deliver(Value::Str("yes".into()), DeliveryPolicy::Block)
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "convert_mismatch");
        assert!(!err.is_backpressure());
    }

    #[test]
    fn test_identity_by_channel() {
        let (tx, _rx) = mpsc::channel::<bool>(1);
        let (other_tx, _other_rx) = mpsc::channel::<bool>(1);
        let strategy = reconcile(&ValueType::Bool, &ValueType::Bool, None).unwrap();

        let a = TypedSink::new(tx.clone(), strategy.clone());
        let b = TypedSink::new(tx.clone(), strategy.clone());
        let c = TypedSink::new(other_tx, strategy);

        assert_ne!(a.id(), b.id());
        assert!(a.same_target(&b));
        assert!(!a.same_target(&c));
        assert!(TypedSink::feeds(&a, &tx));
    }
}
