use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::chain::FractalChain;
use crate::constant::{FractalKind, Timeframe};
use crate::error::ListenerError;
use crate::events::{FractalEvent, Listener};

#[derive(Debug, Clone, PartialEq)]
pub struct FractalNotification {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub kind: FractalKind,
    pub value: f64,
    pub datetime: DateTime<Utc>,
}

impl FractalNotification {
    pub fn from_event(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        event: &FractalEvent,
        chain: &FractalChain,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            kind: chain.kind(event.fractal_id),
            value: event.fractal.value,
            datetime: event.fractal.datetime,
        }
    }

    pub fn subject(&self) -> String {
        format!("New {} fractal", self.kind.as_str())
    }

    pub fn body(&self) -> String {
        format!(
            "You have a new {} fractal on symbol {}.",
            self.kind.as_str(),
            self.symbol
        )
    }
}

/// Delivery channel for new-fractal notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &FractalNotification) -> Result<(), ListenerError>;
}

/// Writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &FractalNotification) -> Result<(), ListenerError> {
        info!(
            symbol = %notification.symbol,
            timeframe = notification.timeframe.as_str(),
            kind = notification.kind.code(),
            value = notification.value,
            datetime = %notification.datetime,
            "{}",
            notification.body()
        );
        Ok(())
    }
}

/// Adapts a notifier into a detector listener.
pub fn notifier_listener(
    symbol: impl Into<String>,
    timeframe: Timeframe,
    notifier: Arc<dyn Notifier>,
) -> Listener {
    let symbol = symbol.into();
    Arc::new(move |event: &FractalEvent, chain: &FractalChain| {
        let notification = FractalNotification::from_event(symbol.clone(), timeframe, event, chain);
        notifier.notify(&notification)
    })
}
