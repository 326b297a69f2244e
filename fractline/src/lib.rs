pub mod bar;
pub mod chain;
pub mod config;
pub mod constant;
pub mod context;
pub mod detector;
pub mod error;
pub mod events;
pub mod fractal;
pub mod logging;
pub mod notification;
pub mod receiver;

pub use bar::{Bar, BarSeries, BarSource, ensure_history};
pub use chain::FractalChain;
pub use config::{FractalOptions, FractalOptionsPatch, FractalProfileConfig, ScanConfig};
pub use constant::{FractalKind, Side, Timeframe};
pub use context::FractalContext;
pub use detector::FractalDetector;
pub use error::{DataError, DetectorError, IngestError, ListenerError, RegisterError};
pub use events::{FractalEvent, Listener, Listeners, SubscriptionId};
pub use fractal::{Fractal, FractalId};
pub use logging::init_logging;
pub use notification::{FractalNotification, LogNotifier, Notifier, notifier_listener};
pub use receiver::{DataReceiver, load_bars, parse_datetime};
