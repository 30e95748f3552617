//! Web SDK analytics support — reports which experiment variant a visitor saw,
//! through either a Mixpanel-style tracking client or a tag-manager dataLayer.
//!
//! # Modules
//!
//! - [`events`] — Experiment event and emission outcome types
//! - [`adaptors`] — Sink payload adaptors (Mixpanel, dataLayer)
//! - [`emitter`] — Dispatches one event to the configured sink
//! - [`split_url`] — Exposure reporting for split-URL variant pages

pub mod adaptors;
pub mod emitter;
pub mod events;
pub mod split_url;

pub use adaptors::datalayer::DataLayerAdaptor;
pub use adaptors::mixpanel::MixpanelAdaptor;
pub use adaptors::ExperimentAdaptor;
pub use emitter::EventEmitter;
pub use events::{EmitOutcome, ExperimentStarted, SkipReason};
