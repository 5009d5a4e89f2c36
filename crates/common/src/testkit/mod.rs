//! Test doubles for the collaborators behind the request objects.
//!
//! The recording node, node factory and registry share a [`CallLog`], so a
//!  test can assert the exact order in which a workflow touched them:
//!
//! ```rust,ignore
//! let log = CallLog::default();
//! let factory = RecordingFactory::new(log.clone());
//! let registry = RecordingRegistry::new(log.clone());
//!
//! // ... publish with pin = true ...
//!
//! assert_eq!(log.calls(), vec![Call::Build(..), Call::Start, Call::Addresses, ..]);
//! ```

mod fixtures;
mod recording;

pub use fixtures::{sample_dataset, sample_repo};
pub use recording::{
    Call, CallLog, PinBehavior, RecordingFactory, RecordingNode, RecordingRegistry,
};
