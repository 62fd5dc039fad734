pub mod call;
pub mod intent;
pub mod language;

pub use call::{CallStep, ProviderAttempt};
pub use intent::{AppointmentIntent, RawExtraction};
pub use language::{CaptureStrategy, Language, Phrase};
