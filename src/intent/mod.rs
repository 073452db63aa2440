pub mod local;
pub mod remote;
pub mod types;

pub use remote::{NameCorrection, VoiceCommandResolver};
pub use types::{Command, CommandKind, Confidence, DayCode, Screen, Source};
