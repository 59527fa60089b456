#![forbid(unsafe_code)]

pub mod audio;
pub mod error;
pub mod sessions;

pub use lingo_core::Clock;
pub use sessions as session;

pub use audio::{AudioError, AudioPlayer, SilentAudioPlayer};
pub use error::SessionError;

pub use sessions::{
    DriverEvent, Effect, Prompt, SessionDriver, SessionEngine, SessionLoopService, SessionView,
    TimerToken,
};
