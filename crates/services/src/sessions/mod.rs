mod driver;
mod engine;
mod matching;
mod options;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use driver::{DriverEvent, SessionDriver};
pub use engine::{Effect, SessionEngine, TimerToken};
pub use matching::answers_match;
pub use options::{DISTRACTOR_COUNT, MIN_ITEMS_FOR_OPTIONS, answer_options};
pub use view::{Prompt, SessionView};
pub use workflow::SessionLoopService;
