mod ids;
mod item;
mod media;
mod progress;
mod question;
mod session;

pub use ids::{CategoryId, ItemId, ParseIdError, SessionId, UserId};
pub use item::{EXAMPLE_PLACEHOLDER, ItemDraft, ItemError, LearningItem};
pub use media::MediaRef;
pub use progress::{AnswerRecord, EXPERIENCE_PER_CORRECT, ProgressUpdate, mastery_percent};
pub use question::{AnswerDomain, QuestionType, QuizFlow};
pub use session::{SessionContext, SessionStats, SessionSummary};
