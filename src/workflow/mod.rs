pub mod attempt;
pub mod session;
pub mod ticker;

pub use attempt::{EditRejection, ExamAttempt, SubmitRejection, TickOutcome};
pub use session::{ActionError, Phase, Request, RequestTicket, Screen, Session};
pub use ticker::{ChannelTicker, IntervalTicker, TickSource};
