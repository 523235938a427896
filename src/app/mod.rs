pub mod report;
pub mod session;

pub use report::{build_payload, render_log, LogReport};
pub use session::{RunOutcome, SendOutcome, SessionState, ValidationSession};
