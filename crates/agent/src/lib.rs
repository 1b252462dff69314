//! Call orchestration
//!
//! The per-call conversation state machine lives here: the session store with
//! per-call serialization, the escalation decision engine, the escalation
//! executor, and the turn pipeline that strings retrieval, generation, and
//! escalation together.

pub mod escalation;
pub mod executor;
pub mod session;
pub mod turn;

pub use escalation::{EscalationEngine, EscalationTrigger};
pub use executor::{EscalationExecutor, EscalationOutcome};
pub use session::{CallSessionStore, SessionHandle};
pub use turn::{SupportAgent, TurnMetrics, TurnOutcome};
