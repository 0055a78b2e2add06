//! feedback-board/crates/services/src/lib.rs
//!
//! Business logic: identifier derivation, input validation, the write
//! sequence orchestrator and the balance guard. Talks to the outside world
//! only through the ports defined in `domains`.

pub mod balance;
pub mod board_service;
pub mod events;
pub mod identity;
pub mod notice;
pub mod sentiment;
pub mod sequence;
pub mod validation;

pub use balance::{BalanceCheck, BalanceGuard, MIN_SOL_REQUIRED};
pub use board_service::{BoardCreated, BoardService, BoardView, ContributionOutcome};
pub use events::{BoardEvent, EventBus};
pub use notice::UserNotice;
pub use sequence::{SequenceReport, StepTag};
pub use validation::{BoardDraft, FeedbackDraft};
