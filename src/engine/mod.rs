//! Pure progress engines.
//!
//! Both engines take the current progress by reference and return the next
//! state. Neither performs I/O; persisting the result is the caller's job.

pub mod completion;
pub mod purchase;

pub use completion::{CompletionOutcome, calendar_day, complete_task, complete_task_with_outcome};
pub use purchase::{PurchaseOutcome, purchase_reward, purchase_reward_with_outcome};
