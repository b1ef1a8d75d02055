//! Study sessions: backend calls, time-derived display values and card
//! markup.

mod directory;
pub mod render;
pub mod timing;

pub use directory::{SessionDirectory, SessionFilters, SessionForm};
pub use render::{initials, join_state, render_card, JoinState};
pub use timing::{scheduled_info, time_remaining};
