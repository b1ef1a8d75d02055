//! Other users: profiles, ratings and blocks.

mod directory;
mod modal;

pub use directory::{Requester, UserDirectory, UserProfile};
pub use modal::{render_user_modal, stars, ModalContext};
