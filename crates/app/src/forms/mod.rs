//! Screen controllers.
//!
//! Each form owns the editable state of one screen and talks to the
//! backend through an [`AppContext`](crate::context::AppContext). Rendering
//! is left to the caller.

pub mod create;
pub mod edit;
pub mod login;

pub use create::CreateForm;
pub use edit::{EditForm, SaveOutcome};
pub use login::LoginForm;
