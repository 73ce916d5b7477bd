//! Domain models for the admin API.

pub mod admin;
pub mod quiz;
pub mod session;

pub use admin::Admin;
pub use quiz::{Answer, AnswersError, NewQuestion, Question, Theme};
pub use session::CurrentAdmin;
