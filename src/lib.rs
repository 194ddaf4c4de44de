pub mod arena;
pub mod classifier;
pub mod clock;
pub mod collaborators;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod fee_policy;
pub mod formatter;
pub mod model;

pub use command::{pay, PayRequest};
pub use config::PayConfig;
pub use controller::RetryController;
pub use error::PayError;
pub use formatter::SuccessReply;
