pub mod cli;
pub mod error;
pub mod handlers;
pub mod http_server;
pub mod models;
pub mod probe;
pub mod routers;
pub mod services;
pub mod transfer;
pub mod utils;

pub use error::{TransferError, TransferResult};
pub use services::TransferService;
