pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;

pub use catalog::{CallClass, Method};
pub use client::TunebookClient;
pub use config::{ClientConfig, Network};
pub use error::ClientError;
pub use http::HttpTransport;
pub use session::{AppSession, Identity};
pub use transport::{CallRequest, Transport};

pub use tunebook_types as types;
