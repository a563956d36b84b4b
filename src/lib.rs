//! A small Rust client for the BDC data-catalog REST API.
//!
//! The catalog groups files into datacollections, organised by task and domain.
//! This crate lists them and drives an export query through its lifecycle:
//! submit a selection, poll its progress, then save the result.
//!
//! ## Quick start
//! - Configure authentication via environment variables (`BDCAPI_URL`,
//!   `BDCAPI_USERNAME`, `BDCAPI_KEY`) or a `.bdcapirc` file (current directory
//!   or home directory), or pass the values to [`Client::new`].
//! - Pick a datacollection and call [`Client::export`].
//!
//! ```no_run
//! use bdcapi::{Client, DatacollectionFilter, Destination, Selection};
//!
//! fn main() -> bdcapi::Result<()> {
//!     let client = Client::from_env()?;
//!     let names = client.datacollections(&DatacollectionFilter::new().limit(1))?;
//!     let receipt = client.export(
//!         &Selection::datacollection(names[0].as_str()),
//!         &Destination::LocalDir("/tmp".into()),
//!     )?;
//!     println!("{}", receipt.message);
//!     Ok(())
//! }
//! ```
//!
//! The step-by-step equivalent is [`Client::submit`], [`Client::poll`] (or
//! [`Client::wait`]) and [`Client::fetch`].

#![forbid(unsafe_code)]

mod client;
mod config;
mod credentials;
mod error;
mod filters;
mod models;
mod object_id;
mod reply;
mod transport;
mod util;

pub use client::{Client, ClientConfig};
pub use credentials::basic_auth_header;
pub use error::{Error, Result};
pub use filters::{DatacollectionFilter, FileFilter, Names};
pub use models::{
    Destination, Poc, Progress, QueryInfo, QueryStatus, SaveReceipt, Selection, TaskInfo,
};
pub use object_id::is_valid_object_id;
pub use transport::{HttpSession, Response, StreamingResponse, Transport};
