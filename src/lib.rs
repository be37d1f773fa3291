//! A client for the [GoodData](https://www.gooddata.com) REST API.
//!
//! The crate has two layers. The [api](crate::api) types describe the
//! platform's requests and responses and work with any HTTP client that uses
//! the [`http`] crate: use [`ApiRequest::into_request`] to create a request,
//! and [`ApiResponse::from_response`] to parse the response. On top of them,
//! [`GoodData`] hands out services that send requests through a shared
//! blocking [`Client`] and translate failures into [`Error`].
//!
//! Many platform operations run asynchronously: the server accepts the job
//! and hands back a link to poll. Services return those as a
//! [`FutureResult`], which polls at the profile's interval once asked for its
//! result.
//!
//! # Example
//!
//! ```no_run
//! use gooddata::{GoodData, Profile, model::DiffRequest};
//!
//! # fn main() -> anyhow::Result<()> {
//! let gd = GoodData::new(Profile::from_default_env()?);
//!
//! let target = serde_json::from_str(&std::fs::read_to_string("model.json")?)?;
//! let mut diff = gd.model().diff("projectId", &DiffRequest::new(target))?;
//!
//! for maql in diff.get()?.update_maql() {
//!     println!("{maql}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example with your own HTTP client
//!
//! ```no_run
//! use gooddata::{ApiRequest, ApiResponse, Profile, account::GetAccount};
//!
//! # fn main() -> anyhow::Result<()> {
//! let profile = Profile::from_default_env()?;
//!
//! let req = GetAccount {
//!     uri: "/gdc/account/profile/current",
//! };
//!
//! let http_req = req.into_request(&profile)?;
//! let resp = ureq::run(http_req)?;
//!
//! let account = <GetAccount<'_> as ApiRequest>::Response::from_response(
//!     resp.map(ureq::Body::into_reader),
//! )?;
//!
//! println!("Logged in as {:?}", account.login);
//! # Ok(())
//! # }
//! ```

#![warn(
    anonymous_parameters,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_qualifications,
    variant_size_differences
)]

mod api;
mod client;
mod config;
mod error;
mod poll;
mod service;

pub use api::*;
pub use client::{Client, SST_HEADER, Session, TT_HEADER, Transport, UreqTransport};
pub use config::{Error as ConfigError, Profile};
pub use error::*;
pub use poll::{FutureResult, PollHandler, PollStep, ResultHandler, TaskStatusHandler};
pub use service::*;
