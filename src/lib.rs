// Library root
// -----------
// Client library for the Wildeer LLP admin API plus the pieces the
// interactive CLI (`main.rs`) is built from.
//
// Module responsibilities:
// - `session`: id token and default headers; browser or direct login.
// - `browser`: the browser login boundary and its Chrome implementation.
// - `api`: one method per admin endpoint on top of GET/POST/PUT.
// - `ui`: the numbered-menu shell.
// - `config`, `error`, `models`, `token`: shared plumbing.
pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod token;
pub mod ui;

pub use api::{AdminClient, UserQuery};
pub use config::ClientConfig;
pub use error::{AdminError, Result};
pub use session::{Credentials, Session};
