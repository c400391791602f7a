//! Core task store for taskdeck: the JSON database, task mutations,
//! listing queries and environment switching.

pub mod config;
pub mod environment;
pub mod intent;
pub mod query;
pub mod repository;
pub mod store;
pub mod task;
pub mod workspace;

#[cfg(test)]
mod test_env;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
