//! Database access for waveroom-api

pub mod projects;
pub mod social;
pub mod users;
