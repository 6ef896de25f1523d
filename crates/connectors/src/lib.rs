//! Data sources for flatql: delimited files over several transports and
//! SQL engines, both the embedded one and remote servers.

pub mod sources;
