pub mod logger;
pub mod server;
pub mod steganalysis;
