//! CLI command implementations.

pub mod build;
pub mod compile;
pub mod init;
pub mod watch;

pub use build::build_site;
pub use compile::compile_file;
pub use init::init_project;
pub use watch::watch_site;
