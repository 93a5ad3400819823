//! 命令定义和实现

pub mod check;
pub mod config;
pub mod run;

pub use check::CheckCommand;
pub use config::ConfigCommand;
pub use run::RunCommand;
