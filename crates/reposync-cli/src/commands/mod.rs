pub mod format;
pub mod repositories;
pub mod update;
