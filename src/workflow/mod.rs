pub mod files;
pub mod release;
pub mod status;
