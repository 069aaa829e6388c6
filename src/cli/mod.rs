pub mod orchestration;

pub use orchestration::{compute_version, parse_major_minor, AutoVersionArgs, Backend};
