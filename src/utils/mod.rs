/// Location string helpers
pub mod path;

pub use path::{normalize_location, read_locations_file};
