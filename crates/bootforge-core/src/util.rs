//! Shared utility modules.

pub mod data;
pub mod fs;
pub mod process;

pub use data::{coerce_bool, options_to_string, parse_option_map, parse_string_list};
pub use fs::{copy_file, expand_path, mkdir_p, rmfile, rmtree, slurp, symlink_force};
