pub mod batch_loader;

pub use batch_loader::{is_batch_file, load_batch_file, requests_from_input};
