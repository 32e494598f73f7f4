// Adapters layer: concrete readers that turn files behind a Storage into a session.

pub mod loader;

pub use loader::{read_gesture_script, DataFiles, FileSessionSource};
