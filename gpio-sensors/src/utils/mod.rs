pub use tokio;

pub mod events;
pub mod task;

pub use events::{EventHandler, EventManager};
