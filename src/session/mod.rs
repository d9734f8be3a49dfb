pub mod controller;
pub mod events;
pub mod sink;
pub mod state;

pub use controller::SessionController;
pub use events::SessionEvent;
pub use sink::FrameSink;
pub use state::{SessionSnapshot, SessionState, SessionStatus};
