pub mod center;
pub mod event;

pub use center::{Listener, ListenerHandle, NotificationCenter};
pub use event::{Notification, NotificationKind};
