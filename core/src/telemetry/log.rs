use crate::notification::Notification;
use log::{debug, info, warn};

/// Thin wrapper over the `log` facade that prefixes records with a component name.
pub struct LogManager {
    component: &'static str,
}

impl LogManager {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.component, message);
    }

    pub fn detail(&self, message: &str) {
        debug!("[{}] {}", self.component, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.component, message);
    }

    pub fn record_notification(&self, notification: &Notification) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        match serde_json::to_string(notification) {
            Ok(json) => debug!("[{}] dispatch {}", self.component, json),
            Err(err) => debug!("[{}] dispatch {:?} ({})", self.component, notification, err),
        }
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("sensorcore")
    }
}
