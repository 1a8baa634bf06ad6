pub mod command;
pub mod config;
pub mod error;
pub mod extract;
pub mod form;
pub mod notify;
pub mod presets;
pub mod scan;
mod sse;
pub mod transport;

pub use command::{interpret, CommandClient};
pub use config::{load_settings, load_settings_from, Settings};
pub use error::ClientError;
pub use extract::{collect_values, hex_to_rgb, ExtractIssue, Extraction};
pub use form::{Form, FormBuilder};
pub use notify::{Dismissal, Notification, NotificationBoard, NotificationLevel};
pub use presets::{DialogState, PresetApplication, PresetDialog, PresetSelection, SaveTarget};
pub use reqwest::Method;
pub use scan::{ScanController, ScanSink, ScanStart, ScanState, ScanStop};
pub use transport::{HttpTransport, RawResponse, Transport};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
