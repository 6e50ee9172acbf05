pub mod mock;
pub mod notifier;
pub mod provider;
pub mod templates;

pub use mock::RecordingNotifier;
pub use notifier::EmailNotifier;
