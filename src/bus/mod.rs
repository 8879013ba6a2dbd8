//! Dialog-bus attachment
//!
//! The pub/sub wire itself lives in an external bridge process; this module
//! owns the local end: a Unix socket the bridge connects to, and the
//! capability interface the rest of the skill uses to publish on the bus.

mod protocol;
mod server;

pub use protocol::Outbound;
pub use server::{BusPublisher, BusServer};

/// Publish capabilities the skill drives on the dialog bus.
///
/// The mode controller and the event loop call these named methods; how the
/// frames reach the actual bus is the attachment's concern. Publishes are
/// fire-and-forget; relative ordering of independent publishes is not
/// guaranteed.
pub trait DialogPublisher: Send {
    /// Replace the set of intents currently active on the bus
    fn publish_intent_filter(&self, intents: &[&str]);

    /// Switch the listening-feedback indicator on or off
    fn set_feedback_sound(&self, on: bool);

    /// Start a notification session speaking `text` on a site
    fn announce(&self, text: &str, site_id: &str);
}
