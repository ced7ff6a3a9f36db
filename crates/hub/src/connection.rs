//! Hub connection seam
//!
//! The transport (Bluetooth LE, message framing, peripheral construction)
//! lives outside this workspace. A connection only has to hand over its
//! attach-event stream and know how to shut itself down.

use common::EventReceiver;

/// Connection to one physical hub
pub trait HubConnection: Send {
    /// Human-readable name or address of the remote hub
    fn name(&self) -> &str;

    /// Hand over the attach-event stream
    ///
    /// Returns `None` once the stream has been taken.
    fn take_events(&mut self) -> Option<EventReceiver>;

    /// Close the link; the event stream ends afterwards
    fn disconnect(&mut self) -> common::Result<()>;
}
