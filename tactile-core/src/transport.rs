//! Serial transport seam and command sink
//!
//! [`Transport`] abstracts the byte stream to the display. Reads are
//! non-blocking single bytes (the controller drains whatever is pending in
//! one poll); writes are fire-and-forget whole commands. An adapter for
//! `embedded-io` streams is provided for HAL UARTs.

use tactile_protocol::Command;

/// Byte-stream link to the display
pub trait Transport {
    /// Error type for write operations
    type Error;

    /// Read a single byte if one is pending. Must not block.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write a complete encoded command to the display
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Adapter implementing [`Transport`] over an `embedded-io` stream
pub struct IoTransport<S> {
    inner: S,
}

impl<S> IoTransport<S> {
    /// Wrap an embedded-io stream
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Consume the adapter and return the underlying stream
    pub fn release(self) -> S {
        self.inner
    }
}

impl<S> Transport for IoTransport<S>
where
    S: embedded_io::Read + embedded_io::Write + embedded_io::ReadReady,
{
    type Error = S::Error;

    fn read_byte(&mut self) -> Option<u8> {
        match self.inner.read_ready() {
            Ok(true) => {
                let mut byte = [0u8; 1];
                match self.inner.read(&mut byte) {
                    Ok(1) => Some(byte[0]),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(bytes)?;
        self.inner.flush()
    }
}

/// Errors that can occur when sending a command
///
/// The transport's own error detail is erased here: outbound commands are
/// fire-and-forget and the display reports execution results separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// The transport failed to accept the bytes
    Transport,
    /// The command did not fit the encode buffer
    TooLong,
}

/// Object-safe sink for display instructions
///
/// Pages receive a `&mut dyn CommandSink` in every handler; the controller
/// implements it over its transport.
pub trait CommandSink {
    /// Encode and send one command
    fn send(&mut self, command: &Command<'_>) -> Result<(), SendError>;

    /// Send verbatim instruction text
    fn send_raw(&mut self, command: &str) -> Result<(), SendError> {
        self.send(&Command::Raw(command))
    }
}

/// Convenience writes for common component attributes
pub trait CommandSinkExt: CommandSink {
    /// Set a text component's content (`t0.txt="..."`)
    fn set_text(&mut self, component: &str, text: &str) -> Result<(), SendError> {
        self.send(&Command::SetText { component, text })
    }

    /// Set a component's value attribute (`n0.val=42`)
    fn set_value(&mut self, component: &str, value: i32) -> Result<(), SendError> {
        self.send(&Command::SetProperty {
            component,
            property: "val",
            value,
        })
    }

    /// Set an arbitrary numeric attribute
    fn set_property(&mut self, component: &str, property: &str, value: i32) -> Result<(), SendError> {
        self.send(&Command::SetProperty {
            component,
            property,
            value,
        })
    }

    /// Set a component's primary picture resource
    fn set_picture(&mut self, component: &str, picture_id: i32) -> Result<(), SendError> {
        self.set_property(component, "pic", picture_id)
    }

    /// Set a component's secondary picture resource (e.g. pressed state)
    fn set_picture2(&mut self, component: &str, picture_id: i32) -> Result<(), SendError> {
        self.set_property(component, "pic2", picture_id)
    }

    /// Set a text component's font resource
    fn set_font(&mut self, component: &str, font_id: i32) -> Result<(), SendError> {
        self.set_property(component, "font", font_id)
    }

    /// Tell the display to show a page
    ///
    /// The display answers with a page-change event, which is what moves
    /// the controller's own active page.
    fn show_page(&mut self, page_id: u8) -> Result<(), SendError> {
        self.send(&Command::Page(page_id))
    }

    /// Ask the display to report its current page
    fn query_page(&mut self) -> Result<(), SendError> {
        self.send(&Command::QueryPage)
    }

    /// Request a component attribute; the display answers with a string or
    /// numeric return event
    fn get(&mut self, attribute: &str) -> Result<(), SendError> {
        self.send(&Command::Get { attribute })
    }
}

// Blanket implementation for all CommandSink types
impl<T: CommandSink + ?Sized> CommandSinkExt for T {}
