//! Page capability interface
//!
//! A page is one logical screen defined in the display's editor project.
//! The controller holds non-owning references to every page for its whole
//! lifetime and routes events to whichever page is active.

use tactile_protocol::{CommandError, TouchAction};

use crate::transport::CommandSink;

/// A logical screen on the display
///
/// Lifecycle, as driven by the controller:
/// - `setup` runs exactly once, after the page's first activation, so setup
///   code may issue display commands for itself
/// - `on_enter` / `on_leave` fire on every page switch (except that the
///   startup page is activated without `on_enter`, as there is no page to
///   leave)
/// - `refresh` fires periodically while the page is active, and on an
///   explicit refresh request
/// - event handlers fire only while the page is active; all default to
///   no-ops so pages implement just what they need
///
/// Every handler receives a [`CommandSink`] for sending instructions back
/// to the display.
pub trait Page {
    /// Page identifier matching the page number in the display's editor
    /// project. Must be unique across the registry.
    fn id(&self) -> u8;

    /// One-time initialization, run after the page first becomes active
    fn setup(&mut self, sink: &mut dyn CommandSink);

    /// Periodic update of dynamic content while the page is active
    fn refresh(&mut self, sink: &mut dyn CommandSink, now_ms: u64);

    /// The page became the active page
    fn on_enter(&mut self, _sink: &mut dyn CommandSink) {}

    /// The page is about to be deactivated
    fn on_leave(&mut self, _sink: &mut dyn CommandSink) {}

    /// A component on this page was pressed or released
    fn on_touch(&mut self, _sink: &mut dyn CommandSink, _component_id: u8, _action: TouchAction) {}

    /// Raw touch coordinates (when coordinate reporting is enabled)
    fn on_touch_xy(
        &mut self,
        _sink: &mut dyn CommandSink,
        _x: u16,
        _y: u16,
        _action: TouchAction,
        _asleep: bool,
    ) {
    }

    /// A component returned a text value
    fn on_text(&mut self, _sink: &mut dyn CommandSink, _text: &str) {}

    /// A component returned a 32-bit numeric value
    fn on_numeric(&mut self, _sink: &mut dyn CommandSink, _value: u32) {}

    /// The display acknowledged an instruction
    fn on_command_ok(&mut self, _sink: &mut dyn CommandSink) {}

    /// The display rejected an instruction
    fn on_command_error(&mut self, _sink: &mut dyn CommandSink, _code: CommandError) {}

    /// The display entered or left auto-sleep
    fn on_sleep_change(&mut self, _sink: &mut dyn CommandSink, _entering: bool) {}
}
