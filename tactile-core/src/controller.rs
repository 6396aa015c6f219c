//! Panel controller: frame assembly, event dispatch, page lifecycle
//!
//! [`PanelController`] is the single entry point of the driver. The host
//! constructs it with a transport and a fixed page registry, calls
//! [`init`](PanelController::init) once, and then calls
//! [`poll`](PanelController::poll) from its main loop with the current time.
//! Everything — draining the serial link, assembling frames, dispatching
//! events, switching pages, periodic refresh — happens synchronously inside
//! that call.
//!
//! The controller treats the display as the source of truth for which page
//! is showing: a touch event reporting an unexpected page id, or a
//! page-change event, moves the active page; after a framing timeout the
//! controller asks the display for its page identity rather than trusting
//! its own state.

use tactile_protocol::{Command, DisplayEvent, Frame, FrameAssembler, FrameError};

use crate::observer::LinkObserver;
use crate::page::Page;
use crate::transport::{CommandSink, SendError, Transport};

/// Interval (ms) between periodic refresh calls on the active page
pub const REFRESH_INTERVAL_MS: u64 = 1000;

/// Errors that can occur when switching pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchError {
    /// No page with this identifier is registered. The previously active
    /// page stays active.
    UnknownPage(u8),
}

/// Transport plus command encoder; what pages see as their [`CommandSink`]
pub struct CommandLink<T: Transport> {
    transport: T,
}

impl<T: Transport> CommandSink for CommandLink<T> {
    fn send(&mut self, command: &Command<'_>) -> Result<(), SendError> {
        let encoded = command.encode().map_err(|_| SendError::TooLong)?;
        self.transport
            .write_all(&encoded)
            .map_err(|_| SendError::Transport)
    }
}

/// Controller for one serial HMI panel
///
/// Holds non-owning references to the registered pages; the pages must
/// outlive the controller. The registry is fixed at construction: page
/// membership never changes, and page identifiers must be unique.
///
/// Not reentrant: `poll` must never run concurrently with itself or with
/// any other method of the same controller.
pub struct PanelController<'a, T: Transport, const N: usize> {
    link: CommandLink<T>,
    assembler: FrameAssembler,
    pages: [&'a mut dyn Page; N],
    initialized: [bool; N],
    active: Option<usize>,
    last_refresh_ms: u64,
    observer: Option<&'a mut dyn LinkObserver>,
}

impl<'a, T: Transport, const N: usize> PanelController<'a, T, N> {
    /// Create a controller over a transport and a fixed page registry
    pub fn new(transport: T, pages: [&'a mut dyn Page; N]) -> Self {
        Self {
            link: CommandLink { transport },
            assembler: FrameAssembler::new(),
            pages,
            initialized: [false; N],
            active: None,
            last_refresh_ms: 0,
            observer: None,
        }
    }

    /// Inject a diagnostics observer (no-op when absent)
    pub fn set_observer(&mut self, observer: &'a mut dyn LinkObserver) {
        self.observer = Some(observer);
    }

    /// Initialize the controller
    ///
    /// The first registered page becomes active and runs its one-time
    /// setup; its enter hook is skipped since there is no page to leave.
    /// The display is then asked for its real current page — it may well be
    /// showing something other than page 0 when the host starts — and the
    /// answer arrives as an ordinary page-change event on a later poll.
    pub fn init(&mut self, now_ms: u64) -> Result<(), SendError> {
        if !self.pages.is_empty() {
            self.active = Some(0);
            if !self.initialized[0] {
                self.pages[0].setup(&mut self.link);
                self.initialized[0] = true;
            }
        }
        self.last_refresh_ms = now_ms;
        self.link.send(&Command::QueryPage)
    }

    /// Process pending serial input and run periodic work
    ///
    /// Call frequently from the host loop with the current time. Drains the
    /// transport, dispatches every complete message, recovers from framing
    /// timeouts, and refreshes the active page once per
    /// [`REFRESH_INTERVAL_MS`].
    pub fn poll(&mut self, now_ms: u64) {
        while let Some(byte) = self.link.transport.read_byte() {
            match self.assembler.feed(byte, now_ms) {
                Ok(Some(frame)) => self.dispatch(&frame),
                Ok(None) => {}
                Err(FrameError::Overflow) => self.notify(|o| o.frame_overflow()),
            }
        }

        if self.assembler.check_timeout(now_ms) {
            // A message was started but never finished; our idea of the
            // active page may be stale, so ask the display
            self.notify(|o| o.timeout_recovered(now_ms));
            self.resync();
        }

        if let Some(index) = self.active {
            if now_ms.saturating_sub(self.last_refresh_ms) > REFRESH_INTERVAL_MS {
                self.pages[index].refresh(&mut self.link, now_ms);
                self.last_refresh_ms = now_ms;
            }
        }
    }

    /// Refresh the active page immediately, ignoring the refresh interval
    pub fn refresh_now(&mut self, now_ms: u64) {
        if let Some(index) = self.active {
            self.pages[index].refresh(&mut self.link, now_ms);
        }
    }

    /// Identifier of the currently active page
    pub fn active_page_id(&self) -> Option<u8> {
        self.active.map(|index| self.pages[index].id())
    }

    /// Send a command to the display
    pub fn send(&mut self, command: &Command<'_>) -> Result<(), SendError> {
        self.link.send(command)
    }

    /// Access the underlying transport
    pub fn transport(&self) -> &T {
        &self.link.transport
    }

    /// Mutable access to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.link.transport
    }

    /// Switch the active page by identifier
    ///
    /// Looks the target up by linear scan. Switching to the already-active
    /// page is a no-op success. Otherwise the outgoing page's leave hook
    /// runs, the target becomes active, its enter hook runs, and — on first
    /// activation only — its one-time setup runs, after activation so setup
    /// code may issue display commands for itself.
    pub fn switch_to(&mut self, page_id: u8) -> Result<(), SwitchError> {
        let target = self
            .pages
            .iter()
            .position(|page| page.id() == page_id)
            .ok_or(SwitchError::UnknownPage(page_id))?;

        if self.active == Some(target) {
            return Ok(());
        }

        let from = self.active_page_id();
        if let Some(outgoing) = self.active {
            self.pages[outgoing].on_leave(&mut self.link);
        }
        self.active = Some(target);
        self.pages[target].on_enter(&mut self.link);
        if !self.initialized[target] {
            self.pages[target].setup(&mut self.link);
            self.initialized[target] = true;
        }

        self.notify(|o| o.page_switched(from, page_id));
        Ok(())
    }

    fn dispatch(&mut self, frame: &Frame) {
        let Some(event) = DisplayEvent::from_frame(frame) else {
            self.notify(|o| o.frame_dropped(frame.opcode));
            return;
        };

        match event {
            DisplayEvent::CommandOk => {
                if let Some(index) = self.active {
                    self.pages[index].on_command_ok(&mut self.link);
                }
            }
            DisplayEvent::CommandFailed(code) => {
                if let Some(index) = self.active {
                    self.pages[index].on_command_error(&mut self.link, code);
                }
            }
            DisplayEvent::Touch {
                page_id,
                component_id,
                action,
            } => {
                // The display's report is ground truth: a mismatch means a
                // missed page-change event or manual navigation. Switch
                // first, then deliver the touch to the page it belongs to.
                if self.active_page_id() != Some(page_id) {
                    if let Err(SwitchError::UnknownPage(id)) = self.switch_to(page_id) {
                        self.notify(|o| o.unknown_page(id));
                    }
                }
                if let Some(index) = self.active {
                    if self.pages[index].id() == page_id {
                        self.pages[index].on_touch(&mut self.link, component_id, action);
                    }
                }
            }
            DisplayEvent::PageChange { page_id } => {
                if let Err(SwitchError::UnknownPage(id)) = self.switch_to(page_id) {
                    self.notify(|o| o.unknown_page(id));
                }
            }
            DisplayEvent::TouchCoordinate {
                x,
                y,
                action,
                asleep,
            } => {
                if let Some(index) = self.active {
                    self.pages[index].on_touch_xy(&mut self.link, x, y, action, asleep);
                }
            }
            DisplayEvent::Text(text) => {
                if let Some(index) = self.active {
                    self.pages[index].on_text(&mut self.link, text.as_str());
                }
            }
            DisplayEvent::Numeric(value) => {
                if let Some(index) = self.active {
                    self.pages[index].on_numeric(&mut self.link, value);
                }
            }
            DisplayEvent::SleepChange { entering } => {
                if let Some(index) = self.active {
                    self.pages[index].on_sleep_change(&mut self.link, entering);
                }
            }
        }
    }

    fn resync(&mut self) {
        if let Err(error) = self.link.send(&Command::QueryPage) {
            self.notify(|o| o.send_failed(error));
        }
    }

    fn notify(&mut self, f: impl FnOnce(&mut dyn LinkObserver)) {
        if let Some(observer) = self.observer.as_deref_mut() {
            f(observer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::CommandSinkExt;
    use heapless::{Deque, String, Vec};
    use tactile_protocol::{CommandError, TouchAction};

    const SENDME: &[u8] = b"sendme\xFF\xFF\xFF";

    struct TestTransport {
        rx: Deque<u8, 1024>,
        tx: Vec<u8, 1024>,
    }

    impl TestTransport {
        fn new() -> Self {
            Self {
                rx: Deque::new(),
                tx: Vec::new(),
            }
        }

        fn push_rx(&mut self, bytes: &[u8]) {
            for &byte in bytes {
                self.rx.push_back(byte).unwrap();
            }
        }
    }

    impl Transport for TestTransport {
        type Error = ();

        fn read_byte(&mut self) -> Option<u8> {
            self.rx.pop_front()
        }

        fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            self.tx.extend_from_slice(bytes).map_err(|_| ())
        }
    }

    #[derive(Default)]
    struct Calls {
        setup: usize,
        enter: usize,
        leave: usize,
        refresh: usize,
        ok: usize,
        touches: Vec<(u8, TouchAction), 8>,
        coords: Vec<(u16, u16, bool), 8>,
        texts: Vec<String<64>, 4>,
        numerics: Vec<u32, 4>,
        errors: Vec<CommandError, 4>,
        sleeps: Vec<bool, 4>,
    }

    struct TestPage {
        page_id: u8,
        calls: Calls,
    }

    impl TestPage {
        fn new(page_id: u8) -> Self {
            Self {
                page_id,
                calls: Calls::default(),
            }
        }
    }

    impl Page for TestPage {
        fn id(&self) -> u8 {
            self.page_id
        }

        fn setup(&mut self, _sink: &mut dyn CommandSink) {
            self.calls.setup += 1;
        }

        fn refresh(&mut self, _sink: &mut dyn CommandSink, _now_ms: u64) {
            self.calls.refresh += 1;
        }

        fn on_enter(&mut self, _sink: &mut dyn CommandSink) {
            self.calls.enter += 1;
        }

        fn on_leave(&mut self, _sink: &mut dyn CommandSink) {
            self.calls.leave += 1;
        }

        fn on_touch(&mut self, _sink: &mut dyn CommandSink, component_id: u8, action: TouchAction) {
            self.calls.touches.push((component_id, action)).unwrap();
        }

        fn on_touch_xy(
            &mut self,
            _sink: &mut dyn CommandSink,
            x: u16,
            y: u16,
            _action: TouchAction,
            asleep: bool,
        ) {
            self.calls.coords.push((x, y, asleep)).unwrap();
        }

        fn on_text(&mut self, _sink: &mut dyn CommandSink, text: &str) {
            self.calls.texts.push(String::try_from(text).unwrap()).unwrap();
        }

        fn on_numeric(&mut self, _sink: &mut dyn CommandSink, value: u32) {
            self.calls.numerics.push(value).unwrap();
        }

        fn on_command_ok(&mut self, _sink: &mut dyn CommandSink) {
            self.calls.ok += 1;
        }

        fn on_command_error(&mut self, _sink: &mut dyn CommandSink, code: CommandError) {
            self.calls.errors.push(code).unwrap();
        }

        fn on_sleep_change(&mut self, _sink: &mut dyn CommandSink, entering: bool) {
            self.calls.sleeps.push(entering).unwrap();
        }
    }

    #[derive(Default)]
    struct TestObserver {
        timeouts: usize,
        overflows: usize,
        unknown_pages: Vec<u8, 4>,
        switches: Vec<(Option<u8>, u8), 8>,
    }

    impl LinkObserver for TestObserver {
        fn timeout_recovered(&mut self, _now_ms: u64) {
            self.timeouts += 1;
        }

        fn frame_overflow(&mut self) {
            self.overflows += 1;
        }

        fn unknown_page(&mut self, page_id: u8) {
            self.unknown_pages.push(page_id).unwrap();
        }

        fn page_switched(&mut self, from: Option<u8>, to: u8) {
            self.switches.push((from, to)).unwrap();
        }
    }

    #[test]
    fn test_init_activates_first_page_and_queries_display() {
        let mut p0 = TestPage::new(0);
        let mut p1 = TestPage::new(1);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [
                &mut p0 as &mut dyn Page,
                &mut p1,
            ]);
            ctrl.init(0).unwrap();

            assert_eq!(ctrl.active_page_id(), Some(0));
            assert_eq!(ctrl.transport().tx.as_slice(), SENDME);
        }
        assert_eq!(p0.calls.setup, 1);
        // Startup activation has no page to leave, so no enter hook fires
        assert_eq!(p0.calls.enter, 0);
        assert_eq!(p1.calls.setup, 0);
    }

    #[test]
    fn test_switch_to_unknown_page_fails_without_state_change() {
        let mut p0 = TestPage::new(0);
        let mut p1 = TestPage::new(1);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [
                &mut p0 as &mut dyn Page,
                &mut p1,
            ]);
            ctrl.init(0).unwrap();

            assert_eq!(ctrl.switch_to(9), Err(SwitchError::UnknownPage(9)));
            assert_eq!(ctrl.active_page_id(), Some(0));
        }
        assert_eq!(p0.calls.leave, 0);
        assert_eq!(p1.calls.enter, 0);
    }

    #[test]
    fn test_switch_to_active_page_is_idempotent() {
        let mut p0 = TestPage::new(0);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.init(0).unwrap();

            assert_eq!(ctrl.switch_to(0), Ok(()));
            assert_eq!(ctrl.switch_to(0), Ok(()));
        }
        assert_eq!(p0.calls.enter, 0);
        assert_eq!(p0.calls.leave, 0);
        assert_eq!(p0.calls.setup, 1);
    }

    #[test]
    fn test_setup_runs_exactly_once_across_activations() {
        let mut p0 = TestPage::new(0);
        let mut p1 = TestPage::new(1);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [
                &mut p0 as &mut dyn Page,
                &mut p1,
            ]);
            ctrl.init(0).unwrap();

            for _ in 0..3 {
                ctrl.switch_to(1).unwrap();
                ctrl.switch_to(0).unwrap();
            }
        }
        assert_eq!(p1.calls.setup, 1);
        assert_eq!(p1.calls.enter, 3);
        assert_eq!(p1.calls.leave, 3);
        assert_eq!(p0.calls.setup, 1);
        assert_eq!(p0.calls.enter, 3);
    }

    #[test]
    fn test_switch_hook_order_leave_then_enter() {
        // Leave fires on the outgoing page, then the target activates
        let mut p0 = TestPage::new(0);
        let mut p1 = TestPage::new(1);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [
                &mut p0 as &mut dyn Page,
                &mut p1,
            ]);
            ctrl.init(0).unwrap();
            ctrl.switch_to(1).unwrap();
            assert_eq!(ctrl.active_page_id(), Some(1));
        }
        assert_eq!(p0.calls.leave, 1);
        assert_eq!(p1.calls.enter, 1);
    }

    #[test]
    fn test_page_change_event_switches_unconditionally() {
        let mut p0 = TestPage::new(0);
        let mut p1 = TestPage::new(1);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [
                &mut p0 as &mut dyn Page,
                &mut p1,
            ]);
            ctrl.init(0).unwrap();

            ctrl.transport_mut().push_rx(&[0x66, 0x01, 0xFF, 0xFF, 0xFF]);
            ctrl.poll(10);
            assert_eq!(ctrl.active_page_id(), Some(1));
        }
        assert_eq!(p1.calls.enter, 1);
    }

    #[test]
    fn test_touch_on_active_page_is_delivered() {
        let mut p0 = TestPage::new(0);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.init(0).unwrap();

            ctrl.transport_mut()
                .push_rx(&[0x65, 0x00, 0x04, 0x01, 0xFF, 0xFF, 0xFF]);
            ctrl.poll(10);
        }
        assert_eq!(p0.calls.touches.as_slice(), &[(4, TouchAction::Press)]);
        assert_eq!(p0.calls.leave, 0);
    }

    #[test]
    fn test_touch_with_stale_page_id_resyncs_then_delivers() {
        let mut p0 = TestPage::new(0);
        let mut p1 = TestPage::new(1);
        let mut observer = TestObserver::default();
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [
                &mut p0 as &mut dyn Page,
                &mut p1,
            ]);
            ctrl.set_observer(&mut observer);
            ctrl.init(0).unwrap();

            // Display reports a touch on page 1 while we believe page 0 is
            // showing: exactly one switch, then the touch reaches page 1
            ctrl.transport_mut()
                .push_rx(&[0x65, 0x01, 0x07, 0x00, 0xFF, 0xFF, 0xFF]);
            ctrl.poll(10);
            assert_eq!(ctrl.active_page_id(), Some(1));
        }
        assert_eq!(p0.calls.leave, 1);
        assert_eq!(p1.calls.enter, 1);
        assert_eq!(p1.calls.touches.as_slice(), &[(7, TouchAction::Release)]);
        assert!(p0.calls.touches.is_empty());
        assert_eq!(observer.switches.as_slice(), &[(Some(0), 1)]);
    }

    #[test]
    fn test_touch_with_undefined_event_byte_still_resyncs() {
        // An out-of-range event-type byte must not cost us the event: the
        // stale page id in it is still ground truth for resynchronization
        let mut p0 = TestPage::new(0);
        let mut p1 = TestPage::new(1);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [
                &mut p0 as &mut dyn Page,
                &mut p1,
            ]);
            ctrl.init(0).unwrap();

            ctrl.transport_mut()
                .push_rx(&[0x65, 0x01, 0x03, 0x05, 0xFF, 0xFF, 0xFF]);
            ctrl.poll(10);
            assert_eq!(ctrl.active_page_id(), Some(1));
        }
        assert_eq!(p1.calls.touches.as_slice(), &[(3, TouchAction::Press)]);
    }

    #[test]
    fn test_touch_for_unregistered_page_is_dropped() {
        let mut p0 = TestPage::new(0);
        let mut observer = TestObserver::default();
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.set_observer(&mut observer);
            ctrl.init(0).unwrap();

            ctrl.transport_mut()
                .push_rx(&[0x65, 0x09, 0x02, 0x01, 0xFF, 0xFF, 0xFF]);
            ctrl.poll(10);
            assert_eq!(ctrl.active_page_id(), Some(0));
        }
        assert!(p0.calls.touches.is_empty());
        assert_eq!(observer.unknown_pages.as_slice(), &[9]);
    }

    #[test]
    fn test_numeric_return_decodes_little_endian() {
        let mut p0 = TestPage::new(0);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.init(0).unwrap();

            ctrl.transport_mut()
                .push_rx(&[0x71, 0x2A, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF]);
            ctrl.poll(10);
        }
        assert_eq!(p0.calls.numerics.as_slice(), &[42]);
    }

    #[test]
    fn test_string_return_delivers_text() {
        let mut p0 = TestPage::new(0);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.init(0).unwrap();

            ctrl.transport_mut()
                .push_rx(&[0x70, b'h', b'i', 0xFF, 0xFF, 0xFF]);
            ctrl.poll(10);
        }
        assert_eq!(p0.calls.texts.len(), 1);
        assert_eq!(p0.calls.texts[0].as_str(), "hi");
    }

    #[test]
    fn test_success_and_error_reach_distinct_handlers() {
        let mut p0 = TestPage::new(0);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.init(0).unwrap();

            ctrl.transport_mut().push_rx(&[0x01, 0xFF, 0xFF, 0xFF]);
            ctrl.transport_mut().push_rx(&[0x03, 0xFF, 0xFF, 0xFF]);
            ctrl.poll(10);
        }
        assert_eq!(p0.calls.ok, 1);
        assert_eq!(p0.calls.errors.as_slice(), &[CommandError::InvalidPageId]);
    }

    #[test]
    fn test_coordinate_and_sleep_events_ignore_page_match() {
        let mut p0 = TestPage::new(0);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.init(0).unwrap();

            ctrl.transport_mut()
                .push_rx(&[0x67, 0x00, 0x64, 0x00, 0x32, 0x01, 0xFF, 0xFF, 0xFF]);
            ctrl.transport_mut().push_rx(&[0x86, 0xFF, 0xFF, 0xFF]);
            ctrl.transport_mut().push_rx(&[0x87, 0xFF, 0xFF, 0xFF]);
            ctrl.poll(10);
        }
        assert_eq!(p0.calls.coords.as_slice(), &[(100, 50, false)]);
        assert_eq!(p0.calls.sleeps.as_slice(), &[true, false]);
    }

    #[test]
    fn test_periodic_refresh_interval() {
        let mut p0 = TestPage::new(0);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.init(0).unwrap();

            ctrl.poll(500);
            ctrl.poll(REFRESH_INTERVAL_MS);
        }
        assert_eq!(p0.calls.refresh, 0);

        let mut p0 = TestPage::new(0);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.init(0).unwrap();

            ctrl.poll(REFRESH_INTERVAL_MS + 1);
            ctrl.poll(REFRESH_INTERVAL_MS + 500);
            ctrl.poll(2 * REFRESH_INTERVAL_MS + 2);
        }
        assert_eq!(p0.calls.refresh, 2);
    }

    #[test]
    fn test_refresh_now_bypasses_interval() {
        let mut p0 = TestPage::new(0);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.init(0).unwrap();

            ctrl.refresh_now(1);
            ctrl.refresh_now(2);
        }
        assert_eq!(p0.calls.refresh, 2);
    }

    #[test]
    fn test_framing_timeout_triggers_page_query() {
        let mut p0 = TestPage::new(0);
        let mut observer = TestObserver::default();
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.set_observer(&mut observer);
            ctrl.init(0).unwrap();
            ctrl.transport_mut().tx.clear();

            // A message starts but never completes
            ctrl.transport_mut().push_rx(&[0x65, 0x00]);
            ctrl.poll(100);
            assert!(ctrl.transport().tx.is_empty());

            ctrl.poll(1000);
            assert_eq!(ctrl.transport().tx.as_slice(), SENDME);

            // The link recovers: a later complete message still parses
            ctrl.transport_mut()
                .push_rx(&[0x71, 0x2A, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF]);
            ctrl.poll(1010);
        }
        assert_eq!(observer.timeouts, 1);
        assert_eq!(p0.calls.numerics.as_slice(), &[42]);
        assert!(p0.calls.touches.is_empty());
    }

    #[test]
    fn test_rx_overflow_reported_and_recovered() {
        let mut p0 = TestPage::new(0);
        let mut observer = TestObserver::default();
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.set_observer(&mut observer);
            ctrl.init(0).unwrap();

            for _ in 0..3 {
                ctrl.transport_mut().push_rx(&[0x42; 100]);
                ctrl.poll(10);
            }
            ctrl.transport_mut().push_rx(&[0xFF, 0xFF, 0xFF]);
            ctrl.transport_mut().push_rx(&[0x01, 0xFF, 0xFF, 0xFF]);
            ctrl.poll(20);
        }
        assert_eq!(observer.overflows, 1);
        assert_eq!(p0.calls.ok, 1);
    }

    #[test]
    fn test_no_pages_registered() {
        let pages: [&mut dyn Page; 0] = [];
        let mut ctrl = PanelController::new(TestTransport::new(), pages);
        ctrl.init(0).unwrap();
        assert_eq!(ctrl.active_page_id(), None);

        // Events with no active page are dropped without effect
        ctrl.transport_mut()
            .push_rx(&[0x71, 0x2A, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF]);
        ctrl.poll(2000);
        assert_eq!(ctrl.active_page_id(), None);
    }

    #[test]
    fn test_unknown_opcode_frame_is_ignored() {
        let mut p0 = TestPage::new(0);
        {
            let mut ctrl = PanelController::new(TestTransport::new(), [&mut p0 as &mut dyn Page]);
            ctrl.init(0).unwrap();

            ctrl.transport_mut().push_rx(&[0x42, 0x01, 0x02, 0xFF, 0xFF, 0xFF]);
            ctrl.poll(10);
            assert_eq!(ctrl.active_page_id(), Some(0));
        }
        assert!(p0.calls.touches.is_empty());
        assert_eq!(p0.calls.ok, 0);
    }

    // A page that writes through the sink from its handler
    struct WritingPage;

    impl Page for WritingPage {
        fn id(&self) -> u8 {
            0
        }

        fn setup(&mut self, sink: &mut dyn CommandSink) {
            sink.set_text("t0", "Ready").unwrap();
        }

        fn refresh(&mut self, _sink: &mut dyn CommandSink, _now_ms: u64) {}

        fn on_touch(&mut self, sink: &mut dyn CommandSink, _component_id: u8, _action: TouchAction) {
            sink.set_value("n0", 5).unwrap();
        }
    }

    #[test]
    fn test_pages_send_commands_through_sink() {
        let mut page = WritingPage;
        let mut ctrl = PanelController::new(TestTransport::new(), [&mut page as &mut dyn Page]);
        ctrl.init(0).unwrap();
        assert!(ctrl
            .transport()
            .tx
            .starts_with(b"t0.txt=\"Ready\"\xFF\xFF\xFF"));

        ctrl.transport_mut().tx.clear();
        ctrl.transport_mut()
            .push_rx(&[0x65, 0x00, 0x01, 0x01, 0xFF, 0xFF, 0xFF]);
        ctrl.poll(10);
        assert_eq!(ctrl.transport().tx.as_slice(), b"n0.val=5\xFF\xFF\xFF");
    }
}
