use pretty_assertions::assert_eq;
use slcan_terminal_core::config::TerminalConfig;
use slcan_terminal_core::link::{Link, LinkError};
use slcan_terminal_core::session::{Console, Session, SessionError, SessionState};
use std::collections::VecDeque;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// In-memory adapter shared between the session's handles
#[derive(Default)]
struct MockState {
    incoming: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    fail_writes: bool,
}

#[derive(Clone, Default)]
struct MockLink {
    state: Arc<Mutex<MockState>>,
}

impl MockLink {
    fn with_replies(replies: &[&str]) -> Self {
        let link = Self::default();
        link.state.lock().unwrap().incoming = replies.iter().map(|r| r.as_bytes().to_vec()).collect();
        link
    }

    fn failing() -> Self {
        let link = Self::default();
        link.state.lock().unwrap().fail_writes = true;
        link
    }

    fn written(&self) -> String {
        String::from_utf8(self.state.lock().unwrap().written.clone()).unwrap()
    }

    fn pending(&self) -> usize {
        self.state.lock().unwrap().incoming.len()
    }
}

impl Link for MockLink {
    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, LinkError> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .incoming
            .pop_front()
            .map(|mut chunk| {
                chunk.truncate(max_bytes);
                chunk
            })
            .unwrap_or_default())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, LinkError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(LinkError::Write("Input/output error".to_string()));
        }
        state.written.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn try_clone(&self) -> Result<Box<dyn Link>, LinkError> {
        Ok(Box::new(self.clone()))
    }

    fn name(&self) -> &str {
        "mock0"
    }
}

/// Console sink that can be inspected after the session ends
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// Keystrokes that are only released once the adapter's replies were consumed
struct AfterDrained {
    link: MockLink,
    keys: Cursor<Vec<u8>>,
    waited: bool,
}

impl Read for AfterDrained {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.waited {
            let deadline = Instant::now() + Duration::from_secs(5);
            while self.link.pending() > 0 && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(1));
            }
            self.waited = true;
        }
        self.keys.read(buf)
    }
}

/// Keyboard that reports timed-out waits, like raw console input with no keys
struct IdleKeyboard {
    wait: Duration,
    timeouts_left: usize,
    keys: Cursor<Vec<u8>>,
}

impl IdleKeyboard {
    fn new(timeouts: usize, keys: &[u8]) -> Self {
        Self {
            wait: Duration::from_millis(10),
            timeouts_left: timeouts,
            keys: Cursor::new(keys.to_vec()),
        }
    }
}

impl Read for IdleKeyboard {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.timeouts_left > 0 {
            self.timeouts_left -= 1;
            std::thread::sleep(self.wait);
            return Err(io::ErrorKind::TimedOut.into());
        }
        self.keys.read(buf)
    }
}

fn fast_config() -> TerminalConfig {
    TerminalConfig {
        poll_interval_ms: 1,
        init_settle_ms: 0,
        init_response_ms: 0,
        ..Default::default()
    }
}

fn open_session(link: &MockLink) -> (Session, Capture) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let capture = Capture::default();
    let mut session = Session::new(fast_config(), Console::new(capture.clone()));
    session.attach(Box::new(link.clone())).unwrap();
    (session, capture)
}

#[test]
fn test_state_transitions() {
    let link = MockLink::default();
    let mut session = Session::new(fast_config(), Console::new(Capture::default()));
    assert_eq!(session.state(), SessionState::Idle);

    assert!(matches!(
        session.run_init_commands(&["V".to_string()]),
        Err(SessionError::InvalidState(SessionState::Idle))
    ));

    session.attach(Box::new(link.clone())).unwrap();
    assert_eq!(session.state(), SessionState::Open);
    assert!(matches!(
        session.attach(Box::new(link.clone())),
        Err(SessionError::InvalidState(SessionState::Open))
    ));

    session.run_interactive(Cursor::new(b"quit\r".to_vec())).unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    assert!(!session.is_running());

    assert!(matches!(
        session.run_interactive(Cursor::new(Vec::new())),
        Err(SessionError::InvalidState(SessionState::Closed))
    ));
}

#[test]
fn test_init_commands_sent_in_order() {
    let link = MockLink::with_replies(&["#\r", "V1013\rN0042\r"]);
    let (mut session, capture) = open_session(&link);

    session
        .run_init_commands(&["C".to_string(), "V".to_string(), "t123#DEADBEEF".to_string()])
        .unwrap();

    assert_eq!(link.written(), "C\rV\rt12304DEADBEEF\r");
    let out = capture.text();
    assert!(out.contains("=== Sending initialization commands ==="));
    assert!(out.contains("[INIT] C\n[RESP] # (Success)\n[INIT] V\n"));
    assert!(out.contains("[RESP] V1013\n[RESP] N0042\n"));
    assert!(out.contains("[INIT] t123#DEADBEEF\n=== Initialization complete ==="));
    assert!(!out.contains("[TX]"));
    assert_eq!(session.state(), SessionState::Open);
}

#[test]
fn test_init_stops_when_terminated() {
    let link = MockLink::default();
    let (mut session, capture) = open_session(&link);

    session.stop();
    session.run_init_commands(&["O".to_string()]).unwrap();

    assert_eq!(link.written(), "");
    assert!(!capture.text().contains("[INIT]"));
}

#[test]
fn test_interactive_translates_and_sends() {
    let link = MockLink::default();
    let (mut session, capture) = open_session(&link);

    session
        .run_interactive(Cursor::new(b"V\rt7E0#11.22.33.44\r\rexit\rO\r".to_vec()))
        .unwrap();

    // Nothing after the quit word is sent
    assert_eq!(link.written(), "V\rt7E00411223344\r");
    let out = capture.text();
    assert!(out.contains("Connected to: mock0"));
    assert!(out.contains("[TX] V\n"));
    assert!(out.contains("[TX] t7E00411223344\n"));
    assert!(out.ends_with("\nTerminal closed.\n"));
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn test_line_editing() {
    let link = MockLink::default();
    let (mut session, capture) = open_session(&link);

    session
        .run_interactive(Cursor::new(b"S7\x7f6\x1b\rquit\r".to_vec()))
        .unwrap();

    assert_eq!(link.written(), "S6\r");
    assert!(capture.text().contains("S7\x08 \x086\n"));
}

#[test]
fn test_malformed_shorthand_is_reported_and_sent_verbatim() {
    let link = MockLink::default();
    let (mut session, capture) = open_session(&link);

    session
        .run_interactive(Cursor::new(b"X123#AA\rt123#ABC\rquit\r".to_vec()))
        .unwrap();

    assert_eq!(link.written(), "X123#AA\rt123#ABC\r");
    let out = capture.text();
    assert!(out.contains("Error: Invalid packet type 'X' (use t,T,r,R,d,D,b,B)"));
    assert!(out.contains("Error: Data must have even number of hex digits"));
}

#[test]
fn test_write_failure_does_not_end_session() {
    let link = MockLink::failing();
    let (mut session, capture) = open_session(&link);

    session
        .run_interactive(Cursor::new(b"V\rO\rquit\r".to_vec()))
        .unwrap();

    let out = capture.text();
    assert_eq!(out.matches("Error: write: Write error").count(), 2);
    assert!(!out.contains("[TX]"));
}

#[test]
fn test_interrupt_key_aborts() {
    let link = MockLink::default();
    let (mut session, _capture) = open_session(&link);

    session
        .run_interactive(Cursor::new(b"V\rO\x03S6\r".to_vec()))
        .unwrap();

    assert_eq!(link.written(), "V\r");
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn test_end_of_input_closes() {
    let link = MockLink::default();
    let (mut session, _capture) = open_session(&link);

    session.run_interactive(Cursor::new(b"V".to_vec())).unwrap();

    assert_eq!(link.written(), "");
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn test_external_stop_before_interactive() {
    let link = MockLink::default();
    let (mut session, _capture) = open_session(&link);

    session.running_flag().store(false, std::sync::atomic::Ordering::SeqCst);
    session.run_interactive(Cursor::new(b"V\r".to_vec())).unwrap();

    assert_eq!(link.written(), "");
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn test_configured_quit_words() {
    let link = MockLink::default();
    let capture = Capture::default();
    let config = TerminalConfig {
        quit_words: vec!["bye".to_string()],
        ..fast_config()
    };
    let mut session = Session::new(config, Console::new(capture.clone()));
    session.attach(Box::new(link.clone())).unwrap();

    session
        .run_interactive(Cursor::new(b"quit\rbye\rV\r".to_vec()))
        .unwrap();

    assert_eq!(link.written(), "quit\r");
    assert!(capture.text().contains("Special: 'bye' to close"));
}

#[test]
fn test_receiver_displays_replies() {
    let link = MockLink::with_replies(&["#\r", "E31050A0F\r#3\r"]);
    let (mut session, capture) = open_session(&link);

    let input = AfterDrained {
        link: link.clone(),
        keys: Cursor::new(b"quit\r".to_vec()),
        waited: false,
    };
    session.run_interactive(input).unwrap();

    let out = capture.text();
    // Each message is printed whole; ordering against the prompt is not checked
    assert!(out.contains("[RX] # (Success)\n"));
    assert!(out.contains(
        "[RX] E31050A0F (Bus Off, Bit stuffing error, Rx Failed+CAN Tx buffer overflow, Tx Errors: 10, Rx Errors: 15)\n"
    ));
    assert!(out.contains("[RX] #3 (Adapter must be open)\n"));
    assert_eq!(link.pending(), 0);
}

#[test]
fn test_external_stop_while_waiting_for_keys() {
    let link = MockLink::default();
    let (mut session, capture) = open_session(&link);

    let running = session.running_flag();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        running.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    // Without the stop this keyboard stays idle for about 3s
    let started = Instant::now();
    session.run_interactive(IdleKeyboard::new(300, b"V\r")).unwrap();
    stopper.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(1), "took {:?}", started.elapsed());
    assert_eq!(link.written(), "");
    assert_eq!(session.state(), SessionState::Closed);
    assert!(capture.text().ends_with("\nTerminal closed.\n"));
}

#[test]
fn test_idle_waits_do_not_end_session() {
    let link = MockLink::default();
    let (mut session, _capture) = open_session(&link);

    session.run_interactive(IdleKeyboard::new(5, b"V\rquit\r")).unwrap();

    assert_eq!(link.written(), "V\r");
}
