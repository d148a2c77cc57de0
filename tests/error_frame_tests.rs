//! ERROR frames are data, not failures: the session surfaces them as
//! events and leaves the close decision to the driver.

use stomp_core::{ConnectRequest, Frame, Session, SessionEvent, SessionPhase, StompError};

fn error_frame(message: &str) -> Frame {
    Frame::new("ERROR")
        .header("message", message)
        .header("content-type", "text/plain")
        .set_body(format!("{}\ndetails follow", message).into_bytes())
}

#[test]
fn error_while_connected_is_surfaced_not_fatal() {
    let mut session = Session::new();
    session
        .connect(ConnectRequest::new().host("broker"))
        .expect("connect");
    session
        .receive(Frame::new("CONNECTED").header("version", "1.2"))
        .expect("handshake");

    let events = session
        .receive(error_frame("malformed frame received"))
        .expect("receive");
    match &events[..] {
        [SessionEvent::ErrorReceived { frame }] => {
            assert_eq!(frame.get_header("message"), Some("malformed frame received"));
        }
        other => panic!("unexpected events: {:?}", other),
    }
    // the session stays connected; closing is the driver's call
    assert_eq!(session.phase(), SessionPhase::Connected);
}

#[test]
fn error_during_handshake_is_surfaced() {
    let mut session = Session::new();
    session
        .connect(ConnectRequest::new().host("broker").credentials("u", "wrong"))
        .expect("connect");

    let events = session
        .receive(error_frame("authentication failed"))
        .expect("receive");
    assert!(matches!(events[..], [SessionEvent::ErrorReceived { .. }]));
    assert_eq!(session.phase(), SessionPhase::Connecting);

    // the driver gives up and reports the transport closed
    session.disconnected();
    assert_eq!(session.phase(), SessionPhase::Disconnected);
}

#[test]
fn error_while_disconnecting_is_surfaced() {
    let mut session = Session::new();
    session
        .connect(ConnectRequest::new().host("broker"))
        .expect("connect");
    session
        .receive(Frame::new("CONNECTED").header("version", "1.2"))
        .expect("handshake");
    session.disconnect(None).expect("disconnect");

    let events = session.receive(error_frame("draining")).expect("receive");
    assert!(matches!(events[..], [SessionEvent::ErrorReceived { .. }]));
}

#[test]
fn error_in_disconnected_phase_is_a_state_error() {
    let mut session = Session::new();
    let err = session.receive(error_frame("too late")).unwrap_err();
    assert!(matches!(err, StompError::State { .. }));
}

#[test]
fn client_commands_from_the_broker_are_rejected() {
    let mut session = Session::new();
    session
        .connect(ConnectRequest::new().host("broker"))
        .expect("connect");
    session
        .receive(Frame::new("CONNECTED").header("version", "1.2"))
        .expect("handshake");

    let err = session
        .receive(Frame::new("SEND").header("destination", "/q"))
        .unwrap_err();
    assert!(matches!(err, StompError::UnexpectedFrame(c) if c == "SEND"));
    assert_eq!(session.phase(), SessionPhase::Connected);
}
