use std::io::Read;

use bytes::Bytes;

use crate::error::TransportErrorKind;

pub(crate) fn make_agent(client_name: &str) -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .user_agent(client_name)
        .build()
        .new_agent()
}

/// Transport timeouts are the only retryable error class; everything
/// else the transport reports is terminal.
pub(crate) fn is_timeout_error(error: &ureq::Error) -> bool {
    match error {
        ureq::Error::Timeout(_) => true,
        ureq::Error::Io(source) => matches!(
            source.kind(),
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
        ),
        _ => false,
    }
}

pub(crate) fn classify_transport_error(error: &ureq::Error) -> TransportErrorKind {
    match error {
        ureq::Error::HostNotFound => TransportErrorKind::Dns,
        ureq::Error::ConnectProxyFailed(_) | ureq::Error::ConnectionFailed => {
            TransportErrorKind::Connect
        }
        ureq::Error::Io(source) => match source.kind() {
            std::io::ErrorKind::NotFound => TransportErrorKind::Dns,
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::AddrNotAvailable => TransportErrorKind::Connect,
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof => TransportErrorKind::Read,
            _ => TransportErrorKind::Other,
        },
        _ => TransportErrorKind::Other,
    }
}

pub(crate) fn read_body(
    response: &mut ureq::http::Response<ureq::Body>,
) -> std::io::Result<Bytes> {
    let mut reader = response.body_mut().as_reader();
    let mut collected = Vec::new();
    let mut chunk = [0_u8; 8192];

    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        collected.extend_from_slice(&chunk[..read]);
    }

    Ok(Bytes::from(collected))
}

/// Reads a discarded response to EOF so the connection is clean before
/// the next attempt. Read failures are irrelevant here: the response is
/// being thrown away either way.
pub(crate) fn drain_body(response: &mut ureq::http::Response<ureq::Body>) {
    let mut reader = response.body_mut().as_reader();
    let mut chunk = [0_u8; 8192];
    while matches!(reader.read(&mut chunk), Ok(read) if read > 0) {}
}
