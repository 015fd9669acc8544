//! Syslog sink for the local daemon.
//!
//! Each formatted event becomes one RFC 3164 style datagram,
//! `<PRI>sharkfacts[PID]: message`, sent to `/dev/log`. The priority uses
//! the `user` facility and a severity derived from the event level.

use std::io;
use std::os::unix::net::UnixDatagram;
use std::path::Path;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Socket the local syslog daemon listens on
pub const SYSLOG_SOCKET: &str = "/dev/log";

/// `user` facility, shifted into the priority's high bits
const FACILITY_USER: u8 = 1 << 3;

const SEVERITY_ERROR: u8 = 3;
const SEVERITY_WARNING: u8 = 4;
const SEVERITY_INFO: u8 = 6;
const SEVERITY_DEBUG: u8 = 7;

pub struct Syslog {
    socket: UnixDatagram,
    ident: &'static str,
    pid: u32,
}

impl Syslog {
    pub fn connect() -> io::Result<Self> {
        Self::connect_to(SYSLOG_SOCKET)
    }

    pub fn connect_to<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let socket = UnixDatagram::unbound()?;
        socket.connect(path)?;
        Ok(Self {
            socket,
            ident: env!("CARGO_CRATE_NAME"),
            pid: std::process::id(),
        })
    }

    fn send(&self, severity: u8, message: &[u8]) {
        let message = String::from_utf8_lossy(message);
        let line = format!(
            "<{}>{}[{}]: {}",
            FACILITY_USER | severity,
            self.ident,
            self.pid,
            message.trim_end()
        );
        // A dropped log line must never take the request down with it.
        let _ = self.socket.send(line.as_bytes());
    }
}

fn severity_for(level: &Level) -> u8 {
    match *level {
        Level::ERROR => SEVERITY_ERROR,
        Level::WARN => SEVERITY_WARNING,
        Level::INFO => SEVERITY_INFO,
        Level::DEBUG | Level::TRACE => SEVERITY_DEBUG,
    }
}

/// Buffers one event and sends it when dropped.
pub struct SyslogMessage<'a> {
    syslog: &'a Syslog,
    severity: u8,
    buf: Vec<u8>,
}

impl io::Write for SyslogMessage<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogMessage<'_> {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            self.syslog.send(self.severity, &self.buf);
        }
    }
}

impl<'a> MakeWriter<'a> for Syslog {
    type Writer = SyslogMessage<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SyslogMessage {
            syslog: self,
            severity: SEVERITY_INFO,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        SyslogMessage {
            syslog: self,
            severity: severity_for(meta.level()),
            buf: Vec::new(),
        }
    }
}
