//! Command transports
//!
//! `SerialLink` talks to the motion controller; `WriterSink` prints frames
//! for dry runs.

use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use puck_core::{CommandSink, ControllerScale, MoveCommand, TransportError};
use serialport::{ClearBuffer, SerialPort};

use crate::config::LinkConfig;

/// Serial connection to the motion controller, reopened on demand
pub struct SerialLink {
    config: LinkConfig,
    port: Option<Box<dyn SerialPort>>,
    last_attempt: Option<Instant>,
    closed: bool,
}

impl SerialLink {
    /// Open the port now; fails if it cannot be opened
    pub fn open(config: LinkConfig) -> Result<Self, TransportError> {
        let mut link = Self::disconnected(config);
        link.connect()?;
        Ok(link)
    }

    /// Try to open the port, but keep going without it on failure
    pub fn open_lazy(config: LinkConfig) -> Self {
        let mut link = Self::disconnected(config);
        if let Err(e) = link.connect() {
            log::warn!("Serial port not available yet: {}", e);
        }
        link
    }

    fn disconnected(config: LinkConfig) -> Self {
        Self {
            config,
            port: None,
            last_attempt: None,
            closed: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        self.last_attempt = Some(Instant::now());
        let cfg = &self.config;

        let mut port = serialport::new(&cfg.port, cfg.baud_rate)
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .open()
            .map_err(|e| TransportError::Unavailable(format!("{}: {}", cfg.port, e)))?;

        if cfg.settle_ms > 0 {
            thread::sleep(Duration::from_millis(cfg.settle_ms));
        }
        if let Err(e) = port.clear(ClearBuffer::All) {
            log::debug!("Could not clear serial buffers: {}", e);
        }

        log::info!("Opened serial on {} @ {} baud", cfg.port, cfg.baud_rate);
        self.port = Some(port);
        Ok(())
    }

    fn reconnect_due(&self) -> bool {
        let interval = Duration::from_millis(self.config.reconnect_interval_ms);
        self.last_attempt.map_or(true, |t| t.elapsed() >= interval)
    }

    /// Send numbered move frames and check each echo (TX wired to RX).
    /// Every frame stays inside `scale`, so it is safe on a live gantry too.
    pub fn loopback(
        &mut self,
        count: usize,
        scale: &ControllerScale,
    ) -> Result<Vec<LoopbackResult>, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        let commands: Vec<MoveCommand> = (0..count).map(|i| loopback_command(i, scale)).collect();
        let gap = Duration::from_millis(100);
        Ok(run_loopback(port.as_mut(), &commands, self.config.inter_byte_delay_us, gap))
    }
}

impl CommandSink for SerialLink {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        if self.port.is_none() {
            if !self.reconnect_due() {
                return Err(TransportError::Unavailable(format!(
                    "{} disconnected",
                    self.config.port
                )));
            }
            log::info!("Reconnecting to {}", self.config.port);
            self.connect()?;
        }

        let delay = self.config.inter_byte_delay_us;
        let Some(port) = self.port.as_mut() else {
            return Err(TransportError::Unavailable(self.config.port.clone()));
        };
        if let Err(e) = write_paced(port.as_mut(), frame, delay) {
            self.port = None;
            self.last_attempt = Some(Instant::now());
            return Err(TransportError::Io(e));
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush() {
                log::warn!("Flush on close failed: {}", e);
            }
            log::info!("Serial port {} closed", self.config.port);
        }
        self.closed = true;
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Frames written as text lines to any writer (stdout for dry runs)
pub struct WriterSink<W: Write> {
    writer: W,
    closed: bool,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, closed: false }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CommandSink for WriterSink<W> {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.writer.write_all(frame)?;
        self.writer.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            if let Err(e) = self.writer.flush() {
                log::warn!("Flush on close failed: {}", e);
            }
            self.closed = true;
        }
    }
}

/// Write a frame, optionally one byte at a time with a pause after each
pub fn write_paced<W: Write + ?Sized>(writer: &mut W, frame: &[u8], delay_us: u64) -> io::Result<()> {
    if delay_us == 0 {
        writer.write_all(frame)?;
    } else {
        let pause = Duration::from_micros(delay_us);
        for byte in frame {
            writer.write_all(std::slice::from_ref(byte))?;
            writer.flush()?;
            thread::sleep(pause);
        }
    }
    writer.flush()
}

/// Read up to and including `\n`; a timeout returns what arrived so far
pub fn read_line<R: Read + ?Sized>(reader: &mut R, max_len: usize) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    while line.len() < max_len {
        match reader.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(line)
}

/// Outcome of one loopback frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackResult {
    pub sent: MoveCommand,
    pub received: Option<MoveCommand>,
    pub error: Option<String>,
}

impl LoopbackResult {
    pub fn passed(&self) -> bool {
        self.received == Some(self.sent)
    }
}

/// Sweep x across `[x_min, x_max]` at mid-range y
fn loopback_command(i: usize, scale: &ControllerScale) -> MoveCommand {
    let (lo, hi) = (scale.x_min.min(scale.x_max), scale.x_min.max(scale.x_max));
    let span = usize::from(hi - lo) + 1;
    let x = lo + ((i * 571) % span) as u16;
    let y = ((u32::from(scale.y_min) + u32::from(scale.y_max)) / 2) as u16;
    MoveCommand::new(x, y)
}

pub fn run_loopback<P: Read + Write + ?Sized>(
    port: &mut P,
    commands: &[MoveCommand],
    delay_us: u64,
    gap: Duration,
) -> Vec<LoopbackResult> {
    commands
        .iter()
        .map(|&sent| {
            let exchange = write_paced(&mut *port, &sent.to_bytes(), delay_us).and_then(|()| {
                if !gap.is_zero() {
                    thread::sleep(gap);
                }
                read_line(&mut *port, 64)
            });
            match exchange {
                Ok(echo) if echo.is_empty() => LoopbackResult {
                    sent,
                    received: None,
                    error: Some("no data received".to_string()),
                },
                Ok(echo) => match MoveCommand::parse(&echo) {
                    Ok(cmd) => LoopbackResult { sent, received: Some(cmd), error: None },
                    Err(e) => LoopbackResult { sent, received: None, error: Some(e.to_string()) },
                },
                Err(e) => LoopbackResult { sent, received: None, error: Some(e.to_string()) },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// TX wired straight to RX
    #[derive(Default)]
    struct Wire {
        buffer: VecDeque<u8>,
        writes: usize,
    }

    impl Write for Wire {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            self.buffer.extend(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Read for Wire {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.buffer.pop_front() {
                Some(b) => {
                    buf[0] = b;
                    Ok(1)
                }
                None => Err(io::Error::from(io::ErrorKind::TimedOut)),
            }
        }
    }

    /// Accepts writes, never answers
    struct Deaf;

    impl Write for Deaf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Read for Deaf {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::TimedOut))
        }
    }

    #[test]
    fn test_write_paced_byte_by_byte() {
        let mut wire = Wire::default();
        write_paced(&mut wire, b"M00010002\r\n", 1).unwrap();
        assert_eq!(wire.writes, 11);
        assert_eq!(wire.buffer.iter().copied().collect::<Vec<u8>>(), b"M00010002\r\n".to_vec());

        let mut wire = Wire::default();
        write_paced(&mut wire, b"M00010002\r\n", 0).unwrap();
        assert_eq!(wire.writes, 1);
    }

    #[test]
    fn test_read_line_stops_at_newline_and_timeout() {
        let mut wire = Wire::default();
        wire.buffer.extend(b"M00010002\r\nM0003");
        assert_eq!(read_line(&mut wire, 64).unwrap(), b"M00010002\r\n".to_vec());
        assert_eq!(read_line(&mut wire, 64).unwrap(), b"M0003".to_vec());
        assert!(read_line(&mut wire, 64).unwrap().is_empty());
    }

    #[test]
    fn test_loopback_passes_on_wire() {
        let mut wire = Wire::default();
        let scale = ControllerScale::default();
        let commands: Vec<MoveCommand> = (0..5).map(|i| loopback_command(i, &scale)).collect();
        let results = run_loopback(&mut wire, &commands, 0, Duration::ZERO);
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(LoopbackResult::passed));
        assert_eq!(results[1].sent, MoveCommand::new(571, 2436));
    }

    #[test]
    fn test_loopback_sweep_stays_in_controller_range() {
        let narrow = ControllerScale {
            x_min: 100,
            x_max: 1000,
            y_min: 200,
            y_max: 600,
            ..ControllerScale::default()
        };
        for i in 0..50 {
            let cmd = loopback_command(i, &narrow);
            assert!((100..=1000).contains(&cmd.x), "frame {}: x={}", i, cmd.x);
            assert_eq!(cmd.y, 400);
        }
        // 571 * 2 wraps past a 901-wide span
        assert_eq!(loopback_command(2, &narrow).x, 100 + (1142 % 901) as u16);

        let tiny = ControllerScale { x_min: 0, x_max: 10, ..ControllerScale::default() };
        assert!((0..20).all(|i| loopback_command(i, &tiny).x <= 10));
    }

    #[test]
    fn test_loopback_reports_silence() {
        let results = run_loopback(&mut Deaf, &[MoveCommand::new(1, 2)], 0, Duration::ZERO);
        assert!(!results[0].passed());
        assert_eq!(results[0].error.as_deref(), Some("no data received"));
    }

    #[test]
    fn test_writer_sink() {
        let mut sink = WriterSink::new(Vec::new());
        sink.send(&MoveCommand::new(12, 34).to_bytes()).unwrap();
        sink.close();
        assert!(matches!(sink.send(b"M00000000\r\n"), Err(TransportError::Closed)));
        assert_eq!(sink.into_inner(), b"M00120034\r\n".to_vec());
    }

    #[test]
    fn test_missing_port_is_unavailable() {
        let config = LinkConfig {
            port: "/dev/does-not-exist-puck".to_string(),
            settle_ms: 0,
            reconnect_interval_ms: 60_000,
            ..LinkConfig::default()
        };
        assert!(matches!(
            SerialLink::open(config.clone()),
            Err(TransportError::Unavailable(_))
        ));

        // Lazy link skips frames until the reconnect interval passes
        let mut link = SerialLink::open_lazy(config);
        assert!(!link.is_connected());
        let err = link.send(b"M00000000\r\n").unwrap_err();
        assert!(err.is_recoverable());

        link.close();
        assert!(matches!(link.send(b"M00000000\r\n"), Err(TransportError::Closed)));
    }
}
