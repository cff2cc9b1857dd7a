//! Control session loop and its collaborator seams

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use super::controller::{Controller, FrameOutcome};
use super::mode_machine::Mode;
use super::observation::Frame;
use crate::error::{DetectorError, TransportError};

/// Source of camera frames
pub trait Detector {
    /// Next frame, or `Ok(None)` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<Frame>, DetectorError>;
}

/// Destination for encoded command frames
pub trait CommandSink {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Release the underlying connection. Must be safe to call twice.
    fn close(&mut self);
}

/// Counters for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub frames: u64,
    pub frames_with_puck: u64,
    pub commands_sent: u64,
    pub transport_failures: u64,
    pub mode_frames: HashMap<Mode, u64>,
}

impl SessionStats {
    pub fn record(&mut self, outcome: &FrameOutcome) {
        self.frames += 1;
        if outcome.puck_visible {
            self.frames_with_puck += 1;
        }
        *self.mode_frames.entry(outcome.mode).or_insert(0) += 1;
    }

    pub fn frames_in(&self, mode: Mode) -> u64 {
        self.mode_frames.get(&mode).copied().unwrap_or(0)
    }
}

/// Drive the control loop until the detector runs dry, `stop` is raised,
/// `max_frames` is reached, or the sink reports it is closed for good.
///
/// Transport failures are logged and counted; detector failures end the
/// session with an error. The sink is closed on every exit path.
pub fn run_session<D, S>(
    detector: &mut D,
    sink: &mut S,
    controller: &mut Controller,
    stop: &AtomicBool,
    max_frames: Option<u64>,
) -> Result<SessionStats, DetectorError>
where
    D: Detector + ?Sized,
    S: CommandSink + ?Sized,
{
    let mut stats = SessionStats::default();

    loop {
        if stop.load(Ordering::Relaxed) {
            log::info!("Stop requested after {} frames", stats.frames);
            break;
        }
        if max_frames.map_or(false, |max| stats.frames >= max) {
            log::info!("Frame limit reached ({})", stats.frames);
            break;
        }

        let frame = match detector.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("Detector exhausted after {} frames", stats.frames);
                break;
            }
            Err(e) => {
                sink.close();
                return Err(e);
            }
        };

        let outcome = controller.process(&frame);
        stats.record(&outcome);

        let Some(command) = outcome.command else {
            continue;
        };
        match sink.send(&command.to_bytes()) {
            Ok(()) => stats.commands_sent += 1,
            Err(e) => {
                stats.transport_failures += 1;
                if e.is_recoverable() {
                    log::warn!("Dropped {} at frame {}: {}", command, stats.frames, e);
                } else {
                    log::warn!("Transport gone, ending session: {}", e);
                    break;
                }
            }
        }
    }

    sink.close();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlConfig;
    use crate::engine::geometry::Table;
    use crate::engine::observation::Observation;
    use crate::protocol::MoveCommand;
    use std::collections::VecDeque;

    struct ScriptedDetector {
        frames: VecDeque<Result<Frame, DetectorError>>,
    }

    impl ScriptedDetector {
        fn new(frames: Vec<Result<Frame, DetectorError>>) -> Self {
            Self { frames: frames.into() }
        }

        /// Puck moving toward the robot at 10 px/frame
        fn approach(count: usize) -> Self {
            let frames = (0..count)
                .map(|i| {
                    let y = 380.0 - 10.0 * i as f32;
                    Ok(Frame::new(i as f64 / 30.0, vec![Observation::puck(100.0, y)]))
                })
                .collect();
            Self::new(frames)
        }
    }

    impl Detector for ScriptedDetector {
        fn next_frame(&mut self) -> Result<Option<Frame>, DetectorError> {
            self.frames.pop_front().transpose()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<Vec<u8>>,
        fail_with: Option<fn() -> TransportError>,
        closed: u32,
    }

    impl CommandSink for RecordingSink {
        fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
            if let Some(make) = self.fail_with {
                return Err(make());
            }
            self.sent.push(frame.to_vec());
            Ok(())
        }

        fn close(&mut self) {
            self.closed += 1;
        }
    }

    fn controller() -> Controller {
        Controller::new(ControlConfig::default(), Table::new(200.0, 400.0).unwrap()).unwrap()
    }

    #[test]
    fn test_runs_until_exhausted() {
        let mut detector = ScriptedDetector::approach(10);
        let mut sink = RecordingSink::default();
        let stop = AtomicBool::new(false);

        let stats = run_session(&mut detector, &mut sink, &mut controller(), &stop, None).unwrap();

        assert_eq!(stats.frames, 10);
        assert_eq!(stats.frames_with_puck, 10);
        // First frame has no velocity yet
        assert_eq!(stats.commands_sent, 9);
        assert_eq!(sink.sent.len(), 9);
        assert_eq!(stats.frames_in(Mode::Predict), 10);
        assert_eq!(sink.closed, 1);

        for frame in &sink.sent {
            assert!(MoveCommand::parse(frame).is_ok());
        }
    }

    #[test]
    fn test_frame_limit() {
        let mut detector = ScriptedDetector::approach(10);
        let mut sink = RecordingSink::default();
        let stop = AtomicBool::new(false);

        let stats =
            run_session(&mut detector, &mut sink, &mut controller(), &stop, Some(4)).unwrap();
        assert_eq!(stats.frames, 4);
        assert_eq!(detector.frames.len(), 6);
    }

    #[test]
    fn test_stop_flag_checked_before_polling() {
        let mut detector = ScriptedDetector::approach(5);
        let mut sink = RecordingSink::default();
        let stop = AtomicBool::new(true);

        let stats = run_session(&mut detector, &mut sink, &mut controller(), &stop, None).unwrap();
        assert_eq!(stats.frames, 0);
        assert_eq!(detector.frames.len(), 5);
        assert_eq!(sink.closed, 1);
    }

    #[test]
    fn test_recoverable_transport_errors_are_counted() {
        let mut detector = ScriptedDetector::approach(6);
        let mut sink = RecordingSink {
            fail_with: Some(|| TransportError::Unavailable("unplugged".into())),
            ..Default::default()
        };
        let stop = AtomicBool::new(false);

        let stats = run_session(&mut detector, &mut sink, &mut controller(), &stop, None).unwrap();
        assert_eq!(stats.frames, 6);
        assert_eq!(stats.commands_sent, 0);
        assert_eq!(stats.transport_failures, 5);
    }

    #[test]
    fn test_closed_transport_ends_session() {
        let mut detector = ScriptedDetector::approach(6);
        let mut sink = RecordingSink {
            fail_with: Some(|| TransportError::Closed),
            ..Default::default()
        };
        let stop = AtomicBool::new(false);

        let stats = run_session(&mut detector, &mut sink, &mut controller(), &stop, None).unwrap();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.transport_failures, 1);
        assert_eq!(sink.closed, 1);
    }

    #[test]
    fn test_detector_error_is_fatal() {
        let mut detector = ScriptedDetector::new(vec![
            Ok(Frame::empty(0.0)),
            Err(DetectorError::Parse { line: 2, message: "bad".into() }),
            Ok(Frame::empty(0.1)),
        ]);
        let mut sink = RecordingSink::default();
        let stop = AtomicBool::new(false);

        let result = run_session(&mut detector, &mut sink, &mut controller(), &stop, None);
        assert!(matches!(result, Err(DetectorError::Parse { line: 2, .. })));
        assert_eq!(sink.closed, 1);
    }

    #[test]
    fn test_works_through_trait_objects() {
        let mut detector: Box<dyn Detector> = Box::new(ScriptedDetector::approach(3));
        let mut sink: Box<dyn CommandSink> = Box::new(RecordingSink::default());
        let stop = AtomicBool::new(false);

        let stats =
            run_session(detector.as_mut(), sink.as_mut(), &mut controller(), &stop, None).unwrap();
        assert_eq!(stats.frames, 3);
    }
}
