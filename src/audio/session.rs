// Playback session and buffer-feed callback
// Runs on the driver's real-time thread: no allocation, no locks, no I/O

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::format::LeSample;
use crate::wav::SampleView;

/// What the feed callback tells the driver after filling a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// More data follows; call again
    Continue,
    /// Buffer exhausted; the rest of the output was silenced
    Complete,
}

/// Cancellation flag shared between the caller and the feed callback
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// State shared between the session (callback side) and its observers
#[derive(Debug)]
pub(crate) struct SessionState {
    offset: AtomicUsize,
    complete: AtomicBool,
    fault: Mutex<Option<String>>,
    cancel: CancelToken,
}

impl SessionState {
    fn new(cancel: CancelToken) -> Self {
        Self {
            offset: AtomicUsize::new(0),
            complete: AtomicBool::new(false),
            fault: Mutex::new(None),
            cancel,
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset.load(Ordering::Acquire)
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Take the first asynchronous stream error, if any was reported
    pub(crate) fn take_fault(&self) -> Option<String> {
        self.fault.lock().take()
    }
}

/// Hands asynchronous stream errors from the driver back to the session owner
#[derive(Debug, Clone)]
pub struct FaultReporter(Arc<SessionState>);

impl FaultReporter {
    /// Record a stream error. Only the first one is kept.
    pub fn report(&self, message: impl Into<String>) {
        let mut fault = self.0.fault.lock();
        if fault.is_none() {
            *fault = Some(message.into());
        }
    }
}

/// One playback of a sample buffer.
///
/// The session never copies or resizes the samples. The read offset only
/// moves forward and only inside [`PlaybackSession::fill`]; the driver never
/// runs two callbacks for the same stream at once, so the offset has a
/// single writer.
#[derive(Debug)]
pub struct PlaybackSession {
    samples: SampleView,
    bytes_per_frame: usize,
    state: Arc<SessionState>,
}

impl PlaybackSession {
    /// Create a session over `samples`. Returns `None` if a frame would be empty.
    pub fn new(samples: SampleView, bytes_per_frame: usize, cancel: CancelToken) -> Option<Self> {
        if bytes_per_frame == 0 {
            return None;
        }
        Some(Self {
            samples,
            bytes_per_frame,
            state: Arc::new(SessionState::new(cancel)),
        })
    }

    pub fn total_bytes(&self) -> usize {
        self.samples.len()
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_frame
    }

    pub fn offset(&self) -> usize {
        self.state.offset()
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    pub fn fault_reporter(&self) -> FaultReporter {
        FaultReporter(Arc::clone(&self.state))
    }

    pub(crate) fn shared_state(&self) -> Arc<SessionState> {
        Arc::clone(&self.state)
    }

    /// Feed `frames_requested` frames into the front of `out`
    pub fn feed(&mut self, frames_requested: usize, out: &mut [u8]) -> FeedStatus {
        let requested = frames_requested
            .saturating_mul(self.bytes_per_frame)
            .min(out.len());
        self.fill(&mut out[..requested])
    }

    /// Fill `out` completely from the current offset.
    ///
    /// Copies as many real bytes as remain, zero-fills the rest and reports
    /// `Complete` once the buffer runs dry.
    pub fn fill(&mut self, out: &mut [u8]) -> FeedStatus {
        if self.state.is_cancelled() {
            out.fill(0);
            return self.finish();
        }

        let offset = self.state.offset.load(Ordering::Relaxed);
        let samples = self.samples.as_slice();
        let remaining = samples.len() - offset;

        if remaining == 0 {
            out.fill(0);
            return self.finish();
        }

        let requested = out.len();
        let to_copy = requested.min(remaining);
        out[..to_copy].copy_from_slice(&samples[offset..offset + to_copy]);
        self.state.offset.store(offset + to_copy, Ordering::Release);

        if to_copy < requested {
            out[to_copy..].fill(0);
            return self.finish();
        }
        FeedStatus::Continue
    }

    /// Fill a typed driver buffer with little-endian WAV samples
    pub fn fill_samples<T: LeSample>(&mut self, out: &mut [T]) -> FeedStatus {
        let status = self.fill(bytemuck::cast_slice_mut(out));
        if cfg!(target_endian = "big") {
            for sample in out.iter_mut() {
                *sample = sample.from_le();
            }
        }
        status
    }

    fn finish(&self) -> FeedStatus {
        self.state.complete.store(true, Ordering::Release);
        FeedStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(samples: Vec<u8>, bytes_per_frame: usize) -> PlaybackSession {
        PlaybackSession::new(SampleView::new(samples), bytes_per_frame, CancelToken::new()).unwrap()
    }

    #[test]
    fn test_full_request_continues() {
        let data: Vec<u8> = (0..32).collect();
        let mut s = session(data.clone(), 4);
        let mut out = [0xAAu8; 16];

        assert_eq!(s.feed(4, &mut out), FeedStatus::Continue);
        assert_eq!(&out, &data[..16]);
        assert_eq!(s.offset(), 16);
        assert!(!s.is_complete());
    }

    #[test]
    fn test_exact_end_continues_then_completes() {
        let data: Vec<u8> = (0..16).collect();
        let mut s = session(data.clone(), 4);
        let mut out = [0xAAu8; 16];

        assert_eq!(s.feed(4, &mut out), FeedStatus::Continue);
        assert_eq!(s.offset(), 16);

        assert_eq!(s.feed(4, &mut out), FeedStatus::Complete);
        assert_eq!(out, [0u8; 16]);
        assert_eq!(s.offset(), 16);
    }

    #[test]
    fn test_partial_request_zero_fills_and_completes() {
        let data: Vec<u8> = (1..=10).collect();
        let mut s = session(data.clone(), 2);
        let mut out = [0xAAu8; 16];

        assert_eq!(s.feed(8, &mut out), FeedStatus::Complete);
        assert_eq!(&out[..10], &data[..]);
        assert_eq!(&out[10..], &[0u8; 6]);
        assert_eq!(s.offset(), s.total_bytes());
        assert!(s.is_complete());
    }

    #[test]
    fn test_single_frame_ten_requested() {
        // 16-bit stereo: one frame is 4 bytes
        let mut s = session(vec![1, 2, 3, 4], 4);
        let mut out = [0xAAu8; 40];

        assert_eq!(s.feed(10, &mut out), FeedStatus::Complete);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
        assert_eq!(&out[4..], &[0u8; 36]);
        assert_eq!(s.offset(), 4);
    }

    #[test]
    fn test_empty_buffer_completes_immediately() {
        let mut s = session(Vec::new(), 4);
        let mut out = [0xAAu8; 32];

        assert_eq!(s.feed(8, &mut out), FeedStatus::Complete);
        assert_eq!(out, [0u8; 32]);
        assert_eq!(s.offset(), 0);
    }

    #[test]
    fn test_offset_monotonic_and_bounded() {
        let data: Vec<u8> = (0..=255).cycle().take(1000).collect();
        let mut s = session(data.clone(), 4);
        let mut played = Vec::new();
        let mut last = 0;

        for frames in [1usize, 7, 64, 3, 128, 0, 17, 256].iter().cycle() {
            let mut out = vec![0xAAu8; frames * 4];
            let status = s.feed(*frames, &mut out);

            let offset = s.offset();
            assert!(offset >= last);
            assert!(offset <= s.total_bytes());
            played.extend_from_slice(&out[..offset - last]);
            last = offset;

            if status == FeedStatus::Complete {
                break;
            }
        }

        assert_eq!(played, data);
    }

    #[test]
    fn test_feed_never_writes_past_request() {
        let mut s = session(vec![9u8; 64], 4);
        let mut out = [0xAAu8; 32];

        assert_eq!(s.feed(2, &mut out), FeedStatus::Continue);
        assert_eq!(&out[..8], &[9u8; 8]);
        assert_eq!(&out[8..], &[0xAAu8; 24]);
    }

    #[test]
    fn test_cancel_silences_without_advancing() {
        let cancel = CancelToken::new();
        let mut s = PlaybackSession::new(SampleView::new(vec![5u8; 64]), 2, cancel.clone()).unwrap();
        let mut out = [0xAAu8; 8];

        assert_eq!(s.fill(&mut out), FeedStatus::Continue);
        assert_eq!(s.offset(), 8);

        cancel.cancel();
        assert_eq!(s.fill(&mut out), FeedStatus::Complete);
        assert_eq!(out, [0u8; 8]);
        assert_eq!(s.offset(), 8);
    }

    #[test]
    fn test_fill_samples_i16() {
        let data: Vec<u8> = [1i16, -2, 300, -400]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let mut s = session(data, 4);
        let mut out = [0i16; 6];

        assert_eq!(s.fill_samples(&mut out), FeedStatus::Complete);
        assert_eq!(out, [1, -2, 300, -400, 0, 0]);
    }

    #[test]
    fn test_fill_samples_f32() {
        let data: Vec<u8> = [0.5f32, -0.25].iter().flat_map(|s| s.to_le_bytes()).collect();
        let mut s = session(data, 8);
        let mut out = [1.0f32; 2];

        assert_eq!(s.fill_samples(&mut out), FeedStatus::Continue);
        assert_eq!(out, [0.5, -0.25]);
    }

    #[test]
    fn test_fill_samples_f64() {
        let data: Vec<u8> = [0.125f64, -0.75, 1.0]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let mut s = session(data, 16);
        let mut out = [9.0f64; 4];

        assert_eq!(s.fill_samples(&mut out), FeedStatus::Complete);
        assert_eq!(out, [0.125, -0.75, 1.0, 0.0]);
        assert_eq!(s.offset(), 24);
    }

    #[test]
    fn test_zero_frame_size_rejected() {
        assert!(PlaybackSession::new(SampleView::new(vec![0u8; 4]), 0, CancelToken::new()).is_none());
    }

    #[test]
    fn test_fault_reporter_keeps_first() {
        let s = session(vec![0u8; 4], 1);
        let reporter = s.fault_reporter();
        reporter.report("device unplugged");
        reporter.report("second");

        let state = s.shared_state();
        assert_eq!(state.take_fault().as_deref(), Some("device unplugged"));
        assert_eq!(state.take_fault(), None);
    }
}
