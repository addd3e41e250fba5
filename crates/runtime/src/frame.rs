/// Display-refresh tick metadata.
///
/// Frames are counted, not timed: the overlay advances one simulation step per
/// refresh, so the index is the only timebase it needs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// 0-based frame index since the loop started.
    pub index: u64,
}

impl Frame {
    pub fn new(index: u64) -> Self {
        Self { index }
    }

    pub fn next(self) -> Self {
        Self::new(self.index.wrapping_add(1))
    }
}

/// Handle for a pending frame callback, used to cancel it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub i32);

/// The host refused to schedule a frame callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleError(pub String);

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame scheduling failed: {}", self.0)
    }
}

impl std::error::Error for ScheduleError {}

/// Source of display-refresh callbacks.
///
/// Implementations only schedule; delivering the callback back into the
/// animation loop is the host's job (a browser `requestAnimationFrame`
/// closure, or a test calling the loop by hand).
pub trait FrameClock {
    fn request_frame(&mut self) -> Result<FrameRequest, ScheduleError>;
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Deterministic clock for headless hosts and tests.
///
/// Records every request and cancellation; the caller decides when a frame
/// "fires" by invoking the loop directly.
#[derive(Debug, Default)]
pub struct ManualClock {
    next_id: i32,
    pending: Option<FrameRequest>,
    requested: u64,
    cancelled: Vec<FrameRequest>,
    fail_next: Option<String>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The request that would fire next, if any.
    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Marks the pending request as delivered and returns it.
    pub fn fire(&mut self) -> Option<FrameRequest> {
        self.pending.take()
    }

    pub fn requested_count(&self) -> u64 {
        self.requested
    }

    pub fn cancelled(&self) -> &[FrameRequest] {
        &self.cancelled
    }

    /// Makes the next `request_frame` call fail with `reason`.
    pub fn fail_next_request(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&mut self) -> Result<FrameRequest, ScheduleError> {
        if let Some(reason) = self.fail_next.take() {
            return Err(ScheduleError(reason));
        }
        self.next_id = self.next_id.wrapping_add(1);
        let req = FrameRequest(self.next_id);
        self.pending = Some(req);
        self.requested += 1;
        Ok(req)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
        self.cancelled.push(request);
    }
}
