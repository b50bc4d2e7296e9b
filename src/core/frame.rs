/// Frame - timing snapshot shared by every tile updated in it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub number: u64,
    pub time: f32,
    pub delta: f32,
}

impl Frame {
    pub fn new(number: u64, time: f32, delta: f32) -> Self {
        Self { number, time, delta }
    }
}

/// Handle to one registered frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

/// Platform frame callback registry, vsync style
///
/// At most one callback is pending at a time. Cancelling it guarantees that
/// `take_due` will not hand it out afterwards.
#[derive(Debug, Default)]
pub struct FrameLoop {
    next: u64,
    pending: Option<FrameToken>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register for the next frame, replacing any earlier registration
    pub fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        let token = FrameToken(self.next);
        self.pending = Some(token);
        token
    }

    /// Cancel a registration; returns whether it was still pending
    pub fn cancel(&mut self, token: FrameToken) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Hand out the pending callback for dispatch, clearing it
    pub fn take_due(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }
}
