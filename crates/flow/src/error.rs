use runtime::ScheduleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The map viewport has not been created yet; the overlay cannot start.
    ViewportNotReady,
    /// The overlay canvas could not be created or attached.
    SurfaceUnavailable(String),
    /// The host refused to schedule the next display-refresh callback.
    Scheduler(String),
    /// A configuration value is out of range.
    InvalidConfig(String),
    /// Configuration text could not be parsed.
    Config(String),
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowError::ViewportNotReady => write!(f, "map viewport not ready"),
            FlowError::SurfaceUnavailable(msg) => write!(f, "overlay surface unavailable: {msg}"),
            FlowError::Scheduler(msg) => write!(f, "frame scheduling failed: {msg}"),
            FlowError::InvalidConfig(msg) => write!(f, "invalid flow config: {msg}"),
            FlowError::Config(msg) => write!(f, "flow config parse error: {msg}"),
        }
    }
}

impl std::error::Error for FlowError {}

impl From<ScheduleError> for FlowError {
    fn from(err: ScheduleError) -> Self {
        FlowError::Scheduler(err.0)
    }
}
