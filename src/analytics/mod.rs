pub mod recorder;
pub mod retention;
pub mod sink;

pub use recorder::ClickRecorder;
pub use retention::{RetentionTask, SweepReport};
pub use sink::ClickSink;

use chrono::{DateTime, Utc};

/// Best-effort request context attached to a click. None of it is required
/// for correctness.
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    /// Origin address
    pub addr: Option<String>,
    /// Client agent string
    pub agent: Option<String>,
    /// Referring URL
    pub referer: Option<String>,
}

impl ClickContext {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One recorded resolution of a short link.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    /// Owning link's opaque id (never the short code: codes can be
    /// reclaimed, ids cannot)
    pub link_id: String,
    pub clicked_at: DateTime<Utc>,
    pub context: ClickContext,
}

impl ClickEvent {
    pub fn new(link_id: impl Into<String>, context: ClickContext) -> Self {
        Self {
            link_id: link_id.into(),
            clicked_at: Utc::now(),
            context,
        }
    }
}
