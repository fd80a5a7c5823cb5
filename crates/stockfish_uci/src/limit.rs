use std::fmt;
use std::time::Duration;

/// Bound on a single engine search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    /// Search to a fixed depth in plies
    Depth(u32),
    /// Search for a fixed wall-clock time
    MoveTime(Duration),
}

impl SearchLimit {
    /// Smallest budget engines accept
    pub const MIN_MOVE_TIME: Duration = Duration::from_millis(1);

    /// The same limit with zero budgets raised to the smallest usable value
    pub fn clamped(self) -> Self {
        match self {
            SearchLimit::Depth(depth) => SearchLimit::Depth(depth.max(1)),
            SearchLimit::MoveTime(time) => SearchLimit::MoveTime(time.max(Self::MIN_MOVE_TIME)),
        }
    }
}

impl fmt::Display for SearchLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchLimit::Depth(depth) => write!(f, "depth {depth}"),
            SearchLimit::MoveTime(time) => write!(f, "{}ms", time.as_millis()),
        }
    }
}
