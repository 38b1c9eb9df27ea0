//! Booking id generation strategies.

use uuid::Uuid;

use crate::model::BookingId;
use crate::ports::IdStrategy;

const SHORT_ID_LEN: usize = 8;

/// Eight lowercase hex characters taken from a random v4 UUID, e.g. `3f9a0c1e`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortUuid;

impl IdStrategy for ShortUuid {
    fn next_id(&mut self) -> BookingId {
        let simple = Uuid::new_v4().simple().to_string();
        BookingId(simple.chars().take(SHORT_ID_LEN).collect())
    }
}

/// Monotonically increasing decimal counter.
#[derive(Debug, Clone, Copy)]
pub struct Sequential {
    next: u64,
}

impl Sequential {
    /// First id handed out is `first`.
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl Default for Sequential {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdStrategy for Sequential {
    fn next_id(&mut self) -> BookingId {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        BookingId(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_uuid_is_eight_hex_chars() {
        let id = ShortUuid.next_id();
        assert_eq!(id.0.len(), SHORT_ID_LEN);
        assert!(id.0.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn sequential_counts_up_from_start() {
        let mut ids = Sequential::starting_at(1001);
        let issued: Vec<_> = (0..3).map(|_| ids.next_id().0).collect();
        assert_eq!(issued, ["1001", "1002", "1003"]);
    }
}
