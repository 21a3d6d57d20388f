use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

pub mod formatting;
pub mod logging;

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time at the millisecond precision rows are stored with.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[cfg(test)]
mod tests {
    use super::{generate_id, timestamp_now};

    #[test]
    fn generated_ids_are_unique() {
        let ids: std::collections::HashSet<String> = (0..64).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn timestamps_have_millisecond_precision() {
        assert_eq!(timestamp_now().timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
