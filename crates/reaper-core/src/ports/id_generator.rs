//! IdGenerator port - ID 生成の抽象化
//!
//! Clock を使って ULID の timestamp 部分を決めるので、FixedClock を渡せば
//! テストでも時刻部分が決定的になります。

use std::sync::Arc;

use ulid::Ulid;

use crate::domain::PassId;
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_pass_id(&self) -> PassId;
}

/// UlidGenerator は ULID ベースの ID 生成器
pub struct UlidGenerator {
    clock: Arc<dyn Clock>,
}

impl UlidGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl IdGenerator for UlidGenerator {
    fn generate_pass_id(&self) -> PassId {
        let timestamp_ms = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        PassId::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(Arc::new(SystemClock));

        let id1 = id_gen.generate_pass_id();
        let id2 = id_gen.generate_pass_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn ulid_generator_uses_clock_for_timestamp() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(Arc::new(FixedClock::new(fixed_time)));

        let id = id_gen.generate_pass_id();
        assert_eq!(
            id.as_ulid().timestamp_ms(),
            fixed_time.timestamp_millis() as u64
        );
    }
}
