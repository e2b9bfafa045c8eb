use chrono::{DateTime, Duration, Utc};

/// Hands out strictly increasing insert timestamps together with a sequence
/// number, so two inserts in the same instant still sort deterministically.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Option<DateTime<Utc>>,
    seq: u64,
}

impl MonotonicClock {
    pub fn tick(&mut self) -> (u64, DateTime<Utc>) {
        let mut now = Utc::now();
        if let Some(last) = self.last {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last = Some(now);
        self.seq += 1;
        (self.seq, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_strictly_increase() {
        let mut clock = MonotonicClock::default();
        let ticks: Vec<_> = (0..1000).map(|_| clock.tick()).collect();
        for pair in ticks.windows(2) {
            assert!(pair[0].0 < pair[1].0);
            assert!(pair[0].1 < pair[1].1);
        }
    }
}
