// tests/admission/leaky_bucket_tests.rs

#[cfg(test)]
mod tests {
    use crate::TestClock;
    use admission_gate::{AdmissionConfig, AdmissionGate, StrategyState};
    use std::time::Duration;

    fn gate(capacity: u64, leak_interval: Duration, clock: &TestClock) -> AdmissionGate<TestClock> {
        let config = AdmissionConfig::leaky_bucket(capacity, leak_interval);
        AdmissionGate::with_config(config, clock.clone()).unwrap()
    }

    #[test]
    fn full_queue_denies_until_one_slot_leaks() {
        let clock = TestClock::new(0.0);
        let gate = gate(3, Duration::from_secs(1), &clock);
        let client = "client1";

        for _ in 0..3 {
            assert!(gate.decide(client).allowed);
        }
        let denied = gate.decide(client);
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after, Some(Duration::from_secs(1)));

        // One interval later exactly one slot has drained
        clock.set_time(1.0);
        let admitted = (0..5).filter(|_| gate.decide(client).allowed).count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn drain_rate_is_one_slot_per_interval() {
        let clock = TestClock::new(0.0);
        let gate = gate(4, Duration::from_millis(500), &clock);
        let client = "client1";

        for _ in 0..4 {
            assert!(gate.decide(client).allowed);
        }

        // 1.5s is three intervals
        clock.set_time(1.5);
        let admitted = (0..10).filter(|_| gate.decide(client).allowed).count();
        assert_eq!(admitted, 3);
    }

    #[test]
    fn queue_never_exceeds_capacity() {
        let clock = TestClock::new(0.0);
        let gate = gate(2, Duration::from_secs(1), &clock);
        let client = "client1";

        for step in 0..50 {
            clock.set_time(step as f64 * 0.1);
            gate.decide(client);
            match gate.store().state_of(client) {
                Some(StrategyState::LeakyBucket(bucket)) => assert!(bucket.queued() <= 2),
                other => panic!("Expected leaky bucket state, got: {:?}", other),
            }
        }
    }

    #[test]
    fn backward_clock_does_not_drain() {
        let clock = TestClock::new(5.0);
        let gate = gate(1, Duration::from_secs(1), &clock);
        let client = "client1";

        assert!(gate.decide(client).allowed);
        clock.set_time(0.0);
        assert!(!gate.decide(client).allowed);
        clock.set_time(6.0);
        assert!(gate.decide(client).allowed);
    }
}
