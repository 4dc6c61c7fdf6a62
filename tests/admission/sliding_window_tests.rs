// tests/admission/sliding_window_tests.rs

#[cfg(test)]
mod tests {
    use crate::TestClock;
    use admission_gate::{AdmissionConfig, AdmissionGate, StrategyState};
    use std::time::Duration;

    fn gate(limit: u64, window: Duration, clock: &TestClock) -> AdmissionGate<TestClock> {
        let config = AdmissionConfig::sliding_window_log(limit, window);
        AdmissionGate::with_config(config, clock.clone()).unwrap()
    }

    fn logged(gate: &AdmissionGate<TestClock>, client: &str) -> u64 {
        match gate.store().state_of(client) {
            Some(StrategyState::SlidingWindowLog(log)) => log.logged(),
            other => panic!("Expected sliding window log state, got: {:?}", other),
        }
    }

    #[test]
    fn exact_window_accounting() {
        let clock = TestClock::new(0.0);
        let gate = gate(2, Duration::from_secs(1), &clock);
        let client = "client1";

        assert!(gate.decide(client).allowed);
        clock.set_time(0.4);
        assert!(gate.decide(client).allowed);

        clock.set_time(0.5);
        let denied = gate.decide(client);
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after, Some(Duration::from_millis(500)));

        // the t=0 entry has left the window, t=0.4 has not
        clock.set_time(1.1);
        assert!(gate.decide(client).allowed);
        assert!(!gate.decide(client).allowed);
    }

    #[test]
    fn repeated_denial_at_same_instant_is_not_double_counted() {
        let clock = TestClock::new(0.0);
        let gate = gate(1, Duration::from_secs(1), &clock);
        let client = "client1";

        assert!(gate.decide(client).allowed);
        clock.set_time(0.5);
        assert!(!gate.decide(client).allowed);
        assert!(!gate.decide(client).allowed);
        assert_eq!(logged(&gate, client), 1);

        clock.set_time(1.0);
        assert!(gate.decide(client).allowed);
    }

    #[test]
    fn log_holds_at_most_limit_entries() {
        let clock = TestClock::new(0.0);
        let gate = gate(3, Duration::from_secs(2), &clock);
        let client = "client1";

        for step in 0..40 {
            clock.set_time(step as f64 * 0.05);
            gate.decide(client);
            assert!(logged(&gate, client) <= 3);
        }
    }

    #[test]
    fn backward_clock_does_not_expire_entries() {
        let clock = TestClock::new(10.0);
        let gate = gate(1, Duration::from_secs(1), &clock);
        let client = "client1";

        assert!(gate.decide(client).allowed);

        clock.set_time(0.0);
        assert!(!gate.decide(client).allowed);
        clock.set_time(10.5);
        assert!(!gate.decide(client).allowed);
        assert_eq!(logged(&gate, client), 1);

        clock.set_time(11.0);
        assert!(gate.decide(client).allowed);
    }
}
