// tests/admission/cleanup_tests.rs

#[cfg(test)]
mod tests {
    use crate::TestClock;
    use admission_gate::{AdmissionConfig, AdmissionGate};
    use std::thread;
    use std::time::{Duration, Instant};

    fn config(idle_secs: u64) -> AdmissionConfig {
        AdmissionConfig::token_bucket(1, 1).idle_threshold(Duration::from_secs(idle_secs))
    }

    #[test]
    fn cleanup_removes_stale_clients() {
        let clock = TestClock::new(0.0);
        let gate = AdmissionGate::with_config(config(5), clock.clone()).unwrap();

        // Add some clients at different times
        assert!(gate.decide("client1").allowed); // last access t=0
        clock.set_time(5.0);
        assert!(gate.decide("client2").allowed); // last access t=5
        clock.set_time(10.0);
        assert!(gate.decide("client3").allowed); // last access t=10
        assert_eq!(gate.tracked_clients(), 3);

        // At t=12 only client1 (12s) and client2 (7s) are idle beyond 5s
        clock.set_time(12.0);
        assert_eq!(gate.sweep_idle(), 2);
        assert_eq!(gate.tracked_clients(), 1);
        assert!(!gate.store().contains("client1"));
        assert!(!gate.store().contains("client2"));
        assert!(gate.store().contains("client3"));
    }

    #[test]
    fn denied_requests_keep_a_client_alive() {
        let clock = TestClock::new(0.0);
        // a 60s window cannot free a slot before the second call
        let config = AdmissionConfig::fixed_window(1, Duration::from_secs(60))
            .idle_threshold(Duration::from_secs(5));
        let gate = AdmissionGate::with_config(config, clock.clone()).unwrap();

        assert!(gate.decide("client1").allowed);
        clock.set_time(4.5);
        assert!(!gate.decide("client1").allowed);

        clock.set_time(9.0);
        assert_eq!(gate.sweep_idle(), 0);
        assert!(gate.store().contains("client1"));
    }

    #[test]
    fn cleanup_handles_empty_state() {
        let gate = AdmissionGate::with_config(config(1), TestClock::new(0.0)).unwrap();

        // Cleanup on empty state should not panic
        assert_eq!(gate.sweep_idle(), 0);
        assert_eq!(gate.tracked_clients(), 0);
    }

    #[test]
    fn evicted_client_starts_over() {
        let clock = TestClock::new(0.0);
        let gate = AdmissionGate::with_config(config(5), clock.clone()).unwrap();

        assert!(gate.decide("client1").allowed);
        assert!(!gate.decide("client1").allowed);

        clock.set_time(0.5);
        gate.store().remove("client1");
        assert!(gate.decide("client1").allowed);
    }

    #[test]
    fn background_reaper_sweeps_and_stops() {
        crate::init_tracing();
        let clock = TestClock::new(0.0);
        let config = AdmissionConfig::token_bucket(1, 1)
            .cleanup_interval(Duration::from_millis(10))
            .idle_threshold(Duration::from_secs(5));
        let gate = AdmissionGate::with_config(config, clock.clone()).unwrap();

        gate.decide("stale");
        clock.set_time(4.0);
        gate.decide("fresh");

        let reaper = gate.start_reaper().unwrap();
        clock.set_time(6.0);

        let deadline = Instant::now() + Duration::from_secs(5);
        while gate.store().contains("stale") && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!gate.store().contains("stale"));
        assert!(gate.store().contains("fresh"));

        reaper.stop();

        // With the reaper gone nothing is evicted any more
        clock.set_time(100.0);
        thread::sleep(Duration::from_millis(50));
        assert!(gate.store().contains("fresh"));
    }
}
