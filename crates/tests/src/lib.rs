//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 真实 TransformBuffer + TransformListener 上的有界等待查询
//! - 超时、关闭、诊断信息等行为场景
//! - 配置加载到查询的端到端流程

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert!(contracts::LookupTime::default().is_latest());
    }
}

#[cfg(test)]
mod lookup_tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use bounded_lookup::{AlwaysRunning, BoundedTransformLookup, FailureCause, LookupConfig};
    use contracts::{
        FrameId, LookupTime, ShutdownFlag, StampedTransform, Timestamp, Transform, TransformError,
        TransformStore,
    };
    use tokio::sync::watch;
    use transform_buffer::{TransformBuffer, TransformListener};

    /// Scheduling slack allowed on top of the poll interval
    const SLACK: Duration = Duration::from_millis(100);

    fn config(poll_ms: u64) -> LookupConfig {
        LookupConfig::default().with_poll_interval(Duration::from_millis(poll_ms))
    }

    fn frames() -> (FrameId, FrameId) {
        ("map".into(), "robot".into())
    }

    fn robot_at(ms: u64, x: f64) -> StampedTransform {
        StampedTransform::new(
            Timestamp::from_millis(ms),
            "map",
            "robot",
            Transform::from_translation(x, 0.0, 0.0),
        )
    }

    /// Empty store, 50ms timeout: deadline failure with no data available
    #[tokio::test(start_paused = true)]
    async fn test_scenario_a_timeout_without_data() {
        let buffer = TransformBuffer::default();
        let lookup = BoundedTransformLookup::new(&buffer, &AlwaysRunning).with_config(config(5));
        let (target, source) = frames();
        let timeout = Duration::from_millis(50);

        let outcome = lookup.lookup(&target, &source, LookupTime::Latest, timeout).await;

        let failure = outcome.failure().expect("nothing was published");
        assert_eq!(failure.cause, FailureCause::DeadlineExceeded);
        assert!(failure.elapsed >= timeout, "returned early after {:?}", failure.elapsed);
        assert!(
            failure.elapsed < Duration::from_millis(60),
            "returned late after {:?}",
            failure.elapsed
        );
        assert!(failure.to_string().contains("none available"));
    }

    /// Data delivered after 20ms: success shortly after delivery
    #[tokio::test]
    async fn test_scenario_b_success_after_delivery() {
        let buffer = Arc::new(TransformBuffer::default());
        let (listener, publisher) = TransformListener::new(buffer.clone());
        let listener_handle = tokio::spawn(listener.run());

        let requested = Timestamp::from_millis(1_000);
        let delivery = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publisher.publish(robot_at(900, 0.9));
            publisher.publish(robot_at(1_100, 1.1));
        });

        let lookup = BoundedTransformLookup::new(buffer.as_ref(), &AlwaysRunning).with_config(config(5));
        let (target, source) = frames();

        let started = Instant::now();
        let outcome = lookup
            .lookup(&target, &source, LookupTime::At(requested), Duration::from_millis(100))
            .await;
        let waited = started.elapsed();

        let tf = outcome.into_result().expect("transform was delivered in time");
        assert!(waited >= Duration::from_millis(20), "resolved before delivery: {waited:?}");
        assert!(waited < Duration::from_millis(20) + SLACK, "resolved late: {waited:?}");

        let direct = buffer
            .lookup_transform(&target, &source, LookupTime::At(requested))
            .unwrap();
        assert_eq!(tf, direct);
        assert!((tf.transform.translation[0] - 1.0).abs() < 1e-9);

        delivery.await.unwrap();
        listener_handle.await.unwrap();
    }

    /// Shutdown at 10ms with a 1s timeout: returns without waiting it out
    #[tokio::test]
    async fn test_scenario_c_shutdown_interrupts_wait() {
        let buffer = TransformBuffer::default();
        let (tx, rx) = watch::channel(true);
        let lookup = BoundedTransformLookup::new(&buffer, &rx).with_config(config(5));
        let (target, source) = frames();

        let flip = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send(false).unwrap();
            Instant::now()
        };

        let (outcome, flipped_at) = tokio::join!(
            lookup.lookup(&target, &source, LookupTime::Latest, Duration::from_secs(1)),
            flip
        );
        let returned_at = Instant::now();

        let failure = outcome.failure().expect("shutdown fails the lookup");
        assert_eq!(failure.cause, FailureCause::ProcessShuttingDown);
        assert!(failure.elapsed >= Duration::from_millis(10));
        assert!(returned_at.duration_since(flipped_at) < SLACK);
        assert!(failure.elapsed < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_immediate_success_when_data_present() {
        let buffer = TransformBuffer::default();
        buffer.set_transform(robot_at(1_000, 1.0), "test").unwrap();
        buffer.set_transform(robot_at(2_000, 2.0), "test").unwrap();
        let lookup = BoundedTransformLookup::new(&buffer, &AlwaysRunning);
        let (target, source) = frames();

        let outcome = lookup
            .lookup(&target, &source, LookupTime::At(Timestamp::from_millis(1_500)), Duration::from_secs(1))
            .await;

        let tf = outcome.transform().expect("data is already buffered");
        assert!((tf.transform.translation[0] - 1.5).abs() < 1e-9);
        assert_eq!(tf.parent, "map");
        assert_eq!(tf.child, "robot");
    }

    #[tokio::test]
    async fn test_zero_timeout() {
        let empty = TransformBuffer::default();
        let lookup = BoundedTransformLookup::new(&empty, &AlwaysRunning).with_config(config(5));
        let (target, source) = frames();

        let started = Instant::now();
        let outcome = lookup.lookup(&target, &source, LookupTime::Latest, Duration::ZERO).await;
        assert_eq!(outcome.failure().map(|f| &f.cause), Some(&FailureCause::DeadlineExceeded));
        assert!(started.elapsed() < Duration::from_millis(5) + SLACK);
    }

    #[tokio::test]
    async fn test_zero_timeout_with_buffered_data() {
        let buffer = TransformBuffer::default();
        buffer.set_transform(robot_at(1_000, 1.0), "test").unwrap();
        let lookup = BoundedTransformLookup::new(&buffer, &AlwaysRunning).with_config(config(5));
        let (target, source) = frames();

        for _ in 0..100 {
            let outcome = lookup.lookup(&target, &source, LookupTime::Latest, Duration::ZERO).await;
            assert_eq!(outcome.transform().map(|tf| tf.stamp), Some(Timestamp::from_millis(1_000)));
        }

        let outcome = lookup.lookup_blocking(&target, &source, LookupTime::Latest, Duration::ZERO);
        assert!(outcome.is_success());
    }

    /// Stale request: failure carries the newest time the pair resolves at
    #[tokio::test]
    async fn test_failure_reports_latest_available() {
        let buffer = TransformBuffer::default();
        buffer.set_transform(robot_at(1_000, 1.0), "test").unwrap();
        let lookup = BoundedTransformLookup::new(&buffer, &AlwaysRunning).with_config(config(2));
        let (target, source) = frames();

        let outcome = lookup
            .lookup(&target, &source, LookupTime::At(Timestamp::from_millis(5_000)), Duration::from_millis(20))
            .await;

        let failure = outcome.failure().expect("requested time is in the future");
        assert_eq!(failure.cause, FailureCause::DeadlineExceeded);
        assert_eq!(failure.latest_available, Some(Timestamp::from_millis(1_000)));
        assert!(failure.to_string().contains("latest available at 1.000000000"));
    }

    /// A store that can answer but always faults on fetch
    struct FaultyStore;

    impl TransformStore for FaultyStore {
        fn can_transform(&self, _target: &FrameId, _source: &FrameId, _time: LookupTime) -> bool {
            true
        }

        fn lookup_transform(
            &self,
            target: &FrameId,
            source: &FrameId,
            _time: LookupTime,
        ) -> Result<StampedTransform, TransformError> {
            Err(TransformError::Disconnected {
                target_frame: target.clone(),
                source_frame: source.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_store_faults_become_failures() {
        let lookup = BoundedTransformLookup::new(&FaultyStore, &AlwaysRunning);
        let (target, source) = frames();

        for time in [LookupTime::Latest, LookupTime::At(Timestamp::from_millis(1))] {
            let outcome = lookup.lookup(&target, &source, time, Duration::from_secs(1)).await;
            let failure = outcome.failure().expect("store always faults");
            assert!(matches!(failure.cause, FailureCause::StoreComputationFailed { .. }));
            assert_eq!(failure.latest_available, None);
        }
    }

    #[tokio::test]
    async fn test_loop_in_buffer_never_panics() {
        let buffer = TransformBuffer::default();
        buffer.set_transform(StampedTransform::new(Timestamp::from_millis(1), "a", "b", Transform::identity()), "test").unwrap();
        buffer.set_transform(StampedTransform::new(Timestamp::from_millis(1), "b", "a", Transform::identity()), "test").unwrap();
        let lookup = BoundedTransformLookup::new(&buffer, &AlwaysRunning).with_config(config(1));

        let outcome = lookup
            .lookup(&"a".into(), &"b".into(), LookupTime::Latest, Duration::from_millis(10))
            .await;
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_store() {
        let buffer = Arc::new(TransformBuffer::default());
        let (listener, publisher) = TransformListener::new(buffer.clone());
        let listener_handle = tokio::spawn(listener.run());
        let shutdown = ShutdownFlag::new();
        let lookup = BoundedTransformLookup::new(buffer.as_ref(), &shutdown).with_config(config(2));

        let delivery = async {
            tokio::time::sleep(Duration::from_millis(15)).await;
            publisher.publish_static(StampedTransform::new(
                Timestamp::ZERO,
                "robot",
                "laser",
                Transform::from_translation(0.0, 0.0, 0.5),
            ));
            publisher.publish(robot_at(1_000, 3.0));
        };

        let laser: FrameId = "laser".into();
        let ghost: FrameId = "ghost".into();
        let (target, robot) = frames();
        let (to_laser, to_robot, missing, ()) = tokio::join!(
            lookup.lookup(&target, &laser, LookupTime::Latest, Duration::from_secs(1)),
            lookup.lookup(&target, &robot, LookupTime::Latest, Duration::from_secs(1)),
            lookup.lookup(&target, &ghost, LookupTime::Latest, Duration::from_millis(40)),
            delivery
        );

        let laser_tf = to_laser.into_result().unwrap();
        assert_eq!(laser_tf.transform.translation, [3.0, 0.0, 0.5]);
        assert!(to_robot.is_success());
        assert!(!missing.is_success());

        drop(publisher);
        listener_handle.await.unwrap();
    }

    /// Synchronous caller servicing the delivery queue itself
    #[test]
    fn test_blocking_lookup_pumps_listener() {
        let buffer = Arc::new(TransformBuffer::default());
        let (listener, publisher) = TransformListener::new(buffer.clone());
        publisher.publish(robot_at(1_000, 1.0));

        let (target, source) = frames();
        let plain = BoundedTransformLookup::new(buffer.as_ref(), &AlwaysRunning).with_config(config(1));
        let unpumped = plain.lookup_blocking(&target, &source, LookupTime::Latest, Duration::from_millis(10));
        assert!(!unpumped.is_success());

        let pumped = plain.with_pump(&listener);
        let outcome = pumped.lookup_blocking(&target, &source, LookupTime::Latest, Duration::from_secs(1));
        assert_eq!(outcome.transform().map(|tf| tf.stamp), Some(Timestamp::from_millis(1_000)));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bounded_lookup::{AlwaysRunning, BoundedTransformLookup};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{StampedTransform, Timestamp};
    use observability::LookupMetricsAggregator;
    use transform_buffer::{TransformBuffer, TransformListener};

    /// Config -> buffer -> listener -> lookups -> aggregated summary
    #[tokio::test]
    async fn test_e2e_config_to_lookups() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[lookup]
poll_interval_ms = 2
default_timeout_ms = 200

[buffer]
cache_time_s = 5.0
max_samples = 50

[[static_transforms]]
parent = "base_link"
child = "laser"
translation = [0.2, 0.0, 0.3]

[[static_transforms]]
parent = "map"
child = "base_link"
translation = [1.0, 2.0, 0.0]

[[queries]]
target = "map"
source = "laser"

[[queries]]
target = "laser"
source = "odom"
timeout_ms = 20
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let buffer = Arc::new(TransformBuffer::new(blueprint.buffer));
        let (listener, publisher) = TransformListener::new(buffer.clone());
        let listener_handle = tokio::spawn(listener.run());
        for st in &blueprint.static_transforms {
            publisher.publish_static(StampedTransform::new(
                Timestamp::ZERO,
                st.parent.clone(),
                st.child.clone(),
                st.transform(),
            ));
        }
        drop(publisher);
        listener_handle.await.unwrap();

        let lookup = BoundedTransformLookup::new(buffer.as_ref(), &AlwaysRunning).with_config(blueprint.lookup);
        let mut aggregator = LookupMetricsAggregator::new();
        let mut outcomes = Vec::new();
        for query in &blueprint.queries {
            let timeout = query
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(blueprint.lookup.default_timeout());
            let outcome = lookup
                .lookup(&query.target, &query.source, query.time.resolve(Timestamp::now()), timeout)
                .await;
            aggregator.update(&outcome, Duration::ZERO);
            outcomes.push(outcome);
        }

        let laser = outcomes[0].transform().expect("static chain resolves");
        for (got, want) in laser.transform.translation.iter().zip([1.2, 2.0, 0.3]) {
            assert!((got - want).abs() < 1e-9);
        }
        assert!(!outcomes[1].is_success());

        let summary = aggregator.summary();
        assert_eq!(summary.total_lookups, 2);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.failures.get("deadline_exceeded"), Some(&1));
    }
}
