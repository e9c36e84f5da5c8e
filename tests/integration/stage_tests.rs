//! Stage state machines driven one cycle at a time.

use embassy_time::{Duration, Instant};
use sensepipe::app::events::{PipelineEvent, SampleRejection};
use sensepipe::app::ports::NullSink;
use sensepipe::config::PipelineConfig;
use sensepipe::error::{ActuatorError, SensorError};
use sensepipe::manual::OverrideLevel;
use sensepipe::pipeline::{Cycle, Pipeline, StageExit};

use crate::mock_hw::{MockActuator, MockSensor, RecordingSink, VirtualClock};

fn pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::default()).unwrap()
}

#[test]
fn startup_sample_drives_first_command() {
    let p = pipeline();
    let clock = VirtualClock::new();
    let act = MockActuator::new();
    let mut sampler = p.sampler(MockSensor::new(&clock).reading(500), clock.clone());
    let mut filter = p.filter();
    let mut actuator = p.actuator(act.clone());
    let mut sink = RecordingSink::new();

    assert_eq!(sampler.run_cycle(&mut sink), Cycle::Continue);
    assert_eq!(filter.run_cycle(&mut sink), Cycle::Continue);
    assert_eq!(actuator.run_cycle(&mut sink), Cycle::Continue);

    // Window is [500, 0 × 9]: both passes see only 500.
    assert_eq!(filter.last().avg1, 500);
    assert_eq!(filter.last().avg2, 500);
    // floor(1000 µs × 500 / 1023) = 488 µs
    assert_eq!(act.last_duty_us(), Some(488));
    assert_eq!(act.calls()[0].period, Duration::from_micros(1000));
    assert_eq!(clock.now_ms(), 1000, "first release is one period after start");

    assert_eq!(
        sink.events(),
        vec![
            PipelineEvent::SamplePublished(500),
            PipelineEvent::Filtered {
                sample: 500,
                avg1: 500,
                avg2: 500
            },
            PipelineEvent::CommandIssued {
                value: 500,
                duty: Duration::from_micros(488),
                period: Duration::from_micros(1000),
                overridden: false,
            },
        ]
    );
}

#[test]
fn mild_outlier_is_trimmed_from_the_average() {
    let p = pipeline();
    let clock = VirtualClock::new();
    let mut readings = vec![100; 9];
    readings.push(120);
    let mut sampler = p.sampler(MockSensor::new(&clock).readings(&readings), clock.clone());
    let mut filter = p.filter();

    for _ in 0..readings.len() {
        sampler.run_cycle(&mut NullSink);
        filter.run_cycle(&mut NullSink);
    }

    // avg1 = 1020 / 10 = 102; band [91.8, 112.2] drops the 120.
    let r = filter.last();
    assert_eq!((r.avg1, r.avg2), (102, 100));
    assert_eq!((r.nonzero, r.kept), (10, 9));
    assert_eq!(p.filtered().latest(), 100);
}

#[test]
fn distant_outlier_empties_the_band() {
    let p = pipeline();
    let mut filter = p.filter();
    for _ in 0..9 {
        filter.process(100);
    }
    // avg1 = 1300 / 10 = 130; band [117, 143] holds neither 100 nor 400.
    let r = filter.process(400);
    assert_eq!(r.avg1, 130);
    assert_eq!(r.kept, 0);
    assert_eq!(r.avg2, 0);
}

#[test]
fn failed_read_publishes_nothing() {
    let p = pipeline();
    let clock = VirtualClock::new();
    let sensor = MockSensor::new(&clock)
        .reading(300)
        .failure(SensorError::AdcReadFailed);
    let mut sampler = p.sampler(sensor, clock.clone());
    let mut filter = p.filter();
    let mut sink = RecordingSink::new();

    sampler.run_cycle(&mut sink);
    filter.run_cycle(&mut sink);
    sampler.run_cycle(&mut sink);

    assert!(!p.samples().is_pending(), "no release after a failed read");
    assert_eq!(p.samples().latest(), 300);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            PipelineEvent::SampleRejected(SampleRejection::ReadFailed(SensorError::AdcReadFailed))
        )),
        1
    );
    // The failed cycle still keeps the cadence.
    assert_eq!(clock.now_ms(), 2000);
}

#[test]
fn over_range_reading_is_rejected() {
    let p = pipeline();
    let clock = VirtualClock::new();
    let mut sampler = p.sampler(MockSensor::new(&clock).readings(&[1023, 1024]), clock.clone());
    let mut sink = RecordingSink::new();

    sampler.run_cycle(&mut sink);
    assert_eq!(p.samples().try_consume(), Some(1023));
    sampler.run_cycle(&mut sink);
    assert!(!p.samples().is_pending());
    assert!(
        sink.events()
            .contains(&PipelineEvent::SampleRejected(SampleRejection::OutOfRange(1024)))
    );
}

#[test]
fn unconsumed_sample_is_overwritten() {
    let p = pipeline();
    let clock = VirtualClock::new();
    let mut sampler = p.sampler(MockSensor::new(&clock).readings(&[200, 700]), clock.clone());
    let mut filter = p.filter();

    sampler.run_cycle(&mut NullSink);
    sampler.run_cycle(&mut NullSink);
    filter.run_cycle(&mut NullSink);

    assert_eq!(filter.window().newest(), 700);
    assert_eq!(filter.last().nonzero, 1, "200 never reached the filter");
    assert!(!p.samples().is_pending(), "permit count never exceeds one");
}

#[test]
fn overrun_skips_sleep_and_keeps_cadence() {
    let p = pipeline();
    let clock = VirtualClock::new();
    let sensor = MockSensor::new(&clock)
        .slow_reading(10, Duration::from_millis(1500))
        .slow_reading(20, Duration::from_millis(1200))
        .reading(30);
    let mut sampler = p.sampler(sensor, clock.clone());
    let mut sink = RecordingSink::new();

    // Release 1000, finished at 1500.
    sampler.run_cycle(&mut sink);
    assert_eq!(sampler.next_release(), Some(Instant::from_millis(2000)));
    // Release 2000, finished at 2700.
    sampler.run_cycle(&mut sink);
    assert_eq!(sampler.next_release(), Some(Instant::from_millis(3000)));
    // Release 3000, finished at 2700: sleeps.
    sampler.run_cycle(&mut sink);

    assert_eq!(clock.sleeps(), vec![Instant::from_millis(3000)]);
    let overruns: Vec<_> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            PipelineEvent::DeadlineOverrun { lateness } => Some(lateness.as_millis()),
            _ => None,
        })
        .collect();
    assert_eq!(overruns, vec![500, 700]);
    assert_eq!(sink.count(|e| matches!(e, PipelineEvent::SamplePublished(_))), 3);
}

#[test]
fn actuator_halts_while_upstream_keeps_running() {
    let p = pipeline();
    let clock = VirtualClock::new();
    let act = MockActuator::new();
    act.set_failing(true);
    let mut sampler = p.sampler(MockSensor::new(&clock).readings(&[400, 410]), clock.clone());
    let mut filter = p.filter();
    let mut actuator = p.actuator(act.clone());
    let mut sink = RecordingSink::new();

    sampler.run_cycle(&mut sink);
    filter.run_cycle(&mut sink);
    assert_eq!(
        actuator.run_cycle(&mut sink),
        Cycle::Exit(StageExit::Halted(ActuatorError::PwmWriteFailed))
    );
    assert!(
        sink.events()
            .contains(&PipelineEvent::ActuatorHalted(ActuatorError::PwmWriteFailed))
    );

    assert_eq!(sampler.run_cycle(&mut sink), Cycle::Continue);
    assert_eq!(filter.run_cycle(&mut sink), Cycle::Continue);
    assert_eq!(p.filtered().try_consume(), Some(405));
    assert!(act.calls().is_empty());
}

#[test]
fn failure_budget_tolerates_isolated_errors() {
    let cfg = PipelineConfig {
        max_consecutive_actuation_failures: 3,
        ..PipelineConfig::default()
    };
    let p = Pipeline::new(cfg).unwrap();
    let act = MockActuator::new();
    let mut actuator = p.actuator(act.clone());
    let mut sink = RecordingSink::new();

    act.set_failing(true);
    for _ in 0..2 {
        p.filtered().publish(100);
        assert_eq!(actuator.run_cycle(&mut sink), Cycle::Continue);
    }
    act.set_failing(false);
    p.filtered().publish(100);
    assert_eq!(actuator.run_cycle(&mut sink), Cycle::Continue);
    assert_eq!(act.calls().len(), 1);

    act.set_failing(true);
    for _ in 0..2 {
        p.filtered().publish(100);
        assert_eq!(actuator.run_cycle(&mut sink), Cycle::Continue);
    }
    p.filtered().publish(100);
    assert_eq!(
        actuator.run_cycle(&mut sink),
        Cycle::Exit(StageExit::Halted(ActuatorError::PwmWriteFailed))
    );
    assert_eq!(
        sink.count(|e| matches!(e, PipelineEvent::ActuationFailed { .. })),
        5
    );
}

#[test]
fn manual_override_replaces_filtered_value() {
    let p = pipeline();
    let act = MockActuator::new();
    let mut actuator = p.actuator(act.clone());
    let mut sink = RecordingSink::new();

    let manual = p.manual_override();
    assert_eq!(manual.press(), OverrideLevel::Off);
    assert_eq!(manual.press(), OverrideLevel::Low);

    p.filtered().publish(1023);
    actuator.run_cycle(&mut sink);
    assert_eq!(act.last_duty_us(), Some(330));
    assert!(matches!(
        sink.events().last(),
        Some(PipelineEvent::CommandIssued {
            overridden: true,
            ..
        })
    ));

    // Mid, Full, then back to Auto.
    for _ in 0..3 {
        manual.press();
    }
    assert_eq!(manual.level(), OverrideLevel::Auto);
    p.filtered().publish(1023);
    actuator.run_cycle(&mut sink);
    assert_eq!(act.last_duty_us(), Some(1000));
}
