//! Integration test: a rig started from a TOML file.

use super::start_rig;
use gimbal_common::config::load_rig_config;
use gimbal_common::hal::types::Axis;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const RIG_TOML: &str = r#"
[shared]
service_name = "gimbal-file-test"
log_level = "debug"

[motion]
step_size_px = 4
frequency_hz = 20000

[hardware]
driver = "simulation"

[circle]
radius_px = 16
points = 8
delay_us = 500
"#;

#[test]
fn circle_from_file_config() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(RIG_TOML.as_bytes()).unwrap();
    let config = load_rig_config(file.path()).unwrap();
    assert_eq!(config.motion.step_size_px, 4);

    let mut sim = start_rig(&config);
    let commander = sim.rig.commander();
    commander.set_absolute_position(0, 0).unwrap();
    let sent = commander
        .trace_circle(
            config.circle.radius_px,
            config.circle.points,
            Duration::from_micros(config.circle.delay_us as u64),
        )
        .unwrap();
    assert_eq!(sent, 8);

    sim.rig.context().flush();
    sim.rig.join().unwrap();

    // First point: 16 px along X from the origin at 4 px per step.
    let first = sim.steps.commands(Axis::X)[0];
    assert_eq!(first.step_count, 4);
    assert_eq!(sim.steps.targets(Axis::Y).len(), 8);
}
