use nestcam_camtools::{BoringGenerator, CamToolError, PartToolpaths, PostProcessor};
use nestcam_core::{ConfigurationError, Point};
use nestcam_settings::Config;

fn config(tool_diameter: f64, thickness: f64, step_down: f64) -> Config {
    let mut config = Config::default();
    config.tool.diameter = tool_diameter;
    config.material.thickness = thickness;
    config.material.step_down = step_down;
    config.material.plunge_rate = 100.0;
    config.material.feed_rate = 500.0;
    config.material.spindle_speed = 1000;
    config
}

fn post(config: &Config, center: Point, radius: f64) -> String {
    let toolpath = BoringGenerator::from_config(config)
        .unwrap()
        .generate(center, radius, "hole")
        .unwrap();
    let parts = vec![PartToolpaths {
        id: "hole".to_string(),
        toolpaths: vec![toolpath],
    }];
    PostProcessor::new(config).generate(&parts).unwrap().text
}

#[test]
fn test_tool_sized_hole_is_plunged() {
    let config = config(5.0, 10.0, 10.0);
    let gcode = post(&config, Point::new(10.0, 20.0), 2.5);

    assert!(gcode.contains("G01 Z-10.000 F100"));
    assert!(gcode.contains("S1000 M3"));
    assert!(gcode.contains("X10.000 Y20.000"));
    assert!(!gcode.contains("G02"));
    assert!(!gcode.contains("G03"));
}

#[test]
fn test_peck_plunges_each_pass() {
    let mut config = config(5.0, 5.0, 2.0);
    config.boring.peck = true;
    let gcode = post(&config, Point::ORIGIN, 2.5);

    assert!(gcode.contains("G01 Z-2.000 F100"));
    assert!(gcode.contains("G01 Z-4.000"));
    assert!(gcode.contains("G01 Z-5.000"));
    assert_eq!(gcode.matches("G00 Z5.000").count(), 3);
}

#[test]
fn test_helical_boring() {
    let mut config = config(6.0, 5.0, 2.0);
    config.boring.helix_pitch = 2.0;
    let gcode = post(&config, Point::ORIGIN, 5.0);

    // Helix radius = 5 - 3 = 2.0
    assert!(gcode.contains("X2.000 Y0.000 Z5.000") || gcode.contains("X2.000\n"));
    assert!(gcode.contains("G03 X2.000 Y0.000 Z-2.000 I-2.000 J0.000 F500"));
    assert!(gcode.contains("X2.000 Y0.000 Z-4.000 I-2.000 J0.000"));
    assert!(gcode.contains("X2.000 Y0.000 Z-5.000 I-2.000 J0.000"));
    // Cleanup circle at the bottom
    assert!(gcode.contains("X2.000 Y0.000 I-2.000 J0.000\n"));
    // Return to centre
    assert!(gcode.contains("G01 X0.000\n"));
}

#[test]
fn test_hole_smaller_than_tool() {
    let config = config(6.0, 5.0, 2.0);
    let err = BoringGenerator::from_config(&config)
        .unwrap()
        .generate(Point::ORIGIN, 2.9, "hole")
        .unwrap_err();
    match err {
        CamToolError::Configuration(ConfigurationError::HoleSmallerThanTool {
            hole_radius,
            tool_radius,
        }) => {
            assert_eq!(hole_radius, 2.9);
            assert_eq!(tool_radius, 3.0);
        }
        other => panic!("unexpected error: {other}"),
    }
}
