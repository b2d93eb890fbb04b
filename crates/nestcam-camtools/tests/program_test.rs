use nestcam_camtools::{MovePurpose, MoveType, PostProcessor, ToolpathPlanner};
use nestcam_core::{MeasurementSystem, Point};
use nestcam_geometry::{Contour, Part};
use nestcam_settings::Config;
use tempfile::TempDir;

fn plate() -> Part {
    let mut part = Part::new(Contour::polygon(vec![
        Point::new(0.0, 0.0),
        Point::new(150.0, 0.0),
        Point::new(150.0, 100.0),
        Point::new(0.0, 100.0),
    ]));
    part.holes.push(Contour::circle(Point::new(30.0, 50.0), 1.5875));
    part.holes.push(Contour::circle(Point::new(120.0, 50.0), 8.0));
    part
}

#[test]
fn test_hole_matching_tool_plunges_once_per_pass() {
    let config = Config::default();
    let planner = ToolpathPlanner::from_config(&config).unwrap();
    let planned = planner.plan_part("plate", &plate()).unwrap();

    let bore = &planned.toolpaths[0];
    assert_eq!(bore.count(MoveType::Plunge), 4);
    assert_eq!(bore.count(MoveType::ArcCw) + bore.count(MoveType::ArcCcw), 0);
    assert!(bore.moves.iter().all(|m| m.target.xy() == Point::new(30.0, 50.0)));

    let helix = &planned.toolpaths[1];
    assert!(helix.count(MoveType::ArcCcw) > 4);
}

#[test]
fn test_program_structure() {
    let mut config = Config::default();
    config.post.coolant = true;
    let planner = ToolpathPlanner::from_config(&config).unwrap();
    let parts = planner.plan(&[("plate".to_string(), plate())]).parts;
    let output = PostProcessor::new(&config)
        .with_timestamp("2026-01-01 00:00:00 UTC")
        .generate(&parts)
        .unwrap();
    let text = &output.text;

    assert!(text.starts_with("%\n(NESTCAM)\n"));
    assert!(text.contains("(Generated: 2026-01-01 00:00:00 UTC)"));
    assert!(text.contains("G17 G21 G40 G49 G80 G90 G94\nG91.1\nT1 M6\nS18000 M3\nG54\n"));
    assert!(text.contains("M8\n"));
    assert!(text.ends_with("G00 Z25.000\nM5\nM9\nG28 G91 Z0\nG90\nM30\n%\n"));
    assert!(text.contains("(plate hole 1)"));
    assert!(text.contains("(Outside contour)"));
    assert!(text.contains("(Tab)"));

    // Holes are cut before the outline
    let hole = text.find("(plate hole 2)").unwrap();
    let outline = text.find("(plate outline)").unwrap();
    assert!(hole < outline);

    assert!(text.contains("G54\nG00 Z5.000\n"));

    // Between the header and footer retracts, modal motion words are never
    // repeated on consecutive lines
    let body = &text[..text.rfind("G00 Z25.000").unwrap()];
    let mut last = None;
    for line in body.lines().filter(|l| l.starts_with('G')) {
        let word = line.split_whitespace().next().unwrap();
        if matches!(word, "G00" | "G01" | "G02" | "G03") {
            assert_ne!(Some(word), last, "repeated {word}");
            last = Some(word);
        }
    }

    assert!(output.stats.moves > 0);
    assert!(output.stats.cut_length > 2.0 * (150.0 + 100.0) * 4.0);
    assert!(output.stats.estimated_minutes > 0.0);
}

#[test]
fn test_imperial_units() {
    let mut config = Config::default();
    config.post.units = MeasurementSystem::Imperial;
    config.post.decimals = 4;
    config.tabs.enabled = false;
    let planner = ToolpathPlanner::from_config(&config).unwrap();
    let parts = planner.plan(&[("plate".to_string(), plate())]).parts;
    let text = PostProcessor::new(&config).generate(&parts).unwrap().text;
    assert!(text.contains("G17 G20 G40"));
    assert!(text.contains("Z-0.4724"));
    assert!(!text.contains("(Tab)"));
}

#[test]
fn test_save_program() {
    let config = Config::default();
    let planner = ToolpathPlanner::from_config(&config).unwrap();
    let parts = planner.plan(&[("plate".to_string(), plate())]).parts;
    let output = PostProcessor::new(&config).generate(&parts).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plate.nc");
    output.save(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), output.text);
}

#[test]
fn test_inside_contour_has_no_tabs() {
    let mut part = plate();
    part.holes.push(Contour::polygon(vec![
        Point::new(60.0, 30.0),
        Point::new(90.0, 30.0),
        Point::new(90.0, 70.0),
        Point::new(60.0, 70.0),
    ]));
    let planner = ToolpathPlanner::from_config(&Config::default()).unwrap();
    let planned = planner.plan_part("plate", &part).unwrap();
    let pocket = &planned.toolpaths[2];
    assert!(pocket.moves.iter().all(|m| m.purpose != MovePurpose::Tab));
    assert_eq!(pocket.min_z(), Some(-12.0));
}

#[test]
fn test_lead_arcs_enter_from_outside_the_part() {
    let mut config = Config::default();
    config.material.thickness = 6.0;
    config.material.step_down = 3.0;
    config.tabs.enabled = false;
    config.cutting.lead_in_out = true;
    config.cutting.lead_radius = 4.0;
    let planner = ToolpathPlanner::from_config(&config).unwrap();
    let part = Part::new(Contour::polygon(vec![
        Point::new(0.0, 0.0),
        Point::new(50.0, 0.0),
        Point::new(50.0, 50.0),
        Point::new(0.0, 50.0),
    ]));
    let planned = planner.plan_part("square", &part).unwrap();
    let outline = &planned.toolpaths[0];

    let leads_in: Vec<_> = outline
        .moves
        .iter()
        .filter(|m| m.purpose == MovePurpose::LeadIn && m.kind.is_arc())
        .collect();
    let leads_out: Vec<_> = outline
        .moves
        .iter()
        .filter(|m| m.purpose == MovePurpose::LeadOut)
        .collect();
    assert_eq!(leads_in.len(), 2);
    assert_eq!(leads_out.len(), 2);
    // Climb milling runs the outline clockwise with the waste on the left,
    // so both leads turn counter-clockwise
    assert_eq!(outline.count(MoveType::ArcCcw), 4);
    assert_eq!(outline.count(MoveType::ArcCw), 0);
    assert_eq!(outline.count(MoveType::Retract), 2);

    let outside =
        |p: Point| p.x < -1e-6 || p.y < -1e-6 || p.x > 50.0 + 1e-6 || p.y > 50.0 + 1e-6;
    for m in outline.moves.iter().filter(|m| m.kind == MoveType::Plunge) {
        assert!(outside(m.target.xy()));
        let distance = leads_in[0].center.unwrap().distance_to(&m.target.xy());
        assert!((distance - 4.0).abs() < 1e-6);
    }
    for m in &leads_in {
        assert!((m.center.unwrap().distance_to(&m.target.xy()) - 4.0).abs() < 1e-6);
    }

    let text = PostProcessor::new(&config)
        .generate(std::slice::from_ref(&planned))
        .unwrap()
        .text;
    assert!(text.contains("(Lead in)"));
    assert!(text.contains("(Lead out)"));
}
