use essence_core::composite::SoftwareCompositor;
use essence_core::config::AppConfig;
use essence_lib::app::App;

fn small_config(seed: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.viewport.width = 280.0;
    config.viewport.height = 210.0;
    config.simulation.agents = 6;
    config.simulation.seed = Some(seed);
    config
}

#[test]
fn test_headless_run_is_deterministic() {
    let mut a = App::new(small_config(11)).unwrap();
    let mut b = App::new(small_config(11)).unwrap();
    a.run(120);
    b.run(120);
    assert_eq!(a.field().live(), b.field().live());
    assert_eq!(a.export_state().trail, b.export_state().trail);
}

#[test]
fn test_different_seeds_diverge() {
    let mut a = App::new(small_config(1)).unwrap();
    let mut b = App::new(small_config(2)).unwrap();
    a.run(60);
    b.run(60);
    assert_ne!(a.field().live(), b.field().live());
}

#[test]
fn test_agents_leave_attributed_trails() {
    let mut app = App::new(small_config(3)).unwrap();
    app.run(200);
    let stats = app.field().stats();
    assert!(stats.occupied_cells > 0);
    assert!(stats.distinct_authors >= 2);
    assert!(stats.peak <= 1.0);
    assert!(app
        .field()
        .live()
        .author
        .iter()
        .all(|a| *a <= app.walkers().len() as u32));
}

#[test]
fn test_render_produces_glow() {
    let mut app = App::new(small_config(4)).unwrap();
    app.run(90);
    let mut compositor = SoftwareCompositor::new(280, 210);
    app.render(&mut compositor);
    let frame = compositor.frame_rgba();
    assert!(frame.chunks_exact(4).any(|px| px[3] > 0));
}

#[test]
fn test_render_disabled_draws_nothing() {
    let mut config = small_config(5);
    config.trail.render_enabled = false;
    let mut app = App::new(config).unwrap();
    app.run(30);
    let mut compositor = SoftwareCompositor::new(280, 210);
    app.render(&mut compositor);
    assert_eq!(compositor.frames(), 0);
}

#[test]
fn test_resume_from_export() {
    let mut original = App::new(small_config(8)).unwrap();
    original.run(50);
    let saved = original.export_state();

    let mut resumed = App::new(small_config(8)).unwrap();
    let report = resumed.import_state(&saved.into());
    assert_eq!(report.rejected_count(), 0);
    assert_eq!(resumed.current_tick(), 50);
    resumed.run(10);
    assert_eq!(resumed.current_tick(), 60);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = small_config(1);
    config.trail.cell_size = 0.5;
    assert!(App::new(config).is_err());
}
