//! Integration tests for the emitter, pool and curves.
//!
//! These drive the public API the way a renderer would: configure, tick at a
//! fixed frame rate and read the attribute buffers back.

use std::sync::Arc;

use glam::Vec3;
use sparkfield::{
    ConfigError, EmitterStyle, EngineConfig, Keyframes, Particle, ParticleCurves, ParticleEngine,
    Tween, MAX_PARTICLES, PRESET_NAMES,
};

const FRAME: f32 = 1.0 / 60.0;

fn engine(config: EngineConfig) -> ParticleEngine {
    ParticleEngine::with_seed(config, 1234).unwrap()
}

// ============================================================================
// Tween
// ============================================================================

#[test]
fn test_tween_clamps_outside_keyframes() {
    let tween = Tween::<f32>::new(vec![(1.0, 3.0), (2.0, 7.0), (4.0, -1.0)]).unwrap();

    for t in [-10.0, 0.0, 0.5, 1.0] {
        assert_eq!(tween.lookup(t), Some(3.0), "t = {t}");
    }
    for t in [4.0, 4.5, 100.0] {
        assert_eq!(tween.lookup(t), Some(-1.0), "t = {t}");
    }
}

#[test]
fn test_tween_interpolates() {
    let tween = Tween::<f32>::new(vec![(0.0, 0.0), (10.0, 10.0)]).unwrap();
    assert_eq!(tween.lookup(5.0), Some(5.0));
}

#[test]
fn test_vector_tween_interpolates_componentwise() {
    let tween = Tween::new(vec![(0.0, Vec3::ZERO), (2.0, Vec3::new(2.0, 4.0, 6.0))]).unwrap();
    assert_eq!(tween.lookup(1.0), Some(Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn test_empty_tween_has_no_value() {
    let tween = Tween::<f32>::empty();
    assert_eq!(tween.lookup(0.5), None);
    assert_eq!(tween.sample_or(0.5, 2.0), 2.0);
}

// ============================================================================
// Particle
// ============================================================================

#[test]
fn test_integrator_is_semi_implicit_euler() {
    let mut particle = Particle::new(Arc::new(ParticleCurves::default()), 10.0);
    particle.acceleration = Vec3::new(0.0, -10.0, 0.0);

    particle.advance(1.0);
    assert_eq!(particle.position, Vec3::ZERO);
    assert_eq!(particle.velocity, Vec3::new(0.0, -10.0, 0.0));

    particle.advance(1.0);
    assert_eq!(particle.velocity, Vec3::new(0.0, -20.0, 0.0));
    assert_eq!(particle.position, Vec3::new(0.0, -10.0, 0.0));
}

#[test]
fn test_particle_dies_at_lifetime() {
    let curves = Arc::new(ParticleCurves::default());

    let mut particle = Particle::new(curves.clone(), 1.0);
    particle.advance(0.99);
    assert!(particle.is_alive());

    let mut particle = Particle::new(curves.clone(), 1.0);
    particle.advance(0.5);
    particle.advance(0.5);
    assert!(!particle.is_alive());

    let mut particle = Particle::new(curves, 1.0);
    particle.advance(1.0);
    assert!(!particle.is_alive());
}

#[test]
fn test_negative_dt_is_a_no_op() {
    let mut particle = Particle::new(Arc::new(ParticleCurves::default()), 1.0);
    particle.velocity = Vec3::X;
    particle.advance(-0.5);
    particle.advance(f32::NAN);
    assert_eq!(particle.position, Vec3::ZERO);
    assert_eq!(particle.age(), 0.0);
}

// ============================================================================
// Pool
// ============================================================================

#[test]
fn test_capacity_is_rate_times_shorter_lifetime() {
    let cases = [
        (100.0, 1.0, 60.0, 100),
        (100.0, 5.0, 2.0, 200),
        (10.0, 3.0, 3.0, 30),
        (400.0, 3.0, 60.0, 1200),
        (2.5, 1.0, 10.0, 3),
    ];

    for (pps, particle_death, emitter_death, expected) in cases {
        let config = EngineConfig {
            pps,
            particle_death,
            emitter_death,
            ..Default::default()
        };
        let engine = engine(config);
        assert_eq!(engine.particle_count(), expected, "pps {pps}");
        assert_eq!(engine.buffers().capacity(), expected);
    }
}

#[test]
fn test_visible_never_exceeds_capacity() {
    let config = EngineConfig {
        pps: 50.0,
        particle_death: 2.0,
        vel_spread: Vec3::ONE,
        ..Default::default()
    };
    let mut engine = engine(config);

    // A stalled frame asks for far more than the pool can hold.
    let frames = [FRAME, FRAME, 5.0, FRAME, 0.5, 0.5, 0.5, FRAME];
    for dt in frames.iter().copied().cycle().take(200) {
        engine.tick(dt);
        let visible = engine.buffers().visible_count();
        assert!(visible <= engine.particle_count());
        assert_eq!(visible, engine.live_count());
    }
    assert!(engine.dropped_spawns() > 0);
}

#[test]
fn test_dead_slots_are_hidden() {
    let config = EngineConfig {
        pps: 10.0,
        particle_death: 0.5,
        emitter_death: 0.5,
        ..Default::default()
    };
    let mut engine = engine(config);
    engine.tick(0.25);
    assert!(engine.buffers().visible_count() > 0);

    for _ in 0..10 {
        engine.tick(0.25);
    }
    let buffers = engine.buffers();
    assert_eq!(buffers.visible_count(), 0);
    assert!(buffers.opacity().iter().all(|&o| o == 0.0));
}

#[test]
fn test_dead_slots_are_reused() {
    let config = EngineConfig {
        pps: 20.0,
        particle_death: 0.5,
        ..Default::default()
    };
    let mut engine = engine(config);

    for _ in 0..600 {
        engine.tick(FRAME);
        assert!(engine.live_count() <= 10);
    }
    assert_eq!(engine.particle_count(), 10);
    assert!(engine.total_spawned() >= 150);
}

// ============================================================================
// Emitter
// ============================================================================

#[test]
fn test_emitter_stops_spawning() {
    let config = EngineConfig {
        pps: 10.0,
        particle_death: 100.0,
        emitter_death: 1.0,
        ..Default::default()
    };
    let mut engine = engine(config);

    for _ in 0..4 {
        engine.tick(0.25);
    }
    assert!(!engine.is_firing());
    let spawned = engine.total_spawned();
    assert!(spawned > 0);

    for _ in 0..100 {
        engine.tick(0.25);
    }
    assert_eq!(engine.total_spawned(), spawned);
    // Earlier particles are still around.
    assert_eq!(engine.live_count() as u64, spawned);
    assert_eq!(engine.buffers().visible_count() as u64, spawned);
}

#[test]
fn test_spawn_rate_carries_fractions() {
    let config = EngineConfig {
        pps: 30.0,
        particle_death: 10.0,
        emitter_death: 5.0,
        ..Default::default()
    };
    let mut engine = engine(config);

    // 4 seconds at 60 fps, each frame owes half a particle.
    for _ in 0..240 {
        engine.tick(FRAME);
    }
    let spawned = engine.total_spawned() as i64;
    assert!((spawned - 120).abs() <= 1, "spawned {spawned}");
    assert_eq!(engine.dropped_spawns(), 0);
}

#[test]
fn test_spawn_rate_below_one_per_frame() {
    let config = EngineConfig {
        pps: 7.5,
        particle_death: 10.0,
        emitter_death: 8.0,
        ..Default::default()
    };
    let mut engine = engine(config);

    for _ in 0..240 {
        engine.tick(FRAME);
    }
    let spawned = engine.total_spawned() as i64;
    assert!((spawned - 30).abs() <= 1, "spawned {spawned}");
}

#[test]
fn test_full_pool_keeps_up_with_spawn_rate() {
    // Capacity is exactly pps * particle_death, so every slot is needed.
    let mut engine = engine(EngineConfig::default());
    assert_eq!(engine.particle_count(), 100);

    for _ in 0..600 {
        engine.tick(FRAME);
    }
    let spawned = engine.total_spawned() as i64;
    assert!((spawned - 1000).abs() <= 1, "spawned {spawned}");
    assert_eq!(engine.dropped_spawns(), 0);
}

#[test]
fn test_full_pool_keeps_up_at_high_frame_rate() {
    let mut engine = engine(EngineConfig::fireball());
    assert_eq!(engine.particle_count(), 600);

    for _ in 0..1440 {
        engine.tick(1.0 / 144.0);
    }
    let spawned = engine.total_spawned() as i64;
    assert!((spawned - 6000).abs() <= 1, "spawned {spawned}");
    assert_eq!(engine.dropped_spawns(), 0);
}

#[test]
fn test_every_due_spawn_is_spawned_or_dropped() {
    let config = EngineConfig {
        pps: 100.0,
        particle_death: 10.0,
        emitter_death: 60.0,
        ..Default::default()
    };
    let mut engine = engine(config);
    assert_eq!(engine.particle_count(), 1000);

    // 500 land, then 800 are due with only 500 free slots.
    engine.tick(5.0);
    assert_eq!(engine.total_spawned(), 500);
    engine.tick(8.0);

    // The first 500 aged out at the end of that frame.
    assert_eq!(engine.live_count(), 500);
    assert_eq!(engine.total_spawned(), 1000);
    assert_eq!(engine.dropped_spawns(), 300);
    assert_eq!(engine.total_spawned() + engine.dropped_spawns(), 1300);
}

#[test]
fn test_restart_rearms_emitter() {
    let config = EngineConfig {
        pps: 10.0,
        particle_death: 5.0,
        emitter_death: 0.5,
        ..Default::default()
    };
    let mut engine = engine(config);
    for _ in 0..4 {
        engine.tick(0.25);
    }
    assert!(!engine.is_firing());

    engine.restart();
    assert!(engine.is_firing());
    assert_eq!(engine.live_count(), 0);
    assert_eq!(engine.emitter_age(), 0.0);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_configure_rejects_without_side_effects() {
    let mut engine = engine(EngineConfig::fountain());
    for _ in 0..30 {
        engine.tick(FRAME);
    }
    let live = engine.live_count();
    let age = engine.emitter_age();

    let bad = [
        EngineConfig {
            pps: 0.0,
            ..Default::default()
        },
        EngineConfig {
            particle_death: f32::NAN,
            ..Default::default()
        },
        EngineConfig {
            size_tween: Keyframes {
                times: vec![0.0, 1.0],
                values: vec![1.0],
            },
            ..Default::default()
        },
        EngineConfig {
            opacity_tween: Keyframes::from_pairs(&[(1.0, 1.0), (0.5, 0.0)]),
            ..Default::default()
        },
        EngineConfig {
            pps: 1.0e7,
            particle_death: 10.0,
            ..Default::default()
        },
    ];

    for config in bad {
        assert!(engine.configure(config).is_err());
        assert_eq!(engine.config(), &EngineConfig::fountain());
        assert_eq!(engine.live_count(), live);
        assert_eq!(engine.emitter_age(), age);
    }
}

#[test]
fn test_capacity_limit_error() {
    let config = EngineConfig {
        pps: MAX_PARTICLES as f32,
        particle_death: 2.0,
        ..Default::default()
    };
    match ParticleEngine::new(config) {
        Err(ConfigError::CapacityTooLarge { max, .. }) => assert_eq!(max, MAX_PARTICLES),
        other => panic!("expected CapacityTooLarge, got {other:?}"),
    }
}

#[test]
fn test_configure_resizes_pool() {
    let mut engine = engine(EngineConfig::default());
    assert_eq!(engine.particle_count(), 100);

    engine
        .configure(EngineConfig {
            pps: 25.0,
            particle_death: 2.0,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(engine.particle_count(), 50);
    assert_eq!(engine.buffers().capacity(), 50);
    assert!(engine.buffers().is_dirty());
}

#[test]
fn test_every_preset_runs() {
    for name in PRESET_NAMES {
        let config = EngineConfig::preset(name).unwrap();
        let mut engine = engine(config);
        for _ in 0..120 {
            engine.tick(FRAME);
        }
        assert!(engine.live_count() > 0, "{name}");
        assert!(engine.live_count() <= engine.particle_count());
    }
}

#[test]
fn test_sphere_positions_stay_in_radius() {
    let config = EngineConfig {
        pos_style: EmitterStyle::Sphere,
        pos_base: Vec3::new(1.0, 2.0, 3.0),
        pos_radius: 0.5,
        pps: 1000.0,
        ..Default::default()
    };
    let mut engine = engine(config);
    for _ in 0..200 {
        let p = engine.spawn();
        assert!(p.position.distance(Vec3::new(1.0, 2.0, 3.0)) <= 0.5 + 1e-5);
    }
}

#[test]
fn test_json_file_round_trip() {
    let path = std::env::temp_dir().join(format!("sparkfield-{}.json", std::process::id()));
    let config = EngineConfig::smoke();
    std::fs::write(&path, config.to_json().unwrap()).unwrap();

    let loaded = EngineConfig::from_json_file(&path);
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded.unwrap(), config);
}

#[test]
fn test_missing_json_file_is_io_error() {
    let err = EngineConfig::from_json_file("no/such/sparkfield.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

// ============================================================================
// Curves through the engine
// ============================================================================

#[test]
fn test_opacity_curve_drives_buffers() {
    let config = EngineConfig {
        pps: 1.0,
        particle_death: 4.0,
        emitter_death: 2.0,
        opacity_tween: Keyframes::from_pairs(&[(0.0, 1.0), (4.0, 0.0)]),
        ..Default::default()
    };
    let mut engine = engine(config);

    // One particle, spawned and advanced on the first tick; the emitter stops on the second.
    engine.tick(1.0);
    engine.tick(1.0);
    assert_eq!(engine.live_count(), 1);
    let opacity = engine.buffers().opacity()[0];
    assert!((opacity - 0.5).abs() < 1e-5, "opacity {opacity}");
}

#[test]
fn test_color_curve_is_hsl() {
    let config = EngineConfig {
        pps: 1.0,
        particle_death: 4.0,
        emitter_death: 2.0,
        col_tween: Keyframes::from_pairs(&[
            (0.0, Vec3::new(0.0, 1.0, 0.5)),
            (2.0, Vec3::new(1.0 / 3.0, 1.0, 0.5)),
        ]),
        ..Default::default()
    };
    let mut engine = engine(config);

    engine.tick(1.0);
    engine.tick(1.0);
    // Age 2: pure green.
    let [r, g, b] = engine.buffers().color()[0];
    assert!(r.abs() < 1e-5 && (g - 1.0).abs() < 1e-5 && b.abs() < 1e-5);
}
