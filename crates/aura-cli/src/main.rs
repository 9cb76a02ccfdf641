//! aura: headless driver for the aura audio engine

mod config;

use std::path::PathBuf;

use anyhow::Context;
use aura_core::{Position, TrackId};
use aura_services::{AudioEngine, OfflineContext, SmartKnobProcessor};
use fundsp::hacker::*;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("aura=debug".parse()?)
            .add_directive("aura_core=debug".parse()?)
            .add_directive("aura_services=debug".parse()?))
        .init();

    let mut path = None;
    let mut write_config = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--write-config" => write_config = true,
            _ => path = Some(PathBuf::from(arg)),
        }
    }
    let path = path.unwrap_or_else(config::config_path);
    let config = config::load_config(&path);
    if write_config {
        config::save_config(&path, &config)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote config to {}", path.display());
    }

    let engine_config = &config.engine;
    let sample_rate = engine_config.sample_rate as f32;
    let processor = SmartKnobProcessor::with_profiles(config.profile_table());
    let mut engine =
        AudioEngine::with_processor(Box::new(OfflineContext::new(sample_rate)), processor);

    engine.subscribe(|state| {
        debug!(
            tracks = state.tracks.len(),
            playback = ?state.transport.playback_state,
            "Engine state changed"
        );
    });
    engine
        .initialize(engine_config.options())
        .context("starting audio context")?;

    let mut track_ids: Vec<TrackId> = Vec::new();
    for track_config in &config.tracks {
        let id = engine.create_track(track_config.options()).id();
        if let Some(value) = track_config.smart_knob {
            engine.set_smart_knob(id, value);
        }
        if track_config.mute {
            engine.set_track_mute(id, true);
        }
        if track_config.solo {
            engine.set_track_solo(id, true);
        }
        track_ids.push(id);
    }

    // One test tone per track, spaced an octave apart
    let mut tones: Vec<_> = track_ids
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            let mut tone = sine_hz(110.0 * (1 << Ord::min(i, 6)) as f32);
            tone.set_sample_rate(sample_rate as f64);
            (id, tone)
        })
        .collect();

    let block = Ord::max(engine_config.block_size, 1);
    let total_frames = (engine_config.render_seconds.max(0.0) * sample_rate as f64) as usize;
    let mut left = vec![0.0f32; block];
    let mut right = vec![0.0f32; block];
    let mut peak = 0.0f32;
    let mut rendered = 0usize;

    engine.play(Some(Position::zero()));
    while rendered < total_frames {
        let frames = Ord::min(block, total_frames - rendered);
        engine.render(
            |id, l, r| {
                let Some((_, tone)) = tones.iter_mut().find(|(t, _)| *t == id) else {
                    return;
                };
                for (sl, sr) in l.iter_mut().zip(r.iter_mut()) {
                    let sample = tone.tick(&Frame::default())[0] * 0.5;
                    *sl = sample;
                    *sr = sample;
                }
            },
            &mut left[..frames],
            &mut right[..frames],
        );
        peak = left[..frames]
            .iter()
            .chain(&right[..frames])
            .fold(peak, |m, s| m.max(s.abs()));
        rendered += frames;
    }
    engine.stop();

    info!(
        "Rendered {} frames across {} tracks, master peak {:.1} dB",
        rendered,
        track_ids.len(),
        amp_db(peak.max(1e-6))
    );

    println!("{}", serde_json::to_string_pretty(&engine.get_state())?);
    engine.dispose();
    Ok(())
}
