//! violin-acoustics - predict violin body modes from geometry and materials,
//! plot the body response and hear it through a bowed-string synthesizer.

mod cli;

use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{debug, error, info, Level};

use violin_acoustics::audio::{BlockAnalyzer, Synthesizer};
use violin_acoustics::error::AudioError;
use violin_acoustics::modal::{AcousticModel, Mode};
use violin_acoustics::params::SpectrumRange;
use violin_acoustics::reference::ReferenceSpectrum;
use violin_acoustics::spectrum::SpectrumCalculator;

use cli::Args;

/// How often the pitch readout refreshes while playing
const PLAY_POLL_INTERVAL: Duration = Duration::from_millis(250);

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(err) = run(&args) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), AudioError> {
    let mut model = AcousticModel::default();
    model.set_material(args.material())?;
    let features = model.features();
    debug!(
        area = features.area,
        depth = features.depth,
        waist = features.width_reference,
        "Geometry features"
    );
    let modes = model.predict();

    let reference = Arc::new(match &args.reference {
        Some(path) => ReferenceSpectrum::load(path),
        None => ReferenceSpectrum::missing(),
    });

    let config = args.synth_config();
    let show_modes = args.modes || !(args.spectrum || args.play.is_some() || args.record.is_some());

    if show_modes {
        print_modes(&modes);
    }

    if args.spectrum {
        let calculator = SpectrumCalculator::new(Arc::clone(&reference));
        let curve = calculator.compute(
            &modes,
            &SpectrumRange::default(),
            config.response_mode,
            config.noise_level,
            config.smoothing_level,
        )?;
        println!("# frequency_hz\tlevel_db ({})", config.response_mode.name());
        for (f, db) in curve {
            println!("{f:.1}\t{db:.2}");
        }
    }

    if args.play.is_none() && args.record.is_none() {
        return Ok(());
    }

    let mut synth = Synthesizer::new(config, modes, reference)?;

    if let Some(recording) = args.create_recording_config() {
        let frames = synth.record(&recording)?;
        println!(
            "Recorded {:.2}s ({} frames) to {}",
            frames as f32 / synth.sample_rate_hz() as f32,
            frames,
            recording.output_path.display()
        );
    }

    if let Some(seconds) = args.play {
        play(&mut synth, seconds)?;
    }

    Ok(())
}

fn print_modes(modes: &[Mode]) {
    println!("{:>4}  {:>10}  {:>9}  {:>7}", "#", "freq (Hz)", "amplitude", "damping");
    for (i, mode) in modes.iter().enumerate() {
        println!(
            "{:>4}  {:>10.1}  {:>9.3}  {:>7.3}",
            i + 1,
            mode.frequency,
            mode.amplitude,
            mode.damping
        );
    }
}

/// Stream in real time, reporting the sounding pitch from published blocks
fn play(synth: &mut Synthesizer, seconds: f32) -> Result<(), AudioError> {
    let mut analyzer = BlockAnalyzer::new(synth.block_size(), synth.sample_rate_hz() as f32);
    let duration = Duration::try_from_secs_f32(seconds.max(0.0)).unwrap_or(Duration::ZERO);

    synth.start()?;
    info!("Playing for {seconds}s");
    let start = Instant::now();
    while start.elapsed() < duration {
        thread::sleep(PLAY_POLL_INTERVAL);
        if let Some(block) = synth.latest_block() {
            if let Some(hz) = analyzer.dominant_frequency(&block) {
                println!("t={:>5.2}s  dominant {:>7.1} Hz", start.elapsed().as_secs_f32(), hz);
            }
        }
        synth.report_faults();
    }
    synth.stop();
    Ok(())
}
