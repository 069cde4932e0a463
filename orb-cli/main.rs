use std::path::PathBuf;
use std::time::Instant;

use argh::FromArgs;
use orb_cli::{OrbConfig, OrbExtractor, OrbResult, draw_features, load_frame};

/// Detect, describe and optionally match ORB features.
#[derive(FromArgs)]
struct Args {
    /// image to detect features in
    #[argh(positional)]
    input: PathBuf,

    /// second image whose features are matched against the first one
    #[argh(positional)]
    second: Option<PathBuf>,

    /// FAST or Harris threshold
    #[argh(option, short = 't', default = "20")]
    threshold: u8,

    /// number of pyramid layers
    #[argh(option, short = 'l', default = "3")]
    layers: usize,

    /// use Harris corners instead of FAST
    #[argh(switch)]
    harris: bool,

    /// score FAST corners precisely
    #[argh(switch)]
    precise: bool,

    /// compute descriptors on three scales
    #[argh(switch)]
    multi_layer: bool,

    /// fraction of differing descriptor bits accepted for a match
    #[argh(option, default = "0.2")]
    match_threshold: f32,

    /// number of worker threads, all cores by default
    #[argh(option, short = 'j')]
    threads: Option<usize>,

    /// write the first image with its features drawn to this path
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    if let Err(err) = run(args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> OrbResult<()> {
    let defaults = OrbConfig::default();
    let config = OrbConfig {
        threshold: args.threshold,
        precise_scoring: args.precise,
        use_harris_features: args.harris,
        pyramid_layers: args.layers,
        use_multi_layers: args.multi_layer,
        match_threshold: args.match_threshold,
        n_threads: args.threads.unwrap_or(defaults.n_threads),
        ..defaults
    };
    let extractor = OrbExtractor::new(config)?;

    let frame = load_frame(&args.input)?;
    log::info!("{}: {}x{}", args.input.display(), frame.width(), frame.height());

    let start = Instant::now();
    let features = extractor.detect_and_describe(&frame.view())?;
    println!("{}: {} features in {:.2?}", args.input.display(), features.len(), start.elapsed());

    if let Some(second) = &args.second {
        let second_frame = load_frame(second)?;

        let start = Instant::now();
        let second_features = extractor.detect_and_describe(&second_frame.view())?;
        println!("{}: {} features in {:.2?}", second.display(), second_features.len(), start.elapsed());

        let start = Instant::now();
        let correspondences = extractor.match_features(&features, &second_features)?;
        println!("{} correspondences in {:.2?}", correspondences.len(), start.elapsed());
    }

    if let Some(output) = &args.output {
        draw_features(&frame.view(), &features)?.save(output)?;
        log::info!("saved features to {}", output.display());
    }

    Ok(())
}
