use imagelab::sound::{LogFeed, PlaybackEngine, Reveal};
use imagelab::{load_config, ImageLab, SonifyConfig};
use std::env;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process;

const USAGE: &str = "Usage: imagelab <image> [--config FILE] [--trim COLSxROWS] [--gray] \
[--midi OUT.mid] [--xml OUT.musicxml] [--dump] [--save OUT.png] [--play]";

#[derive(Debug, Default)]
struct Options {
    input: String,
    config: Option<String>,
    trim: Option<(usize, usize)>,
    gray: bool,
    midi: Option<String>,
    xml: Option<String>,
    dump: bool,
    save: Option<String>,
    play: bool,
}

fn parse_trim(value: &str) -> Option<(usize, usize)> {
    let (columns, rows) = value.split_once('x')?;
    Some((columns.trim().parse().ok()?, rows.trim().parse().ok()?))
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut input = None;
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", flag))
        };
        match arg.as_str() {
            "--config" => options.config = Some(value("--config")?),
            "--trim" => {
                let raw = value("--trim")?;
                let trim = parse_trim(&raw)
                    .ok_or_else(|| format!("Invalid trim '{}', expected COLSxROWS", raw))?;
                options.trim = Some(trim);
            }
            "--gray" => options.gray = true,
            "--midi" => options.midi = Some(value("--midi")?),
            "--xml" => options.xml = Some(value("--xml")?),
            "--dump" => options.dump = true,
            "--save" => options.save = Some(value("--save")?),
            "--play" => options.play = true,
            flag if flag.starts_with("--") => return Err(format!("Unknown option '{}'", flag)),
            path => {
                if input.replace(path.to_string()).is_some() {
                    return Err("Only one input image is accepted".to_string());
                }
            }
        }
    }

    options.input = input.ok_or_else(|| "Missing input image".to_string())?;
    Ok(options)
}

fn run(options: &Options) -> Result<(), Box<dyn Error>> {
    let mut config = match &options.config {
        Some(path) => load_config(Path::new(path))?,
        None => SonifyConfig::default(),
    };
    if let Some((columns, rows)) = options.trim {
        config.trim_columns = columns;
        config.trim_rows = rows;
    }

    let mut lab = ImageLab::new(config.clone());
    let mut id = lab.open(&options.input)?;
    if options.gray {
        id = lab.grayscale(id)?;
    }

    if let Some(path) = &options.save {
        lab.save(id, path)?;
        eprintln!("Wrote image to {}", path);
    }

    let tune = lab.sonify(id)?;
    eprintln!("Sonified {} into {} chords", options.input, tune.chord_count());

    if options.dump {
        println!("{}", serde_yaml::to_string(&tune)?);
    }

    if let Some(path) = &options.midi {
        fs::write(path, imagelab::render_midi(&tune, &config)?)?;
        eprintln!("Wrote MIDI to {}", path);
    }

    if let Some(path) = &options.xml {
        let title = Path::new(&options.input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| options.input.clone());
        let xml = imagelab::export_musicxml(&tune, &title, &config);
        fs::write(path, xml)?;
        eprintln!("Wrote MusicXML to {}", path);
    }

    if options.play {
        let raster = lab.get(id)?.clone();
        let mut reveal = Reveal::new(raster, LogFeed);
        let report = PlaybackEngine::silent(&config).run(&tune, Some(&mut reveal));
        if let Some(reason) = report.degraded {
            eprintln!("Played {} chords silently: {}", report.chords_played, reason);
        }
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = run(&options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
