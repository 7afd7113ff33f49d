use glam::Vec3;
use pico_args::Arguments;

/// Arguments after the binary name and the demo name.
pub fn demo_args() -> Arguments {
    Arguments::from_vec(std::env::args_os().skip(2).collect())
}

pub fn option_arg<T>(result: Result<Option<T>, pico_args::Error>, help: &str) -> Option<T> {
    match result {
        Ok(o) => o,
        Err(pico_args::Error::Utf8ArgumentParsingFailed { value, cause }) => {
            eprintln!("{}: '{}'\n\n{}", cause, value, help);
            std::process::exit(1);
        }
        Err(pico_args::Error::OptionWithoutAValue(value)) => {
            eprintln!("{} flag needs an argument", value);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{:?}", e);
            std::process::exit(1);
        }
    }
}

/// Exits with the help text on `--help` or on anything left unparsed.
pub fn finish(args: Arguments, help_requested: bool, help: &str) {
    let remaining = args.finish();

    if !remaining.is_empty() {
        eprint!("Unknown arguments:");
        for flag in remaining {
            eprint!(" '{}'", flag.to_string_lossy());
        }
        eprintln!("\n");

        eprintln!("{}", help);
        std::process::exit(1);
    }

    if help_requested {
        eprintln!("{}", help);
        std::process::exit(1);
    }
}

pub fn extract_vec3(value: &str) -> Result<Vec3, &'static str> {
    let mut res = [0.0_f32; 3];
    let split: Vec<_> = value.split(',').enumerate().collect();

    if split.len() != 3 {
        return Err("Directional lights are defined with 3 values");
    }

    for (idx, inner) in split {
        let inner = inner.trim();

        res[idx] = inner.parse().map_err(|_| "Cannot parse direction number")?;
    }
    Ok(Vec3::from(res))
}

/// Reports a fatal error the way `main` would, then exits.
pub fn exit_on_error(result: anyhow::Result<()>) {
    if let Err(e) = result {
        log::error!("{e:#}");
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
