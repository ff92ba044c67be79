use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: bench-runner [OPTIONS]
  --baseline <path>              Compare against a saved JSON baseline
  --output <path>                Write this run as a JSON baseline
  --regression-threshold <pct>   Allowed slowdown per metric (default: 10)
  --scratch <dir>                Where scene worlds are written (default: temp dir)
  --config <path>                Engine config RON; scenes override radius and world dir
  --materials <path>             Material table RON (default: built-in table)
  --gpu                          Upload faces to wgpu buffers instead of memory";

/// Command line options of `bench-runner`.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub baseline: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub regression_threshold: f64,
    pub scratch: PathBuf,
    pub config: Option<PathBuf>,
    pub materials: Option<PathBuf>,
    pub gpu: bool,
    pub help: bool,
}

impl Options {
    /// Parse arguments, not including the program name.
    pub fn parse<I>(args: I, default_scratch: PathBuf) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Options {
            baseline: None,
            output: None,
            regression_threshold: 10.0,
            scratch: default_scratch,
            config: None,
            materials: None,
            gpu: false,
            help: false,
        };

        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            let mut value = || args.next().ok_or_else(|| format!("missing value for {flag}"));
            match flag.as_str() {
                "--baseline" => options.baseline = Some(value()?.into()),
                "--output" => options.output = Some(value()?.into()),
                "--scratch" => options.scratch = value()?.into(),
                "--config" => options.config = Some(value()?.into()),
                "--materials" => options.materials = Some(value()?.into()),
                "--regression-threshold" => {
                    let raw = value()?;
                    options.regression_threshold = raw
                        .parse()
                        .map_err(|_| format!("invalid --regression-threshold value: {raw}"))?;
                }
                "--gpu" => options.gpu = true,
                "--help" | "-h" => options.help = true,
                other => return Err(format!("unknown argument: {other}")),
            }
        }
        Ok(options)
    }
}
