//! `-v`/`-q` count flags controlling how chatty the proxy is on stderr.
//!
//! The default level is `Info`, which prints the startup line and warnings.
//! Each `-v` raises the level (`-v` debug, `-vv` trace) and each `-q`
//! lowers it (`-q` warnings only, `-qq` errors only, `-qqq` silence).

use log::LevelFilter;

#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct Verbosity {
    /// Pass many times for more log output
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    verbose: u8,

    /// Pass many times for less log output
    #[arg(
        long,
        short = 'q',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "verbose"
    )]
    quiet: u8,
}

impl Verbosity {
    /// The level filter selected by the flags, anchored at `Info`
    pub(crate) fn log_level_filter(&self) -> LevelFilter {
        match 3_i16 + i16::from(self.verbose) - i16::from(self.quiet) {
            i16::MIN..=0 => LevelFilter::Off,
            1 => LevelFilter::Error,
            2 => LevelFilter::Warn,
            3 => LevelFilter::Info,
            4 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
