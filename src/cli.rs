use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::fmt::Display;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Set the log level.
    #[arg(short, long, global = true, default_value_t = CommandLogLevel::Warn)]
    pub log_level: CommandLogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum CommandLogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl CommandLogLevel {
    pub fn filter(&self) -> LevelFilter {
        match self {
            CommandLogLevel::Trace => LevelFilter::Trace,
            CommandLogLevel::Debug => LevelFilter::Debug,
            CommandLogLevel::Info => LevelFilter::Info,
            CommandLogLevel::Warn => LevelFilter::Warn,
            CommandLogLevel::Error => LevelFilter::Error,
            CommandLogLevel::Off => LevelFilter::Off,
        }
    }
}

impl Display for CommandLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite the tags of the MP3 files listed in a track info file.
    Convert {
        /// Directory holding the source MP3 files.
        mp3_dir: PathBuf,

        /// The track info file.
        track_info: PathBuf,

        /// Character encoding of the track info file.
        #[arg(short, long, default_value = "shift_jis")]
        encoding: String,
    },

    /// Copy `NN_name.mp3` files to `name.mp3`, dropping the track number.
    Strip {
        /// Directory holding the MP3 files.
        mp3_dir: PathBuf,
    },

    /// List the ID3v2.3 frames of a file.
    Show {
        /// The MP3 file.
        file: PathBuf,
    },
}

#[cfg(test)]
mod test {
    use super::{Cli, CommandLogLevel, Commands};
    use clap::{CommandFactory, Parser, ValueEnum};

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_convert() {
        let cli = Cli::parse_from(["mp3retag", "convert", "orig", "trackInfo.txt", "-l", "info"]);
        match cli.command {
            Commands::Convert {
                mp3_dir,
                track_info,
                encoding,
            } => {
                assert_eq!(mp3_dir.to_string_lossy(), "orig");
                assert_eq!(track_info.to_string_lossy(), "trackInfo.txt");
                assert_eq!(encoding, "shift_jis");
            }
            _ => panic!("expected convert"),
        }
        assert_eq!(cli.log_level.to_string(), "info");
    }

    #[test]
    fn log_level_names_parse_back() {
        for level in CommandLogLevel::value_variants() {
            let name = level.to_string();
            assert_eq!(CommandLogLevel::from_str(&name, false).unwrap().to_string(), name);
        }
        assert_eq!(CommandLogLevel::Warn.to_string(), "warn");
    }
}
