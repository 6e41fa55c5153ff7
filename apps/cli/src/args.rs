//! Command-line argument parsing.

use std::path::PathBuf;

use anyhow::{Context, bail};

pub const USAGE: &str = "\
Usage:
  vidfuse upload <video> <youtube-url> --thumbnail <image>
  vidfuse info <youtube-url>
  vidfuse health [--watch]
  vidfuse help";

/// A parsed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Upload a personal video and submit it for fusion.
    Upload {
        video: PathBuf,
        youtube_url: String,
        thumbnail: Option<PathBuf>,
    },
    /// Look up a YouTube video's metadata.
    Info { youtube_url: String },
    /// Check backend health once, or keep polling with `watch`.
    Health { watch: bool },
    Help,
}

/// Parses arguments, excluding the program name.
pub fn parse<I>(args: I) -> anyhow::Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "upload" => {
            let mut positional = Vec::new();
            let mut thumbnail = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--thumbnail" | "-t" => {
                        let value = args.next().context("--thumbnail needs a file path")?;
                        thumbnail = Some(PathBuf::from(value));
                    }
                    flag if flag.starts_with('-') => bail!("unknown option for upload: {flag}"),
                    _ => positional.push(arg),
                }
            }
            let [video, youtube_url]: [String; 2] = positional
                .try_into()
                .map_err(|_| anyhow::anyhow!("upload takes <video> <youtube-url>\n\n{USAGE}"))?;
            Ok(Command::Upload {
                video: PathBuf::from(video),
                youtube_url,
                thumbnail,
            })
        }
        "info" => {
            let youtube_url = args
                .next()
                .with_context(|| format!("info takes <youtube-url>\n\n{USAGE}"))?;
            if let Some(extra) = args.next() {
                bail!("unexpected argument: {extra}");
            }
            Ok(Command::Info { youtube_url })
        }
        "health" => {
            let mut watch = false;
            for arg in args {
                match arg.as_str() {
                    "--watch" | "-w" => watch = true,
                    other => bail!("unexpected argument for health: {other}"),
                }
            }
            Ok(Command::Health { watch })
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => bail!("unknown command: {other}\n\n{USAGE}"),
    }
}
