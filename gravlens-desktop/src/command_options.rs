// Copyright 2020-2022 Kevin Reid under the terms of the MIT License as detailed
// in the accompanying file README.md or <https://opensource.org/licenses/MIT>.

//! Command line option parsing.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "gravlens", version, about = "Black-hole gravitational lensing viewer")]
pub(crate) struct GravlensOptions {
    /// Window size in pixels, as "WIDTHxHEIGHT".
    #[arg(long = "display-size", default_value = "1024x768", value_parser = parse_dimensions)]
    pub(crate) display_size: (u32, u32),

    /// Render quality, 1 to 20. Higher values trace longer photon paths
    /// per frame.
    #[arg(long, short = 'q', default_value_t = 4)]
    pub(crate) quality: u32,

    /// Image file for the accretion disk texture (a built-in procedural
    /// texture is used if omitted).
    #[arg(long)]
    pub(crate) disk_texture: Option<PathBuf>,

    /// Image file for the sky sphere texture (a built-in star field is
    /// used if omitted).
    #[arg(long)]
    pub(crate) sky_texture: Option<PathBuf>,

    /// File the S key writes PNG captures to.
    #[arg(long, default_value = "gravlens-capture.png")]
    pub(crate) capture_path: PathBuf,

    /// Additional logging detail (may be repeated).
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,
}

pub(crate) fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let mut parts = value.splitn(2, &['x', 'X', '×', ','][..]);
    let width = parts.next().unwrap_or("");
    let height = parts
        .next()
        .ok_or_else(|| String::from("dimensions must be written as WIDTHxHEIGHT"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .map_err(|_| format!("{s:?} is not a valid dimension"))
    };
    Ok((parse(width)?, parse(height)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn verify_command() {
        GravlensOptions::command().debug_assert();
    }

    #[test]
    fn dimensions_good() {
        assert_eq!(parse_dimensions("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_dimensions("256,256"), Ok((256, 256)));
        assert_eq!(parse_dimensions(" 100 x 200 "), Ok((100, 200)));
    }

    #[test]
    fn dimensions_bad() {
        assert!(parse_dimensions("1280").is_err());
        assert!(parse_dimensions("axb").is_err());
        assert!(parse_dimensions("-1x5").is_err());
        assert!(parse_dimensions("").is_err());
    }
}
