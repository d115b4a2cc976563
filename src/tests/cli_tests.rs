//! Command line parsing.

use crate::Options;
use std::path::PathBuf;

fn parse(args: &[&str]) -> anyhow::Result<Options> {
    Options::parse(args.iter().map(|s| s.to_string()))
}

#[test]
fn no_arguments_gives_defaults() {
    assert_eq!(parse(&[]).unwrap(), Options::default());
}

#[test]
fn all_switches_are_recognised() {
    let options = parse(&["--json", "--once", "--dim", "--24h", "--config", "face.toml"]).unwrap();
    assert!(options.json && options.once && options.dim && options.force_24_hour);
    assert_eq!(options.config_path, Some(PathBuf::from("face.toml")));
}

#[test]
fn config_without_path_is_an_error() {
    assert!(parse(&["--config"]).is_err());
}

#[test]
fn unknown_argument_is_an_error() {
    let err = parse(&["--stdout"]).unwrap_err();
    assert!(err.to_string().contains("--stdout"));
}
