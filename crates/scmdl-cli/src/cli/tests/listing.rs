//! Tests for urls, download, verify and tools.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_urls_keeps_remixes_by_default() {
    match parse(&["scmdl", "urls"]) {
        CliCommand::Urls { exclude_remixes } => assert!(!exclude_remixes),
        _ => panic!("expected Urls"),
    }
}

#[test]
fn cli_parse_urls_exclude_remixes() {
    match parse(&["scmdl", "urls", "--exclude-remixes"]) {
        CliCommand::Urls { exclude_remixes } => assert!(exclude_remixes),
        _ => panic!("expected Urls without remixes"),
    }
}

#[test]
fn cli_urls_has_no_include_flag() {
    assert!(Cli::try_parse_from(["scmdl", "urls", "--include-remixes"]).is_err());
}

#[test]
fn cli_parse_download_defaults() {
    match parse(&["scmdl", "download"]) {
        CliCommand::Download {
            workers,
            yes,
            include_remixes,
        } => {
            assert!(workers.is_none());
            assert!(!yes);
            assert!(!include_remixes);
        }
        _ => panic!("expected Download"),
    }
}

#[test]
fn cli_parse_download_flags() {
    match parse(&["scmdl", "download", "-y", "--workers", "3"]) {
        CliCommand::Download { workers, yes, .. } => {
            assert_eq!(workers, Some(3));
            assert!(yes);
        }
        _ => panic!("expected Download with flags"),
    }
}

#[test]
fn cli_parse_verify() {
    match parse(&["scmdl", "verify", "--expected", "267"]) {
        CliCommand::Verify {
            expected,
            include_remixes,
        } => {
            assert_eq!(expected, Some(267));
            assert!(!include_remixes);
        }
        _ => panic!("expected Verify"),
    }
}

#[test]
fn cli_parse_tools() {
    assert!(matches!(parse(&["scmdl", "tools"]), CliCommand::Tools));
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["scmdl", "status"]).is_err());
}

#[test]
fn cli_rejects_non_numeric_workers() {
    assert!(Cli::try_parse_from(["scmdl", "download", "--workers", "many"]).is_err());
}
