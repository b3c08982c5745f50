//! Log formatting and output with ANSI colors
//!
//! Colorized console output plus a plain-text file mirror. Broken pipes
//! (e.g. piping into `head`) are swallowed instead of panicking.
use std::io::{ stdout, ErrorKind, Write };

use chrono::Local;
use colored::*;

use super::file::write_to_file;
use super::tags::LogTag;

/// Width the tag column is padded to
const TAG_WIDTH: usize = 9;

/// Format and output a log message
pub fn format_and_log(tag: LogTag, log_type: &str, message: &str) {
    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string();

    let console_line = format!(
        "{} [{}] [{}] {}",
        time.dimmed(),
        format_tag(&tag),
        format_log_type(log_type),
        message
    );
    print_stdout_safe(&console_line);

    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    write_to_file(&format!("{} [{}] [{}] {}", timestamp, tag.as_str(), log_type, message));
}

/// Format a tag with its subsystem color
fn format_tag(tag: &LogTag) -> ColoredString {
    let padded = format!("{:<width$}", tag.as_str(), width = TAG_WIDTH);
    match tag {
        LogTag::System => padded.bright_yellow().bold(),
        LogTag::Config => padded.bright_magenta().bold(),
        LogTag::Database => padded.bright_blue().bold(),
        LogTag::Webserver => padded.bright_green().bold(),
        LogTag::Hub => padded.bright_cyan().bold(),
        LogTag::Sync => padded.cyan().bold(),
    }
}

/// Format a level string with its severity color
fn format_log_type(log_type: &str) -> ColoredString {
    match log_type {
        "ERROR" => log_type.red().bold(),
        "WARNING" => log_type.yellow().bold(),
        "DEBUG" => log_type.purple(),
        _ => log_type.normal(),
    }
}

fn print_stdout_safe(line: &str) {
    let mut out = stdout();
    if let Err(e) = writeln!(out, "{}", line) {
        if e.kind() != ErrorKind::BrokenPipe {
            eprintln!("logger: failed to write to stdout: {}", e);
        }
    }
    let _ = out.flush();
}
