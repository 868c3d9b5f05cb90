//! User-facing output helpers.
//! Prefixes are coloured only when stdout is a TTY. Result lines printed with
//! [`print_user`] carry no prefix so scripts can parse them.

use owo_colors::OwoColorize;

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {msg}");
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {msg}");
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {msg}");
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {msg}");
    }
}

/// Plain line, no prefix.
pub fn print_user(msg: &str) {
    println!("{msg}");
}

/// `[tag]  text` result line, tag padded so columns line up.
pub fn print_tagged(tag: &str, msg: &str) {
    println!("{:<10} {msg}", format!("[{tag}]"));
}
