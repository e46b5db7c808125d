//! CLI output formatting.
//!
//! Human-readable by default; `--json` switches every handler to a single
//! JSON document on stdout.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

static JSON: AtomicBool = AtomicBool::new(false);

pub fn set_json(json: bool) {
    JSON.store(json, Ordering::Relaxed);
}

#[must_use]
pub fn is_json() -> bool {
    JSON.load(Ordering::Relaxed)
}

pub fn section(title: &str) {
    if !is_json() {
        println!("{title}");
    }
}

pub fn field(label: &str, value: impl Display) {
    if !is_json() {
        println!("  {label:<20} {value}");
    }
}

pub fn success(message: &str) {
    if !is_json() {
        println!("ok: {message}");
    }
}

pub fn error(message: &str) {
    if !is_json() {
        eprintln!("error: {message}");
    }
}

pub fn json_output(value: serde_json::Value) {
    println!("{value}");
}
