//! Routing warnings to your own sink.
//!
//! This example demonstrates:
//! 1. The default handler, which prints to standard error
//! 2. Installing a closure as the process-wide handler
//! 3. Wrapping the previously installed handler instead of replacing it
//! 4. Restoring the default handler

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use faultstack::{
    SourceLocation,
    warning::{self, LeakedWarningHandler, WarningHandler},
};

/// A handler that keeps every warning in memory, e.g. for display in a UI.
struct Collector {
    warnings: Mutex<Vec<String>>,
}

impl WarningHandler for Collector {
    fn handle(&self, location: &SourceLocation, message: &str) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(format!("{message} [{}:{}]", location.file, location.line));
        }
    }
}

static COLLECTOR: Collector = Collector {
    warnings: Mutex::new(Vec::new()),
};

/// Warnings issued by "library" code.
fn cast_to_f16(values: &[f64]) -> Vec<f32> {
    if values.iter().any(|v| v.abs() > 65504.0) {
        faultstack::warning!("values outside the f16 range will saturate");
    }
    values.iter().map(|&v| v as f32).collect()
}

fn main() {
    println!("=== Custom Warning Handlers ===\n");

    println!("Example 1: Default handler (see standard error)");
    cast_to_f16(&[1.0, 1e6]);
    println!();

    println!("Example 2: Collecting warnings in memory");
    warning::set_warning_handler(|location: &SourceLocation, message: &str| {
        COLLECTOR.handle(location, message);
    });
    cast_to_f16(&[1e9]);
    cast_to_f16(&[-1e9]);
    if let Ok(warnings) = COLLECTOR.warnings.lock() {
        for entry in warnings.iter() {
            println!("  collected: {entry}");
        }
    }
    println!();

    println!("Example 3: Counting, then forwarding to the previous handler");
    static COUNT: AtomicUsize = AtomicUsize::new(0);
    let previous = LeakedWarningHandler::fetch_current();
    warning::set_warning_handler(move |location: &SourceLocation, message: &str| {
        COUNT.fetch_add(1, Ordering::Relaxed);
        match previous {
            Some(previous) => previous.handle(location, message),
            None => warning::print_warning(location, message),
        }
    });
    cast_to_f16(&[1e7, 2e7]);
    println!("  warnings seen: {}", COUNT.load(Ordering::Relaxed));
    println!(
        "  collector now holds {} warning(s)",
        COLLECTOR.warnings.lock().map(|w| w.len()).unwrap_or(0)
    );
    println!();

    println!("Example 4: Back to the default handler");
    warning::reset_warning_handler();
    cast_to_f16(&[1e8]);
}
