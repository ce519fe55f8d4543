//! Basic introduction to faultstack faults.
//!
//! This example demonstrates the fundamental concepts:
//! 1. Raising faults with `fault!()`, `index_fault!()` and `check!()`
//! 2. Annotating a fault with `.append_message()` while it propagates
//! 3. Choosing between the full and the concise rendering
//! 4. Singling out indexing faults at a boundary

use faultstack::prelude::*;

/// Raising: `index_fault!()` records where the fault was detected.
fn lookup(table: &[f32], token: usize) -> Result<f32, Fault> {
    match table.get(token) {
        Some(value) => Ok(*value),
        None => Err(index_fault!(
            "token {token} is out of bounds for a table of size {}",
            table.len()
        )),
    }
}

/// Annotating: each layer adds one line of context.
fn embed(table: &[f32], tokens: &[usize]) -> Result<Vec<f32>, Fault> {
    tokens
        .iter()
        .enumerate()
        .map(|(position, &token)| {
            lookup(table, token).append_message(format!("while embedding position {position}"))
        })
        .collect()
}

/// Checking: `check!()` returns early with a fault naming the condition.
fn scale(values: &mut [f32], factor: f32) -> Result<(), Fault> {
    check!(factor.is_finite(), "scale factor must be finite, got {factor}");
    check!(!values.is_empty());
    values.iter_mut().for_each(|v| *v *= factor);
    Ok(())
}

fn forward(tokens: &[usize]) -> Result<Vec<f32>, Fault> {
    let table = [0.5, 0.25, 0.125];
    let mut embedded = embed(&table, tokens).append_message("while running the forward pass")?;
    scale(&mut embedded, 2.0).append_message("while scaling embeddings")?;
    Ok(embedded)
}

/// Boundary: translate the fault kind into something the caller understands.
fn describe(fault: &Fault) -> &'static str {
    match fault.kind() {
        FaultKind::Index => "bad input (IndexError)",
        FaultKind::Generic => "runtime failure",
    }
}

fn main() {
    println!("=== Basic Fault Handling ===\n");

    println!("Example 1: Successful call");
    println!("{:?}\n", forward(&[0, 2]));

    println!("Example 2: Annotated fault, concise rendering");
    if let Err(fault) = forward(&[1, 7]) {
        println!("[{}]", describe(&fault));
        println!("{:#}\n", fault);
    }

    println!("Example 3: Message stack, one entry per layer");
    if let Err(fault) = forward(&[9]) {
        for (depth, message) in fault.message_stack().iter().enumerate() {
            println!("  {depth}: {message}");
        }
        if let Some(location) = fault.location() {
            println!("  raised in {location}");
        }
    }
    println!();

    println!("Example 4: Default check message");
    if let Err(fault) = forward(&[]) {
        println!("[{}]", describe(&fault));
        println!("{fault}");
    }
}
