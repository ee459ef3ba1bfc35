//! Cart Demo
//!
//! Loads a fixture set, runs its campaigns against its cart and prints the resulting lines.
//!
//! Use `-f` to load a fixture set by name
//! Use `-b` to point at a different fixtures directory
//! Use `-l` (or `RUST_LOG`) to change the log filter, e.g. `-l trellis=debug`

use std::io::{self, Write};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use trellis::{fixtures::Fixture, utils::DemoCartArgs};

/// Cart Demo
pub fn main() -> Result<()> {
    let args = DemoCartArgs::parse();

    tracing_subscriber::fmt()
        .compact()
        .with_target(true)
        .with_env_filter(EnvFilter::new(&args.log_level))
        .with_writer(io::stderr)
        .init();

    let fixture = Fixture::from_set_at(&args.base_path, &args.fixture)?;
    let mut cart = fixture.cart()?;

    fixture.runner().run(&mut cart)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for line in cart.line_items() {
        let product = line.variant().product();

        write!(
            handle,
            "{:>3} x {} {} ({})  {} -> {}",
            line.quantity(),
            product.vendor(),
            product.product_type(),
            line.variant().id(),
            line.original_line_price(),
            line.line_price(),
        )?;

        for adjustment in line.adjustments() {
            write!(handle, "  [{}]", adjustment.message)?;
        }

        writeln!(handle)?;
    }

    writeln!(
        handle,
        "\nSubtotal: {} (was {})",
        cart.subtotal()?,
        cart.original_subtotal()?
    )?;

    Ok(())
}
