//! Utils

use clap::Parser;

/// Arguments for the cart demo
#[derive(Debug, Parser)]
pub struct DemoCartArgs {
    /// Fixture set to load products, cart & campaigns from
    #[clap(short, long, default_value = "havok")]
    pub fixture: String,

    /// Directory holding the fixture sets
    #[clap(short, long, default_value = "./fixtures")]
    pub base_path: String,

    /// Log filter, e.g. `info` or `trellis=debug`
    #[clap(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}
