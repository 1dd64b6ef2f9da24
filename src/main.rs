// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for lineforge.

use clap::Parser;

use lineforge::driver::{self, cli::Cli};

fn main() {
    let cli = Cli::parse();
    std::process::exit(driver::run(&cli));
}
