//! Shell completion generation for search-porter

use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io::Write;

use crate::cli::CliArgs;

/// Binary name used in generated scripts
const BIN_NAME: &str = "search-porter";

/// Write the completion script for `shell` to `out`
///
/// # Arguments
/// * `shell` - Target shell
/// * `out` - Destination, usually stdout
pub fn generate_completion(shell: Shell, out: &mut dyn Write) {
    let mut cmd = CliArgs::command();
    generate(shell, &mut cmd, BIN_NAME, out);
}
