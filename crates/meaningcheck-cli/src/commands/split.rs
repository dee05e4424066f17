//! The `meaningcheck split` command.

use anyhow::Result;

use meaningcheck_core::meaning::split_meanings;

pub fn execute(meaning: &str) -> Result<()> {
    let meanings = split_meanings(meaning);
    anyhow::ensure!(!meanings.is_empty(), "no matchable meaning in '{meaning}'");
    for m in &meanings {
        println!("{m}");
    }
    Ok(())
}
