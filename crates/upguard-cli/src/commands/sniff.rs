//! Sniff command implementation

use crate::cli::SniffArgs;
use crate::error::add_file_context;
use crate::output::OutputFormatter;
use crate::output::SniffResult;
use anyhow::Result;
use upguard_core::sniff::is_archive;
use upguard_core::sniff::sniff_file;

pub fn execute(args: &SniffArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let results = args
        .files
        .iter()
        .map(|path| {
            let file_type = add_file_context(sniff_file(path), path)?;
            Ok(SniffResult {
                path: path.clone(),
                archive: is_archive(file_type.as_deref()),
                file_type,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    formatter.format_sniff_results(&results)
}
