//! Check command implementation

use super::load_config;
use crate::cli::CheckArgs;
use crate::error::convert_guard_error;
use crate::output::OutputFormatter;
use anyhow::Result;
use upguard_core::ArchiveGuard;
use upguard_core::Denylist;
use upguard_core::config::EntryErrorPolicy;
use upguard_core::config::UploadConfig;
use upguard_core::config::UploadRoute;

pub fn execute(args: &CheckArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?.upload;
    apply_overrides(&mut config, args);

    let route = if args.web {
        UploadRoute::Web
    } else {
        UploadRoute::Manage
    };
    if config.denylist(route).is_empty() {
        formatter.format_warning("denylist is empty, every archive will be accepted");
    }

    match ArchiveGuard::new(&config).check_path(&args.file, route) {
        Ok(report) => formatter.format_check_result(&args.file, &report),
        Err(e) => {
            if e.is_client_error() {
                formatter.format_rejection("check", &e);
            }
            Err(convert_guard_error(e, &args.file))
        }
    }
}

fn apply_overrides(config: &mut UploadConfig, args: &CheckArgs) {
    if let Some(denied) = &args.denied {
        let Ok(list) = denied.parse::<Denylist>();
        config.denied = list.clone();
        config.web_denied = Some(list);
    }
    if args.best_effort {
        config.entry_errors = EntryErrorPolicy::BestEffort;
    }
    if let Some(max) = args.max_file_size {
        config.max_file_size = max;
    }
    if let Some(max) = args.max_total_size {
        config.max_total_size = max;
    }
    // keep the single-file limit within the total budget
    config.max_file_size = config.max_file_size.min(config.max_total_size);
}
