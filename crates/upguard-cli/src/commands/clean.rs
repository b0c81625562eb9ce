//! Clean command implementation

use super::load_config;
use crate::cli::CleanArgs;
use crate::error::convert_guard_error;
use crate::output::OutputFormatter;
use anyhow::Result;
use std::path::Path;
use upguard_core::HttpRequest;
use upguard_core::SanitizedRequest;
use upguard_core::SimpleRequest;
use upguard_core::config::SanitizeMode;
use upguard_core::sanitize::Cleaner;

pub fn execute(args: &CleanArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let policy = load_config(args.config.as_deref())?.sanitize;
    if policy.mode == SanitizeMode::PassThrough {
        formatter.format_warning("sanitizer is in pass-through mode, values are not checked");
    }

    let path = args.path.as_str();
    let raw = if args.body {
        SimpleRequest::new("POST", path)
            .with_header("Content-Type", "text/plain")
            .with_body(args.value.clone())
    } else if args.header {
        SimpleRequest::new("GET", path).with_header(args.name.as_str(), args.value.as_str())
    } else {
        SimpleRequest::new("POST", path).with_parameter(args.name.as_str(), args.value.as_str())
    };
    let cleaner = Cleaner::new(&policy);
    let request = SanitizedRequest::new(&raw, &cleaner);

    let result = if args.body {
        request
            .body()
            .map(|body| Some(String::from_utf8_lossy(&body).into_owned()))
    } else if args.header {
        request.header(&args.name)
    } else {
        request.parameter(&args.name)
    };

    match result {
        Ok(value) => {
            let bypassed = !args.header && !args.body && policy.is_raw_html(&args.name);
            let value = value.unwrap_or_default();
            formatter.format_clean_result(&args.name, &value, bypassed)
        }
        Err(e) => {
            formatter.format_rejection("clean", &e);
            Err(convert_guard_error(e, Path::new(&args.path)))
        }
    }
}
