//! Validates parsed config entries before they reach the registry (§7 item 1,
//! §10.3). Bad entries are logged and skipped, never fatal; warnings flag
//! legal-but-risky configuration.

use crate::models::settings::{Settings, SourceEntry};
use log::{info, warn};

/// Accumulated warnings from validating a config file. Errors that cause an
/// entry to be skipped are logged directly by the registry at construction
/// time (§4.4); this collector is for non-fatal advice only.
#[derive(Debug, Clone, Default)]
pub struct ValidationWarnings {
    pub messages: Vec<String>,
}

impl ValidationWarnings {
    pub fn push(&mut self, message: String) {
        self.messages.push(message);
    }
}

/// Performs advisory checks over every source entry in a parsed config file
/// and logs the result. Does not reject entries — identifier validity and
/// conflict detection happen in [`crate::registry::Registry::from_config`];
/// this pass only flags configuration that is legal but likely a mistake.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> ValidationWarnings {
        let mut warnings = ValidationWarnings::default();

        if settings.sources.is_empty() {
            warnings.push("config has no source entries; the gateway will reject every call".to_string());
        }

        for entry in &settings.sources {
            Self::check_entry(entry, &mut warnings);
        }

        Self::log(&warnings);
        warnings
    }

    fn check_entry(entry: &SourceEntry, warnings: &mut ValidationWarnings) {
        let rate_limit = &entry.rate_limit;

        if rate_limit.interval == 0.0 && !rate_limit.add_random {
            warnings.push(format!(
                "identifier {} has interval=0 and add_random=false: every request will \
                 be released back-to-back, which is legal but likely to hammer the upstream",
                entry.identifier.canonical_key()
            ));
        }

        if rate_limit.interval < 0.0 {
            warnings.push(format!(
                "identifier {} has a negative interval ({}); it will be treated as zero pacing",
                entry.identifier.canonical_key(),
                rate_limit.interval
            ));
        }

        if rate_limit.rpd == 0 {
            warnings.push(format!(
                "identifier {} has RPD=0: every call will be quota-rejected",
                entry.identifier.canonical_key()
            ));
        }
    }

    fn log(warnings: &ValidationWarnings) {
        if warnings.messages.is_empty() {
            info!("config validation passed with no warnings");
            return;
        }
        for message in &warnings.messages {
            warn!("config validation warning: {message}");
        }
    }
}
