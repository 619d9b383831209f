//! Default [`ErrorReporter`]: forwards reports to the tracing pipeline.

use tracing::error;

use crate::domain::ports::{ErrorReport, ErrorReporter};
use crate::logging;

/// Emits one `error_report` event per report on the `root` logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, report: &ErrorReport) {
        logging::logger(logging::ROOT).in_scope(|| {
            error!(
                event = "error_report",
                req_id = %report.req_id,
                status = report.status,
                location = report.location.as_deref().unwrap_or("unknown"),
                detail = %report.detail,
                "{}",
                report.message
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporting_never_panics_without_subscriber() {
        TracingErrorReporter.report(&ErrorReport {
            req_id: "r-1".into(),
            status: 502,
            message: "upstream failed".into(),
            location: None,
            detail: "Invalid http 502".into(),
        });
    }
}
