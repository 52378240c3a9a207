//! 例外の報告ポリシー。

use crate::context::RequestContext;
use crate::fault::Fault;

/// Reporter は例外の報告ポリシー。
///
/// ドメイン例外とメンテナンス通知は想定内のため報告しない。
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    dont_report: Vec<String>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未知の例外のうち、メッセージに指定文字列を含むものを報告対象から除外する。
    pub fn ignore_containing(mut self, needle: impl Into<String>) -> Self {
        self.dont_report.push(needle.into());
        self
    }

    pub fn should_report(&self, fault: &Fault) -> bool {
        match fault {
            Fault::Domain(_) | Fault::Maintenance(_) => false,
            Fault::Unknown(err) => {
                let message = err.to_string();
                !self.dont_report.iter().any(|n| message.contains(n.as_str()))
            }
        }
    }

    /// 報告対象なら error、対象外なら debug レベルでログ出力する。
    pub fn report(&self, ctx: &RequestContext, fault: &Fault) {
        if self.should_report(fault) {
            tracing::error!(
                path = %ctx.path(),
                request_id = %ctx.request_id(),
                kind = %fault.kind(),
                error = ?fault,
                "unhandled fault"
            );
        } else {
            tracing::debug!(
                path = %ctx.path(),
                request_id = %ctx.request_id(),
                kind = %fault.kind(),
                message = %fault.message(),
                "expected fault not reported"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{ApiFault, MaintenanceSignal};

    #[test]
    fn test_domain_and_maintenance_not_reported() {
        let reporter = Reporter::new();
        assert!(!reporter.should_report(&ApiFault::maintain_mode("m").into()));
        assert!(!reporter.should_report(&MaintenanceSignal::default().into()));
    }

    #[test]
    fn test_unknown_reported() {
        let reporter = Reporter::new();
        assert!(reporter.should_report(&Fault::unknown(anyhow::anyhow!("disk full"))));
    }

    #[test]
    fn test_ignore_containing() {
        let reporter = Reporter::new().ignore_containing("broken pipe");
        assert!(!reporter.should_report(&Fault::unknown(anyhow::anyhow!("write: broken pipe"))));
        assert!(reporter.should_report(&Fault::unknown(anyhow::anyhow!("disk full"))));
    }

    #[test]
    fn test_report_does_not_panic_without_subscriber() {
        let ctx = RequestContext::new("/api/v1/x");
        Reporter::new().report(&ctx, &Fault::unknown(anyhow::anyhow!("boom")));
        Reporter::new().report(&ctx, &ApiFault::maintain_mode("m").into());
    }
}
