//! Report generation and export.

use chrono::{NaiveDate, Utc};
use foodify_common::{
    export::{self, ExportFormat},
    AppError, AppResult, Row,
};
use foodify_db::repositories::{
    RecentActivity, ReportRange, ReportRepository, ReportType, StatsRepository,
};
use serde::{Deserialize, Serialize};

use foodify_db::repositories::stats::ReportPageStats;

const RECENT_ACTIVITY_LIMIT: u64 = 10;

/// Report parameters, shared by generation and export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportRequest {
    pub report_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub format: Option<String>,
}

/// Landing data of the reports page.
#[derive(Debug, Serialize)]
pub struct ReportPage {
    pub stats: ReportPageStats,
    pub recent_activity: Vec<RecentActivity>,
}

/// A generated report.
#[derive(Debug, Serialize)]
pub struct GeneratedReport {
    pub rows: Vec<Row>,
    /// Without extension
    pub filename: String,
    pub count: usize,
    pub format: ExportFormat,
}

/// A rendered download.
#[derive(Debug)]
pub struct ReportExport {
    pub body: String,
    /// With extension
    pub filename: String,
    pub content_type: &'static str,
    pub notice: Option<&'static str>,
}

/// Report service.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    stats_repo: StatsRepository,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(report_repo: ReportRepository, stats_repo: StatsRepository) -> Self {
        Self {
            report_repo,
            stats_repo,
        }
    }

    /// Headline counts and the latest activity.
    pub async fn page(&self) -> AppResult<ReportPage> {
        Ok(ReportPage {
            stats: self.stats_repo.report_page_stats().await?,
            recent_activity: self.report_repo.recent_activity(RECENT_ACTIVITY_LIMIT).await?,
        })
    }

    /// Run a report.
    pub async fn generate(&self, request: &ReportRequest) -> AppResult<GeneratedReport> {
        let (report, range, format) = parse_request(request)?;
        let rows = self.report_repo.rows(report, range).await?;

        tracing::debug!(report = report.as_str(), rows = rows.len(), "Report generated");

        Ok(GeneratedReport {
            count: rows.len(),
            filename: export::report_filename(report.as_str(), Utc::now().date_naive()),
            rows,
            format,
        })
    }

    /// Run a report and render it for download.
    pub async fn export(&self, request: &ReportRequest) -> AppResult<ReportExport> {
        let report = self.generate(request).await?;
        render_export(&report)
    }
}

fn render_export(report: &GeneratedReport) -> AppResult<ReportExport> {
    let body = export::render(&report.rows, report.format)
        .ok_or_else(|| AppError::NotFound("No data to export".to_string()))?;

    Ok(ReportExport {
        body,
        filename: format!("{}.{}", report.filename, report.format.extension()),
        content_type: report.format.content_type(),
        notice: report.format.fallback_notice(),
    })
}

fn parse_request(request: &ReportRequest) -> AppResult<(ReportType, ReportRange, ExportFormat)> {
    let report: ReportType = request.report_type.as_deref().unwrap_or_default().parse()?;
    let format: ExportFormat = request.format.as_deref().unwrap_or_default().parse()?;
    let range = ReportRange {
        from: parse_date(request.date_from.as_deref())?,
        to: parse_date(request.date_to.as_deref())?,
    };
    Ok((report, range, format))
}

fn parse_date(value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid date: {v}"))),
    }
}
