//! Self-contained HTML report rendering

use std::fmt::Write as _;

use crate::application::risk::RiskEngine;
use crate::domain::scan::{Finding, ScanResult, Severity};

/// Render a complete, self-contained HTML report.
pub fn render_report(result: &ScanResult) -> String {
    let engine = RiskEngine::new();
    let prioritized = engine.prioritize(&result.findings);
    let risk_level = RiskEngine::risk_level(result.risk_score);

    let severity_tiles = Severity::ALL
        .iter()
        .rev()
        .map(|severity| {
            let count = result.findings_by_severity.get(severity).unwrap_or(&0);
            format!(
                r#"<div class="tile severity-{sev}"><div class="tile-value">{count}</div><div class="tile-label">{label}</div></div>"#,
                sev = severity.as_str(),
                count = count,
                label = severity.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n            ");

    let findings_rows = if prioritized.is_empty() {
        r#"<tr><td colspan="6" class="empty">No findings at or above the requested severity threshold.</td></tr>"#
            .to_string()
    } else {
        let mut rows = String::new();
        for finding in &prioritized {
            let _ = write!(
                rows,
                r#"<tr>
                <td><span class="badge severity-{sev}">{sev}</span></td>
                <td>{title}</td>
                <td>{resource}</td>
                <td>{group}</td>
                <td>{risk}</td>
                <td>{effort}</td>
            </tr>
            <tr class="detail"><td colspan="6"><strong>Issue:</strong> {description}<br><strong>Recommendation:</strong> {recommendation}</td></tr>"#,
                sev = finding.severity.as_str(),
                title = escape_html(&finding.title),
                resource = escape_html(&finding.resource_name),
                group = escape_html(&finding.resource_group),
                risk = finding.risk_score,
                effort = remediation_effort(finding),
                description = escape_html(&finding.description),
                recommendation = escape_html(&finding.recommendation),
            );
        }
        rows
    };

    let recommendations = engine
        .recommendations(&result.findings)
        .iter()
        .map(|r| format!("<li>{}</li>", escape_html(r)))
        .collect::<Vec<_>>()
        .join("\n            ");

    let subscription_label = match &result.subscription_name {
        Some(name) => format!(
            "{} ({})",
            escape_html(name),
            escape_html(&result.subscription_id)
        ),
        None => escape_html(&result.subscription_id),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Security Posture Report - {subscription_id}</title>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #1e293b;
            background: #f1f5f9;
            padding: 2rem;
        }}
        .container {{ max-width: 1100px; margin: 0 auto; }}
        .header {{
            background: linear-gradient(135deg, #1e3a8a 0%, #3b82f6 100%);
            color: white;
            padding: 2rem;
            border-radius: 0.75rem;
            margin-bottom: 1.5rem;
        }}
        .header h1 {{ font-size: 1.8rem; margin-bottom: 0.25rem; }}
        .header p {{ opacity: 0.85; }}
        .tiles {{ display: flex; gap: 1rem; margin-bottom: 1.5rem; flex-wrap: wrap; }}
        .tile {{
            flex: 1;
            min-width: 120px;
            background: white;
            border-radius: 0.5rem;
            padding: 1rem;
            text-align: center;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
        }}
        .tile-value {{ font-size: 1.8rem; font-weight: 700; }}
        .tile-label {{ color: #64748b; text-transform: capitalize; }}
        .score {{ font-size: 2.4rem; }}
        section {{
            background: white;
            border-radius: 0.5rem;
            padding: 1.5rem;
            margin-bottom: 1.5rem;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
        }}
        section h2 {{ margin-bottom: 1rem; font-size: 1.2rem; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ text-align: left; padding: 0.5rem 0.75rem; border-bottom: 1px solid #e2e8f0; }}
        th {{ color: #64748b; font-size: 0.85rem; text-transform: uppercase; }}
        tr.detail td {{ color: #475569; font-size: 0.9rem; background: #f8fafc; }}
        td.empty {{ text-align: center; color: #64748b; }}
        .badge {{
            display: inline-block;
            padding: 0.1rem 0.6rem;
            border-radius: 999px;
            font-size: 0.8rem;
            font-weight: 600;
            text-transform: capitalize;
            color: white;
        }}
        .severity-critical {{ background: #dc2626; }}
        .severity-high {{ background: #ea580c; }}
        .severity-medium {{ background: #d97706; }}
        .severity-low {{ background: #16a34a; }}
        .severity-info {{ background: #2563eb; }}
        .tile.severity-critical, .tile.severity-high, .tile.severity-medium,
        .tile.severity-low, .tile.severity-info {{ background: white; color: inherit; }}
        .tile.severity-critical .tile-value {{ color: #dc2626; }}
        .tile.severity-high .tile-value {{ color: #ea580c; }}
        .tile.severity-medium .tile-value {{ color: #d97706; }}
        .tile.severity-low .tile-value {{ color: #16a34a; }}
        .tile.severity-info .tile-value {{ color: #2563eb; }}
        ul {{ padding-left: 1.25rem; }}
        .footer {{ text-align: center; color: #64748b; font-size: 0.85rem; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Azure Security Posture Report</h1>
            <p>Subscription: {subscription_label}</p>
            <p>Scanned at {scan_timestamp} &middot; {duration:.1}s &middot; {resources} resources inspected</p>
        </div>

        <div class="tiles">
            <div class="tile"><div class="tile-value score">{risk_score}</div><div class="tile-label">Risk score ({risk_level})</div></div>
            <div class="tile"><div class="tile-value">{total_findings}</div><div class="tile-label">Findings</div></div>
            {severity_tiles}
        </div>

        <section>
            <h2>Findings</h2>
            <table>
                <thead>
                    <tr><th>Severity</th><th>Title</th><th>Resource</th><th>Resource group</th><th>Risk</th><th>Effort</th></tr>
                </thead>
                <tbody>
                    {findings_rows}
                </tbody>
            </table>
        </section>

        <section>
            <h2>Recommendations</h2>
            <ul>
            {recommendations}
            </ul>
        </section>

        <p class="footer">cloudposture v{version}</p>
    </div>
</body>
</html>
"#,
        subscription_id = escape_html(&result.subscription_id),
        subscription_label = subscription_label,
        scan_timestamp = result.scan_timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        duration = result.scan_duration_seconds,
        resources = result.total_resources_scanned,
        risk_score = result.risk_score,
        risk_level = risk_level,
        total_findings = result.total_findings,
        severity_tiles = severity_tiles,
        findings_rows = findings_rows,
        recommendations = recommendations,
        version = env!("CARGO_PKG_VERSION"),
    )
}

/// Rough remediation-effort estimate from the finding title.
fn remediation_effort(finding: &Finding) -> &'static str {
    let title = finding.title.to_lowercase();
    const LOW: [&str; 4] = ["enable", "disable", "configure", "set"];
    const HIGH: [&str; 3] = ["redesign", "migrate", "restructure"];

    if LOW.iter().any(|kw| title.contains(kw)) {
        "Low"
    } else if HIGH.iter().any(|kw| title.contains(kw)) {
        "High"
    } else {
        "Medium"
    }
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
