//! Human-readable and JSON rendering of results

use anyhow::Result;
use clausewatch::classify::AnalysisResult;
use clausewatch::store::StoredAnalysis;
use clausewatch::util::truncate_str;
use clausewatch::SiteReport;
use std::fmt::Write;

const RULE: &str = "============================================================";
const CLAUSE_DISPLAY_CHARS: usize = 150;

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{RULE}\n{title}\n{RULE}");
}

fn clauses(out: &mut String, total_risks: usize, clauses: &[String]) {
    if total_risks == 0 {
        let _ = writeln!(out, "\nNo major risks detected in Terms & Conditions");
        return;
    }
    let _ = writeln!(out, "\nFound {} potential risk(s)", total_risks);
    let _ = writeln!(out, "\nSuspicious clauses found:");
    for (i, clause) in clauses.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, truncate_str(clause, CLAUSE_DISPLAY_CHARS));
    }
}

fn stored(out: &mut String, record: &StoredAnalysis) {
    let _ = writeln!(out, "\nSafety Rating: {}", record.safety_rating);
    let _ = writeln!(out, "Recommendation: {}", record.recommendation);
    clauses(out, record.risk_categories.len(), &record.suspicious_clauses);
    let _ = writeln!(
        out,
        "\nAnalyzed: {}",
        record.analyzed_at.format("%Y-%m-%d %H:%M UTC")
    );
}

/// Text rendering of a site report
pub fn render_report(report: &SiteReport) -> String {
    let mut out = String::new();
    heading(&mut out, "TERMS & CONDITIONS ANALYSIS RESULTS");

    match report {
        SiteReport::Trusted { url } => {
            let _ = writeln!(out, "Website: {}", url);
            let _ = writeln!(out, "Source: Trusted site list");
            let _ = writeln!(out, "\nThis is a well-known site; no analysis needed");
        }
        SiteReport::Cached { url, record } => {
            let _ = writeln!(out, "Website: {}", url);
            let _ = writeln!(out, "Source: Previous analysis (from database)");
            stored(&mut out, record);
        }
        SiteReport::Analyzed {
            url,
            safety_rating,
            recommendation,
            suspicious_clauses,
            total_risks,
            ..
        } => {
            let _ = writeln!(out, "Website: {}", url);
            let _ = writeln!(out, "Source: Fresh analysis");
            let _ = writeln!(out, "\nSafety Rating: {}", safety_rating);
            let _ = writeln!(out, "Recommendation: {}", recommendation);
            clauses(&mut out, *total_risks, suspicious_clauses);
        }
        SiteReport::Failed { error, .. } => {
            let _ = writeln!(out, "ERROR: {}", error);
        }
    }

    let _ = writeln!(out, "{RULE}");
    out
}

/// Text rendering of a raw text analysis
pub fn render_analysis(result: &AnalysisResult) -> String {
    let mut out = String::new();
    heading(&mut out, "TEXT ANALYSIS RESULTS");
    let _ = writeln!(out, "Safety Rating: {}", result.safety_rating);
    let _ = writeln!(out, "Recommendation: {}", result.recommendation);
    if !result.findings.is_empty() {
        let _ = writeln!(out, "\nRisk categories:");
        for finding in &result.findings {
            let _ = writeln!(out, "  - {}", finding.category);
        }
    }
    clauses(&mut out, result.risks_found, &result.suspicious_clauses);
    let _ = writeln!(out, "{RULE}");
    out
}

pub fn print_report(report: &SiteReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_report(report));
    }
    Ok(())
}

pub fn print_analysis(result: &AnalysisResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print!("{}", render_analysis(result));
    }
    Ok(())
}

pub fn print_record(record: &StoredAnalysis, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        let mut out = String::new();
        heading(&mut out, "STORED ANALYSIS");
        let _ = writeln!(out, "Website: {}", record.final_url);
        let _ = writeln!(out, "Domain: {}", record.domain);
        let _ = writeln!(out, "Text analyzed: {} characters", record.text_length);
        stored(&mut out, record);
        let _ = writeln!(out, "{RULE}");
        print!("{}", out);
    }
    Ok(())
}
