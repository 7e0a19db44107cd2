//! Tests for PDF report rendering

use chrono::{TimeZone, Utc};
use contact_intake::models::SubmissionRecord;
use contact_intake::report::ReportGenerator;
use lopdf::Document;

fn record(id: i64, details: &str) -> SubmissionRecord {
    SubmissionRecord {
        id,
        name: format!("Person {id}"),
        email: format!("person{id}@gmail.com"),
        phone: String::new(),
        country_code: "+91".to_string(),
        company: String::new(),
        project_type: "Web Development".to_string(),
        budget_range: "$5k-$10k".to_string(),
        timeline: "1-3 months".to_string(),
        project_details: details.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
    }
}

fn page_text(doc: &Document) -> String {
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages).unwrap_or_default()
}

#[test]
fn test_render_produces_loadable_pdf() {
    let generated_at = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
    let bytes = ReportGenerator::default()
        .render(&[record(1, "Build a landing page.")], generated_at)
        .unwrap();

    assert!(bytes.starts_with(b"%PDF-"));

    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    let text = page_text(&doc);
    assert!(text.contains("Contact Submissions Report"));
    assert!(text.contains("Personal Information:"));
    assert!(text.contains("Phone: N/A"));
    assert!(text.contains("Generated on: 2024-05-02"));
    // Empty company section is omitted
    assert!(!text.contains("Company Information:"));
}

#[test]
fn test_many_records_span_pages() {
    let details = "Lots of detail about the project. ".repeat(20);
    let records: Vec<SubmissionRecord> = (1..=40).map(|id| record(id, &details)).collect();

    let bytes = ReportGenerator::new("Quarterly Leads").render(&records, Utc::now()).unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    assert!(doc.get_pages().len() > 1);
    assert!(page_text(&doc).contains("Quarterly Leads"));
}

#[test]
fn test_non_latin_text_does_not_fail() {
    let mut submission = record(1, "Détails du projet: 日本語 テキスト");
    submission.company = "Café Ünïcode".to_string();

    let bytes = ReportGenerator::default().render(&[submission], Utc::now()).unwrap();
    assert!(Document::load_mem(&bytes).is_ok());
}
