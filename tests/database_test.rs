//! Tests for the SQLite record store

use chrono::{Duration, TimeZone, Utc};
use contact_intake::db::Database;
use contact_intake::models::NewSubmission;
use tempfile::TempDir;

fn open() -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let url = format!("sqlite://{}", dir.path().join("contacts.db").display());
    let db = Database::new(&url).expect("Failed to create database");
    (dir, db)
}

fn submission(name: &str, email: &str, project_type: &str) -> NewSubmission {
    NewSubmission {
        name: name.to_string(),
        email: email.to_string(),
        phone: "9876543210".to_string(),
        country_code: "+91".to_string(),
        company: "Acme".to_string(),
        project_type: project_type.to_string(),
        budget_range: "$1k-$5k".to_string(),
        timeline: "1 month".to_string(),
        project_details: "A project description long enough.".to_string(),
    }
}

#[test]
fn test_database_creation_and_initialization() {
    let (_dir, db) = open();
    let _conn = db.get_connection().expect("Failed to get database connection");
    assert_eq!(db.count_submissions().unwrap(), 0);
}

#[test]
fn test_list_returns_newest_first() {
    let (_dir, db) = open();
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    for i in 0..15 {
        db.insert_submission(
            &submission(&format!("Person {i}"), &format!("person{i}@gmail.com"), "Web"),
            base + Duration::minutes(i),
        )
        .unwrap();
    }

    let page = db.list_submissions(10, 0).unwrap();
    assert_eq!(page.len(), 10);
    assert_eq!(page[0].name, "Person 14");
    assert!(page.windows(2).all(|pair| pair[0].created_at >= pair[1].created_at));

    let rest = db.list_submissions(10, 10).unwrap();
    assert_eq!(rest.len(), 5);
    assert_eq!(rest[4].name, "Person 0");
    assert_eq!(db.count_submissions().unwrap(), 15);
}

#[test]
fn test_ids_and_timestamps_never_go_backwards() {
    let (_dir, db) = open();
    let now = Utc::now();

    let first = db.insert_submission(&submission("Ann", "ann@gmail.com", "Web"), now).unwrap();
    // A clock step backwards must not reorder records
    let second = db
        .insert_submission(&submission("Bob", "bob@gmail.com", "Web"), now - Duration::hours(1))
        .unwrap();

    assert!(second.id > first.id);
    assert!(second.created_at >= first.created_at);

    let page = db.list_submissions(10, 0).unwrap();
    assert_eq!(page[0].name, "Bob");
}

#[test]
fn test_search_is_case_insensitive_substring() {
    let (_dir, db) = open();
    let now = Utc::now();
    db.insert_submission(&submission("Ann", "ann@gmail.com", "Mobile App"), now).unwrap();
    db.insert_submission(&submission("Bob", "bob@gmail.com", "Web"), now).unwrap();

    let mut other = submission("Cara", "cara@gmail.com", "Web");
    other.email = "cara@outlook.com".to_string();
    db.insert_submission(&other, now).unwrap();

    let hits = db.search_submissions("GMAIL", 10, 0).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(db.count_matching("gmail").unwrap(), 2);

    let mobile = db.search_submissions("mobile", 10, 0).unwrap();
    assert_eq!(mobile.len(), 1);
    assert_eq!(mobile[0].name, "Ann");

    // Phone numbers are not searchable
    assert!(db.search_submissions("98765", 10, 0).unwrap().is_empty());
}

#[test]
fn test_search_folds_non_ascii_case() {
    let (_dir, db) = open();
    let mut record = submission("Emile", "emile@gmail.com", "Web");
    record.company = "Émile Zürich".to_string();
    db.insert_submission(&record, Utc::now()).unwrap();
    db.insert_submission(&submission("Bob", "bob@gmail.com", "Web"), Utc::now()).unwrap();

    for term in ["Émile", "émile", "ÉMILE", "ZÜRICH", "MILE"] {
        let hits = db.search_submissions(term, 10, 0).unwrap();
        assert_eq!(hits.len(), 1, "term {term}");
        assert_eq!(hits[0].company, "Émile Zürich");
        assert_eq!(db.count_matching(term).unwrap(), 1, "term {term}");
    }
}

#[test]
fn test_aggregates() {
    let (_dir, db) = open();
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();

    db.insert_submission(&submission("Ann", "ann@gmail.com", "Web"), now - Duration::days(40))
        .unwrap();
    db.insert_submission(&submission("Bob", "bob@gmail.com", "Web"), now - Duration::days(2))
        .unwrap();
    db.insert_submission(&submission("Cara", "cara@gmail.com", "Design"), now).unwrap();

    let by_type = db.project_type_stats().unwrap();
    assert_eq!(by_type[0].project_type, "Web");
    assert_eq!(by_type[0].count, 2);
    assert_eq!(by_type[1].project_type, "Design");

    assert_eq!(db.count_since(now - Duration::days(7)).unwrap(), 2);

    let monthly = db.monthly_stats(now - Duration::days(180)).unwrap();
    assert_eq!(monthly.len(), 2);
    assert_eq!((monthly[0].period.year, monthly[0].period.month), (2024, 5));
    assert_eq!(monthly[0].count, 1);
    assert_eq!((monthly[1].period.year, monthly[1].period.month), (2024, 6));
    assert_eq!(monthly[1].count, 2);
}
