//! End-to-end tests for the vatrec binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn vatrec() -> Command {
    Command::cargo_bin("vatrec").expect("binary builds")
}

#[test]
fn process_prints_extraction_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ticket.txt");
    std::fs::write(
        &input,
        "UBER FRANCE SAS\n20/03/2025\nHT : 23.13 EUR\nTVA : 5.32 EUR\nTTC : 28.45 EUR",
    )
    .unwrap();

    vatrec()
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"price_ttc\":\"28.45\""))
        .stdout(predicate::str::contains("\"company_name\":\"UBER FRANCE SAS\""));
}

#[test]
fn process_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ticket.txt");
    let output = dir.path().join("result.json");
    std::fs::write(&input, "Total TTC : 34.50 EUR").unwrap();

    vatrec()
        .arg("process")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let result = std::fs::read_to_string(&output).unwrap();
    assert!(result.contains("\"price_ttc\":\"34.50\""));
    assert!(result.contains("\"is_valid\":false"));
}

#[test]
fn process_rejects_missing_input() {
    vatrec()
        .arg("process")
        .arg("does-not-exist.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn match_reports_the_matched_receipt() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("invoice.txt");
    std::fs::write(&document, "Facture Uber France SAS\nTotal : 28,45 EUR\n20/03/2025").unwrap();

    let receipts = dir.path().join("receipts.json");
    std::fs::write(
        &receipts,
        r#"[{
            "id": 7,
            "client_id": "acme",
            "user_id": 1,
            "company_name": "UBER FRANCE SAS",
            "price_ttc": "28.45",
            "date": "2025-03-20",
            "email_sent": false,
            "invoice_received": false,
            "created_at": "2025-03-20T10:00:00Z",
            "updated_at": "2025-03-20T10:00:00Z"
        }]"#,
    )
    .unwrap();

    vatrec()
        .arg("match")
        .arg(&document)
        .arg("--receipts")
        .arg(&receipts)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"receipt_id\":7"));
}

#[test]
fn worker_drains_a_seeded_queue() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("seed.json");
    std::fs::write(
        &seed,
        r#"{
            "receipts": [{
                "id": 1,
                "client_id": "acme",
                "user_id": 1,
                "email_sent": false,
                "invoice_received": false,
                "created_at": "2025-03-20T10:00:00Z",
                "updated_at": "2025-03-20T10:00:00Z"
            }],
            "tasks": [{
                "type": "extract",
                "payload": {"receipt_id": 1, "text": "UBER FRANCE SAS\n20/03/2025\nTTC : 28.45 EUR"}
            }]
        }"#,
    )
    .unwrap();

    vatrec()
        .arg("worker")
        .arg("--seed")
        .arg(&seed)
        .arg("--drain")
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 1 tasks, 0 dead-lettered"));
}

#[test]
fn config_show_prints_defaults() {
    vatrec()
        .arg("config")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_attempts\": 3"));
}
