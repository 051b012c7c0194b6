//! End-to-end tests of the `faktur` binary. None of them reach the network.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RESPONSE: &str = r#"Here is the JSON you asked for:
{
  "seller_identity": {"company_name": "PT Sinar Jaya", "address": "Jakarta", "email_address": "billing@sinar.id"},
  "buyer_identity": {"company_name": "PT Pembeli", "address": "Bandung", "email_address": "ap@pembeli.id"},
  "invoice_details": {"invoice_no": "INV-2024-001", "invoice_date": "2024-05-02"},
  "item_details": [{"item_description": "Laptop", "quantity": 1, "unit_price": 8000000, "amount": 8000000}],
  "subtotal_invoice": 8000000,
  "vat": 880000,
  "invoice_total": 8880000,
  "bank_details": {"account_no": "123", "account_name": "PT Sinar Jaya", "beneficiary_bank": "BCA"}
}
Let me know if you need anything else."#;

fn faktur(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("faktur").unwrap();
    cmd.current_dir(dir.path()).env_remove("OPENAI_API_KEY");
    cmd
}

/// Config that looks for the key in a variable no test sets.
fn keyless_config(dir: &Path) -> String {
    let path = dir.join("config.json");
    fs::write(
        &path,
        r#"{"llm": {"api_key_env": "FAKTUR_CLI_TEST_UNSET_KEY"}}"#,
    )
    .unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    faktur(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("normalize"))
        .stdout(predicate::str::contains("flatten"));
}

#[test]
fn normalize_applies_inclusive_vat_marker() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("response.txt"), RESPONSE).unwrap();
    fs::write(dir.path().join("source.txt"), "INVOICE\nTotal 8.000.000\nPRICE INCLUDING VAT").unwrap();
    let config = keyless_config(dir.path());

    faktur(&dir)
        .args(["--config", &config, "normalize", "--json", "response.txt", "--source", "source.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"vat_overridden\": true"))
        .stdout(predicate::str::contains("792792.79"))
        .stdout(predicate::str::contains("INV-2024-001"));
}

#[test]
fn normalize_without_marker_keeps_vat() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("response.txt"), RESPONSE).unwrap();
    let config = keyless_config(dir.path());

    faktur(&dir)
        .args(["--config", &config, "normalize", "--json", "response.txt", "-f", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("VAT:      880000 IDR"))
        .stdout(predicate::str::contains("Prices include VAT").not());
}

#[test]
fn normalize_writes_invoice_workbook() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("response.txt"), RESPONSE).unwrap();
    let config = keyless_config(dir.path());

    faktur(&dir)
        .args(["--config", &config, "normalize", "--json", "response.txt", "-f", "xlsx", "-o", "invoice.xlsx"])
        .assert()
        .success();

    let bytes = fs::read(dir.path().join("invoice.xlsx")).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn normalize_malformed_response_shows_raw_text() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("response.txt"), "Sorry, I can't read that invoice.").unwrap();
    let config = keyless_config(dir.path());

    faktur(&dir)
        .args(["--config", &config, "normalize", "--json", "response.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"))
        .stderr(predicate::str::contains("Sorry, I can't read that invoice."));
}

#[test]
fn flatten_prints_csv_rows() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc.json"), r#"{"a": 1, "b": {"c": 2, "d": [3, 4]}}"#).unwrap();
    let config = keyless_config(dir.path());

    faktur(&dir)
        .args(["--config", &config, "flatten", "doc.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Key,Value\na,1\nb - c,2\nb - d [1],3\nb - d [2],4\n"));
}

#[test]
fn flatten_xlsx_needs_output() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("doc.json"), r#"{"a": 1}"#).unwrap();
    let config = keyless_config(dir.path());

    faktur(&dir)
        .args(["--config", &config, "flatten", "doc.json", "-f", "xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));

    faktur(&dir)
        .args(["--config", &config, "flatten", "doc.json", "-f", "xlsx", "-o", "doc.xlsx", "--sheet", "CV"])
        .assert()
        .success();
    assert!(dir.path().join("doc.xlsx").exists());
}

#[test]
fn process_without_api_key_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("invoice.txt"), "INVOICE INV-1").unwrap();
    let config = keyless_config(dir.path());

    faktur(&dir)
        .args(["--config", &config, "process", "invoice.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no language model configured"));
}

#[test]
fn process_rejects_images() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("scan.png"), [0x89, b'P', b'N', b'G']).unwrap();
    let config = keyless_config(dir.path());

    faktur(&dir)
        .args(["--config", &config, "process", "scan.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OCR"));
}

#[test]
fn config_set_and_get_roundtrip() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("faktur.json");
    let config = config.to_string_lossy();

    faktur(&dir)
        .args(["--config", &config, "config", "init"])
        .assert()
        .success();

    faktur(&dir)
        .args(["--config", &config, "config", "set", "extraction.vat_rate_percent", "12"])
        .assert()
        .success();

    faktur(&dir)
        .args(["--config", &config, "config", "get", "extraction.vat_rate_percent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("12"));

    faktur(&dir)
        .args(["--config", &config, "config", "set", "export.invoice_sheet", "\"\""])
        .assert()
        .failure();
}
