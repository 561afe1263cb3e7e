use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

use cli_helpers::{base_cmd, joppd_args, write_config, xml_files, TEST_OIB};

fn setup_temp_home() -> TempDir {
    TempDir::new().expect("failed to create temp home")
}

#[test]
fn oib_valid_exits_zero() {
    let home = setup_temp_home();

    base_cmd(&home)
        .args(["oib", TEST_OIB])
        .assert()
        .success()
        .stdout(predicate::str::contains("is a valid OIB"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn oib_invalid_shows_expected_check_digit() {
    let home = setup_temp_home();

    base_cmd(&home)
        .args(["oib", "69435151531"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("expected check digit: 0"))
        .stderr(predicate::str::contains("invalid OIB"));
}

#[test]
fn oib_wrong_length_fails() {
    let home = setup_temp_home();

    base_cmd(&home)
        .args(["oib", "12345"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("N/A"));
}

#[test]
fn code_prints_period_code() {
    let home = setup_temp_home();

    base_cmd(&home)
        .args(["code", "2024-02-01"])
        .assert()
        .success()
        .stdout(predicate::str::diff("24032\n"));

    base_cmd(&home)
        .args(["code", "31.12.2024."])
        .assert()
        .success()
        .stdout(predicate::str::diff("24366\n"));
}

#[test]
fn code_rejects_invalid_date() {
    let home = setup_temp_home();

    base_cmd(&home)
        .args(["code", "2024-13-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn towns_lists_bundled_table() {
    let home = setup_temp_home();

    base_cmd(&home)
        .args(["towns"])
        .assert()
        .success()
        .stdout(predicate::str::contains("zagreb"))
        .stdout(predicate::str::contains("01333"))
        .stdout(predicate::str::contains("18%"));
}

#[test]
fn towns_filter_matches_without_diacritics() {
    let home = setup_temp_home();

    base_cmd(&home)
        .args(["towns", "cakovec"])
        .assert()
        .success()
        .stdout(predicate::str::contains("čakovec"))
        .stdout(predicate::str::contains("zagreb").not());
}

#[test]
fn joppd_writes_report_with_expected_name() {
    let home = setup_temp_home();
    let out = TempDir::new().unwrap();
    let out_dir = out.path().to_string_lossy().into_owned();

    base_cmd(&home)
        .args(joppd_args("2024-02-01", "Zagreb", &out_dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("JOPPD 24032"))
        .stdout(predicate::str::contains("1.727,48 €"))
        .stdout(predicate::str::contains("345,50 €"))
        .stdout(predicate::str::contains("Report written to"))
        .stdout(predicate::str::contains("\u{001b}[").not());

    let files = xml_files(out.path()).unwrap();
    assert_eq!(files, vec!["ObrazacJOPPD_69435151530_01022024_24032_8.xml"]);

    let xml = std::fs::read_to_string(out.path().join(&files[0])).unwrap();
    assert!(xml.contains("<OznakaIzvjesca>24032</OznakaIzvjesca>"));
    assert!(xml.contains("<P2>01333</P2>"));
    assert!(xml.contains("<P11>1727.48</P11>"));
    assert!(xml.contains("<P141>345.50</P141>"));
    assert!(xml.contains("<P142>0.00</P142>"));
    assert!(xml.contains("<P162>1381.98</P162>"));
    assert!(xml.contains("<Ime>Ana</Ime>"));
    assert!(!xml.contains("{{"));
}

#[test]
fn joppd_dry_run_writes_nothing() {
    let home = setup_temp_home();
    let out = TempDir::new().unwrap();
    let out_dir = out.path().to_string_lossy().into_owned();

    let mut args = joppd_args("2024-02-01", "Zagreb", &out_dir);
    args.push("--dry-run");

    base_cmd(&home)
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(xml_files(out.path()).unwrap().is_empty());
}

#[test]
fn joppd_unknown_town_suggests_and_writes_nothing() {
    let home = setup_temp_home();
    let out = TempDir::new().unwrap();
    let out_dir = out.path().to_string_lossy().into_owned();

    base_cmd(&home)
        .args(joppd_args("2024-02-01", "Zagrbe", &out_dir))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown town 'Zagrbe'"))
        .stderr(predicate::str::contains("did you mean: zagreb"));

    assert!(xml_files(out.path()).unwrap().is_empty());
}

#[test]
fn joppd_invalid_oib_fails_before_anything_else() {
    let home = setup_temp_home();
    let out = TempDir::new().unwrap();
    let out_dir = out.path().to_string_lossy().into_owned();

    let mut args = joppd_args("2024-02-01", "Zagreb", &out_dir);
    let oib_pos = args.iter().position(|a| *a == TEST_OIB).unwrap();
    args[oib_pos] = "69435151531";

    base_cmd(&home)
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid OIB"));

    assert!(xml_files(out.path()).unwrap().is_empty());
}

#[test]
fn joppd_rejects_bad_manual_rate() {
    let home = setup_temp_home();
    let out = TempDir::new().unwrap();
    let out_dir = out.path().to_string_lossy().into_owned();

    let mut args = joppd_args("2024-02-01", "Zagreb", &out_dir);
    let rate_pos = args.iter().position(|a| *a == "1,0854").unwrap();
    args[rate_pos] = "0";

    base_cmd(&home)
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-positive rate"));
}

/// Config pointing the HNB client at a port nothing listens on
const UNREACHABLE_HNB: &str = "[rates]\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n";

fn without_manual_rate<'a>(mut args: Vec<&'a str>) -> Vec<&'a str> {
    let pos = args.iter().position(|a| *a == "--rate").unwrap();
    args.drain(pos..pos + 2);
    args
}

#[test]
fn joppd_unreachable_rate_service_writes_nothing() {
    let home = setup_temp_home();
    let config = write_config(&home, UNREACHABLE_HNB).unwrap();
    let out = TempDir::new().unwrap();
    let out_dir = out.path().to_string_lossy().into_owned();

    base_cmd(&home)
        .arg("--config")
        .arg(&config)
        .args(without_manual_rate(joppd_args("2024-02-01", "Zagreb", &out_dir)))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to get the HNB rate"))
        .stderr(predicate::str::contains("conversion rate unavailable"));

    assert!(xml_files(out.path()).unwrap().is_empty());
}

#[test]
fn joppd_unknown_town_is_reported_before_fetching_rate() {
    let home = setup_temp_home();
    let config = write_config(&home, UNREACHABLE_HNB).unwrap();
    let out = TempDir::new().unwrap();
    let out_dir = out.path().to_string_lossy().into_owned();

    base_cmd(&home)
        .arg("--config")
        .arg(&config)
        .args(without_manual_rate(joppd_args("2024-02-01", "Zagrbe", &out_dir)))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown town 'Zagrbe'"))
        .stderr(predicate::str::contains("conversion rate unavailable").not());

    assert!(xml_files(out.path()).unwrap().is_empty());
}

#[test]
fn missing_explicit_config_is_an_error() {
    let home = setup_temp_home();

    base_cmd(&home)
        .args(["--config", "/nonexistent/autotax.toml", "towns"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}
