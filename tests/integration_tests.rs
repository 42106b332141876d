//! Integration tests for the BCT CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get a bct command
fn bct() -> Command {
    let mut cmd = Command::cargo_bin("bct").unwrap();
    // keep authorship deterministic across CI environments
    cmd.env("BCT_AUTHOR", "Test Author");
    cmd
}

/// Helper to create a test project in a temp directory
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    bct()
        .current_dir(tmp.path())
        .args([
            "init",
            "--name",
            "Test Bike",
            "--bike-type",
            "gravel",
            "--gate",
            "DTx=2025-09-01",
        ])
        .assert()
        .success();
    tmp
}

/// Helper to create a BOM item
fn create_item(tmp: &TempDir, code: &str, description: &str, qty: &str) {
    bct()
        .current_dir(tmp.path())
        .args([
            "item", "new", "--code", code, "--description", description, "--qty", qty,
        ])
        .assert()
        .success();
}

/// Helper to create a running change
fn create_change(tmp: &TempDir, cn: &str, old: &str, new: &str, go_live: &str) {
    bct()
        .current_dir(tmp.path())
        .args([
            "change", "new", "--cn", cn, "--title", "swap", "--go-live", go_live, "--old", old,
            "--new", new,
        ])
        .assert()
        .success();
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    bct()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("BOM & Change Toolkit"));
}

#[test]
fn test_version_displays() {
    bct()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bct"));
}

#[test]
fn test_unknown_command_fails() {
    bct()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_commands_outside_project_fail() {
    let tmp = TempDir::new().unwrap();
    bct()
        .current_dir(tmp.path())
        .args(["item", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a BCT project"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();

    bct()
        .current_dir(tmp.path())
        .args(["init", "--name", "Test", "--bike-type", "gravel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(tmp.path().join(".bct/config.yaml").exists());
    assert!(tmp.path().join(".bct/project.yaml").exists());
    assert!(tmp.path().join("bom/items").is_dir());
    assert!(tmp.path().join("bom/groups").is_dir());
    assert!(tmp.path().join("changes").is_dir());
    assert!(tmp.path().join("specs/history").is_dir());
    assert!(tmp.path().join("mappings").is_dir());
    assert!(tmp.path().join("snapshots").is_dir());
}

#[test]
fn test_init_twice_fails_without_force() {
    let tmp = setup_test_project();

    bct()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    bct()
        .current_dir(tmp.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

// ============================================================================
// Item Commands
// ============================================================================

#[test]
fn test_item_new_and_list() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");

    bct()
        .current_dir(tmp.path())
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B100234"))
        .stdout(predicate::str::contains("Chainring 42T"));
}

#[test]
fn test_item_duplicate_code_rejected() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");

    bct()
        .current_dir(tmp.path())
        .args([
            "item", "new", "--code", "B100234", "--description", "Duplicate", "--qty", "1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_item_show_by_code() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");

    bct()
        .current_dir(tmp.path())
        .args(["item", "show", "B100234"])
        .assert()
        .success()
        .stdout(predicate::str::contains("item_code: B100234"))
        .stdout(predicate::str::contains("extended_cost"));
}

#[test]
fn test_item_list_id_format_is_pipable() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");
    create_item(&tmp, "B200555", "Rear derailleur", "1");

    let output = bct()
        .current_dir(tmp.path())
        .args(["item", "list", "--format", "id"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["B100234", "B200555"]);
}

// ============================================================================
// Change Commands + Matcher
// ============================================================================

#[test]
fn test_change_affected_matches_by_old_code() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");
    create_item(&tmp, "B300111", "Spoke", "64");
    create_change(&tmp, "CN-0099", "B100234", "B100999", "2025-06-01");

    bct()
        .current_dir(tmp.path())
        .args(["change", "affected", "--as-of", "2025-05-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B100234"))
        .stdout(predicate::str::contains("CN-0099"))
        .stdout(predicate::str::contains("31"))
        .stdout(predicate::str::contains("B300111").not());
}

#[test]
fn test_change_affected_count_badge() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");
    create_change(&tmp, "CN-0099", "B100234", "B100999", "2025-06-01");
    create_change(&tmp, "CN-0112", "B100234", "B101111", "2025-08-01");

    // two matches but one affected item
    bct()
        .current_dir(tmp.path())
        .args(["change", "affected", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::diff("1\n"));
}

#[test]
fn test_change_affected_flags_after_gate() {
    let tmp = setup_test_project(); // DTx = 2025-09-01
    create_item(&tmp, "B100234", "Chainring 42T", "2");
    create_change(&tmp, "CN-0200", "B100234", "B100999", "2025-10-01");

    bct()
        .current_dir(tmp.path())
        .args(["change", "affected", "--as-of", "2025-05-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("YES"))
        .stdout(predicate::str::contains("after the DTx gate"));
}

#[test]
fn test_change_deactivate_removes_from_matching() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");
    create_change(&tmp, "CN-0099", "B100234", "B100999", "2025-06-01");

    bct()
        .current_dir(tmp.path())
        .args(["change", "deactivate", "CN-0099", "--note", "superseded"])
        .assert()
        .success();

    bct()
        .current_dir(tmp.path())
        .args(["change", "affected", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::diff("0\n"));

    // still on record
    bct()
        .current_dir(tmp.path())
        .args(["change", "list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CN-0099"));
}

// ============================================================================
// Import Commands
// ============================================================================

#[test]
fn test_import_items_from_csv() {
    let tmp = setup_test_project();
    let csv = tmp.path().join("bom.csv");
    fs::write(
        &csv,
        "item_code,description,group_code,quantity,level,material_cost\n\
         B100234,Chainring 42T,DRIVETRAIN,2,1,4.50\n\
         B200555,Rear derailleur,DRIVETRAIN,1,1,38.00\n",
    )
    .unwrap();

    bct()
        .current_dir(tmp.path())
        .args(["import", "item", "bom.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Records created:  2"));

    bct()
        .current_dir(tmp.path())
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B200555"));
}

#[test]
fn test_import_changes_from_csv() {
    let tmp = setup_test_project();
    let csv = tmp.path().join("changes.csv");
    fs::write(
        &csv,
        "cn_number,title,owner,estimated_go_live,old_b_codes,new_b_codes,active\n\
         CN-0099,Chainring vendor swap,M. Kranz,2025-06-01,B100234,B100999,true\n",
    )
    .unwrap();

    bct()
        .current_dir(tmp.path())
        .args(["import", "change", "changes.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Records created:  1"));

    bct()
        .current_dir(tmp.path())
        .args(["change", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CN-0099"));
}

#[test]
fn test_import_invalid_row_fails_without_skip_errors() {
    let tmp = setup_test_project();
    let csv = tmp.path().join("bom.csv");
    fs::write(
        &csv,
        "item_code,description,quantity\n\
         B100234,Chainring 42T,not-a-number\n",
    )
    .unwrap();

    bct()
        .current_dir(tmp.path())
        .args(["import", "item", "bom.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid quantity"));
}

#[test]
fn test_import_skip_errors_continues() {
    let tmp = setup_test_project();
    let csv = tmp.path().join("bom.csv");
    fs::write(
        &csv,
        "item_code,description,quantity\n\
         B100234,Chainring 42T,bad\n\
         B200555,Rear derailleur,1\n",
    )
    .unwrap();

    bct()
        .current_dir(tmp.path())
        .args(["import", "item", "bom.csv", "--skip-errors"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Records created:  1"))
        .stdout(predicate::str::contains("Errors:           1"));
}

#[test]
fn test_import_dry_run_creates_nothing() {
    let tmp = setup_test_project();
    let csv = tmp.path().join("bom.csv");
    fs::write(&csv, "item_code,description,quantity\nB100234,Chainring,2\n").unwrap();

    bct()
        .current_dir(tmp.path())
        .args(["import", "item", "bom.csv", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run complete"));

    bct()
        .current_dir(tmp.path())
        .args(["item", "list", "--format", "id"])
        .assert()
        .success()
        .stdout(predicate::str::diff(""));
}

#[test]
fn test_import_template_generation() {
    bct()
        .args(["import", "--template", "change"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cn_number"))
        .stdout(predicate::str::contains("old_b_codes"));
}

// ============================================================================
// Spec Workflow
// ============================================================================

fn setup_spec(tmp: &TempDir) {
    bct()
        .current_dir(tmp.path())
        .args(["spec", "init", "--title", "MY26 Gravel Pro"])
        .assert()
        .success();
}

#[test]
fn test_spec_init_set_show() {
    let tmp = setup_test_project();
    setup_spec(&tmp);

    bct()
        .current_dir(tmp.path())
        .args(["spec", "set", "Frame", "Aluminium"])
        .assert()
        .success();

    bct()
        .current_dir(tmp.path())
        .args(["spec", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bike_type: gravel"))
        .stdout(predicate::str::contains("Aluminium"));
}

#[test]
fn test_spec_submit_freezes_version() {
    let tmp = setup_test_project();
    setup_spec(&tmp);

    bct()
        .current_dir(tmp.path())
        .args(["spec", "set", "Frame", "Aluminium"])
        .assert()
        .success();
    bct()
        .current_dir(tmp.path())
        .args(["spec", "submit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Submitted spec v1"));

    assert!(tmp.path().join("specs/history/SPEC-v0001.bct.yaml").exists());

    // a submitted spec cannot be edited
    bct()
        .current_dir(tmp.path())
        .args(["spec", "set", "Frame", "Carbon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("submitted"));

    // and cannot be resubmitted
    bct()
        .current_dir(tmp.path())
        .args(["spec", "submit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid status transition"));
}

fn submit_two_versions(tmp: &TempDir) {
    setup_spec(tmp);
    bct()
        .current_dir(tmp.path())
        .args(["spec", "set", "Frame", "Aluminium"])
        .assert()
        .success();
    bct()
        .current_dir(tmp.path())
        .args(["spec", "submit"])
        .assert()
        .success();
    bct()
        .current_dir(tmp.path())
        .args(["spec", "accept"])
        .assert()
        .success();
    bct()
        .current_dir(tmp.path())
        .args(["spec", "revise"])
        .assert()
        .success();
    bct()
        .current_dir(tmp.path())
        .args(["spec", "set", "Frame", "Carbon"])
        .assert()
        .success();
    bct()
        .current_dir(tmp.path())
        .args(["spec", "submit"])
        .assert()
        .success();
}

#[test]
fn test_spec_accept_revise_and_versions() {
    let tmp = setup_test_project();
    submit_two_versions(&tmp);

    bct()
        .current_dir(tmp.path())
        .args(["spec", "versions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v1"))
        .stdout(predicate::str::contains("v2"));
}

#[test]
fn test_spec_compare_detects_modification() {
    let tmp = setup_test_project();
    submit_two_versions(&tmp);

    bct()
        .current_dir(tmp.path())
        .args(["spec", "compare", "1", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Frame"))
        .stdout(predicate::str::contains("modified"))
        .stdout(predicate::str::contains("Aluminium"))
        .stdout(predicate::str::contains("Carbon"));
}

#[test]
fn test_spec_compare_same_version_is_empty() {
    let tmp = setup_test_project();
    submit_two_versions(&tmp);

    bct()
        .current_dir(tmp.path())
        .args(["spec", "compare", "1", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No differences"));
}

#[test]
fn test_spec_reject_returns_to_draft_on_edit() {
    let tmp = setup_test_project();
    setup_spec(&tmp);

    bct()
        .current_dir(tmp.path())
        .args(["spec", "set", "Frame", "Aluminium"])
        .assert()
        .success();
    bct()
        .current_dir(tmp.path())
        .args(["spec", "submit"])
        .assert()
        .success();
    bct()
        .current_dir(tmp.path())
        .args(["spec", "reject", "--comment", "colour TBD"])
        .assert()
        .success();

    // editable again; resubmission takes the next version number
    bct()
        .current_dir(tmp.path())
        .args(["spec", "set", "Frame", "Carbon"])
        .assert()
        .success();
    bct()
        .current_dir(tmp.path())
        .args(["spec", "submit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Submitted spec v2"));
}

#[test]
fn test_spec_apply_requires_an_operation() {
    let tmp = setup_test_project();
    submit_two_versions(&tmp);

    bct()
        .current_dir(tmp.path())
        .args(["spec", "apply", "1", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no operation selected"));
}

#[test]
fn test_spec_apply_creates_and_retires_groups() {
    let tmp = setup_test_project();
    submit_two_versions(&tmp);

    // teach the engine both frame options
    bct()
        .current_dir(tmp.path())
        .args([
            "map", "confirm", "Frame", "Aluminium", "--groups", "FRAME-ALU",
        ])
        .assert()
        .success();
    bct()
        .current_dir(tmp.path())
        .args(["map", "confirm", "Frame", "Carbon", "--groups", "FRAME-CARBON"])
        .assert()
        .success();

    // the old group must exist before it can be retired
    bct()
        .current_dir(tmp.path())
        .args([
            "asm", "new", "--code", "FRAME-ALU", "--title", "Alu frame", "--template",
        ])
        .assert()
        .success();

    bct()
        .current_dir(tmp.path())
        .args([
            "spec",
            "apply",
            "1",
            "2",
            "--add-groups",
            "--remove-groups",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("added group FRAME-CARBON"))
        .stdout(predicate::str::contains("retired group FRAME-ALU"));

    // re-running is a no-op thanks to pre-checks
    bct()
        .current_dir(tmp.path())
        .args([
            "spec",
            "apply",
            "1",
            "2",
            "--add-groups",
            "--remove-groups",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));
}

// ============================================================================
// Mapping Commands
// ============================================================================

#[test]
fn test_map_confirm_then_suggest_full_confidence() {
    let tmp = setup_test_project();

    bct()
        .current_dir(tmp.path())
        .args(["map", "confirm", "Frame", "Carbon", "--groups", "FRAME-CARBON"])
        .assert()
        .success()
        .stdout(predicate::str::contains("confidence 1.0"));

    bct()
        .current_dir(tmp.path())
        .args(["map", "suggest", "Frame", "Carbon"])
        .assert()
        .success()
        .stdout(predicate::str::contains("learned mapping"))
        .stdout(predicate::str::contains("FRAME-CARBON"));
}

#[test]
fn test_map_confirm_rejects_empty_groups() {
    let tmp = setup_test_project();

    bct()
        .current_dir(tmp.path())
        .args(["map", "confirm", "Frame", "Carbon", "--groups", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no group codes"));
}

#[test]
fn test_map_suggest_unmapped_option() {
    let tmp = setup_test_project();

    bct()
        .current_dir(tmp.path())
        .args(["map", "suggest", "Electronics", "Radar Light"])
        .assert()
        .success()
        .stdout(predicate::str::contains("needs manual mapping"));
}

#[test]
fn test_map_list_shows_band() {
    let tmp = setup_test_project();

    bct()
        .current_dir(tmp.path())
        .args(["map", "confirm", "Frame", "Carbon", "--groups", "FRAME-CARBON"])
        .assert()
        .success();

    bct()
        .current_dir(tmp.path())
        .args(["map", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gravel"))
        .stdout(predicate::str::contains("high"));
}

// ============================================================================
// Snapshot Commands
// ============================================================================

#[test]
fn test_snapshot_create_and_compare() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");

    bct()
        .current_dir(tmp.path())
        .args(["snapshot", "create", "before", "-m", "baseline"])
        .assert()
        .success();

    create_item(&tmp, "B200555", "Rear derailleur", "1");

    bct()
        .current_dir(tmp.path())
        .args(["snapshot", "create", "after"])
        .assert()
        .success();

    bct()
        .current_dir(tmp.path())
        .args(["snapshot", "compare", "before", "after"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B200555"))
        .stdout(predicate::str::contains("added"))
        .stdout(predicate::str::contains("1 added, 0 removed"));
}

#[test]
fn test_snapshot_duplicate_label_fails() {
    let tmp = setup_test_project();

    bct()
        .current_dir(tmp.path())
        .args(["snapshot", "create", "baseline"])
        .assert()
        .success();

    bct()
        .current_dir(tmp.path())
        .args(["snapshot", "create", "baseline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// ============================================================================
// Task Commands
// ============================================================================

#[test]
fn test_task_new_move_board() {
    let tmp = setup_test_project();

    bct()
        .current_dir(tmp.path())
        .args([
            "task",
            "new",
            "--title",
            "Confirm CN-0099 go-live",
            "--priority",
            "high",
            "--changes",
            "CN-0099",
        ])
        .assert()
        .success();

    bct()
        .current_dir(tmp.path())
        .args(["task", "move", "Confirm", "in_progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backlog -> in_progress"));

    bct()
        .current_dir(tmp.path())
        .args(["task", "board"])
        .assert()
        .success()
        .stdout(predicate::str::contains("in_progress"))
        .stdout(predicate::str::contains("Confirm CN-0099 go-live"));
}

// ============================================================================
// Vendor / Contract Commands
// ============================================================================

#[test]
fn test_vendor_and_contract_flow() {
    let tmp = setup_test_project();

    bct()
        .current_dir(tmp.path())
        .args([
            "vendor",
            "new",
            "--short-name",
            "acme",
            "--title",
            "Acme Components Ltd",
        ])
        .assert()
        .success();

    bct()
        .current_dir(tmp.path())
        .args([
            "contract", "new", "--vendor", "acme", "--item", "B100234", "--price", "4.50",
            "--from", "2025-01-01", "--to", "2025-12-31",
        ])
        .assert()
        .success();

    bct()
        .current_dir(tmp.path())
        .args(["contract", "list", "--current-on", "2025-06-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B100234"));

    bct()
        .current_dir(tmp.path())
        .args(["contract", "list", "--current-on", "2026-06-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B100234").not());
}

#[test]
fn test_contract_refresh_reprices_items() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");

    bct()
        .current_dir(tmp.path())
        .args([
            "contract", "new", "--vendor", "acme", "--item", "B100234", "--price", "4.50",
        ])
        .assert()
        .success();

    bct()
        .current_dir(tmp.path())
        .args(["contract", "refresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 item(s) repriced"));

    bct()
        .current_dir(tmp.path())
        .args(["item", "show", "B100234"])
        .assert()
        .success()
        .stdout(predicate::str::contains("material_cost: 4.5"))
        .stdout(predicate::str::contains("cost_source: contract"));
}

// ============================================================================
// Status / Validate / Report / Cache
// ============================================================================

#[test]
fn test_status_dashboard() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");
    create_change(&tmp, "CN-0099", "B100234", "B100999", "2025-06-01");

    bct()
        .current_dir(tmp.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Bike"))
        .stdout(predicate::str::contains("Gate DTx: 2025-09-01"))
        .stdout(predicate::str::contains("1 active"))
        .stdout(predicate::str::contains("1 BOM item(s) affected"));
}

#[test]
fn test_validate_passes_on_generated_entities() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");
    create_change(&tmp, "CN-0099", "B100234", "B100999", "2025-06-01");

    bct()
        .current_dir(tmp.path())
        .args(["validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("all OK"));
}

#[test]
fn test_validate_reports_malformed_file() {
    let tmp = setup_test_project();
    fs::write(
        tmp.path().join("bom/items/ITEM-broken.bct.yaml"),
        "id: ITEM-01HC2JB7SMQX7RS1Y0GFKBHPTD\nitem_code: B1\n",
    )
    .unwrap();

    bct()
        .current_dir(tmp.path())
        .args(["validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid"));
}

#[test]
fn test_report_affected_renders_markdown() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");
    create_change(&tmp, "CN-0099", "B100234", "B100999", "2025-06-01");

    bct()
        .current_dir(tmp.path())
        .args(["report", "affected"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Running Change Impact Report"))
        .stdout(predicate::str::contains("B100234"));
}

#[test]
fn test_report_comparison_to_file() {
    let tmp = setup_test_project();
    submit_two_versions(&tmp);

    bct()
        .current_dir(tmp.path())
        .args(["report", "comparison", "1", "2", "-o", "report.md"])
        .assert()
        .success();

    let content = fs::read_to_string(tmp.path().join("report.md")).unwrap();
    assert!(content.contains("# Spec Comparison: v1 -> v2"));
    assert!(content.contains("Frame"));
}

#[test]
fn test_cache_sync_and_status() {
    let tmp = setup_test_project();
    create_item(&tmp, "B100234", "Chainring 42T", "2");
    create_change(&tmp, "CN-0099", "B100234", "B100999", "2025-06-01");

    bct()
        .current_dir(tmp.path())
        .args(["cache", "sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 scanned"));

    bct()
        .current_dir(tmp.path())
        .args(["cache", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BOM items:       1"))
        .stdout(predicate::str::contains("Active changes:  1"));
}

#[test]
fn test_completions_generate() {
    bct()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bct"));
}
