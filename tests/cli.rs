use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::TempDir;

// the repeat planted in tests/reads/crispr.fa
const REPEAT: &str = "ATTGCAGTCCTAGCGCTTCAGCGGTATC";

#[test]
fn command_invalid() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("criscan")?;
    cmd.arg("foobar");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("recognized"));

    Ok(())
}

#[test]
fn file_doesnt_provided() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("criscan")?;
    cmd.arg("search");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not provided"));

    Ok(())
}

#[test]
fn file_doesnt_exist() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("criscan")?;
    cmd.arg("search").arg("tests/file/doesnt/exist.fa");
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("could not open"));

    Ok(())
}

#[test]
fn command_search() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("criscan")?;
    let output = cmd
        .arg("search")
        .arg("tests/reads/crispr.fa")
        .output()?;
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8(output.stdout)?;
    // three reads collapse into one group of one node and two spacers
    assert!(stdout.contains("#group\trepeat\treads"));
    assert!(stdout.contains(&format!("1\t{}\t3\t1\t2\t7\t7", REPEAT)));
    assert!(stdout.contains(&format!("node\t0\t{}\t7", REPEAT)));
    assert_eq!(stdout.matches("edge\t0\t0\t").count(), 2);

    Ok(())
}

#[test]
fn command_search_no_arrays() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("criscan")?;
    cmd.arg("search").arg("tests/reads/plain.fa");
    cmd.assert().code(3);

    Ok(())
}

#[test]
fn command_search_bad_options() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("criscan")?;
    cmd.arg("search")
        .arg("--min-dr")
        .arg("50")
        .arg("--max-dr")
        .arg("40")
        .arg("tests/reads/plain.fa");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("repeat length"));

    Ok(())
}

#[test]
fn command_search_outdir() -> anyhow::Result<()> {
    let tempdir = TempDir::new()?;
    let outdir = tempdir.path().join("out");

    let mut cmd = Command::cargo_bin("criscan")?;
    cmd.arg("search")
        .arg("tests/reads/crispr.fa")
        .arg("-o")
        .arg(outdir.to_str().unwrap());
    cmd.assert().success();

    let summary = std::fs::read_to_string(outdir.join("crisprs.tsv"))?;
    assert!(summary.contains(REPEAT));

    let graph = std::fs::read_to_string(outdir.join("group_1.txt"))?;
    assert!(graph.contains(&format!("node\t0\t{}", REPEAT)));
    assert!(graph.contains("attached"));

    Ok(())
}

#[test]
fn command_search_gzipped_input() -> anyhow::Result<()> {
    let tempdir = TempDir::new()?;
    let gz_path = tempdir.path().join("crispr.fa.gz");

    // intspan::writer compresses when the name ends in .gz
    let content = std::fs::read_to_string("tests/reads/crispr.fa")?;
    let mut writer = intspan::writer(gz_path.to_str().unwrap());
    writer.write_all(content.as_bytes())?;
    drop(writer);

    let mut cmd = Command::cargo_bin("criscan")?;
    let output = cmd
        .arg("search")
        .arg(gz_path.to_str().unwrap())
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8(output.stdout)?.contains(REPEAT));

    Ok(())
}

#[test]
fn command_search_is_deterministic() -> anyhow::Result<()> {
    let run = || -> anyhow::Result<Vec<u8>> {
        let mut cmd = Command::cargo_bin("criscan")?;
        let output = cmd
            .arg("search")
            .arg("tests/reads/crispr.fa")
            .arg("tests/reads/plain.fa")
            .output()?;
        assert_eq!(output.status.code(), Some(0));
        Ok(output.stdout)
    };

    assert_eq!(run()?, run()?);

    Ok(())
}

#[test]
fn command_search_failed_file_exit_code() -> anyhow::Result<()> {
    // one good file, one missing: results are written, exit code is 2
    let mut cmd = Command::cargo_bin("criscan")?;
    let output = cmd
        .arg("search")
        .arg("tests/reads/crispr.fa")
        .arg("tests/file/doesnt/exist.fa")
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stdout)?.contains(REPEAT));

    Ok(())
}
