// SPDX-License-Identifier: GPL-2.0 OR MIT

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use fletch_exe_lib::{run, Cli, RunError};
use tempfile::TempDir;

/// Data that repeats a 16 byte pattern.
fn pattern(size: usize) -> Vec<u8> {
    const TEST_VECTOR_A: [u8; 16] = [
        0xbc, 0x4b, 0x4d, 0x58, 0x43, 0xca, 0x34, 0x35, 0xe4, 0xd0, 0x59, 0xe4, 0xd0, 0x2b, 0x08,
        0xe3,
    ];
    TEST_VECTOR_A.iter().copied().cycle().take(size).collect()
}

fn write_file(dir: &TempDir, name: &str, data: &[u8]) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.path().join(name);
    fs::write(&path, data)?;
    Ok(path)
}

/// Run the tool, returning stdout, stderr and the result.
fn fletch(args: &[&str], files: &[&Path]) -> (String, String, Result<(), RunError>) {
    let mut argv: Vec<String> = vec!["fletch".into()];
    argv.extend(args.iter().map(|a| a.to_string()));
    argv.extend(files.iter().map(|f| f.display().to_string()));

    let cli = Cli::try_parse_from(argv).unwrap();

    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = run(&cli, &mut out, &mut err);

    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
        result,
    )
}

#[test]
fn whole_file() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let hello = write_file(&dir, "hello.txt", b"Hello World!")?;
    let empty = write_file(&dir, "empty.bin", b"")?;

    let (out, _, result) = fletch(&[], &[&hello, &empty]);
    result?;

    let expected = format!(
        "4557dd28fd27f229 deae40defa3d37026f57206f8dd0d1ba 000000000000000c {}\n\
         0000000000000000 00000000000000000000000000000000 0000000000000000 {}\n",
        hello.display(),
        empty.display()
    );
    assert_eq!(out, expected);

    Ok(())
}

#[test]
fn single_checksum_modes() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let hello = write_file(&dir, "hello.txt", b"Hello World!")?;

    let (out, _, result) = fletch(&["-m", "fletcher64"], &[&hello]);
    result?;
    assert_eq!(
        out,
        format!("4557dd28fd27f229 000000000000000c {}\n", hello.display())
    );

    let (out, _, result) = fletch(&["--mode", "fletcher128"], &[&hello]);
    result?;
    assert_eq!(
        out,
        format!(
            "deae40defa3d37026f57206f8dd0d1ba 000000000000000c {}\n",
            hello.display()
        )
    );

    Ok(())
}

#[test]
fn striped_interleaves_words() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let hello = write_file(&dir, "hello.txt", b"Hello World!")?;

    // First word to stripe 0, padded tail word to stripe 1.
    let (out, _, result) = fletch(&["-b", "8", "-s", "2"], &[&hello]);
    result?;
    assert_eq!(
        out,
        format!(
            "6f57206f6c6c65486f57206f6c6c6548\
             0000000021646c720000000021646c72 000000000000000c {}\n",
            hello.display()
        )
    );

    Ok(())
}

#[test]
fn striped_one_stripe_matches_fletcher128() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "data.bin", &pattern(1003))?;

    let (whole, _, result) = fletch(&["-m", "fletcher128"], &[&path]);
    result?;

    // Small blocks force many reads, and an unaligned last one.
    let (striped, _, result) = fletch(&["-b", "16", "-s", "1"], &[&path]);
    result?;

    assert_eq!(whole, striped);

    Ok(())
}

#[test]
fn striped_block_size_does_not_change_result() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "data.bin", &pattern(4 * 3 * 64))?;

    let (a, _, result) = fletch(&["-b", "64", "-s", "3"], &[&path]);
    result?;

    let (b, _, result) = fletch(&["-b", "128", "-s", "3"], &[&path]);
    result?;

    let (c, _, result) = fletch(&["-b", "71", "-s", "3"], &[&path]);
    result?;

    assert_eq!(a, b);
    assert_eq!(a, c);

    Ok(())
}

#[test]
fn repeated_runs_are_identical() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let a = write_file(&dir, "a.bin", &pattern(777))?;
    let b = write_file(&dir, "b.bin", &pattern(64))?;

    let cases: [&[&str]; 2] = [&[], &["-s", "4", "-b", "32"]];

    for args in cases {
        let (first, _, result) = fletch(args, &[&a, &b, &a]);
        result?;
        let (second, _, result) = fletch(args, &[&a, &b, &a]);
        result?;

        assert_eq!(first, second);

        // Same file gives the same line, regardless of what came before.
        let lines: Vec<&str> = first.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], lines[2]);
    }

    Ok(())
}

#[test]
fn header() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let hello = write_file(&dir, "hello.txt", b"Hello World!")?;

    let (out, _, result) = fletch(&["--header"], &[&hello]);
    result?;

    let mut lines = out.lines();
    let header = lines.next().unwrap_or_default();
    assert!(header.starts_with("fletcher-64"));
    assert!(header.ends_with("file"));
    assert!(lines.next().unwrap_or_default().starts_with("4557dd28fd27f229"));

    Ok(())
}

#[test]
fn missing_file_fails_fast() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let hello = write_file(&dir, "hello.txt", b"Hello World!")?;
    let missing = dir.path().join("missing.bin");

    let (out, _, result) = fletch(&[], &[&missing, &hello]);

    match result {
        Err(e @ RunError::FileOpen { .. }) => assert_eq!(e.exit_code(), 1),
        other => panic!("expected open error, got {:?}", other),
    }

    // Nothing after the failing file.
    assert_eq!(out, "");

    Ok(())
}

#[test]
fn missing_file_keep_going() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let hello = write_file(&dir, "hello.txt", b"Hello World!")?;
    let missing = dir.path().join("missing.bin");

    let (out, err, result) = fletch(&["-k", "-s", "1"], &[&missing, &hello]);

    match result {
        Err(RunError::Failed { failed, total }) => {
            assert_eq!(failed, 1);
            assert_eq!(total, 2);
        }
        other => panic!("expected failed files, got {:?}", other),
    }

    assert!(err.contains("missing.bin"));
    assert_eq!(err.lines().count(), 1);
    assert!(out.ends_with(&format!("000000000000000c {}\n", hello.display())));

    Ok(())
}

#[test]
fn invalid_stripe_geometry_is_usage_error() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let hello = write_file(&dir, "hello.txt", b"Hello World!")?;

    let cases: [&[&str]; 4] = [
        &["-b", "7"],
        &["-s", "0"],
        &["-b", "18446744073709551608", "-s", "1"],
        &["-b", "4611686018427387904", "-s", "2"],
    ];

    for args in cases {
        let (_, _, result) = fletch(args, &[&hello]);

        match result {
            Err(e @ RunError::Usage { .. }) => assert_eq!(e.exit_code(), 2),
            other => panic!("expected usage error, got {:?}", other),
        }
    }

    Ok(())
}

#[cfg(target_pointer_width = "64")]
#[test]
fn unallocatable_geometry_is_usage_error() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let hello = write_file(&dir, "hello.txt", b"Hello World!")?;

    // Block buffer of isize::MAX - 7 bytes.
    let (_, _, result) = fletch(&["-b", "9223372036854775807", "-s", "1"], &[&hello]);
    match result {
        Err(e @ RunError::Allocation { .. }) => assert_eq!(e.exit_code(), 2),
        other => panic!("expected allocation error, got {:?}", other),
    }

    // Stripe accumulators of isize::MAX - 15 bytes.
    let (_, _, result) = fletch(&["-b", "8", "-s", "576460752303423487"], &[&hello]);
    match result {
        Err(e @ RunError::Usage { .. }) => assert_eq!(e.exit_code(), 2),
        other => panic!("expected usage error, got {:?}", other),
    }

    Ok(())
}

/// Directory with one entry, so it has a non zero size on every filesystem.
fn directory(dir: &TempDir) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.path().join("d");
    fs::create_dir(&path)?;
    fs::write(path.join("f"), b"f")?;
    Ok(path)
}

#[test]
fn directory_is_mapping_error() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let path = directory(&dir)?;

    let (out, _, result) = fletch(&[], &[&path]);
    match result {
        Err(e @ RunError::Mapping { .. }) => assert_eq!(e.exit_code(), 1),
        other => panic!("expected mapping error, got {:?}", other),
    }
    assert_eq!(out, "");

    Ok(())
}

#[test]
fn directory_is_read_error() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let path = directory(&dir)?;

    let (out, _, result) = fletch(&["-s", "2"], &[&path]);
    match result {
        Err(e @ RunError::Read { .. }) => assert_eq!(e.exit_code(), 1),
        other => panic!("expected read error, got {:?}", other),
    }
    assert_eq!(out, "");

    Ok(())
}
