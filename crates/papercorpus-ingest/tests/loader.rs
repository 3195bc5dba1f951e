use std::fs;
use std::path::PathBuf;

use papercorpus_ingest::{CorpusLoader, FailureKind, TextOrigin};

fn corpus(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

#[test]
fn outputs_are_index_aligned_and_hidden_files_skipped() {
    let dir = corpus(&[
        ("A1-title-1999.txt", "first text\n"),
        ("B2-title-2005.txt", "second text"),
        (".DS_Store", "junk"),
        (".C3-hidden-2010.txt", "hidden"),
    ]);

    let loaded = CorpusLoader::new().load(dir.path()).unwrap();
    assert!(loaded.is_clean());
    assert_eq!(loaded.len(), 2);

    let (texts, years, ref_ids, filenames) = loaded.into_parallel();
    assert_eq!(texts.len(), 2);
    assert_eq!(years.len(), 2);
    assert_eq!(ref_ids.len(), 2);
    assert_eq!(filenames.len(), 2);

    for i in 0..2 {
        let name = filenames[i].file_name().unwrap().to_str().unwrap();
        assert_eq!(filenames[i], dir.path().join(name));
        match name {
            "A1-title-1999.txt" => {
                assert_eq!(years[i], 1999);
                assert_eq!(ref_ids[i], "A1");
                assert_eq!(texts[i], "first text\n");
            }
            "B2-title-2005.txt" => {
                assert_eq!(years[i], 2005);
                assert_eq!(ref_ids[i], "B2");
                assert_eq!(texts[i], "second text");
            }
            other => panic!("unexpected file {other}"),
        }
    }
}

#[test]
fn content_is_read_verbatim() {
    let raw = "line one\r\nline two\n\n  indented\ttab caf\u{e9}\n";
    let dir = corpus(&[("Z9-raw-2020.txt", raw)]);

    let loaded = CorpusLoader::new().load(dir.path()).unwrap();
    let doc = &loaded.documents[0];
    assert_eq!(doc.text, raw);
    assert_eq!(doc.origin, TextOrigin::Persisted);
}

#[test]
fn bad_filenames_accumulate() {
    let dir = corpus(&[
        ("A1-good-1999.txt", "ok"),
        ("README", "no metadata here"),
        ("B2-noyear.txt", "missing year"),
    ]);

    let loaded = CorpusLoader::new().load(dir.path()).unwrap();
    assert_eq!(loaded.documents.len(), 1);
    assert_eq!(loaded.documents[0].ref_id, "A1");

    let mut bad: Vec<String> = loaded.failures.iter().map(|f| f.display_name()).collect();
    bad.sort();
    assert_eq!(bad, vec!["B2-noyear.txt", "README"]);
    assert!(loaded.failures.iter().all(|f| f.kind() == FailureKind::Metadata));
}

#[test]
fn strict_mode_aborts_on_first_failure() {
    let dir = corpus(&[("A1-good-1999.txt", "ok"), ("README", "x")]);
    let err = CorpusLoader::new().strict(true).load(dir.path()).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Metadata);
}

#[test]
fn non_utf8_content_is_io_failure() {
    let dir = corpus(&[("B2-fine-2000.txt", "fine")]);
    fs::write(dir.path().join("A1-latin1-1999.txt"), [0x63u8, 0x61, 0x66, 0xe9]).unwrap();

    let loaded = CorpusLoader::new().load(dir.path()).unwrap();
    assert_eq!(loaded.documents.len(), 1);
    assert_eq!(loaded.failures.len(), 1);
    assert_eq!(loaded.failures[0].kind(), FailureKind::Io);
    assert_eq!(loaded.failures[0].display_name(), "A1-latin1-1999.txt");
}

#[test]
fn subdirectories_are_not_documents() {
    let dir = corpus(&[("A1-title-1999.txt", "text")]);
    fs::create_dir(dir.path().join("C3-subdir-2001.txt")).unwrap();

    let loaded = CorpusLoader::new().load(dir.path()).unwrap();
    assert!(loaded.is_clean());
    assert_eq!(loaded.len(), 1);
}

#[test]
fn missing_directory_is_an_error() {
    let err = CorpusLoader::new()
        .load(&PathBuf::from("/nonexistent/papercorpus/txt"))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Io);
}

#[test]
fn empty_directory_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = CorpusLoader::new().load(dir.path()).unwrap();
    assert!(loaded.is_empty());
    let (texts, years, ref_ids, filenames) = loaded.into_parallel();
    assert!(texts.is_empty() && years.is_empty() && ref_ids.is_empty() && filenames.is_empty());
}
