use std::fs;

use super::*;

fn job_db(dir: &Path) -> PathBuf {
    let path = dir.join("config.db3");
    let connection = Connection::open(&path).expect("db");
    connection
        .execute_batch(
            r#"
            CREATE TABLE Job (JobId INTEGER PRIMARY KEY, JobName TEXT, XmlData TEXT);
            CREATE TABLE JobDatabase (JobId INTEGER, Name TEXT);
            INSERT INTO Job VALUES (1, 'one', '<Job JobName="one"><StartAddress>old</StartAddress><Rule/></Job>');
            INSERT INTO Job VALUES (2, 'two', '');
            INSERT INTO Job VALUES (3, 'three', '<broken>');
            INSERT INTO Job VALUES (4, 'four', '<Job/>');
            INSERT INTO JobDatabase VALUES (1, 'a');
            INSERT INTO JobDatabase VALUES (2, 'b');
            INSERT INTO JobDatabase VALUES (9, 'c');
            "#,
        )
        .expect("seed jobs");
    path
}

fn job(connection: &Connection, id: i64) -> store::JobRecord {
    store::fetch_job(connection, id)
        .expect("fetch")
        .expect("job exists")
}

#[test]
fn job_range_rejects_non_positive_and_reversed_bounds() {
    assert!(JobRange::new(0, 3).is_err());
    assert!(JobRange::new(5, 4).is_err());
    let range = JobRange::new(2, 4).expect("range");
    assert_eq!(range.len(), 3);
    assert_eq!(range.ids().collect::<Vec<_>>(), vec![2, 3, 4]);
}

#[test]
fn xml_patch_replaces_existing_start_address_and_job_name() {
    let patched = xml::patch_job_xml(
        r#"<Job JobName="old" Id="7"><Nested><StartAddress>keep</StartAddress></Nested><StartAddress>old <b>x</b></StartAddress></Job>"#,
        "Men|||Tops",
        "#FILE#C:/links/a&b.txt",
    )
    .expect("patch");

    assert!(patched.starts_with("<?xml"));
    assert!(patched.contains(r#"<Job JobName="Men|||Tops" Id="7">"#));
    assert!(patched.contains("<Nested><StartAddress>keep</StartAddress></Nested>"));
    assert!(patched.contains("<StartAddress>#FILE#C:/links/a&amp;b.txt</StartAddress></Job>"));
    assert!(!patched.contains("old"));
}

#[test]
fn xml_patch_inserts_start_address_first_and_recovers_from_bad_xml() {
    let inserted = xml::patch_job_xml("<Job><Rule/></Job>", "Shoes", "Shoes").expect("patch");
    assert!(inserted.contains(
        r#"<Job JobName="Shoes"><StartAddress>Shoes</StartAddress><Rule/></Job>"#
    ));

    let fallback = xml::patch_job_xml("<broken>", "Bags", "addr").expect("patch");
    assert!(fallback.contains(r#"<root JobName="Bags"><StartAddress>addr</StartAddress></root>"#));

    let empty_root = xml::patch_job_xml("  ", "Hats", "addr").expect("patch");
    assert!(empty_root.contains(r#"<root JobName="Hats">"#));

    let self_closing = xml::patch_job_xml("<Job/>", "Caps", "addr").expect("patch");
    assert!(self_closing.contains(
        r#"<Job JobName="Caps"><StartAddress>addr</StartAddress></Job>"#
    ));
}

#[test]
fn link_files_match_by_name_or_separator_substitute() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("Men___Tops.txt"), "x").expect("write");
    fs::write(dir.path().join("Shoes.TXT"), "x").expect("write");
    fs::write(dir.path().join("notes.md"), "x").expect("write");

    let files = LinkFiles::scan(dir.path()).expect("scan");
    assert_eq!(files.len(), 2);
    assert!(files.by_name("Men|||Tops").is_some());
    assert!(files.by_name("Shoes").is_some());
    assert!(files.by_name("Bags").is_none());

    let categories = vec!["Men|||Tops".to_string(), "Kids|||Toys".to_string()];
    let unmatched = matching::unmatched_categories(&categories, &files);
    assert_eq!(
        unmatched,
        vec![Unmatched {
            category: "Kids|||Toys".to_string(),
            expected_file: "Kids___Toys.txt".to_string(),
        }]
    );
}

#[test]
fn link_files_order_naturally() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in ["10.txt", "2.txt", "1.txt"] {
        fs::write(dir.path().join(name), "x").expect("write");
    }

    let files = LinkFiles::scan(dir.path()).expect("scan");
    let names: Vec<String> = (0..files.len())
        .filter_map(|index| files.by_position(index))
        .map(|path| path.file_name().expect("name").to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["1.txt", "2.txt", "10.txt"]);
}

#[test]
fn category_links_keep_file_line_numbers_and_last_link() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("links.txt");
    fs::write(
        &path,
        "\u{feff}Men|||https://a.example/old\n\nno separator\nShoes|||https://a.example/shoes\nMen|||https://a.example/new\n",
    )
    .expect("write");

    let links = CategoryLinks::load(&path).expect("links");
    assert_eq!(links.malformed_lines(), &[3]);
    assert_eq!(links.get("Men"), Some("https://a.example/new"));
    assert_eq!(
        links.iter().collect::<Vec<_>>(),
        vec![
            ("Men", "https://a.example/new"),
            ("Shoes", "https://a.example/shoes"),
        ]
    );
}

#[test]
fn category_links_split_on_last_separator() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("links.txt");
    fs::write(
        &path,
        "Men|||Tops|||https://a.example/tops\nbroken line\nShoes|||https://a.example/shoes\n",
    )
    .expect("write");

    let links = CategoryLinks::load(&path).expect("links");
    assert_eq!(links.len(), 2);
    assert_eq!(links.malformed_lines(), &[2]);
    assert_eq!(links.get("Men|||Tops"), Some("https://a.example/tops"));
    assert_eq!(links.get("Shoes"), Some("https://a.example/shoes"));

    let report = matching::write_failed_links_report(
        dir.path(),
        &["Shoes".to_string(), "Bags".to_string()],
        &links,
    )
    .expect("report");
    let body = fs::read_to_string(report).expect("read report");
    assert_eq!(body, "Shoes|||https://a.example/shoes\nBags|||(no link)\n");
}

#[test]
fn assign_by_category_patches_every_job_in_range() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = job_db(dir.path());
    let connection = Connection::open(&db_path).expect("db");
    let range = JobRange::new(1, 5).expect("range");
    let categories = vec![
        "A".to_string(),
        "B".to_string(),
        "C".to_string(),
        "D".to_string(),
        "E".to_string(),
    ];

    let outcome = assign_jobs(
        &connection,
        range,
        &categories,
        &StartSource::Category,
        false,
        &Progress::hidden(),
    )
    .expect("assign");

    assert_eq!(outcome.processed, 4);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.failed, 0);

    let first = job(&connection, 1);
    assert_eq!(first.job_name.as_deref(), Some("A"));
    let xml = first.xml_data.expect("xml");
    assert!(xml.contains(r#"<Job JobName="A"><StartAddress>A</StartAddress><Rule/></Job>"#));

    let broken = job(&connection, 3).xml_data.expect("xml");
    assert!(broken.contains(r#"<root JobName="C"><StartAddress>C</StartAddress></root>"#));
}

#[test]
fn assign_by_name_skips_unmatched_categories_and_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = job_db(dir.path());
    let links_dir = dir.path().join("links");
    fs::create_dir_all(&links_dir).expect("mkdir");
    fs::write(links_dir.join("A.txt"), "x").expect("write");

    let connection = Connection::open(&db_path).expect("db");
    let source = StartSource::Files {
        files: LinkFiles::scan(&links_dir).expect("scan"),
        mode: LinkMatch::Name,
        prefix: true,
    };
    let categories = vec!["A".to_string(), "Missing".to_string()];

    let outcome = assign_jobs(
        &connection,
        JobRange::new(1, 2).expect("range"),
        &categories,
        &source,
        true,
        &Progress::hidden(),
    )
    .expect("assign");
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.failed_categories, vec!["Missing".to_string()]);
    assert_eq!(job(&connection, 1).job_name.as_deref(), Some("one"));

    let outcome = assign_jobs(
        &connection,
        JobRange::new(1, 2).expect("range"),
        &categories,
        &source,
        false,
        &Progress::hidden(),
    )
    .expect("assign");
    assert_eq!(outcome.processed, 1);
    let xml = job(&connection, 1).xml_data.expect("xml");
    assert!(xml.contains("<StartAddress>#FILE#"));
    assert!(xml.contains("A.txt</StartAddress>"));
    assert_eq!(job(&connection, 2).job_name.as_deref(), Some("two"));
}

#[test]
fn job_count_is_capped_by_categories_and_ordered_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("1.txt"), "x").expect("write");
    let range = JobRange::new(10, 19).expect("range");
    let categories = vec!["A".to_string(), "B".to_string(), "C".to_string()];

    assert_eq!(planned_job_count(range, &categories, &StartSource::Category), 3);

    let ordered = StartSource::Files {
        files: LinkFiles::scan(dir.path()).expect("scan"),
        mode: LinkMatch::Order,
        prefix: false,
    };
    assert_eq!(planned_job_count(range, &categories, &ordered), 1);

    let by_name = StartSource::Files {
        files: LinkFiles::scan(dir.path()).expect("scan"),
        mode: LinkMatch::Name,
        prefix: false,
    };
    assert_eq!(planned_job_count(range, &categories, &by_name), 3);
}

#[test]
fn remove_deletes_related_rows_and_keeps_backup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = job_db(dir.path());

    remove(JobsRemoveArgs {
        job: crate::cli::JobDbArgs {
            db_path: db_path.clone(),
            start: 1,
            end: 2,
        },
        dry_run: false,
        backup: true,
        keep_related: false,
    })
    .expect("remove");

    let connection = Connection::open(&db_path).expect("db");
    let jobs: i64 = connection
        .query_row("SELECT COUNT(*) FROM Job", [], |row| row.get(0))
        .expect("count");
    let related: i64 = connection
        .query_row("SELECT COUNT(*) FROM JobDatabase", [], |row| row.get(0))
        .expect("count");
    assert_eq!(jobs, 2);
    assert_eq!(related, 1);
    assert!(dir.path().join("config.db3.bak").is_file());
}
