use super::*;

fn content_db() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory db");
    connection
        .execute_batch(
            r#"
            CREATE TABLE Content (
                "ID" INTEGER PRIMARY KEY,
                "标题" TEXT,
                "分类" TEXT,
                "图片" TEXT,
                "销售价" TEXT,
                "折扣价" TEXT,
                "SKU" TEXT,
                "颜色1" TEXT,
                "颜色" TEXT,
                "已发" INTEGER DEFAULT 0,
                "PageUrl" TEXT
            );
            "#,
        )
        .expect("create table");
    connection
}

fn insert(connection: &Connection, id: i64, sku: &str, price: &str, image: Option<&str>) {
    connection
        .execute(
            r#"INSERT INTO Content ("ID", "标题", "SKU", "销售价", "图片") VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![id, format!("Item {id}"), sku, price, image],
        )
        .expect("insert row");
}

fn text(connection: &Connection, column: &str, id: i64) -> Option<String> {
    connection
        .query_row(
            &format!(
                "SELECT {} FROM Content WHERE \"ID\" = ?1",
                quote_ident(column)
            ),
            [id],
            |row| Ok(text_value(row.get_ref(0)?)),
        )
        .expect("select value")
}

#[test]
fn dedupe_keeps_lowest_id_per_sku_and_backs_up_table() {
    let connection = content_db();
    insert(&connection, 3, "A", "10", Some("a.jpg"));
    insert(&connection, 1, "A", "10", Some("a.jpg"));
    insert(&connection, 2, "B", "20", Some("b.jpg"));
    insert(&connection, 4, "B", "20", Some("b.jpg"));

    let stats = duplicate_stats(&connection, "Content").expect("stats");
    assert_eq!(stats.total_rows, 4);
    assert_eq!(stats.duplicate_groups, 2);

    let backup = backup_table(&connection, "Content").expect("backup");
    let deleted = dedupe_by_sku(&connection, "Content").expect("dedupe");

    assert_eq!(deleted, 2);
    assert_eq!(row_count(&connection, &backup).expect("backup count"), 4);
    let ids: Vec<i64> = load_rows(&connection, "Content")
        .expect("rows")
        .into_iter()
        .filter_map(|row| row.id)
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn rows_without_images_are_deleted() {
    let connection = content_db();
    insert(&connection, 1, "A", "10", Some("a.jpg"));
    insert(&connection, 2, "B", "10", Some("   "));
    insert(&connection, 3, "C", "10", None);

    assert_eq!(
        duplicate_stats(&connection, "Content")
            .expect("stats")
            .rows_without_images,
        2
    );
    assert_eq!(
        delete_rows_without_images(&connection, "Content").expect("delete"),
        2
    );
    assert_eq!(row_count(&connection, "Content").expect("count"), 1);
}

#[test]
fn discount_only_touches_numeric_prices() {
    let connection = content_db();
    insert(&connection, 1, "A", "100", None);
    insert(&connection, 2, "B", "19.99", None);
    insert(&connection, 3, "C", "call us", None);

    assert_eq!(count_numeric_prices(&connection, "Content").expect("count"), 2);
    assert_eq!(apply_discount(&connection, "Content", 0.3).expect("discount"), 2);

    assert_eq!(text(&connection, "折扣价", 1).as_deref(), Some("30.00"));
    assert_eq!(text(&connection, "折扣价", 2).as_deref(), Some("6.00"));
    assert_eq!(text(&connection, "折扣价", 3), None);
}

#[test]
fn currency_conversion_derives_sale_from_converted_price() {
    let connection = content_db();
    insert(&connection, 1, "A", "100", None);

    convert_currency(&connection, "Content", 0.5, 0.2).expect("convert");

    assert_eq!(text(&connection, "销售价", 1).as_deref(), Some("50.00"));
    assert_eq!(text(&connection, "折扣价", 1).as_deref(), Some("10.00"));
}

#[test]
fn replace_copy_and_set_column() {
    let connection = content_db();
    insert(&connection, 1, "A", "1", Some("https:////cdn.example/a.jpg"));
    insert(&connection, 2, "B", "1", Some("https://cdn.example/b.jpg"));
    connection
        .execute(r#"UPDATE Content SET "颜色1" = 'Red' WHERE "ID" = 1"#, [])
        .expect("seed color");
    connection
        .execute(r#"UPDATE Content SET "颜色" = 'Keep' WHERE "ID" = 2"#, [])
        .expect("seed color");

    let replaced =
        replace_in_column(&connection, "Content", "图片", "https:////", "https://").expect("replace");
    assert_eq!(replaced, 1);
    assert_eq!(
        text(&connection, "图片", 1).as_deref(),
        Some("https://cdn.example/a.jpg")
    );

    assert_eq!(copy_column(&connection, "Content", "颜色1", "颜色").expect("copy"), 1);
    assert_eq!(text(&connection, "颜色", 1).as_deref(), Some("Red"));
    assert_eq!(text(&connection, "颜色", 2).as_deref(), Some("Keep"));

    assert_eq!(
        set_column_all(&connection, "Content", "规格", "XS|||S").expect("set"),
        2
    );
    assert_eq!(text(&connection, "规格", 2).as_deref(), Some("XS|||S"));
    assert!(!ensure_column(&connection, "Content", "规格").expect("ensure"));
}

#[test]
fn size_extractor_separates_sizes_from_colors() {
    let extractor = SizeExtractor::new().expect("extractor");

    assert_eq!(
        extractor.split("Black / M|||Black / l|||Navy Blue|||Navy / xs"),
        ("Black|||Navy Blue|||Navy".to_string(), "M|||L|||XS".to_string())
    );
    // Only `X`, `XX`, `XXX` and their `S` forms are recognised; `XL` stays a color.
    assert_eq!(
        extractor.split("Grey / XL"),
        ("Grey / XL".to_string(), String::new())
    );
    assert_eq!(
        extractor.split("Small Print|||2x"),
        ("Small Print".to_string(), "2X".to_string())
    );
    assert_eq!(extractor.split(""), (String::new(), String::new()));
}

#[test]
fn split_colors_writes_color_and_size_columns() {
    let connection = content_db();
    ensure_column(&connection, "Content", "规格").expect("size column");
    insert(&connection, 1, "A", "1", None);
    connection
        .execute(
            r#"UPDATE Content SET "颜色1" = 'Red / S|||Red / M' WHERE "ID" = 1"#,
            [],
        )
        .expect("seed");

    let extractor = SizeExtractor::new().expect("extractor");
    assert_eq!(
        split_colors(&connection, "Content", "颜色1", &extractor).expect("split"),
        1
    );
    assert_eq!(text(&connection, "颜色", 1).as_deref(), Some("Red"));
    assert_eq!(text(&connection, "规格", 1).as_deref(), Some("S|||M"));
}

#[test]
fn random_skus_are_unique_and_prefixed() {
    let connection = content_db();
    for id in 1..=20 {
        insert(&connection, id, "dup", "1", None);
    }

    let mut generator = SkuGenerator::new("SKU", 10).expect("generator");
    let updated =
        assign_random_skus(&connection, "Content", columns::SKU, &mut generator).expect("assign");
    assert_eq!(updated, 20);
    assert_eq!(generator.issued(), 20);

    let skus: BTreeSet<String> = load_rows(&connection, "Content")
        .expect("rows")
        .iter()
        .filter_map(|row| row.get(columns::SKU).map(ToOwned::to_owned))
        .collect();
    assert_eq!(skus.len(), 20);
    assert!(skus.iter().all(|sku| sku.len() == 13
        && sku.starts_with("SKU")
        && sku[3..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())));
}

#[test]
fn sku_generator_stops_when_space_is_exhausted() {
    let mut generator = SkuGenerator::new("P", 1).expect("generator");
    for _ in 0..36 {
        generator.next_sku().expect("sku");
    }
    assert!(generator.next_sku().is_err());
    assert!(SkuGenerator::new("P", 0).is_err());
}

#[test]
fn fill_category_touches_only_empty_values_in_keyword_columns() {
    let connection = content_db();
    connection
        .execute_batch(
            r#"
            CREATE TABLE Extra ("Type" TEXT, "Note" TEXT);
            INSERT INTO Extra VALUES (NULL, NULL);
            INSERT INTO Extra VALUES ('Shoes', '');
            "#,
        )
        .expect("extra table");
    insert(&connection, 1, "A", "1", None);
    insert(&connection, 2, "B", "1", None);
    connection
        .execute(r#"UPDATE Content SET "分类" = 'NULL' WHERE "ID" = 1"#, [])
        .expect("seed");
    connection
        .execute(r#"UPDATE Content SET "分类" = 'Bags' WHERE "ID" = 2"#, [])
        .expect("seed");

    let filled = fill_empty_category_columns(&connection, "Men|||Tops").expect("fill");

    assert_eq!(filled, 2);
    assert_eq!(text(&connection, "分类", 1).as_deref(), Some("Men|||Tops"));
    assert_eq!(text(&connection, "分类", 2).as_deref(), Some("Bags"));
    let notes: i64 = connection
        .query_row(r#"SELECT COUNT(*) FROM Extra WHERE "Note" IS NULL"#, [], |row| {
            row.get(0)
        })
        .expect("notes");
    assert_eq!(notes, 1);
}

#[test]
fn sent_flags_and_published_categories() {
    let connection = content_db();
    insert(&connection, 1, "A", "1", None);
    insert(&connection, 2, "B", "1", None);
    connection
        .execute(r#"UPDATE Content SET "分类" = 'Men|||Tops'"#, [])
        .expect("seed");

    mark_sent(&connection, "Content", 1, Some("https://shop.example/p/1")).expect("mark");
    mark_sent(&connection, "Content", 2, None).expect("mark");

    let rows = load_rows(&connection, "Content").expect("rows");
    assert!(rows.iter().all(ContentRow::is_sent));
    assert_eq!(rows[0].get(columns::PAGE_URL), Some("https://shop.example/p/1"));
    assert_eq!(rows[1].get(columns::PAGE_URL), None);
    assert_eq!(sent_count(&connection, "Content").expect("sent"), 2);

    let paths = published_category_paths(&connection, "Content").expect("paths");
    assert_eq!(paths.into_iter().collect::<Vec<_>>(), vec!["Men|||Tops"]);

    assert_eq!(reset_sent_flags(&connection, "Content").expect("reset"), 2);
    assert!(published_category_paths(&connection, "Content")
        .expect("paths")
        .is_empty());
}
