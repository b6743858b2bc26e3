use super::transforms::*;
use super::*;

fn sheet(headers: &[&str], rows: &[&[&str]]) -> Table {
    let mut table = Table::new(headers.iter().map(|value| value.to_string()).collect());
    for row in rows {
        table.push_row(row.iter().map(|value| value.to_string()).collect());
    }
    table
}

fn options(base: Option<&str>) -> TransformOptions {
    TransformOptions {
        images: base.map(|base| ImageRewriter::new(base, "-2").expect("rewriter")),
        sizes: SizeCleaner::new().expect("cleaner"),
    }
}

#[test]
fn image_urls_move_to_upload_directory_with_suffix() {
    let rewriter =
        ImageRewriter::new("https://shop.example/wp-content/uploads/2025/08/", "-2").expect("rewriter");

    assert_eq!(
        rewriter.rewrite(
            "http://src.example/cdn/shop/files/red.jpg?v=123|||https://other.example/img.png|||"
        ),
        "https://shop.example/wp-content/uploads/2025/08/red-2.jpg, https://other.example/img.png"
    );
    assert_eq!(
        rewriter.rewrite_url("https://src.example/files/noext"),
        "https://shop.example/wp-content/uploads/2025/08/noext-2"
    );
}

#[test]
fn size_cleaner_strips_markup_and_sorts_unique_values() {
    let cleaner = SizeCleaner::new().expect("cleaner");

    assert_eq!(
        cleaner.clean("<span>Blue Sage / L</span>|||Blue Sage / L|||M disabled|||['XS']"),
        "Blue Sage / L, M, XS"
    );
    assert_eq!(cleaner.clean("value='x' 删除 one size"), "one size");
    assert_eq!(cleaner.clean("a/|||x"), "");
}

#[test]
fn transforms_reshape_columns_for_importer() {
    let mut table = sheet(
        &["ID", "标题", "分类", "图片", "颜色", "规格", "销售价", "折扣价"],
        &[&[
            "1",
            "Shirt",
            "Men|||Tops",
            "https://src.example/files/a.jpg",
            "Red|||Blue",
            "S|||M",
            "10",
            "7",
        ]],
    );

    let applied = apply_transforms(&mut table, &options(Some("https://shop.example/up")));

    assert_eq!(
        applied,
        vec![
            "nested-categories",
            "title-to-name",
            "image-urls",
            "color-attribute",
            "size-attribute",
            "price-columns"
        ]
    );
    assert_eq!(
        table.headers(),
        &[
            "ID",
            "名称",
            "分类",
            "图片",
            "常规售价",
            "促销价格",
            "属性 1 名称",
            "属性 1 值",
            "属性 1 可见",
            "属性 1  的全局",
            "属性 2 名称",
            "属性 2 值",
            "属性 2 可见",
            "属性 2  的全局",
        ]
    );
    assert_eq!(table.value(0, "分类"), Some("Men > Tops, Men"));
    assert_eq!(table.value(0, "图片"), Some("https://shop.example/up/a-2.jpg"));
    assert_eq!(table.value(0, "属性 1 值"), Some("Red, Blue"));
    assert_eq!(table.value(0, "属性 2 名称"), Some("Size"));
    assert_eq!(table.value(0, "属性 2 值"), Some("M, S"));
    assert_eq!(table.value(0, "属性 1 可见"), Some("1"));
}

#[test]
fn missing_columns_skip_their_steps() {
    let mut table = sheet(&["ID", "销售价"], &[&["1", "10"]]);

    let applied = apply_transforms(&mut table, &options(None));

    assert!(applied.is_empty());
    assert_eq!(table.headers(), &["ID", "销售价"]);
}

#[test]
fn export_drops_duplicate_columns_and_round_trips_bom() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("SpiderResult.db3");
    let connection = Connection::open(&db_path).expect("db");
    connection
        .execute_batch(
            r#"
            CREATE TABLE Content ("ID" INTEGER, "标题" TEXT, "颜色重复" TEXT, "Color_Duplicate" TEXT);
            INSERT INTO Content VALUES (1, 'Shirt, "classic"', 'x', 'y');
            INSERT INTO Content VALUES (2, NULL, 'x', 'y');
            "#,
        )
        .expect("seed");
    drop(connection);

    let target = dir.path().join("Content.csv");
    let rows = export_folder(&db_path, "Content", &target)
        .expect("export")
        .expect("table present");
    assert_eq!(rows, 2);

    let raw = std::fs::read(&target).expect("read csv");
    assert!(raw.starts_with(b"\xEF\xBB\xBF"));

    let table = Table::read_csv(&target).expect("parse csv");
    assert_eq!(table.headers(), &["ID", "标题"]);
    assert_eq!(table.value(0, "标题"), Some("Shirt, \"classic\""));
    assert_eq!(table.value(1, "标题"), Some(""));

    assert!(export_folder(&db_path, "Missing", &target)
        .expect("export")
        .is_none());
}

#[test]
fn format_categories_rewrites_named_field_in_every_csv() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = sheet(&["Name", "Categories"], &[&["a", "Home|||Decor|||Lamps"]]);
    table
        .write_csv(&dir.path().join("one.csv"))
        .expect("write one");
    sheet(&["Name"], &[&["b"]])
        .write_csv(&dir.path().join("two.CSV"))
        .expect("write two");

    format_categories(CsvCategoriesArgs {
        dir: dir.path().to_path_buf(),
        field: "Categories".to_string(),
    })
    .expect("format");

    let table = Table::read_csv(&dir.path().join("one.csv")).expect("read");
    assert_eq!(
        table.value(0, "Categories"),
        Some("Home > Decor, Home > Decor > Lamps, Home")
    );
    let untouched = Table::read_csv(&dir.path().join("two.CSV")).expect("read");
    assert_eq!(untouched.headers(), &["Name"]);
}
