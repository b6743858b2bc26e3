//! Scaffolding helpers around category text files and scraped HTML.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Url;
use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::cli::{DirPairArgs, DownloadArgs, ExtractLinksArgs};
use crate::fields::SEPARATOR;
use crate::util;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

pub fn mkdirs(args: DirPairArgs) -> Result<()> {
    let mut created = 0;
    for file in sorted_files(&args.input, "txt")? {
        for line in util::read_nonempty_lines(&file)? {
            match category_dir(&args.output, &line) {
                Some(dir) => {
                    util::ensure_directory(&dir)?;
                    created += 1;
                    info!(file = %file.display(), dir = %dir.display(), "created folder");
                }
                None => warn!(file = %file.display(), line = %line, "fewer than two levels, skipping"),
            }
        }
    }

    info!(output = %args.output.display(), created, "mkdirs complete");
    Ok(())
}

/// `output/L1/L2` for a line `L1|||L2|||…`; deeper levels are ignored.
pub fn category_dir(output: &Path, line: &str) -> Option<PathBuf> {
    let mut parts = line.split(SEPARATOR).map(str::trim);
    let first = parts.next()?;
    let second = parts.next()?;
    Some(output.join(first).join(second))
}

pub fn html_stubs(args: DirPairArgs) -> Result<()> {
    util::ensure_directory(&args.output)?;

    for file in sorted_files(&args.input, "txt")? {
        let Some(stem) = file.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let target = args.output.join(stem);
        util::ensure_directory(&target)?;

        let mut count = 0;
        for line in util::read_nonempty_lines(&file)? {
            let path = target.join(stub_file_name(&line));
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
            count += 1;
        }
        info!(file = %file.display(), dir = %target.display(), count, "created html stubs");
    }

    Ok(())
}

/// File name for a category line with path-unsafe characters replaced.
pub fn stub_file_name(line: &str) -> String {
    let joined = line.replace(SEPARATOR, "_");
    let safe: String = joined
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '<' | '>' | '|' => '-',
            '"' => '\'',
            other => other,
        })
        .collect();
    format!("{safe}.html")
}

pub fn extract_links(args: ExtractLinksArgs) -> Result<()> {
    let dirs = &args.dirs;
    util::ensure_directory(&dirs.output)?;
    let anchors = anchor_selector()?;

    for file in sorted_files(&dirs.input, "html")? {
        let raw = fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
        let links = collect_links(&anchors, &String::from_utf8_lossy(&raw), &args.base_url);

        let Some(stem) = file.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let target = dirs.output.join(format!("{stem}.txt"));
        let mut body = links.iter().map(String::as_str).collect::<Vec<_>>().join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        fs::write(&target, body).with_context(|| format!("failed to write {}", target.display()))?;
        info!(file = %file.display(), links = links.len(), target = %target.display(), "extracted links");
    }

    Ok(())
}

pub fn anchor_selector() -> Result<Selector> {
    Selector::parse("a[href]").map_err(|err| anyhow!("failed to parse anchor selector: {err}"))
}

/// `href` values of every anchor, prefixed with `base_url`, deduplicated and sorted.
pub fn collect_links(anchors: &Selector, html: &str, base_url: &str) -> BTreeSet<String> {
    Html::parse_document(html)
        .select(anchors)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(|href| format!("{base_url}{href}"))
        .collect()
}

pub fn download(args: DownloadArgs) -> Result<()> {
    let url = Url::parse(&args.url).with_context(|| format!("invalid URL: {}", args.url))?;
    let Some(name) = download_name(&url) else {
        bail!("URL has no file name: {url}");
    };
    util::ensure_directory(&args.output)?;
    let target = args.output.join(&name);

    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;
    let mut response = client
        .get(url.clone())
        .send()
        .and_then(|response| response.error_for_status())
        .with_context(|| format!("failed to download {url}"))?;

    let mut file =
        File::create(&target).with_context(|| format!("failed to create {}", target.display()))?;
    let bytes = response
        .copy_to(&mut file)
        .with_context(|| format!("failed to write {}", target.display()))?;

    info!(url = %url, path = %target.display(), bytes, "downloaded file");
    Ok(())
}

pub fn download_name(url: &Url) -> Option<String> {
    url.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(ToOwned::to_owned)
}

fn sorted_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files = util::list_files_with_extension(dir, ext)?;
    files.sort_by(|a, b| {
        util::natural_cmp(
            &a.file_name().unwrap_or_default().to_string_lossy(),
            &b.file_name().unwrap_or_default().to_string_lossy(),
        )
    });
    if files.is_empty() {
        warn!(dir = %dir.display(), ext, "no matching files");
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_dir_uses_first_two_levels() {
        let output = Path::new("out");
        assert_eq!(
            category_dir(output, "Men ||| Tops|||Shirts"),
            Some(output.join("Men").join("Tops"))
        );
        assert_eq!(category_dir(output, "Men"), None);
    }

    #[test]
    fn stub_file_name_replaces_unsafe_characters() {
        assert_eq!(
            stub_file_name("Men|||Tops/Tees|||\"Big\" & <Tall>?"),
            "Men_Tops-Tees_'Big' & -Tall--.html"
        );
    }

    #[test]
    fn collect_links_dedupes_and_sorts() {
        let html = r#"
            <ul>
              <li><a class="x" href="/p/2?a=1&amp;b=2">Two</a></li>
              <li><A HREF='/p/1'>One</A></li>
              <li><a href="/p/2?a=1&amp;b=2">Again</a></li>
              <li><a name="anchor">No link</a></li>
              <li><a href="">Empty</a></li>
            </ul>
        "#;
        let anchors = anchor_selector().expect("anchor selector");
        let links: Vec<String> = collect_links(&anchors, html, "https://shop.example")
            .into_iter()
            .collect();
        assert_eq!(
            links,
            vec![
                "https://shop.example/p/1".to_string(),
                "https://shop.example/p/2?a=1&b=2".to_string(),
            ]
        );
    }

    #[test]
    fn collect_links_reads_only_real_anchors() {
        let html = r#"
            <div data-href="/fake">Not an anchor</div>
            <span><b data-href="/also-fake">x</b></span>
            <!-- <a href="/commented-out">old</a> -->
            <script>var s = '<a href="/in-script">x</a>';</script>
            <a href="/p&#47;1">Numeric entity</a>
            <a data-href="/ignored" href="/real">Real</a>
        "#;
        let anchors = anchor_selector().expect("anchor selector");
        let links: Vec<String> = collect_links(&anchors, html, "https://shop.example")
            .into_iter()
            .collect();
        assert_eq!(
            links,
            vec![
                "https://shop.example/p/1".to_string(),
                "https://shop.example/real".to_string(),
            ]
        );
    }

    #[test]
    fn download_name_is_last_path_segment() {
        let url = Url::parse("https://cdn.example/images/a/photo.png?v=3").expect("url");
        assert_eq!(download_name(&url).as_deref(), Some("photo.png"));

        let bare = Url::parse("https://cdn.example/").expect("url");
        assert_eq!(download_name(&bare), None);
    }

    #[test]
    fn mkdirs_and_stubs_write_expected_layout() {
        let input = tempfile::tempdir().expect("input dir");
        let output = tempfile::tempdir().expect("output dir");
        fs::write(
            input.path().join("men.txt"),
            "Men|||Tops\nMen|||Shoes|||Boots\nLonely\n",
        )
        .expect("write categories");

        mkdirs(DirPairArgs {
            input: input.path().to_path_buf(),
            output: output.path().to_path_buf(),
        })
        .expect("mkdirs");
        assert!(output.path().join("Men").join("Tops").is_dir());
        assert!(output.path().join("Men").join("Shoes").is_dir());
        assert!(!output.path().join("Lonely").exists());

        let stubs = output.path().join("stubs");
        html_stubs(DirPairArgs {
            input: input.path().to_path_buf(),
            output: stubs.clone(),
        })
        .expect("html stubs");
        assert!(stubs.join("men").join("Men_Tops.html").is_file());
        assert!(stubs.join("men").join("Men_Shoes_Boots.html").is_file());
        assert!(stubs.join("men").join("Lonely.html").is_file());
    }
}
