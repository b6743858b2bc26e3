use std::path::{Path, PathBuf};

use tracing::warn;

use crate::fields;
use crate::woo::{ImageRef, Storefront};

/// Builds the product image list from a `|||` image field.
///
/// URLs pass through. Local names are looked up in `folder`, then
/// `folder/images`, and uploaded when `upload` is set. Anything that cannot
/// be uploaded keeps its raw value.
pub fn resolve_images<S: Storefront + ?Sized>(
    store: &S,
    raw: &str,
    folder: &Path,
    upload: bool,
) -> Vec<ImageRef> {
    fields::split_multi(raw)
        .into_iter()
        .enumerate()
        .map(|(position, value)| ImageRef {
            src: resolve_one(store, &value, folder, upload),
            position,
        })
        .collect()
}

fn resolve_one<S: Storefront + ?Sized>(store: &S, value: &str, folder: &Path, upload: bool) -> String {
    if fields::is_http_url(value) {
        return value.to_string();
    }

    let Some(path) = local_image(folder, value) else {
        warn!(folder = %folder.display(), image = value, "local image not found, using raw value");
        return value.to_string();
    };
    if !upload {
        return value.to_string();
    }

    match store.upload_media(&path) {
        Ok(url) => url,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "image upload failed, using raw value");
            value.to_string()
        }
    }
}

pub fn local_image(folder: &Path, name: &str) -> Option<PathBuf> {
    let direct = folder.join(name);
    if direct.is_file() {
        return Some(direct);
    }
    let nested = folder.join("images").join(name);
    nested.is_file().then_some(nested)
}
