//! Fixtures shared by the unit tests

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::mo::ByteOrder;
use crate::paths::{self, MAIN_SITE, SitePaths};

const MAGIC: u32 = 0x950412de;
const HEADER_SIZE: usize = 28;

/// Catalog metadata record declaring `plural_forms`
pub fn metadata(plural_forms: &str) -> String {
    format!(
        "Project-Id-Version: humm\nContent-Type: text/plain; charset=UTF-8\nPlural-Forms: {}\n",
        plural_forms
    )
}

/// Encode `entries` as a compiled catalog
///
/// Plural variants are written NUL-separated inside the strings.
pub fn build_mo(entries: &[(&str, &str)], order: ByteOrder) -> Vec<u8> {
    let count = entries.len();
    let originals_offset = HEADER_SIZE;
    let translations_offset = originals_offset + count * 8;
    let strings_offset = translations_offset + count * 8;

    let put = |out: &mut Vec<u8>, value: u32| match order {
        ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()),
        ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
    };

    let mut strings = Vec::new();
    let mut original_records = Vec::new();
    let mut translation_records = Vec::new();
    for (original, _) in entries {
        original_records.push((original.len(), strings_offset + strings.len()));
        strings.extend_from_slice(original.as_bytes());
        strings.push(0);
    }
    for (_, translation) in entries {
        translation_records.push((translation.len(), strings_offset + strings.len()));
        strings.extend_from_slice(translation.as_bytes());
        strings.push(0);
    }

    let mut out = Vec::new();
    put(&mut out, MAGIC);
    put(&mut out, 0);
    put(&mut out, count as u32);
    put(&mut out, originals_offset as u32);
    put(&mut out, translations_offset as u32);
    put(&mut out, 0);
    put(&mut out, 0);
    for (length, offset) in original_records.iter().chain(translation_records.iter()) {
        put(&mut out, *length as u32);
        put(&mut out, *offset as u32);
    }
    out.extend_from_slice(&strings);
    out
}

/// Catalog with a metadata record followed by `entries`
pub fn catalog_bytes(plural_forms: &str, entries: &[(&str, &str)], order: ByteOrder) -> Vec<u8> {
    let header = metadata(plural_forms);
    let mut all = vec![("", header.as_str())];
    all.extend_from_slice(entries);
    build_mo(&all, order)
}

/// Write `<locale_dir>/<lang>/<lang>.mo` and return its path
pub fn write_catalog(
    locale_dir: &Path,
    lang: &str,
    plural_forms: &str,
    entries: &[(&str, &str)],
) -> PathBuf {
    let file = paths::text_domain_file(locale_dir, lang);
    write_file(&file, catalog_bytes(plural_forms, entries, ByteOrder::Little));
    file
}

pub fn write_file(path: &Path, content: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Temporary installation root with the main site selected
pub struct Fixture {
    pub dir: TempDir,
    pub paths: SitePaths,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = SitePaths::new(dir.path(), MAIN_SITE);
        fs::create_dir_all(paths.site()).unwrap();
        Fixture { dir, paths }
    }

    /// Create an empty view file
    pub fn view(&self, dir: &Path, name: &str, content: &str) -> PathBuf {
        let file = dir.join(format!("{}.html", name));
        write_file(&file, content);
        file
    }

    /// Create a plugin directory with its marker file
    pub fn plugin(&self, name: &str) -> PathBuf {
        let root = self.paths.plugins().join(name);
        write_file(&paths::plugin_marker(&root, name), "");
        root
    }
}
