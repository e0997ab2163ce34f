//! Extension-based file categorization.
//!
//! A [`CategoryMap`] is an ordered list of category rules plus a fallback
//! category. Lookups walk the rules in order and the first rule that claims
//! an extension wins, so the order of the table is part of its behavior.
//!
//! # Examples
//!
//! ```
//! use dirsort::file_category::CategoryMap;
//!
//! let map = CategoryMap::standard();
//! assert_eq!(map.classify("holiday.JPG"), "Images");
//! assert_eq!(map.classify("report.pdf"), "Documents");
//! assert_eq!(map.classify("Makefile"), "Others");
//! ```

use std::collections::HashSet;

/// Name of the category used when no rule matches.
pub const FALLBACK_CATEGORY: &str = "Others";

/// A named category and the extensions it claims.
///
/// Extensions are stored lowercased with their leading dot (`".jpg"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    name: String,
    extensions: HashSet<String>,
}

impl CategoryRule {
    /// Creates a rule. Extensions may be given with or without the leading
    /// dot and in any case.
    pub fn new(name: impl Into<String>, extensions: &[&str]) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .filter(|ext| !ext.is_empty())
            .collect();
        Self {
            name: name.into(),
            extensions,
        }
    }

    /// The category name, which is also the destination directory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if this rule claims `extension` (lowercase, dotted).
    pub fn claims(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Returns the lowercased extension of a file name or path, including the
/// leading dot.
///
/// Only the final suffix counts, and a name whose only dot is the leading
/// one (a dotfile) has no extension.
///
/// ```
/// use dirsort::file_category::extension_of;
///
/// assert_eq!(extension_of("archive.tar.GZ"), ".gz");
/// assert_eq!(extension_of(".bashrc"), "");
/// assert_eq!(extension_of("noext"), "");
/// ```
pub fn extension_of(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rfind('.') {
        None | Some(0) => String::new(),
        Some(idx) => base[idx..].to_lowercase(),
    }
}

/// Ordered extension table with a designated fallback category.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    rules: Vec<CategoryRule>,
    fallback: String,
}

impl CategoryMap {
    /// Creates a map from explicit rules. Rule order is preserved.
    pub fn new(rules: Vec<CategoryRule>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    /// The built-in table.
    pub fn standard() -> Self {
        Self::new(
            vec![
                CategoryRule::new(
                    "Images",
                    &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "tiff"],
                ),
                CategoryRule::new(
                    "Documents",
                    &[
                        "pdf", "doc", "docx", "txt", "xls", "xlsx", "ppt", "pptx", "odt", "rtf",
                    ],
                ),
                CategoryRule::new("Videos", &["mp4", "avi", "mov", "mkv", "webm", "flv"]),
                CategoryRule::new("Audio", &["mp3", "wav", "flac", "aac", "ogg"]),
                CategoryRule::new("Archives", &["zip", "tar", "gz", "bz2", "7z", "rar"]),
                CategoryRule::new(
                    "Code",
                    &[
                        "py", "js", "ts", "css", "html", "json", "xml", "yaml", "yml", "md", "mdx",
                    ],
                ),
                CategoryRule::new(
                    "Programs",
                    &["exe", "msi", "app", "dmg", "pkg", "deb", "rpm", "iso"],
                ),
            ],
            FALLBACK_CATEGORY,
        )
    }

    /// The rules in lookup order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Name of the fallback category.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Returns the category for a file name or path.
    ///
    /// This never fails: anything unclaimed goes to the fallback category.
    pub fn classify(&self, file_name: &str) -> &str {
        let extension = extension_of(file_name);
        if extension.is_empty() {
            return &self.fallback;
        }
        self.rules
            .iter()
            .find(|rule| rule.claims(&extension))
            .map(CategoryRule::name)
            .unwrap_or(&self.fallback)
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::standard()
    }
}
