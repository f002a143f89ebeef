/// Extension-based file categorization.
///
/// A [`FileMapper`] holds an ordered list of named categories, each with a set of
/// lower-case extensions such as `.jpg`. Lookup scans the categories in order and
/// the first one listing the extension wins; an extension no category lists maps
/// to nothing and the file is left where it is.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::FileMapper;
///
/// let mut mapper = FileMapper::empty();
/// mapper.add_extension_mapping("images", ".jpg");
/// mapper.add_extension_mapping("backups", ".bak");
///
/// assert_eq!(mapper.classify(".JPG"), Some("images"));
/// assert_eq!(mapper.classify(".txt"), None);
/// ```
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A named destination bucket and the extensions that belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Folder name under the organized root.
    pub name: String,
    /// Extensions including the leading dot, lower-case.
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl Category {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|ext| normalize_extension(ext)).collect(),
        }
    }

    /// Returns true if this category lists `ext` (already normalized).
    pub fn contains(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }
}

/// Maps file extensions to categories, preserving category order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMapper {
    categories: Vec<Category>,
}

impl FileMapper {
    /// Creates a mapper from an ordered list of categories.
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Creates a mapper with no categories.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Populates the mapper with the standard category table.
    fn populate_standard_mappings(&mut self) {
        let table: &[(&str, &[&str])] = &[
            (
                "images",
                &[
                    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".tiff", ".raw",
                    ".ico", ".psd", ".ai", ".eps",
                ],
            ),
            (
                "music",
                &[
                    ".mp3", ".wav", ".aac", ".flac", ".m4a", ".wma", ".ogg", ".mid", ".midi",
                ],
            ),
            (
                "documents",
                &[
                    ".pdf", ".docx", ".txt", ".pptx", ".html", ".tex", ".doc", ".rtf", ".odt",
                    ".md", ".epub", ".mobi",
                ],
            ),
            (
                "videos",
                &[
                    ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".mpg",
                    ".mpeg", ".3gp",
                ],
            ),
            (
                "archives",
                &[
                    ".zip", ".tar", ".gz", ".rar", ".7z", ".bz2", ".xz", ".iso", ".tgz",
                ],
            ),
            ("3d-prints", &[".3mf", ".stl", ".obj", ".gcode", ".amf"]),
            ("executables", &[".exe", ".msi", ".bat", ".cmd", ".ps1", ".sh"]),
            ("vs-extensions", &[".vsix"]),
            ("disk-images", &[".iso", ".img", ".vhd", ".vmdk"]),
            ("poe", &[".filter"]),
            ("spreadsheets", &[".csv", ".xlsx", ".xls", ".ods"]),
            ("ai-models", &[".safetensors", ".onnx", ".pth", ".h5", ".pkl"]),
            ("psx-projects", &[".psxprj"]),
            (
                "windows-apps",
                &[".appx", ".appxbundle", ".appinstaller", ".msix"],
            ),
            (
                "config",
                &[".yml", ".yaml", ".json", ".xml", ".ini", ".conf", ".toml"],
            ),
            (
                "databases",
                &[".sqlite3", ".db", ".sqlite", ".sql", ".mdb", ".accdb"],
            ),
            ("audiobooks", &[".aax", ".m4b"]),
            (
                "code",
                &[
                    ".py", ".js", ".java", ".cpp", ".cs", ".php", ".rb", ".go", ".rs", ".swift",
                ],
            ),
            ("fonts", &[".ttf", ".otf", ".woff", ".woff2", ".eot"]),
            ("ebooks", &[".epub", ".mobi", ".azw", ".azw3", ".pdf"]),
            ("design", &[".psd", ".ai", ".xd", ".sketch", ".fig"]),
            ("subtitles", &[".srt", ".sub", ".ass", ".vtt"]),
            ("torrents", &[".torrent"]),
            ("backups", &[".bak", ".backup"]),
            ("certificates", &[".crt", ".cer", ".key", ".pem"]),
            ("export-lib", &[".exp"]),
            ("codesys-lib", &[".library"]),
            ("bin-files", &[".bin"]),
        ];

        for (name, extensions) in table {
            for ext in *extensions {
                self.add_extension_mapping(name, ext);
            }
        }
    }

    /// Adds an extension to a category, appending the category if it is new.
    pub fn add_extension_mapping(&mut self, category: &str, ext: &str) {
        let ext = normalize_extension(ext);
        match self.categories.iter_mut().find(|c| c.name == category) {
            Some(existing) => {
                if !existing.contains(&ext) {
                    existing.extensions.push(ext);
                }
            }
            None => self.categories.push(Category {
                name: category.to_string(),
                extensions: vec![ext],
            }),
        }
    }

    /// The categories in lookup order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Maps an extension (with leading dot, any case) to a category name.
    ///
    /// Categories are scanned in order; the first one listing the extension
    /// wins. Returns `None` for extensions no category lists.
    pub fn classify(&self, extension: &str) -> Option<&str> {
        let ext = extension.to_lowercase();
        self.categories
            .iter()
            .find(|category| category.contains(&ext))
            .map(|category| category.name.as_str())
    }

    /// Classifies a file by the extension of its name.
    pub fn classify_name(&self, file_name: &str) -> Option<&str> {
        extension_of(file_name).and_then(|ext| self.classify(&ext))
    }

    /// Extensions listed by more than one category, with the category that wins
    /// and the ones shadowed by it.
    pub fn shadowed_extensions(&self) -> Vec<(String, String, Vec<String>)> {
        let mut owners: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for category in &self.categories {
            for ext in &category.extensions {
                let entry = owners.entry(ext.as_str()).or_default();
                if entry.is_empty() {
                    order.push(ext.as_str());
                }
                if !entry.contains(&category.name.as_str()) {
                    entry.push(category.name.as_str());
                }
            }
        }

        order
            .into_iter()
            .filter_map(|ext| {
                let names = &owners[ext];
                let (winner, shadowed) = names.split_first()?;
                if shadowed.is_empty() {
                    return None;
                }
                Some((
                    ext.to_string(),
                    winner.to_string(),
                    shadowed.iter().map(|s| s.to_string()).collect(),
                ))
            })
            .collect()
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        let mut mapper = Self::empty();
        mapper.populate_standard_mappings();
        mapper
    }
}

/// Lower-cases an extension and makes sure it starts with a dot.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Returns the lower-case extension of a file name, including the dot.
///
/// Names with no dot, or a single leading dot (`.bashrc`), have no extension.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}
