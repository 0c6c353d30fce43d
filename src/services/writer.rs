use crate::models::IdentifierMapping;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use thiserror::Error;

/// Output file locations, relative to each style's root.
pub mod layout {
    pub const DEF_INDEXES: &str = "steam_indexes/def_indexes.json";
    pub const PAINT_INDEXES: &str = "steam_indexes/paint_indexes.json";

    pub const AGENTS: &str = "steam_grouped_ids/agents.json";
    pub const COLLECTIBLES: &str = "steam_grouped_ids/collectibles.json";
    pub const CRATES: &str = "steam_grouped_ids/crates.json";
    pub const GRAFFITI: &str = "steam_grouped_ids/graffiti.json";
    pub const HIGHLIGHTS: &str = "steam_grouped_ids/highlights.json";
    pub const KEYCHAINS: &str = "steam_grouped_ids/keychains.json";
    pub const KEYS: &str = "steam_grouped_ids/keys.json";
    pub const MUSIC_KITS: &str = "steam_grouped_ids/music_kits.json";
    pub const PATCHES: &str = "steam_grouped_ids/patches.json";
    pub const STICKERS: &str = "steam_grouped_ids/stickers.json";

    pub const STEAM_MARKET: &str = "market_ids/steam.json";
    pub const BUFF_MARKET: &str = "market_ids/buff_market.json";

    pub const BUFF163_STICKERS: &str = "buff163_grouped_ids/stickers.json";
    pub const BUFF163_PAINTSEED_GROUPS: &str = "buff163_grouped_ids/paintseed_group_ids.json";
    pub const BUFF163_PHASES: &str = "buff163_grouped_ids/phases.json";
    pub const BUFF163_TAGS: &str = "buff163_grouped_ids/tags.json";
    pub const BUFF163_PATCHES: &str = "buff163_grouped_ids/patches.json";
    pub const BUFF163_PATTERNS: &str = "buff163_grouped_ids/patterns.json";

    /// Directories created under both style roots before any write
    pub const GROUP_DIRS: [&str; 4] = [
        "buff163_grouped_ids",
        "steam_grouped_ids",
        "steam_indexes",
        "market_ids",
    ];

    /// Regional market file for an output stem such as `c5game`
    pub fn regional_market(stem: &str) -> String {
        format!("market_ids/{}.json", stem)
    }
}

/// Serialization style of one output tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    /// No whitespace, under `mini/`
    Compact,
    /// Four-space indentation, under `pretty/`
    Pretty,
}

impl Style {
    pub const ALL: [Style; 2] = [Style::Compact, Style::Pretty];

    pub fn dir_name(self) -> &'static str {
        match self {
            Style::Compact => "mini",
            Style::Pretty => "pretty",
        }
    }
}

/// Errors that can occur while publishing one output file
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create file {path}: {source}")]
    CreateFile {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode data to JSON for {path}: {source}")]
    Encode {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Write task for {path} aborted: {message}")]
    Task { path: Utf8PathBuf, message: String },
}

/// One dataset ready for publication: a relative path and a key-sorted JSON document.
///
/// Both styles are rendered from this single value, so the compact and pretty files
/// cannot diverge.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    relative_path: Utf8PathBuf,
    document: Value,
}

impl Artifact {
    /// Snapshot a mapping with its top-level keys sorted.
    ///
    /// Nested maps in this crate are `BTreeMap`s, so every level comes out sorted.
    pub fn from_mapping<T: Serialize>(
        relative_path: impl Into<Utf8PathBuf>,
        mapping: &IdentifierMapping<T>,
    ) -> Result<Self, WriteError> {
        let relative_path = relative_path.into();
        let sorted: BTreeMap<&String, &T> = mapping.iter().collect();
        let document = serde_json::to_value(&sorted).map_err(|source| WriteError::Encode {
            path: relative_path.clone(),
            source,
        })?;

        Ok(Self {
            relative_path,
            document,
        })
    }

    pub fn relative_path(&self) -> &Utf8Path {
        &self.relative_path
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

/// Render a document in the given style, with a trailing newline.
///
/// This is the exact byte content [`Writer::write`] puts on disk.
pub fn encode(document: &Value, style: Style) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    match style {
        Style::Compact => serde_json::to_writer(&mut buffer, document)?,
        Style::Pretty => {
            let formatter = PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
            document.serialize(&mut serializer)?;
        }
    }
    buffer.push(b'\n');
    Ok(buffer)
}

/// Writes artifacts into the `mini/` and `pretty/` trees under a root directory.
#[derive(Debug, Clone)]
pub struct Writer {
    root: Utf8PathBuf,
}

impl Writer {
    pub fn new<P: AsRef<Utf8Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute location of an artifact in the given style's tree.
    pub fn path_for(&self, style: Style, relative_path: &Utf8Path) -> Utf8PathBuf {
        self.root.join(style.dir_name()).join(relative_path)
    }

    /// Create every output directory under both style roots.
    pub fn prepare_directories(&self) -> Result<(), WriteError> {
        for style in Style::ALL {
            for group in layout::GROUP_DIRS {
                let dir = self.root.join(style.dir_name()).join(group);
                fs::create_dir_all(&dir)
                    .map_err(|source| WriteError::CreateDir { path: dir, source })?;
            }
        }

        tracing::debug!("Prepared output directories under {}", self.root);
        Ok(())
    }

    /// Create or truncate the artifact's file in `style` and write its encoded bytes.
    ///
    /// The document is encoded before the file is opened, so an encode failure leaves
    /// any previous file untouched.
    pub fn write(&self, artifact: &Artifact, style: Style) -> Result<Utf8PathBuf, WriteError> {
        let path = self.path_for(style, artifact.relative_path());

        let bytes = match encode(artifact.document(), style) {
            Ok(bytes) => bytes,
            Err(source) => return Err(WriteError::Encode { path, source }),
        };

        let mut file = match File::create(&path) {
            Ok(file) => file,
            Err(source) => return Err(WriteError::CreateFile { path, source }),
        };

        if let Err(source) = file.write_all(&bytes).and_then(|()| file.flush()) {
            return Err(WriteError::Io { path, source });
        }

        tracing::debug!("Wrote {} ({} bytes)", path, bytes.len());
        Ok(path)
    }
}
