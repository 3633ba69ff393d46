//! Package descriptors and the manifest format they are parsed from.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Classification of a scanned mod folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModKind {
    /// A code mod with a valid manifest.
    Valid,
    /// A valid package whose manifest names an owner mod.
    ContentPack,
    /// Skipped on purpose (hidden or excluded folder).
    Ignored,
    /// Has a manifest that could not be used.
    Invalid,
    /// Neither a manifest nor nested folders.
    Unknown,
}

impl ModKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModKind::Valid => "Valid",
            ModKind::ContentPack => "ContentPack",
            ModKind::Ignored => "Ignored",
            ModKind::Invalid => "Invalid",
            ModKind::Unknown => "Unknown",
        }
    }

    /// Whether folders of this kind belong in the rendered graph.
    pub fn is_renderable(self) -> bool {
        !matches!(self, ModKind::Ignored | ModKind::Invalid)
    }
}

impl fmt::Display for ModKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ModKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Valid" => Ok(ModKind::Valid),
            "ContentPack" => Ok(ModKind::ContentPack),
            "Ignored" => Ok(ModKind::Ignored),
            "Invalid" => Ok(ModKind::Invalid),
            "Unknown" => Ok(ModKind::Unknown),
            other => Err(format!("unknown mod category: {}", other)),
        }
    }
}

/// A parsed `manifest.json`.
///
/// Keys follow the game's manifest format (`UniqueID`, `ContentPackFor`, ...)
/// and match regardless of case. Read raw manifest text with
/// [`Manifest::from_json`]; the derived `Deserialize` expects keys already
/// folded to lowercase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename(serialize = "UniqueID", deserialize = "uniqueid"), default)]
    pub unique_id: String,
    #[serde(rename(serialize = "Name", deserialize = "name"), default)]
    pub name: Option<String>,
    #[serde(rename(serialize = "Author", deserialize = "author"), default)]
    pub author: Option<String>,
    #[serde(
        rename(serialize = "Version", deserialize = "version"),
        default,
        deserialize_with = "lenient_version"
    )]
    pub version: Option<String>,
    #[serde(rename(serialize = "Description", deserialize = "description"), default)]
    pub description: Option<String>,
    #[serde(rename(serialize = "EntryDll", deserialize = "entrydll"), default)]
    pub entry_dll: Option<String>,
    #[serde(rename(serialize = "ContentPackFor", deserialize = "contentpackfor"), default)]
    pub content_pack_for: Option<ContentPackFor>,
    #[serde(
        rename(serialize = "Dependencies", deserialize = "dependencies"),
        default,
        deserialize_with = "null_as_empty"
    )]
    pub dependencies: Vec<ManifestDependency>,
}

impl Manifest {
    pub fn new(unique_id: impl Into<String>) -> Self {
        Self {
            unique_id: unique_id.into(),
            ..Self::default()
        }
    }

    /// Parse manifest text the way the game's mod loader does: a leading
    /// BOM, `//` and `/* */` comments, and trailing commas are tolerated, and
    /// keys match case-insensitively.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let relaxed = strip_comments_and_trailing_commas(text.trim_start_matches('\u{feff}'));
        let value: Value = serde_json::from_str(&relaxed)?;
        serde_json::from_value(fold_keys(value))
    }

    /// The owner mod's id when this manifest describes a content pack.
    pub fn owner_id(&self) -> Option<&str> {
        self.content_pack_for
            .as_ref()
            .map(|c| c.unique_id.trim())
            .filter(|id| !id.is_empty())
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.content_pack_for = Some(ContentPackFor {
            unique_id: owner.into(),
            minimum_version: None,
        });
        self
    }

    pub fn with_dependency(mut self, target: impl Into<String>, is_required: bool) -> Self {
        self.dependencies.push(ManifestDependency {
            unique_id: target.into(),
            minimum_version: None,
            is_required,
        });
        self
    }
}

/// The `ContentPackFor` block of a content pack manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPackFor {
    #[serde(rename(serialize = "UniqueID", deserialize = "uniqueid"), default)]
    pub unique_id: String,
    #[serde(
        rename(serialize = "MinimumVersion", deserialize = "minimumversion"),
        default,
        deserialize_with = "lenient_version"
    )]
    pub minimum_version: Option<String>,
}

/// One entry of a manifest's `Dependencies` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestDependency {
    #[serde(rename(serialize = "UniqueID", deserialize = "uniqueid"), default)]
    pub unique_id: String,
    #[serde(
        rename(serialize = "MinimumVersion", deserialize = "minimumversion"),
        default,
        deserialize_with = "lenient_version"
    )]
    pub minimum_version: Option<String>,
    /// Missing means required.
    #[serde(
        rename(serialize = "IsRequired", deserialize = "isrequired"),
        default = "default_true"
    )]
    pub is_required: bool,
}

fn default_true() -> bool {
    true
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Versions appear as strings, bare numbers, or the legacy
/// `{ "MajorVersion": 1, "MinorVersion": 0, "PatchVersion": 0 }` object.
fn lenient_version<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Object(map)) => {
            let part = |key: &str| {
                map.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .and_then(|(_, v)| v.as_u64())
                    .unwrap_or(0)
            };
            Some(format!(
                "{}.{}.{}",
                part("MajorVersion"),
                part("MinorVersion"),
                part("PatchVersion")
            ))
        }
        _ => None,
    })
}

/// Lowercase every object key, recursively.
fn fold_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), fold_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(fold_keys).collect()),
        other => other,
    }
}

/// Remove `//` and `/* */` comments, then trailing commas, outside string
/// literals. Newlines inside comments are kept so parse errors still point
/// at the right line.
fn strip_comments_and_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push('\n');
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    drop_trailing_commas(&out)
}

fn drop_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = text[i + 1..].trim_start().chars().next();
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// One scanned folder, as handed to the graph builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageDescriptor {
    /// The manifest's unique id; absent when no usable manifest was read.
    pub identity: Option<String>,
    pub display_name: String,
    pub kind: ModKind,
    pub manifest: Option<Manifest>,
    pub directory: PathBuf,
    /// Why the folder is Invalid or Unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PackageDescriptor {
    /// Describe a folder with a usable manifest. The kind is `ContentPack`
    /// when the manifest names an owner, `Valid` otherwise. The unique id is
    /// trimmed here so the identity and the graph node id agree.
    pub fn from_manifest(
        directory: impl Into<PathBuf>,
        fallback_name: &str,
        mut manifest: Manifest,
    ) -> Self {
        let trimmed = manifest.unique_id.trim();
        if trimmed.len() != manifest.unique_id.len() {
            manifest.unique_id = trimmed.to_string();
        }
        let kind = if manifest.owner_id().is_some() {
            ModKind::ContentPack
        } else {
            ModKind::Valid
        };
        let display_name = manifest
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(fallback_name)
            .to_string();
        Self {
            identity: Some(manifest.unique_id.clone()).filter(|id| !id.is_empty()),
            display_name,
            kind,
            manifest: Some(manifest),
            directory: directory.into(),
            error: None,
        }
    }

    /// Describe a folder that produced no usable manifest.
    pub fn without_manifest(
        directory: impl Into<PathBuf>,
        display_name: impl Into<String>,
        kind: ModKind,
        error: Option<String>,
    ) -> Self {
        Self {
            identity: None,
            display_name: display_name.into(),
            kind,
            manifest: None,
            directory: directory.into(),
            error,
        }
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest.is_some()
    }
}
