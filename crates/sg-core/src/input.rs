//! Chargement des fichiers d'entrée (mapping de base, câblage utilisateur).
//!
//! Les fichiers JSON et TOML sont lus dans un même arbre ([`Node`]) qui garde
//! l'ordre des clés et les clés répétées, puis convertis en structures brutes.
//! Une clé répétée n'est donc jamais fusionnée en silence : elle arrive telle
//! quelle jusqu'à la validation. Le cœur typé n'est construit qu'ensuite, via
//! [`build_canonical_with`] et [`build_pin_assignment`].

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::canonical::{CanonicalMapping, CanonicalOptions, CanonicalOrder, build_canonical_with};
use crate::error::CoreError;
use crate::pins::{PinAssignment, build_pin_assignment};

/// Syntax of an input file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl InputFormat {
    /// Guess from the file extension (case-insensitive).
    ///
    /// # Example
    /// ```
    /// use sg_core::input::InputFormat;
    /// use std::path::Path;
    /// assert_eq!(InputFormat::from_path(Path::new("base.JSON")), Some(InputFormat::Json));
    /// assert_eq!(InputFormat::from_path(Path::new("pins.toml")), Some(InputFormat::Toml));
    /// assert_eq!(InputFormat::from_path(Path::new("pins.txt")), None);
    /// ```
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Mapping de base tel que lu, avant validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawBaseMapping {
    /// Ordre canonique explicite, bit 0 en premier.
    pub order: Option<Vec<String>>,
    /// Caractère → segments allumés, dans l'ordre du fichier.
    pub characters: Vec<(String, Vec<String>)>,
}

impl RawBaseMapping {
    /// Validate into the typed canonical mapping.
    ///
    /// # Errors
    /// See [`build_canonical_with`].
    pub fn build(&self, allow_blank: bool) -> Result<(CanonicalMapping, CanonicalOrder), CoreError> {
        let options = CanonicalOptions {
            allow_blank,
            order: self.order.clone(),
        };
        build_canonical_with(
            self.characters
                .iter()
                .map(|(symbol, segments)| (symbol.as_str(), segments.iter().map(String::as_str))),
            &options,
        )
    }
}

/// Câblage utilisateur tel que lu : (clé de pin, segment), ordre du fichier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawPinConfig {
    /// Raw `(pin key, segment name)` pairs.
    pub entries: Vec<(String, String)>,
}

impl RawPinConfig {
    /// Validate against `order`.
    ///
    /// # Errors
    /// See [`build_pin_assignment`].
    pub fn build(&self, order: &CanonicalOrder) -> Result<PinAssignment, CoreError> {
        build_pin_assignment(
            self.entries.iter().map(|(k, s)| (k.as_str(), s.as_str())),
            order,
        )
    }
}

/// Arbre de document neutre (JSON ou TOML).
///
/// Contrairement à `serde_json::Value`, une table est une liste de paires :
/// une clé répétée dans un fichier JSON reste visible.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Table, paires dans l'ordre du fichier, doublons compris.
    Table(Vec<(String, Node)>),
    /// Liste.
    List(Vec<Node>),
    /// Chaîne.
    Text(String),
    /// Nombre, booléen, null ou date, gardé pour les messages d'erreur.
    Scalar(String),
}

impl Node {
    /// Short description used in error messages.
    fn kind(&self) -> String {
        match self {
            Self::Table(_) => "une table".into(),
            Self::List(_) => "une liste".into(),
            Self::Text(s) => format!("\"{s}\""),
            Self::Scalar(s) => s.clone(),
        }
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("une valeur JSON ou TOML")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Scalar(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Scalar(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(Node::Scalar(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(Node::Scalar(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Scalar("null".into()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Scalar("null".into()))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        Node::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Node::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, Node>()? {
            entries.push(entry);
        }
        Ok(Node::Table(entries))
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

/// Retire la clé `key` d'une table ; une clé répétée est une erreur.
fn take_key(table: &mut Vec<(String, Node)>, key: &str) -> Result<Option<Node>> {
    let Some(pos) = table.iter().position(|(k, _)| k == key) else {
        return Ok(None);
    };
    let (_, node) = table.remove(pos);
    if table.iter().any(|(k, _)| k == key) {
        bail!(CoreError::Config(format!("clé '{key}' répétée")));
    }
    Ok(Some(node))
}

/// Lit un fichier en [`Node`], format deviné par l'extension.
fn read_node(path: &Path) -> Result<Node> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_node(&content, InputFormat::from_path(path))
        .with_context(|| format!("Erreur de parsing dans {}", path.display()))
}

fn parse_node(content: &str, format: Option<InputFormat>) -> Result<Node> {
    match format {
        Some(InputFormat::Json) => Ok(serde_json::from_str(content)?),
        Some(InputFormat::Toml) => Ok(toml::from_str(content)?),
        None => serde_json::from_str(content).or_else(|json_err| {
            toml::from_str(content).map_err(|toml_err| {
                anyhow::anyhow!("ni JSON ({json_err}) ni TOML ({toml_err})")
            })
        }),
    }
}

/// Load a base mapping file.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or has an
/// unexpected shape.
pub fn load_base_mapping(path: &Path) -> Result<RawBaseMapping> {
    let node = read_node(path)?;
    let raw = base_mapping_from_node(node)
        .with_context(|| format!("Mapping de base invalide : {}", path.display()))?;
    log::info!(
        "Mapping de base chargé : {} caractères depuis {}",
        raw.characters.len(),
        path.display()
    );
    Ok(raw)
}

/// Parse a base mapping from text.
///
/// Two shapes are accepted:
///
/// - segment lists: `{"segments": [...], "characters": {"0": ["a", ...]}}`,
///   or just the `characters` table. A value may also be a string:
///   `"abcdef"` (one segment per character) or `"a b dp"` / `"a,b,dp"`.
/// - legacy encoding: `{"pins_on_display": [...], "characters_encoding":
///   {"0": "1111110"}}`, with `pins_on_display` listed MSB first and each
///   encoding string starting with the bit-0 segment.
///
/// The wrapped shapes are recognised by their table-valued `characters` or
/// `characters_encoding` key. Without one, the whole file is the character
/// table, so glyphs may be named `segments` or `characters` there. Repeated
/// keys are kept and rejected by [`RawBaseMapping::build`].
///
/// # Errors
/// Returns an error on syntax errors or an unexpected shape.
///
/// # Example
/// ```
/// use sg_core::input::{InputFormat, parse_base_mapping};
/// let raw = parse_base_mapping(r#"{"1": ["b", "c"], "7": "abc"}"#, Some(InputFormat::Json)).unwrap();
/// assert_eq!(raw.characters[1].1, ["a", "b", "c"]);
/// ```
pub fn parse_base_mapping(content: &str, format: Option<InputFormat>) -> Result<RawBaseMapping> {
    base_mapping_from_node(parse_node(content, format)?)
}

fn base_mapping_from_node(node: Node) -> Result<RawBaseMapping> {
    let Node::Table(mut root) = node else {
        bail!(CoreError::Config("le mapping de base doit être une table".into()));
    };
    let has_table = |root: &[(String, Node)], key: &str| {
        root.iter().any(|(k, v)| k == key && matches!(v, Node::Table(_)))
    };

    if has_table(&root, "characters_encoding") {
        let encoding = take_key(&mut root, "characters_encoding")?;
        let pins = take_key(&mut root, "pins_on_display")?.ok_or_else(|| {
            CoreError::Config("'characters_encoding' sans 'pins_on_display'".into())
        })?;
        return legacy_mapping(&pins, encoding);
    }

    let (order, table) = if has_table(&root, "characters") {
        let order = take_key(&mut root, "segments")?
            .map(|v| string_list(&v, "segments"))
            .transpose()?;
        let Some(Node::Table(table)) = take_key(&mut root, "characters")? else {
            bail!(CoreError::Config("'characters' doit être une table".into()));
        };
        if let Some((key, _)) = root.first() {
            bail!(CoreError::Config(format!("clé inattendue '{key}' à côté de 'characters'")));
        }
        (order, table)
    } else {
        (None, root)
    };

    let characters = table
        .into_iter()
        .map(|(symbol, v)| {
            let segments = segment_list(&v)
                .with_context(|| format!("caractère \"{symbol}\""))?;
            Ok((symbol, segments))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RawBaseMapping { order, characters })
}

fn legacy_mapping(pins: &Node, encoding: Option<Node>) -> Result<RawBaseMapping> {
    let mut order = string_list(pins, "pins_on_display")?;
    // Listé MSB → LSB dans le fichier : le dernier est le bit 0.
    order.reverse();

    let Some(Node::Table(table)) = encoding else {
        bail!(CoreError::Config("'characters_encoding' doit être une table".into()));
    };
    let characters = table
        .into_iter()
        .map(|(symbol, v)| {
            let Node::Text(bits) = v else {
                bail!(CoreError::Config(format!(
                    "caractère \"{symbol}\" : encodage binaire attendu"
                )));
            };
            if bits.chars().count() != order.len() {
                bail!(CoreError::Config(format!(
                    "caractère \"{symbol}\" : {} bits au lieu de {}",
                    bits.chars().count(),
                    order.len()
                )));
            }
            let mut lit = Vec::new();
            for (i, bit) in bits.chars().enumerate() {
                match bit {
                    '1' => lit.push(order[i].clone()),
                    '0' => {}
                    other => bail!(CoreError::Config(format!(
                        "caractère \"{symbol}\" : bit invalide '{other}'"
                    ))),
                }
            }
            Ok((symbol, lit))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RawBaseMapping {
        order: Some(order),
        characters,
    })
}

fn string_list(node: &Node, field: &str) -> Result<Vec<String>> {
    let Node::List(items) = node else {
        bail!(CoreError::Config(format!("'{field}' doit être une liste")));
    };
    items
        .iter()
        .map(|item| match item {
            Node::Text(s) => Ok(s.clone()),
            other => bail!(CoreError::Config(format!(
                "'{field}' : nom de segment attendu, trouvé {}",
                other.kind()
            ))),
        })
        .collect()
}

fn segment_list(node: &Node) -> Result<Vec<String>> {
    match node {
        Node::List(_) => string_list(node, "segments"),
        Node::Text(s) if s.contains(|c: char| c.is_whitespace() || c == ',') => Ok(s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect()),
        Node::Text(s) => Ok(s.chars().map(String::from).collect()),
        other => bail!(CoreError::Config(format!(
            "liste de segments attendue, trouvé {}",
            other.kind()
        ))),
    }
}

/// Load a user pin configuration file.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or has an
/// unexpected shape.
pub fn load_pin_config(path: &Path) -> Result<RawPinConfig> {
    let node = read_node(path)?;
    let raw = pin_config_from_node(node)
        .with_context(|| format!("Configuration de pins invalide : {}", path.display()))?;
    log::info!(
        "Configuration de pins chargée : {} pins depuis {}",
        raw.entries.len(),
        path.display()
    );
    Ok(raw)
}

/// Parse a pin configuration from text.
///
/// Accepts `{"0": "a", "1": "b"}`, the same table under a `pins` key, or a
/// list of segment names where the list index is the pin.
///
/// # Errors
/// Returns an error on syntax errors or non-string segment names.
///
/// # Example
/// ```
/// use sg_core::input::{InputFormat, parse_pin_config};
/// let raw = parse_pin_config("[pins]\n0 = \"b\"\n1 = \"a\"\n", Some(InputFormat::Toml)).unwrap();
/// assert_eq!(raw.entries, [("0".to_string(), "b".to_string()), ("1".into(), "a".into())]);
/// ```
pub fn parse_pin_config(content: &str, format: Option<InputFormat>) -> Result<RawPinConfig> {
    pin_config_from_node(parse_node(content, format)?)
}

fn pin_config_from_node(node: Node) -> Result<RawPinConfig> {
    let table = match node {
        Node::Table(mut root) => {
            let nested = root
                .iter()
                .any(|(k, v)| k == "pins" && matches!(v, Node::Table(_) | Node::List(_)));
            if nested {
                match take_key(&mut root, "pins")? {
                    Some(Node::Table(pins)) => pins,
                    Some(list @ Node::List(_)) => return pin_list(&list),
                    _ => bail!(CoreError::Config("'pins' doit être une table".into())),
                }
            } else {
                root
            }
        }
        list @ Node::List(_) => return pin_list(&list),
        _ => bail!(CoreError::Config(
            "la configuration de pins doit être une table".into()
        )),
    };
    let entries = table
        .into_iter()
        .map(|(key, v)| match v {
            Node::Text(segment) => Ok((key, segment)),
            other => bail!(CoreError::Config(format!(
                "pin \"{key}\" : nom de segment attendu, trouvé {}",
                other.kind()
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RawPinConfig { entries })
}

fn pin_list(list: &Node) -> Result<RawPinConfig> {
    let segments = string_list(list, "pins")?;
    Ok(RawPinConfig {
        entries: segments
            .into_iter()
            .enumerate()
            .map(|(pin, segment)| (pin.to_string(), segment))
            .collect(),
    })
}
