//! Deterministic cache-key derivation.

use std::str::FromStr;

use sha2::{Digest, Sha256};

/// SHA-256 of `input`, as 64 lowercase hex characters.
pub fn hash(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// How key fields are joined before hashing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyEncoding {
    /// `name:len:value;` per field, so field boundaries cannot shift.
    #[default]
    LengthPrefixed,
    /// Plain concatenation of the values. `"ab" + "c"` and `"a" + "bc"`
    /// collide; kept for keys compatible with the Node service.
    Concatenated,
}

impl FromStr for KeyEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "length-prefixed" | "length_prefixed" | "structured" => Ok(KeyEncoding::LengthPrefixed),
            "concatenated" | "concat" | "legacy" => Ok(KeyEncoding::Concatenated),
            other => Err(format!("unknown key encoding {other:?}")),
        }
    }
}

/// Accumulates named fields and hashes them into a prefixed key.
#[derive(Debug)]
pub struct KeyBuilder {
    encoding: KeyEncoding,
    buf: String,
}

impl KeyBuilder {
    pub fn new(encoding: KeyEncoding) -> Self {
        Self {
            encoding,
            buf: String::new(),
        }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        match self.encoding {
            KeyEncoding::LengthPrefixed => {
                self.buf
                    .push_str(&format!("{}:{}:{};", name, value.len(), value));
            }
            KeyEncoding::Concatenated => self.buf.push_str(value),
        }
        self
    }

    pub fn finish(self, prefix: &str) -> String {
        format!("{}{}", prefix, hash(&self.buf))
    }
}
