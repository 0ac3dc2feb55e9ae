//! Global candidate index for region..street scale entities.
//!
//! A character trie from normalized spelling keys to node stubs. The on-disk
//! image is `ATRE`, a format version byte, the xxh64 of the payload and the
//! gzip-compressed JSON list of `(key, stubs)` entries in trie order.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};
use xxhash_rust::xxh64::xxh64;

use crate::error::{GazetteerError, Result};
use crate::models::AddrLevel;

const MAGIC: &[u8; 4] = b"ATRE";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1 + 8;
const IMAGE_NAME: &str = "atree.dat";

/// Lightweight summary of a repository node kept in the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStub {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<AddrLevel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_ids: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<u64>,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    stubs: Vec<IndexStub>,
}

#[derive(Serialize, Deserialize)]
struct ImageEntry {
    key: String,
    stubs: Vec<IndexStub>,
}

#[derive(Debug, Default)]
pub struct CandidateIndex {
    root: TrieNode,
    keys: usize,
}

impl CandidateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an index image
    pub fn open(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
            return Err(GazetteerError::corrupt_image(IMAGE_NAME, "bad magic"));
        }
        let version = bytes[MAGIC.len()];
        if version != FORMAT_VERSION {
            return Err(GazetteerError::corrupt_image(
                IMAGE_NAME,
                format!("unsupported format version {}", version),
            ));
        }
        let mut checksum = [0u8; 8];
        checksum.copy_from_slice(&bytes[MAGIC.len() + 1..HEADER_LEN]);
        let payload = &bytes[HEADER_LEN..];
        if xxh64(payload, 0) != u64::from_be_bytes(checksum) {
            return Err(GazetteerError::corrupt_image(IMAGE_NAME, "checksum mismatch"));
        }

        let mut json = Vec::new();
        GzDecoder::new(payload).read_to_end(&mut json)?;
        let entries: Vec<ImageEntry> = serde_json::from_slice(&json)?;

        let mut index = Self::new();
        for entry in entries {
            for stub in entry.stubs {
                index.add(&entry.key, stub);
            }
        }
        debug!("Decoded candidate index with {} keys", index.keys);
        Ok(index)
    }

    /// Load `<dir>/atree.dat`, or an empty index when the file is absent
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(IMAGE_NAME);
        if !path.exists() {
            return Ok(Self::new());
        }
        let bytes = fs::read(&path)?;
        if bytes.is_empty() {
            return Err(GazetteerError::corrupt_image(IMAGE_NAME, "empty file"));
        }
        let index = Self::open(&bytes)?;
        info!("Loaded candidate index: {} keys", index.keys);
        Ok(index)
    }

    /// Encode the index image
    pub fn save<W: Write>(&self, mut writer: W) -> Result<()> {
        let mut entries = Vec::with_capacity(self.keys);
        let mut prefix = String::new();
        collect_entries(&self.root, &mut prefix, &mut entries);

        let json = serde_json::to_vec(&entries)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        let payload = encoder.finish()?;

        writer.write_all(MAGIC)?;
        writer.write_all(&[FORMAT_VERSION])?;
        writer.write_all(&xxh64(&payload, 0).to_be_bytes())?;
        writer.write_all(&payload)?;
        writer.flush()?;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.root = TrieNode::default();
        self.keys = 0;
    }

    /// Stubs registered under exactly `key`
    pub fn find(&self, key: &str) -> &[IndexStub] {
        let mut node = &self.root;
        for ch in key.chars() {
            match node.children.get(&ch) {
                Some(next) => node = next,
                None => return &[],
            }
        }
        &node.stubs
    }

    /// Register `stub` under `key`, replacing an older stub with the same id.
    /// Returns true when the index changed.
    pub fn add(&mut self, key: &str, stub: IndexStub) -> bool {
        if key.is_empty() {
            return false;
        }
        let mut node = &mut self.root;
        for ch in key.chars() {
            node = node.children.entry(ch).or_default();
        }
        if node.stubs.is_empty() {
            self.keys += 1;
        }
        match node.stubs.iter_mut().find(|s| s.id == stub.id) {
            Some(existing) if *existing == stub => false,
            Some(existing) => {
                *existing = stub;
                true
            }
            None => {
                node.stubs.push(stub);
                true
            }
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys == 0
    }
}

fn collect_entries(node: &TrieNode, prefix: &mut String, out: &mut Vec<ImageEntry>) {
    if !node.stubs.is_empty() {
        out.push(ImageEntry {
            key: prefix.clone(),
            stubs: node.stubs.clone(),
        });
    }
    for (ch, child) in &node.children {
        prefix.push(*ch);
        collect_entries(child, prefix, out);
        prefix.pop();
    }
}
