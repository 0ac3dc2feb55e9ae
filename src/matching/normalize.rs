//! Spelling normalization for index keys.

use hashbrown::HashMap;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s]+").expect("valid punctuation regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Head-type abbreviations, one rule per line: `variants => canonical` or an
/// equivalence list whose first entry is canonical.
const BUILTIN_TYPE_SYNONYMS: &[&str] = &[
    "ул, ул. => улица",
    "пр-т, пр-кт, просп, просп. => проспект",
    "пер, пер. => переулок",
    "пл, пл. => площадь",
    "ш, ш. => шоссе",
    "б-р, бул, бул. => бульвар",
    "наб, наб. => набережная",
    "проезд, пр-д",
    "туп, туп. => тупик",
    "мкр, мкр., мкрн, мк-н => микрорайон",
    "г, г. => город",
    "пос, пос., п. => поселок",
    "поселок, посёлок",
    "с, с. => село",
    "д, дер, дер. => деревня",
    "р-н, р-он => район",
    "обл, обл. => область",
    "респ, респ. => республика",
    "тер, тер. => территория",
    "км => километр",
    "снт => садовое товарищество",
];

/// Maps spellings to index keys and head types to their canonical form.
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Lower-case variant -> canonical type
    replacements: HashMap<String, String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Normalizer with the built-in type abbreviations
    pub fn new() -> Self {
        let mut res = Self {
            replacements: HashMap::new(),
        };
        for line in BUILTIN_TYPE_SYNONYMS {
            res.add_rule(line);
        }
        debug!("Loaded {} type synonyms", res.replacements.len());
        res
    }

    /// Register one synonym rule; blank lines and `#` comments are ignored
    pub fn add_rule(&mut self, line: &str) {
        let line = line.split('#').next().unwrap_or("").trim().to_lowercase();
        if line.is_empty() {
            return;
        }
        let line = WHITESPACE_RE.replace_all(&line, " ");

        let (lefts, canon): (Vec<&str>, Option<&str>) = match line.split_once("=>") {
            Some((left, right)) => (left.split(',').collect(), right.split(',').next()),
            None => {
                let parts: Vec<&str> = line.split(',').collect();
                let canon = parts.first().copied();
                (parts.into_iter().skip(1).collect(), canon)
            }
        };
        let Some(canon) = canon.map(str::trim).filter(|c| !c.is_empty()) else {
            return;
        };
        for src in lefts {
            let src = src.trim();
            if !src.is_empty() && src != canon {
                self.replacements.insert(src.to_string(), canon.to_string());
            }
        }
    }

    /// Canonical lower-case form of a head type ("ул." -> "улица")
    pub fn canonical_type(&self, typ: &str) -> String {
        let lower = typ.trim().to_lowercase();
        if let Some(canon) = self.replacements.get(&lower) {
            return canon.clone();
        }
        match lower.strip_suffix('.').and_then(|t| self.replacements.get(t)) {
            Some(canon) => canon.clone(),
            None => lower,
        }
    }

    /// Index key of a spelling: upper case, Ё folded to Е, punctuation
    /// replaced by spaces, whitespace collapsed
    pub fn key(&self, text: &str) -> String {
        let upper = text.to_uppercase().replace('Ё', "Е");
        let spaced = PUNCTUATION_RE.replace_all(&upper, " ");
        WHITESPACE_RE.replace_all(spaced.trim(), " ").into_owned()
    }
}
