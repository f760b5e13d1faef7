use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as Json;

use crate::common::{hex_encode, parse_hash, Hash};
use crate::error::{Error, Result};

/// Root and named proofs written to `merkleTreeData.json`.
///
/// Serializes as a JSON object with `root` first and one `proof<Name>` key
/// per leaf in the order proofs were added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeData {
    root: Hash,
    proofs: Vec<(String, Vec<Hash>)>,
}

impl TreeData {
    pub fn new(root: Hash) -> Self {
        Self {
            root,
            proofs: Vec::new(),
        }
    }

    /// Adds the proof of leaf `name` under the key `proof<name>`.
    pub fn push_proof(&mut self, name: &str, proof: Vec<Hash>) {
        self.proofs.push((format!("proof{name}"), proof));
    }

    pub fn root(&self) -> Hash {
        self.root
    }

    pub fn proofs(&self) -> &[(String, Vec<Hash>)] {
        &self.proofs
    }

    /// Proof of leaf `name`, looked up by its `proof<name>` key.
    pub fn proof(&self, name: &str) -> Option<&[Hash]> {
        let key = format!("proof{name}");
        self.proofs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, proof)| proof.as_slice())
    }

    /// Pretty-printed JSON with two-space indentation and a trailing newline.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parses tree data previously written by [`TreeData::to_json_pretty`].
    ///
    /// Proof keys come back sorted by name. Keys other than `root` and
    /// `proof<Name>` are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Json = serde_json::from_str(json)?;
        let object = value
            .as_object()
            .ok_or_else(|| Error::Format("expected a JSON object".to_string()))?;

        let root = object
            .get("root")
            .and_then(Json::as_str)
            .ok_or_else(|| Error::Format("missing string field 'root'".to_string()))?;
        let mut data = Self::new(parse_hash(root)?);

        for (key, value) in object.iter().filter(|(key, _)| key.as_str() != "root") {
            if !key.starts_with("proof") || key.len() == "proof".len() {
                return Err(Error::Format(format!("unexpected key '{key}'")));
            }
            let items = value
                .as_array()
                .ok_or_else(|| Error::Format(format!("'{key}' is not an array")))?;
            let proof = items
                .iter()
                .map(|item| {
                    item.as_str()
                        .ok_or_else(|| Error::Format(format!("'{key}' holds a non-string entry")))
                        .and_then(parse_hash)
                })
                .collect::<Result<Vec<_>>>()?;
            data.proofs.push((key.clone(), proof));
        }
        Ok(data)
    }
}

impl Serialize for TreeData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.proofs.len() + 1))?;
        map.serialize_entry("root", &hex_encode(self.root))?;
        for (key, proof) in &self.proofs {
            let encoded: Vec<String> = proof.iter().map(hex_encode).collect();
            map.serialize_entry(key, &encoded)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeData {
        let mut data = TreeData::new([0xab; 32]);
        data.push_proof("Zeta", vec![[0x01; 32], [0x02; 32]]);
        data.push_proof("Alpha", vec![]);
        data
    }

    #[test]
    fn test_json_layout() {
        let json = sample().to_json_pretty().unwrap();
        let expected = format!(
            "{{\n  \"root\": \"0x{}\",\n  \"proofZeta\": [\n    \"0x{}\",\n    \"0x{}\"\n  ],\n  \"proofAlpha\": []\n}}\n",
            "ab".repeat(32),
            "01".repeat(32),
            "02".repeat(32),
        );
        assert_eq!(json, expected);
    }

    #[test]
    fn test_from_json_reads_back_proofs() {
        let data = sample();
        let parsed = TreeData::from_json(&data.to_json_pretty().unwrap()).unwrap();

        assert_eq!(parsed.root(), data.root());
        assert_eq!(parsed.proof("Zeta"), data.proof("Zeta"));
        assert_eq!(parsed.proof("Alpha"), Some(&[][..]));
        assert_eq!(parsed.proof("Missing"), None);
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(matches!(TreeData::from_json("[]"), Err(Error::Format(_))));
        assert!(matches!(
            TreeData::from_json(r#"{"proofA": []}"#),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            TreeData::from_json(r#"{"root": "0x12"}"#),
            Err(Error::Format(_))
        ));
        let root = format!("0x{}", "00".repeat(32));
        let json = format!(r#"{{"root": "{root}", "proofA": [1]}}"#);
        assert!(matches!(TreeData::from_json(&json), Err(Error::Format(_))));
        assert!(matches!(TreeData::from_json("{"), Err(Error::Json(_))));
    }

    #[test]
    fn test_from_json_rejects_unknown_keys() {
        let root = format!("0x{}", "00".repeat(32));
        for json in [
            format!(r#"{{"root": "{root}", "extra": []}}"#),
            format!(r#"{{"root": "{root}", "proof": []}}"#),
            format!(r#"{{"root": "{root}", "Proofa": []}}"#),
        ] {
            assert!(matches!(TreeData::from_json(&json), Err(Error::Format(_))));
        }
    }
}
