use std::{fs, path::Path};

use ethers::{abi::Abi, types::Bytes};
use eyre::{bail, eyre, Result, WrapErr};
use serde::Deserialize;

/// A compiled contract artifact from the external build package: the ABI,
/// the creation bytecode, and (when the compiler emitted it) the standard
/// JSON metadata used for source verification.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
    pub metadata: Option<String>,
}

#[derive(Deserialize)]
struct RawArtifact {
    abi: serde_json::Value,
    #[serde(default)]
    bytecode: Option<serde_json::Value>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

/// Loads `{dir}/{name}.json`, accepting both the hardhat artifact shape
/// (`"bytecode": "0x…"`) and the foundry shape
/// (`"bytecode": {"object": "0x…"}`).
pub fn load_artifact(dir: &Path, name: &str) -> Result<Artifact> {
    let path = dir.join(format!("{}.json", name));
    let raw = fs::read_to_string(&path)
        .wrap_err_with(|| format!("missing artifact for {} at {}", name, path.display()))?;
    let raw: RawArtifact = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("malformed artifact {}", path.display()))?;

    let abi: Abi = serde_json::from_value(raw.abi)
        .wrap_err_with(|| format!("malformed ABI in {}", path.display()))?;
    let bytecode = parse_bytecode(raw.bytecode)
        .wrap_err_with(|| format!("malformed bytecode in {}", path.display()))?;
    let metadata = raw.metadata.map(|value| match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    });

    Ok(Artifact {
        name: name.to_string(),
        abi,
        bytecode,
        metadata,
    })
}

fn parse_bytecode(value: Option<serde_json::Value>) -> Result<Bytes> {
    let value = value.ok_or_else(|| eyre!("artifact carries no bytecode"))?;
    let hex_str = match &value {
        serde_json::Value::String(s) => s.as_str(),
        serde_json::Value::Object(fields) => fields
            .get("object")
            .and_then(|v| v.as_str())
            .ok_or_else(|| eyre!("bytecode object has no \"object\" field"))?,
        _ => bail!("unsupported bytecode shape"),
    };
    let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    if stripped.is_empty() {
        bail!("artifact carries empty bytecode (is it an interface?)");
    }
    let bytes = ethers::utils::hex::decode(stripped)?;
    Ok(Bytes::from(bytes))
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    const MINIMAL_ABI: &str = r#"[{"inputs": [], "stateMutability": "nonpayable", "type": "constructor"}]"#;

    fn write_artifact(contents: &str) -> (std::path::PathBuf, String) {
        let dir = std::env::temp_dir();
        let name = format!("artifact-{}", rand::thread_rng().gen::<u64>());
        fs::write(dir.join(format!("{}.json", name)), contents).unwrap();
        (dir, name)
    }

    #[test]
    fn test_hardhat_artifact_shape() {
        let (dir, name) = write_artifact(&format!(
            r#"{{"abi": {}, "bytecode": "0x6080"}}"#,
            MINIMAL_ABI
        ));
        let artifact = load_artifact(&dir, &name).unwrap();
        assert_eq!(artifact.bytecode.to_vec(), vec![0x60, 0x80]);
        fs::remove_file(dir.join(format!("{}.json", name))).unwrap();
    }

    #[test]
    fn test_foundry_artifact_shape() {
        let (dir, name) = write_artifact(&format!(
            r#"{{"abi": {}, "bytecode": {{"object": "0x6001"}}, "metadata": "{{}}"}}"#,
            MINIMAL_ABI
        ));
        let artifact = load_artifact(&dir, &name).unwrap();
        assert_eq!(artifact.bytecode.to_vec(), vec![0x60, 0x01]);
        assert!(artifact.metadata.is_some());
        fs::remove_file(dir.join(format!("{}.json", name))).unwrap();
    }

    #[test]
    fn test_interface_artifact_is_rejected() {
        let (dir, name) =
            write_artifact(&format!(r#"{{"abi": {}, "bytecode": "0x"}}"#, MINIMAL_ABI));
        assert!(load_artifact(&dir, &name).is_err());
        fs::remove_file(dir.join(format!("{}.json", name))).unwrap();
    }
}
