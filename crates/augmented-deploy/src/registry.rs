use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use ethers::{types::Address, utils::to_checksum};
use eyre::{bail, eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};

/// A singleton contract registered under a logical name. `count` increments
/// on every registration under the same name so accidental multi-deploys
/// can be spotted in the summary.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NamedEntry {
    pub address: Address,
    pub count: u32,
}

/// Data needed to verify a contract later: the ABI-encoded constructor (or
/// initializer) arguments and, for proxies, the implementation address.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct VerifyInfo {
    /// Hex-encoded argument blob, without the 0x prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    #[serde(default, rename = "impl", skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Address>,
}

/// Every deployed contract instance, named or not, keyed by address.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InstanceEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<VerifyInfo>,
}

/// A proxy record keyed by the proxy address. `verify.implementation` must
/// reference an instance entry in the same network partition.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProxyEntry {
    pub id: String,
    pub verify: VerifyInfo,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NetworkDb {
    #[serde(default)]
    pub named: BTreeMap<String, NamedEntry>,
    #[serde(default)]
    pub instance: BTreeMap<String, InstanceEntry>,
    #[serde(default)]
    pub proxy: BTreeMap<String, ProxyEntry>,
}

/// The deployment registry: what has been deployed where. There is no
/// concurrency control; the tooling assumes a single deploy process per
/// registry file at a time.
pub trait ContractRegistry {
    fn named(&self, id: &str) -> Option<NamedEntry>;
    fn named_entries(&self) -> Vec<(String, NamedEntry)>;
    fn instance_by_address(&self, address: Address) -> Option<InstanceEntry>;
    fn instances(&self) -> Vec<(Address, InstanceEntry)>;
    fn proxies(&self) -> Vec<(Address, ProxyEntry)>;

    /// Records a deployed instance. With `register` set, also upserts the
    /// named entry under `id`, incrementing its count.
    fn add_instance(
        &mut self,
        id: &str,
        address: Address,
        register: bool,
        verify_args: Option<String>,
    ) -> Result<()>;

    /// Records a proxy entry linking the proxy to its implementation and
    /// init arguments, and registers the proxy under `id`.
    fn add_proxy(
        &mut self,
        id: &str,
        proxy: Address,
        implementation: Address,
        init_args: Option<String>,
    ) -> Result<()>;
}

fn key(address: Address) -> String {
    to_checksum(&address, None)
}

fn apply_instance(
    db: &mut NetworkDb,
    id: &str,
    address: Address,
    register: bool,
    verify_args: Option<String>,
) -> Result<()> {
    if address == Address::zero() {
        bail!("refusing to record {} at the zero address", id);
    }
    db.instance.insert(
        key(address),
        InstanceEntry {
            id: id.to_string(),
            verify: verify_args.map(|args| VerifyInfo {
                args: Some(args),
                implementation: None,
            }),
        },
    );
    if register {
        db.named
            .entry(id.to_string())
            .and_modify(|entry| {
                entry.address = address;
                entry.count += 1;
            })
            .or_insert(NamedEntry { address, count: 1 });
    }
    Ok(())
}

fn apply_proxy(
    db: &mut NetworkDb,
    id: &str,
    proxy: Address,
    implementation: Address,
    init_args: Option<String>,
) -> Result<()> {
    if proxy == Address::zero() || implementation == Address::zero() {
        bail!("refusing to record proxy {} with a zero address", id);
    }
    db.proxy.insert(
        key(proxy),
        ProxyEntry {
            id: id.to_string(),
            verify: VerifyInfo {
                args: init_args,
                implementation: Some(implementation),
            },
        },
    );
    db.named
        .entry(id.to_string())
        .and_modify(|entry| {
            entry.address = proxy;
            entry.count += 1;
        })
        .or_insert(NamedEntry {
            address: proxy,
            count: 1,
        });
    Ok(())
}

/// An in-memory registry, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    db: NetworkDb,
}

impl ContractRegistry for MemoryRegistry {
    fn named(&self, id: &str) -> Option<NamedEntry> {
        self.db.named.get(id).cloned()
    }

    fn named_entries(&self) -> Vec<(String, NamedEntry)> {
        self.db
            .named
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect()
    }

    fn instance_by_address(&self, address: Address) -> Option<InstanceEntry> {
        self.db.instance.get(&key(address)).cloned()
    }

    fn instances(&self) -> Vec<(Address, InstanceEntry)> {
        collect_addressed(&self.db.instance)
    }

    fn proxies(&self) -> Vec<(Address, ProxyEntry)> {
        collect_addressed(&self.db.proxy)
    }

    fn add_instance(
        &mut self,
        id: &str,
        address: Address,
        register: bool,
        verify_args: Option<String>,
    ) -> Result<()> {
        apply_instance(&mut self.db, id, address, register, verify_args)
    }

    fn add_proxy(
        &mut self,
        id: &str,
        proxy: Address,
        implementation: Address,
        init_args: Option<String>,
    ) -> Result<()> {
        apply_proxy(&mut self.db, id, proxy, implementation, init_args)
    }
}

/// A file-backed registry partitioned by network name. Every operation
/// performs a full read-modify-write of the file, so a crashed run leaves
/// only confirmed deployments behind.
#[derive(Debug)]
pub struct JsonFileRegistry {
    path: PathBuf,
    network: String,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>, network: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            network: network.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_root(&self) -> Result<BTreeMap<String, NetworkDb>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .wrap_err_with(|| format!("failed to read {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .wrap_err_with(|| format!("malformed registry file {}", self.path.display()))
    }

    fn load(&self) -> Result<NetworkDb> {
        Ok(self
            .load_root()?
            .remove(&self.network)
            .unwrap_or_default())
    }

    fn store(&self, db: NetworkDb) -> Result<()> {
        let mut root = self.load_root()?;
        root.insert(self.network.clone(), db);
        let raw = serde_json::to_string_pretty(&root)?;
        fs::write(&self.path, raw)
            .wrap_err_with(|| format!("failed to write {}", self.path.display()))
    }

    fn mutate(&self, f: impl FnOnce(&mut NetworkDb) -> Result<()>) -> Result<()> {
        let mut db = self.load()?;
        f(&mut db)?;
        self.store(db)
    }
}

impl ContractRegistry for JsonFileRegistry {
    fn named(&self, id: &str) -> Option<NamedEntry> {
        self.load().ok().and_then(|db| db.named.get(id).cloned())
    }

    fn named_entries(&self) -> Vec<(String, NamedEntry)> {
        self.load()
            .map(|db| db.named.into_iter().collect())
            .unwrap_or_default()
    }

    fn instance_by_address(&self, address: Address) -> Option<InstanceEntry> {
        self.load()
            .ok()
            .and_then(|db| db.instance.get(&key(address)).cloned())
    }

    fn instances(&self) -> Vec<(Address, InstanceEntry)> {
        self.load()
            .map(|db| collect_addressed(&db.instance))
            .unwrap_or_default()
    }

    fn proxies(&self) -> Vec<(Address, ProxyEntry)> {
        self.load()
            .map(|db| collect_addressed(&db.proxy))
            .unwrap_or_default()
    }

    fn add_instance(
        &mut self,
        id: &str,
        address: Address,
        register: bool,
        verify_args: Option<String>,
    ) -> Result<()> {
        self.mutate(|db| apply_instance(db, id, address, register, verify_args))
    }

    fn add_proxy(
        &mut self,
        id: &str,
        proxy: Address,
        implementation: Address,
        init_args: Option<String>,
    ) -> Result<()> {
        self.mutate(|db| apply_proxy(db, id, proxy, implementation, init_args))
    }
}

fn collect_addressed<T: Clone>(map: &BTreeMap<String, T>) -> Vec<(Address, T)> {
    map.iter()
        .filter_map(|(addr, entry)| Some((addr.parse().ok()?, entry.clone())))
        .collect()
}

/// Checks the cross-entry invariants: every proxy's implementation must be
/// a recorded instance in the same network partition.
pub fn validate(registry: &dyn ContractRegistry) -> Result<()> {
    for (proxy, entry) in registry.proxies() {
        let implementation = entry
            .verify
            .implementation
            .ok_or_else(|| eyre!("proxy {} ({}) has no implementation", entry.id, proxy))?;
        if registry.instance_by_address(implementation).is_none() {
            bail!(
                "proxy {} ({}) references unknown implementation {}",
                entry.id,
                proxy,
                implementation
            );
        }
    }
    Ok(())
}

/// A per-run summary of the named entries, with multi-deploy warnings.
#[derive(Debug, Default)]
pub struct Summary {
    pub rows: Vec<(String, NamedEntry)>,
    pub warnings: Vec<String>,
}

pub fn summarize(registry: &dyn ContractRegistry) -> Summary {
    let rows = registry.named_entries();
    let warnings = rows
        .iter()
        .filter(|(_, entry)| entry.count > 1)
        .map(|(id, entry)| format!("{} was deployed {} times", id, entry.count))
        .collect();
    Summary { rows, warnings }
}

pub fn print_summary(registry: &dyn ContractRegistry) {
    let summary = summarize(registry);
    for (id, entry) in &summary.rows {
        tracing::info!(
            id = id.as_str(),
            address = %to_checksum(&entry.address, None),
            count = entry.count,
            "deployed contract"
        );
    }
    for warning in &summary.warnings {
        tracing::warn!("{}", warning);
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    #[test]
    fn test_named_entry_count_is_monotonic() {
        let mut registry = MemoryRegistry::default();
        registry
            .add_instance("Foo", addr(0xaa), true, None)
            .unwrap();
        registry
            .add_instance("Foo", addr(0xbb), true, None)
            .unwrap();

        let named = registry.named("Foo").unwrap();
        assert_eq!(named.count, 2);
        assert_eq!(named.address, addr(0xbb));

        // Both instances are kept individually.
        assert!(registry.instance_by_address(addr(0xaa)).is_some());
        assert!(registry.instance_by_address(addr(0xbb)).is_some());

        let summary = summarize(&registry);
        assert_eq!(summary.warnings.len(), 1);
        assert!(summary.warnings[0].contains("Foo"));
    }

    #[test]
    fn test_unregistered_instances_do_not_create_named_entries() {
        let mut registry = MemoryRegistry::default();
        registry
            .add_instance("Background", addr(0x11), false, None)
            .unwrap();
        assert!(registry.named("Background").is_none());
        assert!(registry.instance_by_address(addr(0x11)).is_some());
    }

    #[test]
    fn test_zero_address_is_rejected() {
        let mut registry = MemoryRegistry::default();
        assert!(registry
            .add_instance("Foo", Address::zero(), true, None)
            .is_err());
        assert!(registry
            .add_proxy("Bar", addr(0x01), Address::zero(), None)
            .is_err());
    }

    #[test]
    fn test_proxy_implementation_must_be_an_instance() {
        let mut registry = MemoryRegistry::default();
        registry
            .add_proxy("Pool", addr(0x10), addr(0x20), Some("00".into()))
            .unwrap();
        assert!(validate(&registry).is_err());

        registry
            .add_instance("PoolImpl", addr(0x20), false, None)
            .unwrap();
        validate(&registry).unwrap();
    }

    #[test]
    fn test_file_registry_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "augmented-registry-{}.json",
            rand::thread_rng().gen::<u64>()
        ));
        let mut registry = JsonFileRegistry::new(&path, "kovan");
        registry
            .add_instance("Foo", addr(0xaa), true, Some("deadbeef".into()))
            .unwrap();
        registry.add_instance("Foo", addr(0xbb), true, None).unwrap();
        registry
            .add_proxy("Pool", addr(0x10), addr(0xbb), Some("00".into()))
            .unwrap();

        // A fresh handle sees the same state, partitioned by network.
        let reopened = JsonFileRegistry::new(&path, "kovan");
        assert_eq!(reopened.named("Foo").unwrap().count, 2);
        assert_eq!(
            reopened
                .instance_by_address(addr(0xaa))
                .unwrap()
                .verify
                .unwrap()
                .args
                .unwrap(),
            "deadbeef"
        );
        assert_eq!(
            reopened.proxies()[0].1.verify.implementation,
            Some(addr(0xbb))
        );

        let other_network = JsonFileRegistry::new(&path, "main");
        assert!(other_network.named("Foo").is_none());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_proxy_entry_serializes_impl_key() {
        let entry = ProxyEntry {
            id: "Pool".into(),
            verify: VerifyInfo {
                args: Some("00".into()),
                implementation: Some(addr(0x02)),
            },
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value["verify"].get("impl").is_some());
    }
}
