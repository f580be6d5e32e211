//! Subscription snapshot handling.
//!
//! A snapshot is the JSON file the gather pipeline writes for one
//! subscription. This module owns its shape and persistence:
//! - [`Snapshot`] - every firewall-bearing resource of a subscription
//! - [`cache`] - reading and writing snapshot files

mod cache;

pub use cache::{read_snapshot, write_snapshot};

use crate::firewall::{
    CosmosDBAccount, DataLakeStore, Firewall, KeyVault, NetworkSecurityGroup, RedisServer,
    SqlServer, WebApp,
};
use serde::{Deserialize, Serialize};

/// Everything gathered for one subscription that can answer reachability
/// questions. The file format round-trips losslessly: every IP and port
/// field marshals as its canonical string form.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub subscription_id: String,
    #[serde(default)]
    pub subscription_name: String,
    /// RFC 3339 timestamp stamped by the gather pipeline, if known.
    #[serde(default)]
    pub gathered_at: Option<String>,
    #[serde(default)]
    pub network_security_groups: Vec<NetworkSecurityGroup>,
    #[serde(default)]
    pub redis_servers: Vec<RedisServer>,
    #[serde(default)]
    pub key_vaults: Vec<KeyVault>,
    #[serde(default)]
    pub data_lakes: Vec<DataLakeStore>,
    #[serde(default)]
    pub cosmos_dbs: Vec<CosmosDBAccount>,
    #[serde(default)]
    pub web_apps: Vec<WebApp>,
    #[serde(default)]
    pub sql_servers: Vec<SqlServer>,
}

impl Snapshot {
    /// Flattens the snapshot into `(resource name, kind, firewall)` rows so
    /// callers can run one check uniformly across every resource.
    pub fn firewalls(&self) -> Vec<(String, &'static str, &dyn Firewall)> {
        let mut out: Vec<(String, &'static str, &dyn Firewall)> = Vec::new();
        for nsg in &self.network_security_groups {
            out.push((nsg.name.clone(), "nsg", nsg));
        }
        for redis in &self.redis_servers {
            out.push((redis.name.clone(), "redis", &redis.firewall));
        }
        for vault in &self.key_vaults {
            out.push((vault.name.clone(), "keyvault", &vault.firewall));
        }
        for lake in &self.data_lakes {
            out.push((lake.name.clone(), "datalake", &lake.firewall));
        }
        for cosmos in &self.cosmos_dbs {
            out.push((cosmos.name.clone(), "cosmosdb", &cosmos.firewall));
        }
        for app in &self.web_apps {
            out.push((app.name.clone(), "webapp", &app.firewall));
            out.push((format!("{} (scm)", app.name), "webapp-scm", &app.scm_firewall));
        }
        for sql in &self.sql_servers {
            out.push((sql.name.clone(), "sql", &sql.firewall));
        }
        out
    }

    pub fn resource_count(&self) -> usize {
        self.network_security_groups.len()
            + self.redis_servers.len()
            + self.key_vaults.len()
            + self.data_lakes.len()
            + self.cosmos_dbs.len()
            + self.web_apps.len()
            + self.sql_servers.len()
    }
}
