//! Cluster access through the `kubectl` binary.
//!
//! [`Kubectl`] runs one command and captures its output, [`ManifestStager`]
//! writes manifests to scratch files for `-f`, and [`KubectlClient`] combines
//! both behind the [`ClusterClient`] trait the rest of kua depends on.

pub mod client;
pub mod exec;
pub mod kubectl;
pub mod staging;

pub use client::{ClusterClient, ClusterError, ListOptions};
pub use exec::{ExecError, Kubectl};
pub use kubectl::KubectlClient;
pub use staging::{ManifestStager, StagedManifest, StagingError};
