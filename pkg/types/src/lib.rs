pub mod api;
pub mod config;
pub mod kind;
pub mod kubeconfig;
pub mod meta;
pub mod namespace;
pub mod rbac;
pub mod report;
pub mod resource;
pub mod secret;
pub mod service_account;
pub mod validate;
