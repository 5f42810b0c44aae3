//! Repository traits over the cluster API.
//!
//! Every trait is implemented on [`KubeClient`](crate::KubeClient); handlers
//! import only the traits they need.

mod apisix;
mod ingress;
mod machine;
mod node;
mod owner;
mod pod;
mod secret;
mod service;
mod workload;

pub use apisix::ApisixRepository;
pub use ingress::IngressRepository;
pub use machine::MachineRepository;
pub use node::NodeRepository;
pub use owner::{OwnerLookup, OwnerRepository, walk_to_root};
pub use pod::PodRepository;
pub use secret::SecretRepository;
pub use service::ServiceRepository;
pub use workload::WorkloadRepository;
