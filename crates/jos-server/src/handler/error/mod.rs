//! [`Error`], [`ErrorKind`] and [`Result`].

mod harbor_error;
mod helm_error;
mod http_error;
mod kube_error;
mod prometheus_error;

pub use http_error::{Error, ErrorKind, Result};
