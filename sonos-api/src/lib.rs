//! High-level Sonos API for device control
//!
//! This crate provides a type-safe, trait-based API for controlling Sonos
//! devices. Each UPnP action is a zero-sized type implementing
//! [`SonosOperation`]; [`SonosClient`] executes it against a device using the
//! private `soap-client` crate.
//!
//! ```rust,no_run
//! use sonos_api::SonosClient;
//! use sonos_api::operations::rendering_control::{GetVolumeOperation, GetVolumeOperationRequest};
//!
//! let client = SonosClient::new();
//! let request = GetVolumeOperationRequest { instance_id: 0, channel: "Master".to_string() };
//! let response = client.execute::<GetVolumeOperation>("192.168.1.100", &request)?;
//! println!("volume: {}", response.current_volume);
//! # Ok::<(), sonos_api::ApiError>(())
//! ```

#[macro_use]
pub mod operation;
pub mod client;
pub mod error;
pub mod service;
pub mod operations;

pub use client::SonosClient;
pub use error::{ApiError, Result};
pub use operation::SonosOperation;
pub use service::{Service, ServiceInfo};
