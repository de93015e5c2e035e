//! Operations grouped by the UPnP service that exposes them

pub mod av_transport;
pub mod rendering_control;
pub mod zone_group_topology;

/// Channel used by every RenderingControl operation
pub const MASTER_CHANNEL: &str = "Master";
