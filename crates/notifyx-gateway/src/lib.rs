pub mod client;
pub mod fallback;

pub use client::{Contact, CreatedInstance, GatewayClient, GatewayError, GatewayInstance, QrCode};
pub use fallback::{RequestShape, ShapeMemo};
