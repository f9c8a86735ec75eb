use halflink_frame::{FrameConfig, Role, DEFAULT_PACKET_SIZE};

use crate::error::Result;

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Fixed frame size on the wire. Default: 96.
    pub packet_size: usize,
    /// Which end of the link this engine plays. Default: host.
    pub role: Role,
}

impl EngineConfig {
    pub fn with_packet_size(mut self, packet_size: usize) -> Self {
        self.packet_size = packet_size;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Validated codec configuration.
    pub fn frame_config(&self) -> Result<FrameConfig> {
        Ok(FrameConfig::new(self.packet_size)?)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
            role: Role::Host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.packet_size, 96);
        assert_eq!(config.role, Role::Host);
        assert_eq!(config.frame_config().unwrap().max_body(), 88);
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::default()
            .with_packet_size(32)
            .with_role(Role::Device);
        assert_eq!(config.packet_size, 32);
        assert_eq!(config.role, Role::Device);
    }

    #[test]
    fn invalid_packet_size_is_a_frame_error() {
        let err = EngineConfig::default()
            .with_packet_size(8)
            .frame_config()
            .unwrap_err();
        assert!(matches!(err, EngineError::Frame(_)));
    }
}
