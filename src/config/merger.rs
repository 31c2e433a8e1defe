//! Configuration merging
//!
//! Overlays one configuration layer on top of another.

use crate::config::types::ConfigValues;

impl ConfigValues {
    /// Overlay `higher` on `self`; values set in `higher` win
    #[must_use]
    pub fn merge(self, higher: ConfigValues) -> ConfigValues {
        ConfigValues {
            remote_host: higher.remote_host.or(self.remote_host),
            remote_port: higher.remote_port.or(self.remote_port),
            local_port: higher.local_port.or(self.local_port),
            listen_host: higher.listen_host.or(self.listen_host),
            buffer_size: higher.buffer_size.or(self.buffer_size),
            max_connections: higher.max_connections.or(self.max_connections),
            connect_timeout: higher.connect_timeout.or(self.connect_timeout),
            shutdown_timeout: higher.shutdown_timeout.or(self.shutdown_timeout),
            tls_max_version: higher.tls_max_version.or(self.tls_max_version),
            verify_peer: higher.verify_peer.or(self.verify_peer),
            verify_hostname: higher.verify_hostname.or(self.verify_hostname),
            notify_endpoint: higher.notify_endpoint.or(self.notify_endpoint),
            log_level: higher.log_level.or(self.log_level),
        }
    }
}
