//! Capability presets describing the host generations each strategy targets.

use saver::HostCapabilities;

/// Current hosts: links carry the `download` attribute.
pub fn modern() -> HostCapabilities {
    HostCapabilities {
        download_attribute: true,
        ..HostCapabilities::NONE
    }
}

/// Hosts that can navigate frames to data URIs but lack the `download` attribute.
pub fn data_uri_only() -> HostCapabilities {
    HostCapabilities {
        data_uri_navigation: true,
        ..HostCapabilities::NONE
    }
}

/// Legacy hosts that only implement the `SaveAs` document command.
pub fn legacy() -> HostCapabilities {
    HostCapabilities {
        exec_command: true,
        ..HostCapabilities::NONE
    }
}

/// Hosts that support none of the strategies.
pub fn bare() -> HostCapabilities {
    HostCapabilities::NONE
}
