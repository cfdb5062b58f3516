//! Node identifier to socket URL mapping.
//!
//! A node id is `host:port` where `port` is the node's ring port. The node
//! serves client sockets on `port + offset`.

use crate::error::AddressError;

/// Split a node id on its last `:` into host and port.
pub fn split_node_id(node_id: &str) -> Result<(&str, u16), AddressError> {
    let (host, port) = node_id
        .rsplit_once(':')
        .ok_or_else(|| AddressError::MissingPort(node_id.to_string()))?;
    if host.is_empty() {
        return Err(AddressError::MissingHost(node_id.to_string()));
    }
    let port = port.parse().map_err(|_| AddressError::InvalidPort {
        node: node_id.to_string(),
        port: port.to_string(),
    })?;
    Ok((host, port))
}

/// WebSocket URL of the client socket served by `node_id`.
pub fn node_url(node_id: &str, port_offset: u16, path: &str) -> Result<String, AddressError> {
    let (host, port) = split_node_id(node_id)?;
    let socket_port = port
        .checked_add(port_offset)
        .ok_or_else(|| AddressError::PortOverflow {
            node: node_id.to_string(),
            port,
            offset: port_offset,
        })?;
    Ok(format!("ws://{host}:{socket_port}{path}"))
}
