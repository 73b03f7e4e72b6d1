//! Wake-on-LAN service.
//!
//! Best-effort power-on of the target before a connection attempt: one
//! magic packet (6 × `0xFF` then 16 repetitions of the hardware
//! address) broadcast as a UDP datagram on port 9. Failure here is
//! logged and absorbed by the engine — it must never abort an
//! in-progress connection attempt.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::error::CoreError;

const WAKE_PORT: u16 = 9;
const UNIVERSAL_BROADCAST: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 255);

/// Sends magic wake packets to the local subnet.
pub struct WakeService {
    broadcast_override: Option<Ipv4Addr>,
}

impl WakeService {
    pub fn new(broadcast_override: Option<Ipv4Addr>) -> Self {
        Self { broadcast_override }
    }

    /// Broadcast one wake packet for `hardware_address`.
    ///
    /// Fails on a malformed address or a send error; never blocks
    /// beyond the single datagram send.
    pub async fn send_wake(&self, hardware_address: &str) -> Result<(), CoreError> {
        let packet = build_magic_packet(hardware_address)?;
        let broadcast = self.broadcast_override.unwrap_or_else(derive_broadcast);
        let dest = SocketAddr::from((broadcast, WAKE_PORT));
        send_packet(&packet, dest).await?;
        info!(%hardware_address, %dest, "wake packet sent");
        Ok(())
    }
}

async fn send_packet(packet: &[u8], dest: SocketAddr) -> Result<(), CoreError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.set_broadcast(true)?;
    socket.send_to(packet, dest).await?;
    Ok(())
}

/// Build the 102-byte magic packet.
fn build_magic_packet(hardware_address: &str) -> Result<Vec<u8>, CoreError> {
    let mac = parse_hardware_address(hardware_address)?;
    let mut packet = Vec::with_capacity(6 + 16 * mac.len());
    packet.extend_from_slice(&[0xff; 6]);
    for _ in 0..16 {
        packet.extend_from_slice(&mac);
    }
    Ok(packet)
}

/// Parse `AA:BB:CC:DD:EE:FF` (or `-`-separated, or bare hex) into bytes.
fn parse_hardware_address(address: &str) -> Result<[u8; 6], CoreError> {
    let cleaned: String = address.chars().filter(|c| *c != ':' && *c != '-').collect();
    if cleaned.len() != 12 || !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidHardwareAddress {
            address: address.to_owned(),
        });
    }

    let mut mac = [0u8; 6];
    for (i, byte) in mac.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&cleaned[i * 2..i * 2 + 2], 16).map_err(|_| {
            CoreError::InvalidHardwareAddress {
                address: address.to_owned(),
            }
        })?;
    }
    Ok(mac)
}

/// Best-effort subnet broadcast address from the local network
/// configuration, falling back to the universal broadcast address.
fn derive_broadcast() -> Ipv4Addr {
    match local_ip_address::local_ip() {
        Ok(IpAddr::V4(ip)) => match ipnet::Ipv4Net::new(ip, 24) {
            Ok(net) => {
                let broadcast = net.broadcast();
                debug!(local = %ip, %broadcast, "derived subnet broadcast");
                broadcast
            }
            Err(_) => UNIVERSAL_BROADCAST,
        },
        Ok(IpAddr::V6(_)) | Err(_) => {
            warn!("no local IPv4 found, using universal broadcast");
            UNIVERSAL_BROADCAST
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_packet_layout() {
        let packet = build_magic_packet("AA:BB:CC:DD:EE:FF").expect("packet");
        assert_eq!(packet.len(), 102);
        assert_eq!(&packet[..6], &[0xff; 6]);
        let mac = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
        for rep in 0..16 {
            let start = 6 + rep * 6;
            assert_eq!(&packet[start..start + 6], &mac, "repetition {rep}");
        }
    }

    #[test]
    fn hardware_address_formats() {
        assert!(parse_hardware_address("aa:bb:cc:dd:ee:ff").is_ok());
        assert!(parse_hardware_address("AA-BB-CC-DD-EE-FF").is_ok());
        assert!(parse_hardware_address("aabbccddeeff").is_ok());
    }

    #[test]
    fn malformed_hardware_address_rejected() {
        for bad in ["", "AA:BB:CC", "AA:BB:CC:DD:EE:FF:00", "ZZ:BB:CC:DD:EE:FF"] {
            assert!(
                matches!(
                    parse_hardware_address(bad),
                    Err(CoreError::InvalidHardwareAddress { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn sends_exactly_one_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.expect("bind");
        let dest = receiver.local_addr().expect("addr");

        let packet = build_magic_packet("AA:BB:CC:DD:EE:FF").expect("packet");
        send_packet(&packet, dest).await.expect("send");

        let mut buf = [0u8; 256];
        let (len, _) = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            receiver.recv_from(&mut buf),
        )
        .await
        .expect("datagram within deadline")
        .expect("recv");
        assert_eq!(&buf[..len], packet.as_slice());
    }
}
