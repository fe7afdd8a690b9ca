use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::UdpSocket;

/// Fire-and-forget datagram sender. Every publish is an independent
/// transmission; no connection state is held between sends.
#[async_trait]
pub trait DatagramTransport: Send + Sync {
    async fn send(&self, target: SocketAddr, payload: &[u8]) -> io::Result<()>;
}

pub struct UdpTransport;

#[async_trait]
impl DatagramTransport for UdpTransport {
    async fn send(&self, target: SocketAddr, payload: &[u8]) -> io::Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.send_to(payload, target).await?;
        Ok(())
    }
}
