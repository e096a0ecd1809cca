use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Server settings for [`Turbofish`](crate::Turbofish).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub(crate) address: IpAddr,
  pub(crate) port: u16,
  pub(crate) keep_alive: Option<u64>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      address: Ipv4Addr::new(127, 0, 0, 1).into(),
      port: 8000,
      keep_alive: Some(5),
    }
  }
}

impl Config {
  pub fn builder() -> Self {
    Self::default()
  }

  /// Sets the keepalive timeout in seconds (default is 5). `None` turns
  /// keep-alive off.
  pub fn keep_alive(mut self, seconds: impl Into<Option<u64>>) -> Self {
    self.keep_alive = seconds.into();
    self
  }

  /// Sets the port to serve on
  pub fn port(mut self, port: u16) -> Self {
    self.port = port;
    self
  }

  /// Sets the IP address to serve on
  pub fn address(mut self, addr: impl Into<IpAddr>) -> Self {
    self.address = addr.into();
    self
  }

  pub fn socket_addr(&self) -> SocketAddr {
    SocketAddr::new(self.address, self.port)
  }

  pub(crate) fn keep_alive_interval(&self) -> Option<Duration> {
    self.keep_alive.map(Duration::from_secs)
  }
}
