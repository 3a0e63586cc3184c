use std::io;

use tokio::net::TcpListener;

/// Bind the first free port from `ports`, in order. Only `AddrInUse`
/// moves on to the next port; any other bind error is returned as-is.
pub async fn bind_with_fallback(host: &str, ports: &[u16]) -> io::Result<TcpListener> {
    for &port in ports {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
                tracing::warn!(port, "port in use, trying next");
            }
            Err(err) => return Err(err),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AddrInUse,
        format!("no free port among {:?}", ports),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skips_ports_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken_port = taken.local_addr().unwrap().port();

        let listener = bind_with_fallback("127.0.0.1", &[taken_port, 0]).await.unwrap();

        assert_ne!(listener.local_addr().unwrap().port(), taken_port);
    }

    #[tokio::test]
    async fn fails_when_every_port_is_taken() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken_port = taken.local_addr().unwrap().port();

        let err = bind_with_fallback("127.0.0.1", &[taken_port]).await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
    }

    #[tokio::test]
    async fn empty_port_list_is_an_error() {
        assert!(bind_with_fallback("127.0.0.1", &[]).await.is_err());
    }
}
