//! Tests for the HTTP server implementation.

#[cfg(test)]
mod server_tests {
    use std::io::{self, Cursor};
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
    use tokio::net::{TcpListener, TcpStream};

    use crate::bootstrap::ping_mux;
    use crate::parser::HttpRequest;
    use crate::server::{
        new_server, with_address, with_handler, with_max_body_size, with_max_connections,
        with_read_buffer_size, with_timeouts, Error, HttpResponse, HttpServer, ServeMux, ServerConfig,
        StatusCode,
    };

    // Mock TcpStream for testing
    struct MockTcpStream {
        read_data: Cursor<Vec<u8>>,
        write_data: Vec<u8>,
        // Once the data runs out, reads stay pending instead of returning EOF
        stall: bool,
    }

    impl MockTcpStream {
        fn new(read_data: impl Into<Vec<u8>>) -> Self {
            Self {
                read_data: Cursor::new(read_data.into()),
                write_data: Vec::new(),
                stall: false,
            }
        }

        fn stalling(read_data: impl Into<Vec<u8>>) -> Self {
            Self {
                stall: true,
                ..Self::new(read_data)
            }
        }

        fn written(&self) -> String {
            String::from_utf8_lossy(&self.write_data).into_owned()
        }
    }

    impl AsyncRead for MockTcpStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            let n = std::io::Read::read(&mut this.read_data, buf.initialize_unfilled())?;
            if n == 0 && this.stall {
                return Poll::Pending;
            }
            buf.advance(n);
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockTcpStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            this.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn ping_config() -> ServerConfig {
        ServerConfig::from_options([
            with_handler(ping_mux()),
            with_timeouts(Duration::from_secs(1), Duration::from_secs(1)),
        ])
    }

    fn body(response: &str) -> &str {
        response.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or("")
    }

    #[tokio::test]
    async fn test_ping_over_mock_stream() {
        let mut stream = MockTcpStream::new(&b"GET /ping HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);

        let result = HttpServer::handle_connection(&mut stream, &ping_config()).await;
        assert!(result.is_ok());

        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: application/json\r\n"));
        assert!(response.contains("Content-Length: 18\r\n"));
        assert_eq!(body(&response), r#"{"message":"pong"}"#);
    }

    #[tokio::test]
    async fn test_body_is_cut_at_content_length() {
        let config = ServerConfig::from_options([with_handler(|req: HttpRequest| async move {
            Ok::<_, Error>(HttpResponse::new(StatusCode::Ok).with_body_bytes(req.body))
        })]);
        let mut stream = MockTcpStream::new(
            &b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello trailing"[..],
        );

        HttpServer::handle_connection(&mut stream, &config).await.unwrap();
        assert_eq!(body(&stream.written()), "hello");
    }

    #[tokio::test]
    async fn test_body_over_limit_is_rejected() {
        let config = ServerConfig::from_options([with_handler(ping_mux()), with_max_body_size(4)]);
        let mut stream = MockTcpStream::new(
            &b"POST /ping HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello"[..],
        );

        let result = HttpServer::handle_connection(&mut stream, &config).await;
        assert!(matches!(result, Err(Error::BodyTooLarge(4))));
        assert!(stream.written().starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    }

    #[tokio::test]
    async fn test_huge_content_length_is_rejected_before_reading() {
        // The body never arrives; the limit check must not wait for it
        let mut stream = MockTcpStream::stalling(
            &b"POST /ping HTTP/1.1\r\nHost: localhost\r\nContent-Length: 18446744073709551615\r\n\r\n"[..],
        );

        let result = HttpServer::handle_connection(&mut stream, &ping_config()).await;
        assert!(matches!(result, Err(Error::BodyTooLarge(_))));
        assert!(stream.written().starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    }

    #[tokio::test]
    async fn test_head_response_has_no_body() {
        let mut stream = MockTcpStream::new(&b"HEAD /ping HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);

        HttpServer::handle_connection(&mut stream, &ping_config()).await.unwrap();

        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Length: 18\r\n"));
        assert!(response.ends_with("\r\n\r\n"));
        assert_eq!(body(&response), "");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let mut stream = MockTcpStream::new(&b"GET /pong HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);

        HttpServer::handle_connection(&mut stream, &ping_config()).await.unwrap();

        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.contains("Not found: /pong"));
    }

    #[tokio::test]
    async fn test_no_handler_answers_not_found() {
        let mut stream = MockTcpStream::new(&b"GET /ping HTTP/1.0\r\n\r\n"[..]);

        HttpServer::handle_connection(&mut stream, &ServerConfig::default()).await.unwrap();
        assert!(stream.written().starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[tokio::test]
    async fn test_invalid_request_gets_bad_request() {
        let mut stream = MockTcpStream::new(&b"INVALID REQUEST\r\n\r\n"[..]);

        let result = HttpServer::handle_connection(&mut stream, &ping_config()).await;
        assert!(matches!(result, Err(Error::ParseError(_))));

        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.contains("Error parsing request:"));
    }

    #[tokio::test]
    async fn test_oversized_head_is_rejected() {
        let config = ServerConfig::from_options([with_handler(ping_mux()), with_read_buffer_size(64)]);
        let request = format!("GET /ping HTTP/1.1\r\nHost: localhost\r\nX-Pad: {pad}\r\n\r\n", pad = "a".repeat(200));
        let mut stream = MockTcpStream::new(request.into_bytes());

        let result = HttpServer::handle_connection(&mut stream, &config).await;
        assert!(matches!(result, Err(Error::HeaderTooLarge(64))));
        assert!(stream.written().starts_with("HTTP/1.1 431 Request Header Fields Too Large\r\n"));
    }

    #[tokio::test]
    async fn test_closed_connection_without_request() {
        let mut stream = MockTcpStream::new(Vec::new());

        let result = HttpServer::handle_connection(&mut stream, &ping_config()).await;
        assert!(result.is_ok());
        assert!(stream.written().is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_is_internal_server_error() {
        let config = ServerConfig::from_options([with_handler(|_req: HttpRequest| async {
            Err::<HttpResponse, _>(Error::InternalError("boom".to_string()))
        })]);
        let mut stream = MockTcpStream::new(&b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);

        let result = HttpServer::handle_connection(&mut stream, &config).await;
        assert!(matches!(result, Err(Error::InternalError(_))));

        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(response.contains("boom"));
    }

    #[tokio::test]
    async fn test_read_timeout_drops_connection() {
        let config = ServerConfig::from_options([
            with_handler(ping_mux()),
            with_timeouts(Duration::from_millis(50), Duration::from_secs(1)),
        ]);
        // The head never completes
        let mut stream = MockTcpStream::stalling(&b"GET /ping HTTP/1.1\r\nHost: local"[..]);

        let result = HttpServer::handle_connection(&mut stream, &config).await;
        assert!(matches!(result, Err(Error::ReadTimeout)));
        assert!(stream.written().is_empty());
    }

    #[tokio::test]
    async fn test_write_timeout_drops_response() {
        let config = ServerConfig::from_options([
            with_handler(|_req: HttpRequest| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<_, Error>(HttpResponse::new(StatusCode::Ok))
            }),
            with_timeouts(Duration::from_secs(1), Duration::from_millis(50)),
        ]);
        let mut stream = MockTcpStream::new(&b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);

        let result = HttpServer::handle_connection(&mut stream, &config).await;
        assert!(matches!(result, Err(Error::WriteTimeout)));
        assert!(stream.written().is_empty());
    }

    #[tokio::test]
    async fn test_zero_timeouts_never_expire() {
        let config = ServerConfig::from_options([
            with_handler(|_req: HttpRequest| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, Error>(HttpResponse::new(StatusCode::NoContent))
            }),
            with_timeouts(Duration::ZERO, Duration::ZERO),
        ]);
        let mut stream = MockTcpStream::new(&b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);

        HttpServer::handle_connection(&mut stream, &config).await.unwrap();
        assert!(stream.written().starts_with("HTTP/1.1 204 No Content\r\n"));
    }

    async fn spawn_server(server: HttpServer) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });
        addr
    }

    async fn roundtrip(addr: std::net::SocketAddr, request: &[u8]) -> String {
        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(request).await.unwrap();
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap()
    }

    #[tokio::test]
    async fn test_ping_over_tcp() {
        let addr = spawn_server(new_server([with_handler(ping_mux())])).await;

        let response = roundtrip(addr, b"GET /ping HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: application/json\r\n"));
        assert_eq!(body(&response), r#"{"message":"pong"}"#);

        // Each connection serves one request; a second client works too
        let response = roundtrip(addr, b"POST /ping HTTP/1.0\r\n\r\n").await;
        assert_eq!(body(&response), r#"{"message":"pong"}"#);
    }

    #[tokio::test]
    async fn test_head_over_tcp_ends_at_blank_line() {
        let addr = spawn_server(new_server([with_handler(ping_mux())])).await;

        let response = roundtrip(addr, b"HEAD /ping HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_unbounded_max_connections_still_serves() {
        let server = new_server([with_handler(ping_mux()), with_max_connections(usize::MAX)]);
        let addr = spawn_server(server).await;

        let response = roundtrip(addr, b"GET /ping HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert_eq!(body(&response), r#"{"message":"pong"}"#);
    }

    #[tokio::test]
    async fn test_connection_limit_answers_service_unavailable() {
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);
        let mut mux = ServeMux::new();
        mux.handle("/hold", move |_req: HttpRequest| {
            let mut release = release_rx.clone();
            async move {
                while !*release.borrow() {
                    if release.changed().await.is_err() {
                        break;
                    }
                }
                Ok::<_, Error>(HttpResponse::new(StatusCode::Ok).with_body_string("released"))
            }
        });
        let server = new_server([with_handler(mux), with_max_connections(1)]);
        let addr = spawn_server(server).await;

        // Occupy the only slot
        let mut held = TcpStream::connect(addr).await.unwrap();
        held.write_all(b"GET /hold HTTP/1.1\r\nHost: localhost\r\n\r\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Rejected before any request is read, so send nothing
        let mut rejected = TcpStream::connect(addr).await.unwrap();
        let mut response = Vec::new();
        rejected.read_to_end(&mut response).await.unwrap();
        let response = String::from_utf8(response).unwrap();
        assert!(response.starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
        assert!(response.contains("Server is at capacity"));

        release_tx.send(true).unwrap();
        let mut response = Vec::new();
        held.read_to_end(&mut response).await.unwrap();
        assert!(String::from_utf8_lossy(&response).ends_with("released"));
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let server = new_server([with_address(addr.clone())]);
        let result = server.listen_and_serve().await;

        match result {
            Err(Error::Bind { addr: failed, source }) => {
                assert_eq!(failed, addr);
                assert_eq!(source.kind(), io::ErrorKind::AddrInUse);
            }
            other => panic!("expected bind error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_shared_config_is_read_only_across_connections() {
        let server = Arc::new(new_server([with_handler(ping_mux())]));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let serving = Arc::clone(&server);
        tokio::spawn(async move {
            let _ = serving.serve(listener).await;
        });

        let requests = (0..8).map(|_| {
            tokio::spawn(roundtrip(addr, b"GET /ping HTTP/1.1\r\nHost: localhost\r\n\r\n"))
        });
        for handle in requests.collect::<Vec<_>>() {
            let response = handle.await.unwrap();
            assert_eq!(body(&response), r#"{"message":"pong"}"#);
        }
        assert_eq!(server.config().addr, ":8080");
    }
}
