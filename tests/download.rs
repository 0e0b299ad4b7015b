use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread;

use iridl_extract::{Client, ClientOptions, DatasetIdentity, Error, ExtractionRequest};
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// The mock server runs on its own thread; the blocking client must stay
// outside any async context, so tests drive the runtime by hand.
fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn start(rt: &Runtime, route: &str, response: ResponseTemplate) -> MockServer {
    rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    })
}

fn client_for(server: &MockServer, chunk_size: usize) -> Client {
    Client::new(ClientOptions {
        base_url: server.uri(),
        chunk_size,
        ..ClientOptions::default()
    })
    .expect("client")
}

fn netcdf_like(len: usize) -> Vec<u8> {
    let mut body = b"CDF\x01".to_vec();
    body.extend((0..len - 4).map(|i| (i % 251) as u8));
    body
}

fn request_count(rt: &Runtime, server: &MockServer) -> usize {
    rt.block_on(server.received_requests())
        .map(|r| r.len())
        .unwrap_or_default()
}

#[test]
fn download_streams_whole_body_to_destination() {
    let rt = runtime();
    let body = netcdf_like(300_000);
    let server = start(&rt, "/data.nc", ResponseTemplate::new(200).set_body_bytes(body.clone()));
    let client = client_for(&server, 4096);

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("subset.nc");
    let n = client.download(&format!("{}/data.nc", server.uri()), &dest).unwrap();

    assert_eq!(n, body.len() as u64);
    assert_eq!(fs::read(&dest).unwrap(), body);
    assert!(!dir.path().join("subset.nc.part").exists());
}

#[test]
fn not_found_leaves_no_file() {
    let rt = runtime();
    let server = start(&rt, "/data.nc", ResponseTemplate::new(404).set_body_string("no such dataset"));
    let client = client_for(&server, 4096);

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("subset.nc");
    let err = client
        .download(&format!("{}/data.nc", server.uri()), &dest)
        .unwrap_err();

    assert!(err.is_transfer());
    assert_eq!(err.status(), Some(404));
    assert!(matches!(err, Error::TransferStatus { status: 404, .. }));
    assert!(!dest.exists());
    assert!(!dir.path().join("subset.nc.part").exists());
}

#[test]
fn server_error_is_not_retried() {
    let rt = runtime();
    let server = start(&rt, "/data.nc", ResponseTemplate::new(503));
    let client = client_for(&server, 4096);

    let dir = tempfile::tempdir().unwrap();
    let err = client
        .download(&format!("{}/data.nc", server.uri()), dir.path().join("x.nc"))
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(request_count(&rt, &server), 1);
}

#[test]
fn retrieve_sends_positional_query_path() {
    let rt = runtime();
    let route = "/SOURCES/.UCSB/.CHIRPS/.v2p0/.daily/.global/.0p05/.prcp\
                 /X/38.75/38.75/RANGE/Y/9.0192/9.0192/RANGE/T/Jan%202023/Jan%202023/RANGE/data.nc";
    let server = start(&rt, route, ResponseTemplate::new(200).set_body_bytes(netcdf_like(1024)));
    let client = client_for(&server, 256);

    let req = ExtractionRequest::new(DatasetIdentity::preset("chirps-daily").unwrap())
        .point(38.75, 9.0192)
        .iso_dates("2023-01-01", "2023-01-05");

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested").join("addis.nc");
    let result = client.retrieve(&req, &target).unwrap();

    assert_eq!(result.url, format!("{}{}", server.uri(), route));
    assert_eq!(result.size_bytes, 1024);
    assert_eq!(result.target, target);
    assert_eq!(file_len(&target), 1024);
}

#[test]
fn retrieve_improved_uses_doubled_catalog_path() {
    let rt = runtime();
    let block = "/SOURCES/.UCSB/.CHIRPS/.v2p0/.daily-improved/.global/.0p05/.prcp";
    let route = format!("{block}{block}/data.nc");
    let server = start(&rt, &route, ResponseTemplate::new(200).set_body_bytes(netcdf_like(64)));
    let client = client_for(&server, 4096);

    let req = ExtractionRequest::new(DatasetIdentity::preset("chirps-daily-improved").unwrap());
    let dir = tempfile::tempdir().unwrap();
    let result = client.retrieve(&req, dir.path().join("improved.nc")).unwrap();

    assert_eq!(result.size_bytes, 64);
}

#[test]
fn bad_date_never_reaches_the_server() {
    let rt = runtime();
    let server = start(&rt, "/data.nc", ResponseTemplate::new(200));
    let client = client_for(&server, 4096);

    let req = ExtractionRequest::new(DatasetIdentity::preset("chirps-daily").unwrap())
        .iso_dates("2023/01/05", "2023-01-05");
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("x.nc");
    let err = client.retrieve(&req, &dest).unwrap_err();

    assert!(matches!(err, Error::InvalidDateFormat(_)));
    assert_eq!(request_count(&rt, &server), 0);
    assert!(!dest.exists());
}

/// One-shot server that promises `declared` bytes, sends `sent`, then hangs up.
fn truncating_server(declared: usize, sent: usize) -> (String, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut seen = Vec::new();
        let mut buf = [0u8; 1024];
        while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => seen.extend_from_slice(&buf[..n]),
            }
        }
        let head = format!("HTTP/1.1 200 OK\r\nContent-Length: {declared}\r\nConnection: close\r\n\r\n");
        stream.write_all(head.as_bytes()).expect("write head");
        stream.write_all(&vec![0x42u8; sent]).expect("write body");
        stream.flush().expect("flush");
    });
    (format!("http://{addr}"), handle)
}

#[test]
fn dropped_connection_keeps_partial_file_aside() {
    let (base, server) = truncating_server(1000, 500);
    let client = Client::new(ClientOptions {
        base_url: base.clone(),
        chunk_size: 128,
        ..ClientOptions::default()
    })
    .expect("client");

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("subset.nc");
    let err = client.download(&format!("{base}/data.nc"), &dest).unwrap_err();
    server.join().expect("server thread");

    assert!(err.is_transfer());
    assert!(
        matches!(err, Error::TransferInterrupted { bytes_written: 500, .. }),
        "{err:?}"
    );
    assert!(!dest.exists());
    assert_eq!(file_len(&dir.path().join("subset.nc.part")), 500);
}

fn file_len(p: &Path) -> u64 {
    fs::metadata(p).unwrap().len()
}
