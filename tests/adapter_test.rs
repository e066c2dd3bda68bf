use anyhow::Result;
use chrono::NaiveDate;
use funding_etl::apis::{nih::NihSource, nsf::NsfSource, sbir::SbirSource};
use funding_etl::error::EtlError;
use funding_etl::http_client::HttpClient;
use funding_etl::types::{FetchFilters, FundingSource};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response on a local port and return its base URL
async fn serve_once(status: &'static str, body: &'static str) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    });

    Ok(format!("http://{addr}/search"))
}

/// Drain headers and any Content-Length body so the client sees a clean exchange
async fn read_request(stream: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let Ok(n) = stream.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }
}

fn http() -> Result<HttpClient> {
    Ok(HttpClient::new(Duration::from_secs(5), "funding_etl-test")?)
}

fn filters() -> FetchFilters {
    FetchFilters {
        limit: 10,
        date_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        date_end: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        fiscal_years: vec![2025],
    }
}

fn assert_unavailable(err: EtlError, source: &str, reason_fragment: &str) {
    match err {
        EtlError::SourceUnavailable {
            source_name,
            reason,
        } => {
            assert_eq!(source_name, source);
            assert!(
                reason.contains(reason_fragment),
                "reason {reason:?} lacks {reason_fragment:?}"
            );
        }
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn sbir_error_status_is_source_unavailable() -> Result<()> {
    let url = serve_once("503 Service Unavailable", "{}").await?;
    let source = SbirSource::with_base_url(http()?, url);

    let err = source.fetch("artificial intelligence", &filters()).await.unwrap_err();
    assert_unavailable(err, "sbir", "unexpected status 503");
    Ok(())
}

#[tokio::test]
async fn sbir_non_json_body_is_source_unavailable() -> Result<()> {
    let url = serve_once("200 OK", "<html><body>maintenance</body></html>").await?;
    let source = SbirSource::with_base_url(http()?, url);

    let err = source.fetch("artificial intelligence", &filters()).await.unwrap_err();
    assert_unavailable(err, "sbir", "malformed JSON payload");
    Ok(())
}

#[tokio::test]
async fn sbir_wrong_envelope_is_zero_records() -> Result<()> {
    let url = serve_once("200 OK", r#"{"awards":"oops"}"#).await?;
    let source = SbirSource::with_base_url(http()?, url);

    let records = source.fetch("artificial intelligence", &filters()).await?;
    assert!(records.is_empty());
    Ok(())
}

#[tokio::test]
async fn nsf_error_status_is_source_unavailable() -> Result<()> {
    let url = serve_once("500 Internal Server Error", "").await?;
    let source = NsfSource::with_base_url(http()?, url);

    let err = source.fetch("artificial intelligence", &filters()).await.unwrap_err();
    assert_unavailable(err, "nsf", "unexpected status 500");
    Ok(())
}

#[tokio::test]
async fn nsf_non_json_body_is_source_unavailable() -> Result<()> {
    let url = serve_once("200 OK", "not json at all").await?;
    let source = NsfSource::with_base_url(http()?, url);

    let err = source.fetch("artificial intelligence", &filters()).await.unwrap_err();
    assert_unavailable(err, "nsf", "malformed JSON payload");
    Ok(())
}

#[tokio::test]
async fn nsf_wrong_envelope_is_zero_records() -> Result<()> {
    let url = serve_once("200 OK", r#"{"response":{"award":{"id":"1"}}}"#).await?;
    let source = NsfSource::with_base_url(http()?, url);

    let records = source.fetch("artificial intelligence", &filters()).await?;
    assert!(records.is_empty());
    Ok(())
}

#[tokio::test]
async fn nsf_award_list_is_returned() -> Result<()> {
    let url = serve_once(
        "200 OK",
        r#"{"response":{"award":[{"id":"2112345","title":"Robust ML"}]}}"#,
    )
    .await?;
    let source = NsfSource::with_base_url(http()?, url);

    let records = source.fetch("artificial intelligence", &filters()).await?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], "2112345");
    Ok(())
}

#[tokio::test]
async fn nih_error_status_is_source_unavailable() -> Result<()> {
    let url = serve_once("503 Service Unavailable", "{}").await?;
    let source = NihSource::with_base_url(http()?, url);

    let err = source.fetch("artificial intelligence", &filters()).await.unwrap_err();
    assert_unavailable(err, "nih", "unexpected status 503");
    Ok(())
}

#[tokio::test]
async fn nih_non_json_body_is_source_unavailable() -> Result<()> {
    let url = serve_once("200 OK", "<html").await?;
    let source = NihSource::with_base_url(http()?, url);

    let err = source.fetch("artificial intelligence", &filters()).await.unwrap_err();
    assert_unavailable(err, "nih", "malformed JSON payload");
    Ok(())
}

#[tokio::test]
async fn nih_wrong_envelope_is_zero_records() -> Result<()> {
    let url = serve_once("200 OK", r#"{"meta":{"total":0},"results":null}"#).await?;
    let source = NihSource::with_base_url(http()?, url);

    let records = source.fetch("artificial intelligence", &filters()).await?;
    assert!(records.is_empty());
    Ok(())
}
