use std::sync::Arc;

use s5_core::{Cid, KeyPair, RegistryEntry, RequestOptions, SignedRegistryEntry};
use s5_portal::{PortalClient, PortalConfig, PortalError, PortalUrlCache};
use s5_registry::{CreateOutcome, RegistryError};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn signed(keypair: &KeyPair, data: &'static [u8], revision: u64) -> SignedRegistryEntry {
    RegistryEntry::new(keypair.public_key(), data, revision)
        .expect("valid entry")
        .sign(keypair)
        .expect("matching key")
}

/// Client with its own URL cache so tests don't share resolution state.
fn client_for(server: &MockServer, config: PortalConfig) -> (PortalClient, Arc<PortalUrlCache>) {
    let cache = Arc::new(PortalUrlCache::new());
    let config = PortalConfig {
        url: server.uri(),
        ..config
    };
    let client = PortalClient::new(config)
        .expect("valid url")
        .with_cache(cache.clone());
    (client, cache)
}

#[tokio::test]
async fn get_entry_absent_on_404() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let keypair = KeyPair::from_seed(&[1; 32]);
    Mock::given(method("GET"))
        .and(path("/s5/registry"))
        .and(query_param("pk", keypair.public_key().to_base64url()))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, PortalConfig::new(""));
    let entry = client
        .registry()
        .get_entry(&keypair.public_key(), &RequestOptions::default())
        .await?;
    assert!(entry.is_none());
    Ok(())
}

#[tokio::test]
async fn get_entry_decodes_and_verifies() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let keypair = KeyPair::from_seed(&[2; 32]);
    let entry = signed(&keypair, b"pointer", 12);
    Mock::given(method("GET"))
        .and(path("/s5/registry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entry.to_record()))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, PortalConfig::new(""));
    let fetched = client
        .registry()
        .get_entry(&keypair.public_key(), &RequestOptions::default())
        .await?;
    assert_eq!(fetched, Some(entry));
    Ok(())
}

#[tokio::test]
async fn server_errors_surface_as_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s5/registry"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, PortalConfig::new(""));
    let err = client
        .registry()
        .get_entry(
            &KeyPair::from_seed(&[3; 32]).public_key(),
            &RequestOptions::default(),
        )
        .await
        .unwrap_err();
    match err {
        RegistryError::Transport(err) => {
            assert_eq!(err.status(), Some(500));
            assert!(err.to_string().contains("boom"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn incomplete_record_is_malformed_entry() {
    let server = MockServer::start().await;
    let keypair = KeyPair::from_seed(&[15; 32]);
    let record = signed(&keypair, b"pointer", 1).to_record();
    Mock::given(method("GET"))
        .and(path("/s5/registry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "pk": record.pk,
            "revision": record.revision,
            "data": record.data,
        })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, PortalConfig::new(""));
    let err = client
        .registry()
        .get_entry(&keypair.public_key(), &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::MalformedEntry(_)), "{err}");
}

#[tokio::test]
async fn portal_path_prefix_is_kept() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/portal/s5/registry"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = PortalClient::new(PortalConfig::new(format!("{}/portal", server.uri())))?
        .with_cache(Arc::new(PortalUrlCache::new()));
    let entry = client
        .registry()
        .get_entry(
            &KeyPair::from_seed(&[16; 32]).public_key(),
            &RequestOptions::default(),
        )
        .await?;
    assert!(entry.is_none());
    Ok(())
}

#[tokio::test]
async fn publish_posts_record_with_auth_headers() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let keypair = KeyPair::from_seed(&[4; 32]);
    let entry = signed(&keypair, b"published", 3);
    let record = serde_json::to_value(entry.to_record())?;

    Mock::given(method("POST"))
        .and(path("/s5/registry"))
        .and(header("authorization", "Bearer client-key"))
        .and(header("x-portal-region", "eu"))
        .and(body_json(record))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, PortalConfig::new("").with_api_key("client-key"));
    let mut options = RequestOptions::default();
    options
        .headers
        .insert("x-portal-region".into(), "eu".into());
    let ack = client.registry().publish_entry(&entry, &options).await?;
    assert_eq!(ack.status, 204);
    Ok(())
}

#[tokio::test]
async fn call_site_options_override_client_options() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/custom/entry"))
        .and(header("authorization", "Bearer call-key"))
        .and(header("user-agent", "s5-tests"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = PortalConfig::new("").with_api_key("client-key");
    config.request.custom_user_agent = Some("s5-tests".into());
    let (client, _) = client_for(&server, config);

    let options = RequestOptions {
        api_key: Some("call-key".into()),
        endpoint_get_entry: Some("/custom/entry".into()),
        ..Default::default()
    };
    let entry = client
        .registry()
        .get_entry(&KeyPair::from_seed(&[5; 32]).public_key(), &options)
        .await?;
    assert!(entry.is_none());
    Ok(())
}

#[tokio::test]
async fn create_entry_over_http() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let keypair = KeyPair::from_seed(&[6; 32]);
    let current = signed(&keypair, b"old", 4);
    let expected = signed(&keypair, b"new", 5);

    Mock::given(method("GET"))
        .and(path("/s5/registry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current.to_record()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/s5/registry"))
        .and(body_json(serde_json::to_value(expected.to_record())?))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, PortalConfig::new(""));
    let outcome = client
        .registry()
        .create_entry(&keypair, &b"new"[..], 0, &RequestOptions::default())
        .await?;
    assert_eq!(
        outcome,
        CreateOutcome::Published {
            entry: expected,
            ack: s5_core::PublishAck { status: 200 },
        }
    );
    Ok(())
}

#[tokio::test]
async fn portal_url_is_resolved_once() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s5/registry"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let (client, cache) = client_for(&server, PortalConfig::new(""));
    let key = KeyPair::from_seed(&[7; 32]).public_key();
    let registry = client.registry();
    registry.get_entry(&key, &RequestOptions::default()).await?;
    registry.get_entry(&key, &RequestOptions::default()).await?;
    assert!(cache.get(client.url()).is_some());

    cache.invalidate(client.url());
    registry.get_entry(&key, &RequestOptions::default()).await?;
    Ok(())
}

#[tokio::test]
async fn network_failure_invalidates_resolved_url() {
    // Reserve a port, then close it so connections are refused.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let dead = Url::parse(&format!("http://{}", listener.local_addr().expect("addr")))
        .expect("url");
    drop(listener);

    let cache = Arc::new(PortalUrlCache::new());
    let initial = Url::parse("http://portal.invalid").expect("url");
    cache.insert(&initial, dead);

    let client = PortalClient::new(PortalConfig::new(initial.as_str()))
        .expect("valid url")
        .with_cache(cache.clone());
    let err = client
        .registry()
        .get_entry(
            &KeyPair::from_seed(&[8; 32]).public_key(),
            &RequestOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Transport(ref err) if err.status().is_none()));
    assert!(cache.get(&initial).is_none());
}

#[tokio::test]
async fn upload_checks_returned_cid() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let data = b"some blob contents".to_vec();
    let cid = Cid::for_bytes(&data);
    Mock::given(method("POST"))
        .and(path("/s5/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "cid": cid.to_string() })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, PortalConfig::new(""));
    let uploaded = client
        .upload_bytes(data.clone(), &RequestOptions::default())
        .await?;
    assert_eq!(uploaded, cid);

    let err = client
        .upload_bytes(b"different contents".to_vec(), &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::HashMismatch { expected, actual } if actual == cid && expected != cid));
    Ok(())
}

#[tokio::test]
async fn download_verifies_content() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let data = b"downloaded blob".to_vec();
    let cid = Cid::for_bytes(&data);
    let tampered_cid = Cid::for_bytes(b"expected other blob");

    Mock::given(method("GET"))
        .and(path(format!("/s5/download/{}", cid.to_base58())))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(data.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/s5/download/{}", tampered_cid.to_base58())))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(data.clone()))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, PortalConfig::new(""));
    let body = client
        .download_bytes(&cid, &RequestOptions::default())
        .await?;
    assert_eq!(body.as_ref(), data.as_slice());

    let err = client
        .download_bytes(&tampered_cid, &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::HashMismatch { .. }));

    let missing = Cid::for_bytes(b"missing");
    let err = client
        .download_bytes(&missing, &RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Transport(ref err) if err.status() == Some(404)));
    Ok(())
}
