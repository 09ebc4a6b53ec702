// # DynDNS2 Provider
//
// This crate provides the DynDNS2 (`/nic/update`) provider for the dynip
// poller. Services like nsupdate.info, dyn.com and DNS-O-Matic speak it.
//
// ## Protocol
//
// ```http
// GET /nic/update?hostname=myhost.nsupdate.info&myip=192.0.2.1
// Authorization: Basic base64(hostname:secret)
// User-Agent: dynipd/<version>
// ```
//
// The 2xx response body is a plain-text return code:
//
// | Body            | Meaning                              | Result                    |
// |-----------------|--------------------------------------|---------------------------|
// | `good <ip>`     | record updated                       | `UpdateResult::Updated`   |
// | `nochg <ip>`    | record already had this IP           | `UpdateResult::Unchanged` |
// | `badauth`       | wrong credentials                    | `Error::Authentication`   |
// | `noauth`        | no credentials sent                  | `Error::Authentication`   |
// | `nohost`        | hostname unknown to this account     | `Error::Provider`         |
// | `notfqdn`       | hostname is not fully qualified      | `Error::Provider`         |
// | `badagent`      | user agent blocked                   | `Error::Provider`         |
// | `abuse`         | hostname blocked for abuse           | `Error::Provider`         |
// | `dnserr`, `911` | server-side failure                  | `Error::Provider`         |
//
// A 401/403 status is `Error::Authentication` regardless of body; any other
// non-2xx status is `Error::Network`.
//
// ## Security Requirements
//
// - The secret travels in the `Authorization` header only, never in the URL
// - The secret NEVER appears in logs, errors or Debug output
// - One request per call; no retries (the poller retries next cycle)

use async_trait::async_trait;
use dynip_core::config::{ProviderConfig, USER_AGENT};
use dynip_core::traits::{DnsProvider, UpdateResult};
use dynip_core::error::body_excerpt;
use dynip_core::{Error, Result};
use std::net::IpAddr;
use std::time::Duration;

const PROVIDER_NAME: &str = "dyndns2";

/// A DynDNS2 return code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnCode {
    /// `good [ip]`
    Good(Option<IpAddr>),
    /// `nochg [ip]`
    NoChange(Option<IpAddr>),
    /// `badauth`
    BadAuth,
    /// `noauth`
    NoAuth,
    /// `nohost`
    NoHost,
    /// `notfqdn`
    NotFqdn,
    /// `badagent`
    BadAgent,
    /// `abuse`
    Abuse,
    /// `dnserr`
    DnsErr,
    /// `911`
    ServerError,
    /// Anything else
    Unknown(String),
}

impl ReturnCode {
    /// Parse a response body; only the first line counts
    pub fn parse(body: &str) -> Self {
        let line = body.trim().lines().next().unwrap_or("").trim();
        let mut parts = line.split_whitespace();
        let code = parts.next().unwrap_or("");
        let ip = parts.next().and_then(|s| s.parse().ok());

        match code {
            "good" => ReturnCode::Good(ip),
            "nochg" => ReturnCode::NoChange(ip),
            "badauth" => ReturnCode::BadAuth,
            "noauth" => ReturnCode::NoAuth,
            "nohost" => ReturnCode::NoHost,
            "notfqdn" => ReturnCode::NotFqdn,
            "badagent" => ReturnCode::BadAgent,
            "abuse" => ReturnCode::Abuse,
            "dnserr" => ReturnCode::DnsErr,
            "911" => ReturnCode::ServerError,
            _ => ReturnCode::Unknown(line.to_string()),
        }
    }

    /// Turn the code into the poller's view of the update
    ///
    /// `requested` is the IP we asked for; it stands in when the server
    /// does not echo one back.
    pub fn into_result(self, hostname: &str, requested: IpAddr) -> Result<UpdateResult> {
        match self {
            ReturnCode::Good(ip) => Ok(UpdateResult::Updated {
                new_ip: ip.unwrap_or(requested),
            }),
            ReturnCode::NoChange(ip) => Ok(UpdateResult::Unchanged {
                current_ip: ip.unwrap_or(requested),
            }),
            ReturnCode::BadAuth => Err(Error::auth(format!(
                "Server rejected credentials for {} (badauth)",
                hostname
            ))),
            ReturnCode::NoAuth => Err(Error::auth("Server received no credentials (noauth)")),
            ReturnCode::NoHost => Err(Error::provider(
                PROVIDER_NAME,
                format!("Hostname {} does not exist in this account (nohost)", hostname),
            )),
            ReturnCode::NotFqdn => Err(Error::provider(
                PROVIDER_NAME,
                format!("Hostname {} is not a fully qualified domain name (notfqdn)", hostname),
            )),
            ReturnCode::BadAgent => Err(Error::provider(
                PROVIDER_NAME,
                format!("User agent {} was refused (badagent)", USER_AGENT),
            )),
            ReturnCode::Abuse => Err(Error::provider(
                PROVIDER_NAME,
                format!("Hostname {} is blocked for abuse (abuse)", hostname),
            )),
            ReturnCode::DnsErr => Err(Error::provider(PROVIDER_NAME, "Server-side DNS error (dnserr)")),
            ReturnCode::ServerError => Err(Error::provider(PROVIDER_NAME, "Server-side failure (911)")),
            ReturnCode::Unknown(body) => Err(Error::invalid_response(format!(
                "Unexpected update response: {:?}",
                body_excerpt(&body)
            ))),
        }
    }
}

/// DynDNS2 provider
///
/// Isolated, stateless and single-shot. Scheduling and retries belong to the
/// poller.
pub struct Dyndns2Provider {
    /// Full URL of the `/nic/update` endpoint
    update_url: String,

    /// HTTP Basic username
    username: String,

    /// HTTP Basic password
    /// ⚠️ NEVER log this value
    secret: String,

    /// Whether to send `myip=`
    send_myip: bool,

    /// HTTP client for update requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the secret
impl std::fmt::Debug for Dyndns2Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dyndns2Provider")
            .field("update_url", &self.update_url)
            .field("username", &self.username)
            .field("secret", &"<REDACTED>")
            .field("send_myip", &self.send_myip)
            .finish()
    }
}

impl Dyndns2Provider {
    /// Create a new DynDNS2 provider
    ///
    /// # Parameters
    ///
    /// - `update_url`: Full `/nic/update` URL
    /// - `username`: HTTP Basic username (nsupdate.info uses the hostname)
    /// - `secret`: HTTP Basic password
    /// - `send_myip`: Whether to pass the observed IP as `myip=`
    /// - `timeout`: Upper bound for each request
    ///
    /// # Errors
    ///
    /// - `Error::Config` if username or secret is empty
    /// - `Error::TransportUnavailable` if the HTTP client cannot be built
    pub fn new(
        update_url: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
        send_myip: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let username = username.into();
        let secret = secret.into();

        if username.is_empty() {
            return Err(Error::config("DynDNS2 username cannot be empty"));
        }
        if secret.is_empty() {
            return Err(Error::config("DynDNS2 secret cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            update_url: update_url.into(),
            username,
            secret,
            send_myip,
            client,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.update_url.clone(),
            config.effective_username(),
            config.secret.clone(),
            config.send_myip,
            timeout,
        )
    }

    fn request_error(&self, e: reqwest::Error) -> Error {
        // Drop the URL: it carries hostname and IP, and adds nothing here
        let e = e.without_url();
        if e.is_timeout() {
            Error::network(format!("Update request to {} timed out", self.update_url))
        } else {
            Error::network(format!("Update request failed: {}", e))
        }
    }
}

#[async_trait]
impl DnsProvider for Dyndns2Provider {
    /// Send one `/nic/update` request
    async fn update_record(&self, hostname: &str, new_ip: IpAddr) -> Result<UpdateResult> {
        let ip_text = new_ip.to_string();
        let mut query = vec![("hostname", hostname)];
        if self.send_myip {
            query.push(("myip", ip_text.as_str()));
        }

        tracing::info!("Sending update: {} -> {} via {}", hostname, new_ip, self.update_url);

        let response = self
            .client
            .get(&self.update_url)
            .query(&query)
            .basic_auth(&self.username, Some(&self.secret))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        // 401/403 is decided from the status alone; the body may never arrive
        let status = response.status();
        match status.as_u16() {
            401 | 403 => {
                return Err(Error::auth(format!(
                    "Server rejected credentials for {}. Status: {}",
                    hostname, status
                )));
            }
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::network(format!(
                    "Update failed: {} - {}",
                    status,
                    body_excerpt(&body)
                )));
            }
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.request_error(e))?;

        tracing::debug!("Update response: {} {:?}", status, body_excerpt(&body));

        let result = ReturnCode::parse(&body).into_result(hostname, new_ip)?;

        if result.ip() != new_ip {
            tracing::warn!(
                "Server set {} to {}, not the observed {}",
                hostname,
                result.ip(),
                new_ip
            );
        }

        Ok(result)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynip_core::config::PollConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{basic_auth, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOST: &str = "myhost.nsupdate.info";
    const SECRET: &str = "yUTvxjRwNu";

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn request_timeout() -> Duration {
        PollConfig::default().request_timeout()
    }

    fn provider_for(server: &MockServer, send_myip: bool) -> Dyndns2Provider {
        Dyndns2Provider::new(
            format!("{}/nic/update", server.uri()),
            HOST,
            SECRET,
            send_myip,
            request_timeout(),
        )
        .unwrap()
    }

    async fn server_replying(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nic/update"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_parse_return_codes() {
        assert_eq!(ReturnCode::parse("good 1.2.3.4"), ReturnCode::Good(Some(ip("1.2.3.4"))));
        assert_eq!(ReturnCode::parse("nochg 2000::2\n"), ReturnCode::NoChange(Some(ip("2000::2"))));
        assert_eq!(ReturnCode::parse("good"), ReturnCode::Good(None));
        assert_eq!(ReturnCode::parse("badauth"), ReturnCode::BadAuth);
        assert_eq!(ReturnCode::parse("noauth"), ReturnCode::NoAuth);
        assert_eq!(ReturnCode::parse("nohost"), ReturnCode::NoHost);
        assert_eq!(ReturnCode::parse("notfqdn"), ReturnCode::NotFqdn);
        assert_eq!(ReturnCode::parse("badagent"), ReturnCode::BadAgent);
        assert_eq!(ReturnCode::parse("abuse"), ReturnCode::Abuse);
        assert_eq!(ReturnCode::parse("dnserr"), ReturnCode::DnsErr);
        assert_eq!(ReturnCode::parse("911"), ReturnCode::ServerError);
        assert_eq!(
            ReturnCode::parse("<html>maintenance</html>"),
            ReturnCode::Unknown("<html>maintenance</html>".to_string())
        );
    }

    #[test]
    fn test_return_code_classification() {
        let requested = ip("1.2.3.4");
        assert!(ReturnCode::BadAuth.into_result(HOST, requested).unwrap_err().is_auth());
        assert!(ReturnCode::NoAuth.into_result(HOST, requested).unwrap_err().is_auth());
        assert!(matches!(
            ReturnCode::NoHost.into_result(HOST, requested),
            Err(Error::Provider { .. })
        ));
        assert!(matches!(
            ReturnCode::Unknown(String::new()).into_result(HOST, requested),
            Err(Error::InvalidResponse(_))
        ));
        assert_eq!(
            ReturnCode::Good(None).into_result(HOST, requested).unwrap(),
            UpdateResult::Updated { new_ip: requested }
        );
    }

    #[tokio::test]
    async fn test_good_update_sends_expected_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nic/update"))
            .and(query_param("hostname", HOST))
            .and(query_param("myip", "5.6.7.8"))
            .and(basic_auth(HOST, SECRET))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("good 5.6.7.8"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, true);
        let result = provider.update_record(HOST, ip("5.6.7.8")).await.unwrap();
        assert_eq!(result, UpdateResult::Updated { new_ip: ip("5.6.7.8") });
    }

    #[tokio::test]
    async fn test_secret_never_in_url() {
        let server = server_replying(200, "good 5.6.7.8").await;
        let provider = provider_for(&server, true);
        provider.update_record(HOST, ip("5.6.7.8")).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let url = requests[0].url.to_string();
        assert!(!url.contains(SECRET), "secret leaked into URL: {}", url);
        assert!(requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_myip_can_be_omitted() {
        let server = server_replying(200, "good 9.9.9.9").await;
        let provider = provider_for(&server, false);
        let result = provider.update_record(HOST, ip("5.6.7.8")).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].url.query_pairs().any(|(k, _)| k == "myip"));
        // The server decided from the source address
        assert_eq!(result.ip(), ip("9.9.9.9"));
    }

    #[tokio::test]
    async fn test_nochg_is_success() {
        let server = server_replying(200, "nochg 5.6.7.8").await;
        let provider = provider_for(&server, true);
        let result = provider.update_record(HOST, ip("5.6.7.8")).await.unwrap();
        assert_eq!(result, UpdateResult::Unchanged { current_ip: ip("5.6.7.8") });
    }

    #[tokio::test]
    async fn test_401_is_auth_failure() {
        let server = server_replying(401, "badauth").await;
        let provider = provider_for(&server, true);
        let err = provider.update_record(HOST, ip("5.6.7.8")).await.unwrap_err();
        assert!(err.is_auth());
        assert!(!err.to_string().contains(SECRET));
    }

    #[tokio::test]
    async fn test_401_with_stalled_body_is_auth_failure() {
        // Headers arrive, the announced body never does
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 100\r\n\r\nbad")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let provider = Dyndns2Provider::new(
            format!("http://{}/nic/update", addr),
            HOST,
            SECRET,
            true,
            Duration::from_millis(300),
        )
        .unwrap();

        let err = provider.update_record(HOST, ip("5.6.7.8")).await.unwrap_err();
        assert!(err.is_auth(), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn test_error_page_is_not_copied_into_error() {
        let page = format!("<html><body>{}</body></html>\n{}", "x".repeat(500), "y".repeat(500));
        let server = server_replying(404, &page).await;
        let provider = provider_for(&server, true);

        let err = provider.update_record(HOST, ip("5.6.7.8")).await.unwrap_err();
        assert!(err.is_network());
        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(!message.contains("yyy"));
        assert!(message.len() < 250, "error message too long: {}", message.len());
    }

    #[tokio::test]
    async fn test_403_is_auth_failure() {
        let server = server_replying(403, "").await;
        let provider = provider_for(&server, true);
        assert!(provider.update_record(HOST, ip("5.6.7.8")).await.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn test_badauth_body_is_auth_failure() {
        let server = server_replying(200, "badauth").await;
        let provider = provider_for(&server, true);
        assert!(provider.update_record(HOST, ip("5.6.7.8")).await.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn test_server_error_is_network_failure() {
        let server = server_replying(502, "Bad Gateway").await;
        let provider = provider_for(&server, true);
        let err = provider.update_record(HOST, ip("5.6.7.8")).await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_nohost_is_provider_error() {
        let server = server_replying(200, "nohost").await;
        let provider = provider_for(&server, true);
        let err = provider.update_record(HOST, ip("5.6.7.8")).await.unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
        assert!(!err.is_auth());
    }

    #[tokio::test]
    async fn test_timeout_is_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("good 5.6.7.8")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let provider = Dyndns2Provider::new(
            format!("{}/nic/update", server.uri()),
            HOST,
            SECRET,
            true,
            Duration::from_millis(100),
        )
        .unwrap();

        let err = provider.update_record(HOST, ip("5.6.7.8")).await.unwrap_err();
        assert!(err.is_network());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = Dyndns2Provider::new("https://nsupdate.info/nic/update", HOST, "", true, request_timeout());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_config_uses_effective_username() {
        let mut config = ProviderConfig::new(HOST, SECRET);
        let provider = Dyndns2Provider::from_config(&config, request_timeout()).unwrap();
        assert_eq!(provider.username, HOST);
        assert!(provider.send_myip);

        config.username = Some("account".to_string());
        let provider = Dyndns2Provider::from_config(&config, request_timeout()).unwrap();
        assert_eq!(provider.username, "account");
    }

    #[test]
    fn test_secret_not_exposed_in_debug() {
        let provider = Dyndns2Provider::new(
            "https://nsupdate.info/nic/update",
            HOST,
            "secret_token_12345",
            true,
            request_timeout(),
        )
        .unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(debug_str.contains("Dyndns2Provider"));
    }

    #[test]
    fn test_provider_name() {
        let config = ProviderConfig::new(HOST, SECRET);
        let provider = Dyndns2Provider::from_config(&config, request_timeout()).unwrap();
        assert_eq!(provider.provider_name(), "dyndns2");
    }
}
