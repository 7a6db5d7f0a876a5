use crate::error::CommandError;
use crate::filter::SlotFilter;
use crate::slot::{Slot, SlotRecord};
use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;
use std::io::{self, Write};
use tracing::debug;

const SLOT_PATH: &str = "v1/slot/";

/// Payload of a console request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON with a JSON content type.
    Json(Value),
    /// Sent verbatim.
    Text(String),
}

impl RequestBody {
    fn payload(&self) -> Result<String> {
        match self {
            RequestBody::Json(value) => {
                serde_json::to_string(value).context("serializing request body")
            }
            RequestBody::Text(text) => Ok(text.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleClient {
    slot_url: Url,
    http: Client,
    debug: bool,
}

impl ConsoleClient {
    pub fn new(console_url: &str, debug: bool) -> Result<Self> {
        let console_url = console_url.trim();
        if console_url.is_empty() {
            return Err(CommandError::invalid_usage(
                "You must set Galaxy console host by passing --console CONSOLE or by setting the GALAXY_CONSOLE environment variable.",
            )
            .into());
        }

        let mut base = console_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let slot_url = Url::parse(&base)
            .and_then(|url| url.join(SLOT_PATH))
            .with_context(|| format!("parsing console URL `{console_url}`"))?;

        let http = Client::builder()
            .user_agent(concat!("galaxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            slot_url,
            http,
            debug,
        })
    }

    /// `<console>/v1/slot/<sub_path>?<filter>`
    pub fn slot_uri(&self, filter: &SlotFilter, sub_path: Option<&str>) -> Result<Url> {
        let mut url = match sub_path {
            Some(path) => self
                .slot_url
                .join(path.trim_start_matches('/'))
                .with_context(|| format!("joining `{path}` to console URL"))?,
            None => self.slot_url.clone(),
        };
        if !filter.is_empty() {
            url.query_pairs_mut().extend_pairs(filter.query_pairs());
        }
        Ok(url)
    }

    /// Issues one request and fails with `no_agents` when nothing matched.
    pub fn request(
        &self,
        filter: &SlotFilter,
        method: Method,
        sub_path: Option<&str>,
        body: Option<&RequestBody>,
    ) -> Result<Vec<Slot>> {
        let slots = self.fetch_slots(filter, method, sub_path, body)?;
        if slots.is_empty() {
            return Err(CommandError::no_agents().into());
        }
        Ok(slots)
    }

    /// Issues one request; an empty match is returned as an empty list.
    pub fn fetch_slots(
        &self,
        filter: &SlotFilter,
        method: Method,
        sub_path: Option<&str>,
        body: Option<&RequestBody>,
    ) -> Result<Vec<Slot>> {
        let url = self.slot_uri(filter, sub_path)?;
        let payload = body.map(RequestBody::payload).transpose()?;

        if self.debug {
            print_curl(&mut io::stdout().lock(), &method, &url, body, payload.as_deref())
                .context("writing debug output")?;
        }
        debug!(%method, %url, "sending console request");

        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        request = attach_body(request, body, payload);

        let response = request
            .send()
            .and_then(|r| r.error_for_status())
            .context("sending request to console")?;
        let text = response.text().context("reading console response")?;

        let json: Value = serde_json::from_str(&text).context("parsing console response as JSON")?;
        if self.debug {
            println!("{json}");
        }

        let records: Vec<SlotRecord> =
            serde_json::from_value(json).context("console response is not a list of slots")?;
        debug!(count = records.len(), "console returned slots");

        records.into_iter().map(Slot::from_record).collect()
    }
}

fn attach_body(
    request: RequestBuilder,
    body: Option<&RequestBody>,
    payload: Option<String>,
) -> RequestBuilder {
    match (body, payload) {
        (Some(RequestBody::Json(_)), Some(payload)) => request
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(payload),
        (_, Some(payload)) => request.body(payload),
        _ => request,
    }
}

/// Writes a curl invocation equivalent to the request about to be sent.
fn print_curl<W: Write>(
    out: &mut W,
    method: &Method,
    url: &Url,
    body: Option<&RequestBody>,
    payload: Option<&str>,
) -> io::Result<()> {
    match (body, payload) {
        (Some(body), Some(payload)) => {
            let header = match body {
                RequestBody::Json(_) => "-H 'Content-Type: application/json' ",
                RequestBody::Text(_) => "",
            };
            writeln!(out, "curl {header}-X{method} '{url}' -d '")?;
            writeln!(out, "{payload}")?;
            writeln!(out, "'")
        }
        _ => writeln!(out, "curl -X{method} '{url}'"),
    }
}
